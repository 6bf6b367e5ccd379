use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

/// One OHLCV candlestick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 24h statistics of a single spot pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub base: String,
    pub quote: String,
    pub percent_change_24h: f64,
}

impl TickerSnapshot {
    pub fn is_quoted_in(&self, quote: &str) -> bool {
        self.quote.eq_ignore_ascii_case(quote)
    }

    pub fn pair(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Timeframe {
    /// Every timeframe an analysis run walks through, shortest first.
    pub const ALL: [Timeframe; 5] = [
        Timeframe::FiveMinutes,
        Timeframe::FifteenMinutes,
        Timeframe::OneHour,
        Timeframe::FourHours,
        Timeframe::OneDay,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1d",
        }
    }

    /// Bar name used by the OKX candles endpoint.
    pub fn okx_bar(&self) -> &'static str {
        match self {
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::OneHour => "1H",
            Timeframe::FourHours => "4H",
            Timeframe::OneDay => "1Dutc",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown timeframe `{s}`"))
    }
}

pub fn validate_candle(candle: &Candle) -> bool {
    let mut is_valid = true;
    let fields = [
        ("open", candle.open),
        ("high", candle.high),
        ("low", candle.low),
        ("close", candle.close),
        ("volume", candle.volume),
    ];

    for (name, value) in fields {
        if !value.is_finite() {
            warn!("{} is not a finite number", name);
            is_valid = false;
        } else if value < 0.0 {
            warn!("{} cannot be negative", name);
            is_valid = false;
        }
    }

    if candle.high < candle.low {
        warn!("High is below low");
        is_valid = false;
    }

    is_valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn timeframe_round_trips_through_its_label() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.label().parse::<Timeframe>().unwrap(), tf);
        }
        assert_eq!("1H".parse::<Timeframe>().unwrap(), Timeframe::OneHour);
        assert!("2h".parse::<Timeframe>().is_err());
    }

    #[test]
    fn okx_bars_use_upper_case_hours() {
        assert_eq!(Timeframe::OneHour.okx_bar(), "1H");
        assert_eq!(Timeframe::FourHours.okx_bar(), "4H");
        assert_eq!(Timeframe::FiveMinutes.okx_bar(), "5m");
    }

    #[test]
    fn rejects_negative_and_non_finite_fields() {
        assert!(validate_candle(&candle(1.0, 2.0, 0.5, 1.5, 10.0)));
        assert!(!validate_candle(&candle(-1.0, 2.0, 0.5, 1.5, 10.0)));
        assert!(!validate_candle(&candle(1.0, 2.0, 0.5, f64::NAN, 10.0)));
        assert!(!validate_candle(&candle(1.0, 0.4, 0.5, 1.5, 10.0)));
    }

    #[test]
    fn ticker_quote_match_ignores_case() {
        let t = TickerSnapshot {
            base: "BTC".into(),
            quote: "USDT".into(),
            percent_change_24h: 1.2,
        };
        assert!(t.is_quoted_in("usdt"));
        assert!(!t.is_quoted_in("USDC"));
        assert_eq!(t.pair(), "BTC/USDT");
    }
}
