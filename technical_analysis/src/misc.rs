use std::fmt;

use market_data::Candle;
use serde::{Deserialize, Serialize};

/// Window sizes of the indicator engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Moving average / Bollinger window.
    pub window: usize,
    /// Standard deviations between the middle line and each band.
    pub band_width: f64,
    /// Samples of the moving-average difference averaged into the slope.
    pub slope_smoothing: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            window: 20,
            band_width: 2.0,
            slope_smoothing: 5,
        }
    }
}

impl IndicatorParams {
    /// Shortest series whose latest row has every indicator defined.
    ///
    /// The moving average needs `window` closes, its first difference one more,
    /// and the slope `slope_smoothing` differences: `window + slope_smoothing`.
    pub fn min_candles(&self) -> usize {
        self.window + self.slope_smoothing
    }
}

/// Indicators at one candle. `None` inside the warm-up region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub moving_average: Option<f64>,
    pub bollinger_mid: Option<f64>,
    pub bollinger_std: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub trend_slope: Option<f64>,
}

/// A candle series with one indicator row per candle.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    candles: Vec<Candle>,
    rows: Vec<IndicatorRow>,
    params: IndicatorParams,
}

impl IndicatorFrame {
    pub(crate) fn new(candles: Vec<Candle>, rows: Vec<IndicatorRow>, params: IndicatorParams) -> Self {
        debug_assert_eq!(candles.len(), rows.len());
        Self {
            candles,
            rows,
            params,
        }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<(&Candle, &IndicatorRow)> {
        self.candles.last().zip(self.rows.last())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
}

impl TrendDirection {
    /// A flat slope counts as falling.
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Rising => f.write_str("rising"),
            TrendDirection::Falling => f.write_str("falling"),
        }
    }
}

/// Trend and Bollinger support/resistance of the latest candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub current_price: f64,
    pub trend_direction: TrendDirection,
    pub resistance_level: f64,
    pub middle_level: f64,
    pub support_level: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    ExtremelyBearish,
    Bearish,
    Neutral,
    Bullish,
    ExtremelyBullish,
}

impl Sentiment {
    /// Buckets are inclusive on their lower bound.
    pub fn from_advancing_fraction(fraction: f64) -> Self {
        if fraction >= 0.80 {
            Sentiment::ExtremelyBullish
        } else if fraction >= 0.60 {
            Sentiment::Bullish
        } else if fraction >= 0.40 {
            Sentiment::Neutral
        } else if fraction >= 0.20 {
            Sentiment::Bearish
        } else {
            Sentiment::ExtremelyBearish
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::ExtremelyBearish => "extremely bearish",
            Sentiment::Bearish => "bearish",
            Sentiment::Neutral => "neutral",
            Sentiment::Bullish => "bullish",
            Sentiment::ExtremelyBullish => "extremely bullish",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub sentiment: Sentiment,
    pub advancing_fraction: f64,
    pub advancing: usize,
    pub total: usize,
}
