use crate::error::AnalysisError;
use crate::misc::{IndicatorFrame, TrendDirection, TrendSummary};

/// Reads the trend and Bollinger levels off the latest row of `frame`.
pub fn classify_trend(frame: &IndicatorFrame) -> Result<TrendSummary, AnalysisError> {
    let required = frame.params().min_candles();
    let available = frame.len();

    let (candle, row) = frame.latest().ok_or(AnalysisError::InsufficientData {
        required,
        available,
    })?;

    let defined = |field: &'static str, value: Option<f64>| {
        value.ok_or(AnalysisError::UndefinedIndicator {
            field,
            required,
            available,
        })
    };

    let resistance_level = defined("bollinger_upper", row.bollinger_upper)?;
    let middle_level = defined("bollinger_mid", row.bollinger_mid)?;
    let support_level = defined("bollinger_lower", row.bollinger_lower)?;
    let slope = defined("trend_slope", row.trend_slope)?;

    Ok(TrendSummary {
        current_price: candle.close,
        trend_direction: TrendDirection::from_slope(slope),
        resistance_level,
        middle_level,
        support_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::compute_indicators;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration};
    use market_data::Candle;

    fn series(closes: impl IntoIterator<Item = f64>) -> Vec<Candle> {
        let start = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| Candle {
                timestamp: start + Duration::hours(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn zero_slope_counts_as_falling() {
        assert_eq!(TrendDirection::from_slope(0.0), TrendDirection::Falling);
        assert_eq!(TrendDirection::from_slope(-0.0), TrendDirection::Falling);
        assert_eq!(TrendDirection::from_slope(1e-12), TrendDirection::Rising);
    }

    #[test]
    fn constant_price_is_flat_and_falling() {
        for close in [42.0, 0.1, 1.1, 3.3, 0.00001234, 2603.37] {
            let frame = compute_indicators(&series(std::iter::repeat_n(close, 25))).unwrap();
            let summary = classify_trend(&frame).unwrap();

            assert_eq!(summary.current_price, close);
            assert_eq!(summary.trend_direction, TrendDirection::Falling, "close {close}");
            assert_eq!(summary.resistance_level, summary.support_level, "close {close}");
            assert_eq!(summary.middle_level, summary.support_level);
            assert_relative_eq!(summary.middle_level, close);
        }
    }

    #[test]
    fn minimum_length_is_twenty_five() {
        let closes = |n: usize| (0..n).map(|i| 10.0 + i as f64);

        let err = classify_trend(&compute_indicators(&series(closes(24))).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UndefinedIndicator {
                field: "trend_slope",
                required: 25,
                available: 24
            }
        ));

        let summary = classify_trend(&compute_indicators(&series(closes(25))).unwrap()).unwrap();
        assert_eq!(summary.trend_direction, TrendDirection::Rising);
    }

    #[test]
    fn bollinger_fields_are_checked_first_in_a_very_short_series() {
        let err = classify_trend(&compute_indicators(&series([1.0, 2.0])).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UndefinedIndicator {
                field: "bollinger_upper",
                ..
            }
        ));
    }

    #[test]
    fn increasing_closes_rise() {
        let frame = compute_indicators(&series((0..60).map(|i| 5.0 + i as f64 * 0.25))).unwrap();
        let summary = classify_trend(&frame).unwrap();

        assert_eq!(summary.trend_direction, TrendDirection::Rising);
        assert_relative_eq!(summary.current_price, 5.0 + 59.0 * 0.25);
    }

    #[test]
    fn decreasing_closes_fall() {
        let frame = compute_indicators(&series((0..60).map(|i| 500.0 - i as f64))).unwrap();
        let summary = classify_trend(&frame).unwrap();

        assert_eq!(summary.trend_direction, TrendDirection::Falling);
        assert!(summary.support_level < summary.middle_level);
        assert!(summary.middle_level < summary.resistance_level);
    }
}
