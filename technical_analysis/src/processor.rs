use log::debug;
use market_data::Candle;
use polars::prelude::*;
use polars::series::ops::NullBehavior;

use crate::error::AnalysisError;
use crate::misc::{IndicatorFrame, IndicatorParams, IndicatorRow};

/// Moving average, Bollinger bands and trend slope with the default 20/2/5 windows.
pub fn compute_indicators(candles: &[Candle]) -> Result<IndicatorFrame, AnalysisError> {
    compute_indicators_with(candles, IndicatorParams::default())
}

/// Computes one [`IndicatorRow`] per candle. Rows inside the warm-up region
/// hold `None`; only an empty series is an error.
pub fn compute_indicators_with(
    candles: &[Candle],
    params: IndicatorParams,
) -> Result<IndicatorFrame, AnalysisError> {
    if candles.is_empty() {
        return Err(AnalysisError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let df = to_dataframe(candles)?;
    let df = indicator_columns(df, &params)?;
    let rows = extract_rows(&df)?;

    debug!(
        "Computed indicators over {} candles ({} warm-up rows)",
        rows.len(),
        rows.iter().take_while(|r| r.trend_slope.is_none()).count()
    );

    Ok(IndicatorFrame::new(candles.to_vec(), rows, params))
}

fn to_dataframe(candles: &[Candle]) -> Result<DataFrame, AnalysisError> {
    let close: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let s1 = Series::new("close", close);
    let df = DataFrame::new(vec![s1])?;
    Ok(df)
}

fn fixed_window(size: usize) -> RollingOptions {
    RollingOptions {
        window_size: Duration::parse(&format!("{size}i")),
        // no partial windows: the head of every column stays null
        min_periods: size,
        ..Default::default()
    }
}

fn indicator_columns(df: DataFrame, params: &IndicatorParams) -> Result<DataFrame, AnalysisError> {
    let band = lit(params.band_width);
    // Closes shifted by the latest close: a constant series becomes exact
    // zeros, so its std is 0 and its mean lands back on the close.
    let anchor = col("close").last();
    let centered = col("close") - anchor.clone();

    let df = df
        .lazy()
        .with_columns([
            (centered.clone().rolling_mean(fixed_window(params.window)) + anchor)
                .alias("moving_average"),
            // sample standard deviation (ddof = 1)
            centered
                .rolling_std(fixed_window(params.window))
                .alias("bollinger_std"),
        ])
        .with_columns([
            col("moving_average").alias("bollinger_mid"),
            (col("moving_average") + band.clone() * col("bollinger_std")).alias("bollinger_upper"),
            (col("moving_average") - band * col("bollinger_std")).alias("bollinger_lower"),
            // smoothed derivative of the moving average
            col("moving_average")
                .diff(1, NullBehavior::Ignore)
                .rolling_mean(fixed_window(params.slope_smoothing))
                .alias("trend_slope"),
        ])
        .collect()?;

    Ok(df)
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, AnalysisError> {
    Ok(df.column(name)?.f64()?.into_iter().collect())
}

fn extract_rows(df: &DataFrame) -> Result<Vec<IndicatorRow>, AnalysisError> {
    let moving_average = column_values(df, "moving_average")?;
    let bollinger_mid = column_values(df, "bollinger_mid")?;
    let bollinger_std = column_values(df, "bollinger_std")?;
    let bollinger_upper = column_values(df, "bollinger_upper")?;
    let bollinger_lower = column_values(df, "bollinger_lower")?;
    let trend_slope = column_values(df, "trend_slope")?;

    let rows = (0..df.height())
        .map(|i| IndicatorRow {
            moving_average: moving_average[i],
            bollinger_mid: bollinger_mid[i],
            bollinger_std: bollinger_std[i],
            bollinger_upper: bollinger_upper[i],
            bollinger_lower: bollinger_lower[i],
            trend_slope: trend_slope[i],
        })
        .collect();

    Ok(rows)
}
