use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: need at least {required} candles, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error(
        "Indicator `{field}` is undefined at the latest candle (need {required} candles, got {available})"
    )]
    UndefinedIndicator {
        field: &'static str,
        required: usize,
        available: usize,
    },

    #[error("No ticker data available")]
    NoData,

    #[error("Dataframe error: {0}")]
    PolarsError(#[from] PolarsError),
}
