pub mod error;
pub mod misc;
pub mod processor;
pub mod sentiment;
pub mod trend;

pub use error::AnalysisError;
pub use misc::{
    IndicatorFrame, IndicatorParams, IndicatorRow, Sentiment, SentimentReading, TrendDirection,
    TrendSummary,
};
pub use processor::{compute_indicators, compute_indicators_with};
pub use sentiment::classify_sentiment;
pub use trend::classify_trend;
