use log::debug;
use market_data::TickerSnapshot;

use crate::error::AnalysisError;
use crate::misc::{Sentiment, SentimentReading};

/// Market-wide mood from the share of `quote` pairs that gained over 24h.
pub fn classify_sentiment(
    tickers: &[TickerSnapshot],
    quote: &str,
) -> Result<SentimentReading, AnalysisError> {
    let quoted: Vec<&TickerSnapshot> = tickers.iter().filter(|t| t.is_quoted_in(quote)).collect();
    let total = quoted.len();
    if total == 0 {
        return Err(AnalysisError::NoData);
    }

    let advancing = quoted.iter().filter(|t| t.percent_change_24h > 0.0).count();
    let advancing_fraction = advancing as f64 / total as f64;
    debug!(
        "{} of {} {} pairs advancing ({} tickers in total)",
        advancing,
        total,
        quote,
        tickers.len()
    );

    Ok(SentimentReading {
        sentiment: Sentiment::from_advancing_fraction(advancing_fraction),
        advancing_fraction,
        advancing,
        total,
    })
}
