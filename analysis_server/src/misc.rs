use chrono::{DateTime, Local};
use market_data::Timeframe;
use serde::Serialize;
use technical_analysis::{SentimentReading, TrendSummary};

use crate::prompts::Tone;

/// Outcome of one timeframe. Exactly one of `summary` / `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct TimeframeAnalysis {
    pub timeframe: Timeframe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TrendSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TimeframeAnalysis {
    pub fn ok(timeframe: Timeframe, summary: TrendSummary) -> Self {
        Self {
            timeframe,
            summary: Some(summary),
            error: None,
        }
    }

    pub fn failed(timeframe: Timeframe, error: impl Into<String>) -> Self {
        Self {
            timeframe,
            summary: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketMood {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<SentimentReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Narrative {
    pub tone: Tone,
    pub trading_plan: String,
    pub report: String,
    pub social_post: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub quote: String,
    pub generated_at: DateTime<Local>,
    pub current_price: Option<f64>,
    pub timeframes: Vec<TimeframeAnalysis>,
    pub market_sentiment: MarketMood,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<Narrative>,
}

impl AnalysisReport {
    pub fn pair(&self) -> String {
        format!("{}/{}", self.symbol, self.quote)
    }

    pub fn summary_for(&self, timeframe: Timeframe) -> Option<&TrendSummary> {
        self.timeframes
            .iter()
            .find(|t| t.timeframe == timeframe)
            .and_then(|t| t.summary.as_ref())
    }
}
