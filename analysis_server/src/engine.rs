use std::sync::Arc;

use chrono::Local;
use futures_util::future::join_all;
use log::{error, info, warn};
use market_data::{FetchError, MarketDataSource, Timeframe};
use technical_analysis::{
    AnalysisError, IndicatorParams, TrendSummary, classify_sentiment, classify_trend,
    compute_indicators_with,
};
use thiserror::Error;

use crate::misc::{AnalysisReport, MarketMood, Narrative, TimeframeAnalysis};
use crate::narrative::NarrativeGenerator;
use crate::prompts::{
    Tone, market_context, report_prompt, social_post_prompt, trading_plan_prompt,
};

#[derive(Error, Debug)]
enum StepError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisOptions {
    pub narrative: bool,
    pub tone: Tone,
}

/// Runs one analysis per request over injected collaborators.
pub struct AnalysisEngine {
    source: Arc<dyn MarketDataSource>,
    narrator: Option<Arc<dyn NarrativeGenerator>>,
    candle_limit: usize,
    params: IndicatorParams,
}

impl AnalysisEngine {
    pub fn new(source: Arc<dyn MarketDataSource>, candle_limit: usize) -> Self {
        Self {
            source,
            narrator: None,
            candle_limit,
            params: IndicatorParams::default(),
        }
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn NarrativeGenerator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn with_params(mut self, params: IndicatorParams) -> Self {
        self.params = params;
        self
    }

    pub fn has_narrator(&self) -> bool {
        self.narrator.is_some()
    }

    /// Fails only when the pair cannot be confirmed to exist. Every later
    /// failure is recorded in the report next to the section it affects.
    pub async fn analyze(
        &self,
        symbol: &str,
        options: AnalysisOptions,
    ) -> Result<AnalysisReport, FetchError> {
        let symbol = symbol.trim().to_uppercase();
        let quote = self.source.quote_currency().to_string();

        if !self.source.symbol_exists(&symbol).await? {
            return Err(FetchError::SymbolNotFound(format!("{symbol}/{quote}")));
        }
        info!("Analyzing {}/{}", symbol, quote);

        let (timeframes, market_sentiment) =
            tokio::join!(self.analyze_timeframes(&symbol), self.market_sentiment(&quote));

        let mut report = AnalysisReport {
            current_price: reference_price(&timeframes),
            symbol,
            quote,
            generated_at: Local::now(),
            timeframes,
            market_sentiment,
            narrative: None,
        };

        if options.narrative {
            match &self.narrator {
                Some(narrator) => {
                    report.narrative = Some(narrate(narrator.as_ref(), &report, options.tone).await)
                }
                None => warn!("Narrative requested but no language model is configured"),
            }
        }

        Ok(report)
    }

    async fn analyze_timeframes(&self, symbol: &str) -> Vec<TimeframeAnalysis> {
        let runs = Timeframe::ALL.into_iter().map(|tf| async move {
            match self.timeframe_summary(symbol, tf).await {
                Ok(summary) => TimeframeAnalysis::ok(tf, summary),
                Err(e) => {
                    warn!("{} analysis of {} failed: {}", tf, symbol, e);
                    TimeframeAnalysis::failed(tf, e.to_string())
                }
            }
        });
        join_all(runs).await
    }

    async fn timeframe_summary(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<TrendSummary, StepError> {
        let candles = self
            .source
            .fetch_candles(symbol, timeframe, self.candle_limit)
            .await?;
        let frame = compute_indicators_with(&candles, self.params)?;
        Ok(classify_trend(&frame)?)
    }

    async fn market_sentiment(&self, quote: &str) -> MarketMood {
        let reading = match self.source.fetch_tickers().await {
            Ok(tickers) => classify_sentiment(&tickers, quote).map_err(StepError::from),
            Err(e) => Err(StepError::from(e)),
        };

        match reading {
            Ok(reading) => MarketMood {
                reading: Some(reading),
                error: None,
            },
            Err(e) => {
                error!("Market sentiment unavailable: {}", e);
                MarketMood {
                    reading: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// The daily close, or the shortest timeframe that produced a summary.
fn reference_price(timeframes: &[TimeframeAnalysis]) -> Option<f64> {
    let of = |tf: Timeframe| {
        timeframes
            .iter()
            .find(|t| t.timeframe == tf)
            .and_then(|t| t.summary.as_ref())
            .map(|s| s.current_price)
    };

    of(Timeframe::OneDay).or_else(|| {
        timeframes
            .iter()
            .find_map(|t| t.summary.as_ref().map(|s| s.current_price))
    })
}

async fn narrate(
    narrator: &dyn NarrativeGenerator,
    report: &AnalysisReport,
    tone: Tone,
) -> Narrative {
    let context = market_context(
        &report.pair(),
        report.current_price,
        &report.timeframes,
        &report.market_sentiment,
    );

    let plan = trading_plan_prompt(&context);
    let full_report = report_prompt(&context);
    let post = social_post_prompt(&context, tone);

    let (trading_plan, report_text, social_post) = tokio::join!(
        section(narrator, "trading plan", &plan),
        section(narrator, "report", &full_report),
        section(narrator, "social post", &post),
    );

    Narrative {
        tone,
        trading_plan,
        report: report_text,
        social_post,
    }
}

async fn section(narrator: &dyn NarrativeGenerator, name: &str, prompt: &str) -> String {
    match narrator.generate_text(prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not generate {}: {}", name, e);
            format!("[{name} unavailable: {e}]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use technical_analysis::TrendDirection;

    fn summary(price: f64) -> TrendSummary {
        TrendSummary {
            current_price: price,
            trend_direction: TrendDirection::Rising,
            resistance_level: price + 1.0,
            middle_level: price,
            support_level: price - 1.0,
        }
    }

    #[test]
    fn reference_price_prefers_the_daily_close() {
        let timeframes = vec![
            TimeframeAnalysis::ok(Timeframe::FiveMinutes, summary(10.0)),
            TimeframeAnalysis::ok(Timeframe::OneDay, summary(12.0)),
        ];
        assert_eq!(reference_price(&timeframes), Some(12.0));
    }

    #[test]
    fn reference_price_falls_back_to_the_shortest_timeframe() {
        let timeframes = vec![
            TimeframeAnalysis::failed(Timeframe::FiveMinutes, "boom"),
            TimeframeAnalysis::ok(Timeframe::FifteenMinutes, summary(11.0)),
            TimeframeAnalysis::ok(Timeframe::OneHour, summary(13.0)),
            TimeframeAnalysis::failed(Timeframe::OneDay, "boom"),
        ];
        assert_eq!(reference_price(&timeframes), Some(11.0));
        assert_eq!(reference_price(&[]), None);
    }
}
