use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::misc::{MarketMood, TimeframeAnalysis};

/// Voice of the generated social post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Casual,
    Trader,
    Analyst,
    Press,
}

impl Tone {
    fn style(&self) -> &'static str {
        match self {
            Tone::Casual => {
                "Write like a friendly crypto enthusiast talking to followers. Plain words, \
                 one or two emojis, no jargon."
            }
            Tone::Trader => {
                "Write like an active trader posting a quick setup. Mention levels and the \
                 bias per timeframe, keep it punchy, use cashtags."
            }
            Tone::Analyst => {
                "Write like a research analyst. Neutral, precise, cite the numbers, no hype \
                 and no emojis."
            }
            Tone::Press => {
                "Write like a short market news brief in the third person. Factual headline \
                 style, no opinions, no emojis."
            }
        }
    }

    pub fn max_chars(&self) -> usize {
        match self {
            Tone::Casual | Tone::Trader => 280,
            Tone::Analyst | Tone::Press => 400,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Casual => "casual",
            Tone::Trader => "trader",
            Tone::Analyst => "analyst",
            Tone::Press => "press",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Numeric context shared by every prompt.
pub fn market_context(
    pair: &str,
    current_price: Option<f64>,
    timeframes: &[TimeframeAnalysis],
    mood: &MarketMood,
) -> String {
    let mut out = format!("Pair: {pair}\n");
    if let Some(price) = current_price {
        out.push_str(&format!("Current price: {price}\n"));
    }

    out.push_str("\nPer-timeframe indicators (MA20 trend, Bollinger 20/2):\n");
    for tf in timeframes {
        let line = match (&tf.summary, &tf.error) {
            (Some(s), _) => format!(
                "- {}: price {}, MA20 trend {}, resistance {:.8}, middle {:.8}, support {:.8}\n",
                tf.timeframe,
                s.current_price,
                s.trend_direction,
                s.resistance_level,
                s.middle_level,
                s.support_level
            ),
            (None, Some(err)) => format!("- {}: unavailable ({err})\n", tf.timeframe),
            (None, None) => format!("- {}: unavailable\n", tf.timeframe),
        };
        out.push_str(&line);
    }

    let sentiment = match (&mood.reading, &mood.error) {
        (Some(r), _) => format!(
            "{} ({:.2}% of pairs advancing over 24h)",
            r.sentiment,
            r.advancing_fraction * 100.0
        ),
        (None, Some(err)) => format!("unavailable ({err})"),
        (None, None) => "unavailable".to_string(),
    };
    out.push_str(&format!("\nOverall market sentiment: {sentiment}\n"));
    out
}

pub fn trading_plan_prompt(context: &str) -> String {
    format!(
        "You are a professional crypto trader. Based on the data below, write a concise \
         trading plan: directional bias, entry zone, stop-loss, two take-profit targets and \
         position-sizing advice. Refer to the support and resistance levels explicitly.\n\n\
         {context}"
    )
}

pub fn report_prompt(context: &str) -> String {
    format!(
        "You are a crypto market analyst. Write a structured markdown report from the data \
         below with exactly these sections:\n\
         ## Overview\n## Multi-timeframe trend\n## Support and resistance\n\
         ## Market sentiment\n## Risks\n\
         Keep every section short and grounded in the numbers given.\n\n{context}"
    )
}

pub fn social_post_prompt(context: &str, tone: Tone) -> String {
    format!(
        "Write a single social media post about the market data below. {} \
         Stay under {} characters. Do not give financial advice.\n\n{context}",
        tone.style(),
        tone.max_chars()
    )
}
