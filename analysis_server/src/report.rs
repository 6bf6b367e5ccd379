use crate::misc::{AnalysisReport, MarketMood};

/// `$0.00001234` below ten cents, `$67,250.10` otherwise.
pub fn format_price(price: f64) -> String {
    if price < 0.1 {
        format!("${price:.8}")
    } else {
        format!("${}", group_thousands(&format!("{price:.2}")))
    }
}

fn group_thousands(fixed: &str) -> String {
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed, ""));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

pub fn sentiment_line(mood: &MarketMood) -> String {
    match (&mood.reading, &mood.error) {
        (Some(r), _) => format!(
            "Market sentiment: {} (advancing pairs {:.2}%)",
            r.sentiment,
            r.advancing_fraction * 100.0
        ),
        (None, Some(e)) => format!("Market sentiment unavailable: {e}"),
        (None, None) => "Market sentiment unavailable".to_string(),
    }
}

/// Plain-text rendering for the terminal.
pub fn render_text(report: &AnalysisReport) -> String {
    let price = report
        .current_price
        .map(format_price)
        .unwrap_or_else(|| "unavailable".to_string());
    let mut out = format!("{} current price: {}\n", report.pair(), price);

    out.push_str("\n== Overall market sentiment ==\n");
    out.push_str(&sentiment_line(&report.market_sentiment));
    out.push('\n');

    out.push_str("\n== Multi-timeframe analysis ==\n");
    for tf in &report.timeframes {
        out.push_str(&format!("\n### {}\n", tf.timeframe));
        let body = match (&tf.summary, &tf.error) {
            (Some(s), _) => format!(
                "  price:       {}\n  MA20 trend:  {}\n  resistance:  {}\n  middle:      {}\n  support:     {}\n",
                format_price(s.current_price),
                s.trend_direction,
                format_price(s.resistance_level),
                format_price(s.middle_level),
                format_price(s.support_level)
            ),
            (None, Some(e)) => format!("  error: {e}\n"),
            (None, None) => "  no data\n".to_string(),
        };
        out.push_str(&body);
    }

    if let Some(narrative) = &report.narrative {
        out.push_str(&format!("\n== Trading plan ==\n{}\n", narrative.trading_plan));
        out.push_str(&format!("\n== Report ==\n{}\n", narrative.report));
        out.push_str(&format!(
            "\n== Social post ({}) ==\n{}\n",
            narrative.tone, narrative.social_post
        ));
    }

    out.push_str(&format!(
        "\nAnalysis time: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out
}
