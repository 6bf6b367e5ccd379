use std::sync::Arc;

use analysis_server::engine::{AnalysisEngine, AnalysisOptions};
use analysis_server::narrative::LlmClient;
use analysis_server::prompts::Tone;
use analysis_server::report::render_text;
use analysis_server::server::Server;
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use market_data::AppConfig;
use market_data::OkxClient;
use market_data::logger::init_logger;
use technical_analysis::IndicatorParams;

#[derive(Parser)]
#[command(name = "analysis_server")]
#[command(about = "Multi-timeframe crypto market analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file layered over the defaults
    #[arg(short, long, default_value = market_data::config::DEFAULT_CONFIG_FILE)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one pair and print the report
    Analyze {
        /// Base asset (e.g. BTC, ETH, PEPE)
        #[arg(default_value = "BTC")]
        symbol: String,

        /// Ask the language model for a plan, report and social post
        #[arg(long)]
        narrative: bool,

        /// Voice of the social post
        #[arg(long, value_enum, default_value_t = Tone::Casual)]
        tone: Tone,

        /// Candles fetched per timeframe
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Serve analyses over HTTP
    Serve {
        /// Overrides server.bind_addr
        #[arg(long)]
        bind: Option<String>,
    },
}

fn build_engine(config: &AppConfig, limit: Option<usize>) -> Result<AnalysisEngine> {
    let source = OkxClient::new(&config.exchange)?;
    let params = IndicatorParams {
        window: config.indicators.window,
        band_width: config.indicators.band_width,
        slope_smoothing: config.indicators.slope_smoothing,
    };
    let mut engine = AnalysisEngine::new(
        Arc::new(source),
        limit.unwrap_or(config.exchange.candle_limit),
    )
    .with_params(params);

    match LlmClient::new(config.llm.clone()) {
        Ok(client) => engine = engine.with_narrator(Arc::new(client)),
        Err(e) => info!("Narrative generation disabled: {}", e),
    }
    Ok(engine)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Analyze {
            symbol,
            narrative,
            tone,
            limit,
        } => {
            let engine = build_engine(&config, limit)?;
            if narrative && !engine.has_narrator() {
                warn!("--narrative needs llm.api_key or OPENAI_API_KEY; skipping narrative");
            }

            match engine
                .analyze(&symbol, AnalysisOptions { narrative, tone })
                .await
            {
                Ok(report) => println!("{}", render_text(&report)),
                Err(e) => {
                    error!("Analysis of {} failed: {}", symbol, e);
                    println!("Error: {e}");
                }
            }
        }
        Commands::Serve { bind } => {
            info!("🚀Starting analysis server...");
            let engine = Arc::new(build_engine(&config, None)?);
            let bind_addr = bind.unwrap_or_else(|| config.server.bind_addr.clone());
            let server = Server::init(engine, &bind_addr)?;

            tokio::select! {
                res = server.run() => {
                    if let Err(e) = res {
                        error!("HTTP server failed: {:?}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal, shutting down");
                }
            }
        }
    }

    Ok(())
}
