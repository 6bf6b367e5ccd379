use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "analysis.toml";
pub const ENV_PREFIX: &str = "CRYPTO_ANALYSIS";

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub candle_limit: usize,
    pub quote_currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// Moving-average window, Bollinger multiplier and slope smoothing.
#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    pub window: usize,
    pub band_width: f64,
    pub slope_smoothing: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub indicators: IndicatorConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Loads `.env`, then defaults < `analysis.toml` < `CRYPTO_ANALYSIS__*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(DEFAULT_CONFIG_FILE)
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        // a missing .env is fine
        let _ = dotenvy::dotenv();

        let cfg = defaults()?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: AppConfig = cfg.try_deserialize()?;
        if app.llm.api_key.is_none() {
            app.llm.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        Ok(app)
    }

    /// Defaults overlaid with an inline TOML document. Ignores the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let cfg = defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        cfg.try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("exchange.base_url", "https://www.okx.com")?
        .set_default("exchange.timeout_secs", 10u64)?
        .set_default("exchange.candle_limit", 200u64)?
        .set_default("exchange.quote_currency", "USDT")?
        .set_default("indicators.window", 20u64)?
        .set_default("indicators.band_width", 2.0)?
        .set_default("indicators.slope_smoothing", 5u64)?
        .set_default("llm.base_url", "https://api.openai.com/v1")?
        .set_default("llm.model", "gpt-4o-mini")?
        .set_default("llm.temperature", 0.7)?
        .set_default("llm.max_tokens", 1500u64)?
        .set_default("llm.timeout_secs", 60u64)?
        .set_default("server.bind_addr", "0.0.0.0:3000")
}
