pub mod config;
pub mod error;
pub mod fetcher;
pub mod logger;
pub mod misc;

pub use config::AppConfig;
pub use error::FetchError;
pub use fetcher::{MarketDataSource, OkxClient};
pub use misc::{Candle, TickerSnapshot, Timeframe};
