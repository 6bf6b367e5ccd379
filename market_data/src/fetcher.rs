use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ExchangeConfig;
use crate::error::FetchError;
use crate::misc::{Candle, TickerSnapshot, Timeframe, validate_candle};

/// Largest page the OKX candles endpoint serves.
pub const MAX_CANDLE_LIMIT: usize = 300;

const INSTRUMENT_NOT_FOUND: &str = "51001";

/// Where candles and tickers come from.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Candles for `symbol` quoted in the source's quote currency, oldest first.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError>;

    /// 24h statistics for every spot pair the exchange lists.
    async fn fetch_tickers(&self) -> Result<Vec<TickerSnapshot>, FetchError>;

    async fn symbol_exists(&self, symbol: &str) -> Result<bool, FetchError>;

    fn quote_currency(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct OkxResponse<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxTicker {
    pub inst_id: String,
    pub last: String,
    pub open24h: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxInstrument {
    inst_id: String,
    #[serde(default)]
    state: String,
}

/// Public OKX v5 REST client.
#[derive(Debug, Clone)]
pub struct OkxClient {
    http: Client,
    base_url: String,
    quote: String,
}

impl OkxClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            quote: config.quote_currency.to_uppercase(),
        })
    }

    pub fn inst_id(&self, symbol: &str) -> String {
        format!("{}-{}", symbol.trim().to_uppercase(), self.quote)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: OkxResponse<T> = serde_json::from_str(&text).map_err(|e| {
            warn!("Unparseable response from {} (HTTP {})", path, status);
            FetchError::SerdeJsonError(e)
        })?;

        if body.code != "0" {
            return Err(FetchError::ApiError {
                code: body.code,
                message: body.msg,
            });
        }
        Ok(body.data)
    }
}

#[async_trait]
impl MarketDataSource for OkxClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError> {
        let inst_id = self.inst_id(symbol);
        if limit > MAX_CANDLE_LIMIT {
            warn!(
                "Requested {} candles, OKX serves at most {}",
                limit, MAX_CANDLE_LIMIT
            );
        }
        let limit = limit.clamp(1, MAX_CANDLE_LIMIT).to_string();

        let rows: Vec<Vec<String>> = self
            .get(
                "/api/v5/market/candles",
                &[
                    ("instId", inst_id.as_str()),
                    ("bar", timeframe.okx_bar()),
                    ("limit", limit.as_str()),
                ],
            )
            .await
            .map_err(|e| match e {
                FetchError::ApiError { code, .. } if code == INSTRUMENT_NOT_FOUND => {
                    FetchError::SymbolNotFound(inst_id.clone())
                }
                other => other,
            })?;

        let candles = parse_candles(&rows)?;
        info!(
            "Fetched {} {} candles for {}",
            candles.len(),
            timeframe,
            inst_id
        );
        Ok(candles)
    }

    async fn fetch_tickers(&self) -> Result<Vec<TickerSnapshot>, FetchError> {
        let tickers: Vec<OkxTicker> = self
            .get("/api/v5/market/tickers", &[("instType", "SPOT")])
            .await?;

        let snapshots = parse_tickers(&tickers)?;
        info!("Fetched {} spot tickers", snapshots.len());
        Ok(snapshots)
    }

    async fn symbol_exists(&self, symbol: &str) -> Result<bool, FetchError> {
        let inst_id = self.inst_id(symbol);
        let result: Result<Vec<OkxInstrument>, FetchError> = self
            .get(
                "/api/v5/public/instruments",
                &[("instType", "SPOT"), ("instId", inst_id.as_str())],
            )
            .await;

        match result {
            Ok(instruments) => Ok(instruments
                .iter()
                .any(|i| i.inst_id == inst_id && i.state != "suspend")),
            Err(FetchError::ApiError { code, .. }) if code == INSTRUMENT_NOT_FOUND => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn quote_currency(&self) -> &str {
        &self.quote
    }
}

fn parse_number(raw: &str, field: &str) -> Result<f64, FetchError> {
    raw.parse::<f64>()
        .map_err(|_| FetchError::Malformed(format!("{field} `{raw}` is not a number")))
}

/// Turns OKX candle rows (`[ts, o, h, l, c, vol, ...]`, newest first) into
/// validated candles ordered oldest first.
pub fn parse_candles(rows: &[Vec<String>]) -> Result<Vec<Candle>, FetchError> {
    let mut candles = Vec::with_capacity(rows.len());

    for row in rows {
        if row.len() < 6 {
            return Err(FetchError::Malformed(format!(
                "candle row has {} fields, expected at least 6",
                row.len()
            )));
        }

        let millis = row[0]
            .parse::<i64>()
            .map_err(|_| FetchError::Malformed(format!("timestamp `{}`", row[0])))?;
        let timestamp = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| FetchError::Malformed(format!("timestamp {millis} out of range")))?;

        let candle = Candle {
            timestamp,
            open: parse_number(&row[1], "open")?,
            high: parse_number(&row[2], "high")?,
            low: parse_number(&row[3], "low")?,
            close: parse_number(&row[4], "close")?,
            volume: parse_number(&row[5], "volume")?,
        };

        if !validate_candle(&candle) {
            return Err(FetchError::Malformed(format!(
                "invalid candle at {}",
                candle.timestamp
            )));
        }
        candles.push(candle);
    }

    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

/// 24h change is `(last - open24h) / open24h * 100`. Pairs without a usable
/// opening price (fresh listings report `0`) carry no change and are skipped.
pub fn parse_tickers(tickers: &[OkxTicker]) -> Result<Vec<TickerSnapshot>, FetchError> {
    let mut snapshots = Vec::with_capacity(tickers.len());

    for ticker in tickers {
        let Some((base, quote)) = ticker.inst_id.split_once('-') else {
            return Err(FetchError::Malformed(format!(
                "instrument id `{}`",
                ticker.inst_id
            )));
        };

        if ticker.last.is_empty() || ticker.open24h.is_empty() {
            debug!("Skipping {} without 24h prices", ticker.inst_id);
            continue;
        }
        let last = parse_number(&ticker.last, "last")?;
        let open = parse_number(&ticker.open24h, "open24h")?;
        if open <= 0.0 {
            debug!("Skipping {} with opening price {}", ticker.inst_id, open);
            continue;
        }

        snapshots.push(TickerSnapshot {
            base: base.to_string(),
            quote: quote.to_string(),
            percent_change_24h: (last - open) / open * 100.0,
        });
    }

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn candles_come_back_oldest_first() {
        let rows = vec![
            row(&["1700000120000", "3", "4", "2", "3.5", "10", "0", "0", "1"]),
            row(&["1700000060000", "2", "3", "1", "3", "12", "0", "0", "1"]),
            row(&["1700000000000", "1", "2", "0.5", "2", "8", "0", "0", "1"]),
        ];

        let candles = parse_candles(&rows).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].close, 2.0);
        assert_eq!(candles[2].close, 3.5);
        assert!(candles.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn short_or_garbled_rows_are_malformed() {
        let short = vec![row(&["1700000000000", "1", "2"])];
        assert!(matches!(parse_candles(&short), Err(FetchError::Malformed(_))));

        let garbled = vec![row(&["1700000000000", "1", "abc", "0.5", "2", "8"])];
        assert!(matches!(parse_candles(&garbled), Err(FetchError::Malformed(_))));

        let negative = vec![row(&["1700000000000", "1", "2", "0.5", "-2", "8"])];
        assert!(matches!(parse_candles(&negative), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn envelope_deserializes_with_error_code() {
        let body = r#"{"code":"51001","msg":"Instrument ID does not exist","data":[]}"#;
        let parsed: OkxResponse<Vec<String>> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.code, "51001");
        assert!(parsed.data.is_empty());
    }

    #[test]
    fn envelope_without_data_holds_records_that_have_no_default() {
        let body = r#"{"code":"51001","msg":"Instrument ID does not exist"}"#;
        let parsed: OkxResponse<OkxInstrument> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.msg, "Instrument ID does not exist");
        assert!(parsed.data.is_empty());

        let body = r#"{"code":"0","data":[{"instId":"BTC-USDT","state":"live"}]}"#;
        let parsed: OkxResponse<OkxInstrument> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].inst_id, "BTC-USDT");
        assert_eq!(parsed.data[0].state, "live");
    }

    #[test]
    fn ticker_change_is_relative_to_24h_open() {
        let body = r#"{"code":"0","msg":"","data":[
            {"instType":"SPOT","instId":"BTC-USDT","last":"110","open24h":"100"},
            {"instType":"SPOT","instId":"ETH-BTC","last":"0.05","open24h":"0.05"},
            {"instType":"SPOT","instId":"NEW-USDT","last":"1","open24h":"0"}
        ]}"#;
        let parsed: OkxResponse<OkxTicker> = serde_json::from_str(body).unwrap();
        let snapshots = parse_tickers(&parsed.data).unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].base, "BTC");
        assert_eq!(snapshots[0].quote, "USDT");
        assert!((snapshots[0].percent_change_24h - 10.0).abs() < 1e-9);
        assert_eq!(snapshots[1].percent_change_24h, 0.0);
    }

    #[test]
    fn inst_id_is_upper_cased() {
        let cfg = ExchangeConfig {
            base_url: "https://www.okx.com/".into(),
            timeout_secs: 5,
            candle_limit: 200,
            quote_currency: "usdt".into(),
        };
        let client = OkxClient::new(&cfg).unwrap();
        assert_eq!(client.inst_id(" pepe "), "PEPE-USDT");
        assert_eq!(client.quote_currency(), "USDT");
    }
}
