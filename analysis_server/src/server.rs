use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use log::{error, info};
use market_data::FetchError;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;

use crate::engine::{AnalysisEngine, AnalysisOptions};
use crate::misc::AnalysisReport;
use crate::prompts::Tone;

/// Shared application state: the engine plus the latest report per pair.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<AnalysisEngine>,
    latest_reports: Arc<RwLock<HashMap<String, AnalysisReport>>>,
}

impl AppState {
    pub fn new(engine: Arc<AnalysisEngine>) -> Self {
        Self {
            engine,
            latest_reports: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    #[serde(default)]
    pub narrative: bool,
    #[serde(default)]
    pub tone: Tone,
}

#[derive(Debug)]
pub struct ApiError(pub FetchError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FetchError::SymbolNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// GET /analysis/{symbol} runs a fresh analysis.
pub async fn run_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let options = AnalysisOptions {
        narrative: query.narrative,
        tone: query.tone,
    };

    let report = state.engine.analyze(&symbol, options).await.map_err(|e| {
        error!("Analysis of {} failed: {}", symbol, e);
        ApiError(e)
    })?;

    state
        .latest_reports
        .write()
        .insert(report.symbol.clone(), report.clone());
    Ok(Json(report))
}

/// GET /analysis/{symbol}/latest returns the last report without refetching.
pub async fn latest_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    let reports = state.latest_reports.read();
    match reports.get(&symbol.trim().to_uppercase()) {
        Some(report) => (StatusCode::OK, Json(json!(report))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no analysis of {symbol} yet") })),
        ),
    }
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analysis/{symbol}", get(run_analysis))
        .route("/analysis/{symbol}/latest", get(latest_analysis))
        .with_state(state)
}

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub fn init(engine: Arc<AnalysisEngine>, bind_addr: &str) -> Result<Self> {
        Ok(Self {
            state: AppState::new(engine),
            addr: bind_addr.parse()?,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let app = router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("HTTP server running on {}", self.addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
