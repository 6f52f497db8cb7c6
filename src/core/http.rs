//! HTTP endpoint server using Axum

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use crate::config::ForecastConfig;
use crate::core::runtime::LatestReport;
use crate::db::HistoryStore;
use crate::forecast::{ForecastEngine, IndicatorSnapshot};
use crate::metrics::Metrics;
use crate::models::{ClampBand, Indicator, Source};
use crate::report::ForecastReport;

const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 500;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub config: Arc<ForecastConfig>,
    pub latest: LatestReport,
    pub history: Option<Arc<HistoryStore>>,
}

impl AppState {
    pub fn new(config: Arc<ForecastConfig>, metrics: Arc<Metrics>) -> Self {
        Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics,
            start_time: Arc::new(Instant::now()),
            config,
            latest: Arc::new(RwLock::new(None)),
            history: None,
        }
    }

    pub fn with_latest(mut self, latest: LatestReport) -> Self {
        self.latest = latest;
        self
    }

    pub fn with_history(mut self, history: Option<Arc<HistoryStore>>) -> Self {
        self.history = history;
        self
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "laborcast-forecast",
        "active_profile": state.config.active_profile,
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Latest published forecast
async fn latest_forecast(
    State(state): State<AppState>,
) -> Result<Json<ForecastReport>, StatusCode> {
    let latest = state.latest.read().await;
    latest.clone().map(Json).ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn forecast_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<ForecastReport>>, StatusCode> {
    let history = state
        .history
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    let reports = history.recent(limit).await.map_err(|e| {
        error!(error = %e, "Failed to read forecast history");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(reports))
}

#[derive(Debug, Serialize)]
struct ProfileSummary {
    name: String,
    active: bool,
    clamp: ClampBand,
    base_confidence: f64,
    confidence_cap: f64,
    rules: Vec<String>,
}

async fn list_profiles(State(state): State<AppState>) -> Json<Vec<ProfileSummary>> {
    let profiles = state
        .config
        .profiles
        .iter()
        .map(|p| ProfileSummary {
            name: p.name.clone(),
            active: p.name == state.config.active_profile,
            clamp: p.clamp,
            base_confidence: p.confidence.base,
            confidence_cap: p.confidence.cap,
            rules: p.rules.iter().map(|r| r.indicator_name.clone()).collect(),
        })
        .collect();
    Json(profiles)
}

#[derive(Debug, Deserialize)]
struct SuppliedReading {
    value: f64,
    #[serde(default)]
    is_fallback: bool,
    timestamp: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct EvaluateRequest {
    profile: Option<String>,
    #[serde(default)]
    indicators: HashMap<String, SuppliedReading>,
}

/// Forecast from a caller-supplied snapshot without touching the upstream sources.
async fn evaluate_forecast(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<ForecastReport>, StatusCode> {
    let profile_name = request
        .profile
        .as_deref()
        .unwrap_or(&state.config.active_profile);
    let profile = state
        .config
        .profile(profile_name)
        .ok_or(StatusCode::NOT_FOUND)?
        .clone();

    let now = Utc::now();
    let mut snapshot = IndicatorSnapshot::new();
    for (name, reading) in request.indicators {
        let mut indicator = Indicator::new(
            name,
            reading.value,
            Source::Synthetic,
            reading.timestamp.unwrap_or_else(|| now.date_naive()),
        );
        indicator.is_fallback = reading.is_fallback;
        snapshot.insert(indicator);
    }

    let result = ForecastEngine::new(profile).forecast(&snapshot, now);
    Ok(Json(ForecastReport::from_result(&result)))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/forecast", get(latest_forecast))
        .route("/api/forecast/history", get(forecast_history))
        .route("/api/forecast/evaluate", post(evaluate_forecast))
        .route("/api/profiles", get(list_profiles))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
