//! Laborcast API Server
//!
//! HTTP API with health check, metrics and forecast endpoints. When
//! FORECAST_INTERVAL_SECONDS > 0 it also runs forecasts on a cron schedule.

use dotenvy::dotenv;
use laborcast::config::{ApiKeys, ForecastConfig};
use laborcast::core::http::{start_server, AppState};
use laborcast::core::runtime::{ForecastRuntime, RuntimeConfig};
use laborcast::core::scheduler::ForecastScheduler;
use laborcast::db::HistoryStore;
use laborcast::logging;
use laborcast::metrics::Metrics;
use laborcast::sources::SourceRegistry;
use std::env;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let env = laborcast::config::get_environment();
    info!("Starting Laborcast API Server");
    info!(environment = %env, "Environment");

    let config = ForecastConfig::load(None)?;
    let runtime_config = RuntimeConfig::from_env();
    info!(
        profile = %config.active_profile,
        series = config.series.len(),
        "Active profile: {}",
        config.active_profile
    );

    let metrics = Arc::new(Metrics::new()?);
    let keys = ApiKeys::from_env();
    info!(keys = ?keys, "API keys");
    let registry = SourceRegistry::from_settings(&config.sources, &keys)?;

    let history = match &runtime_config.history_path {
        Some(path) => Some(Arc::new(HistoryStore::open(path.clone()).await?)),
        None => {
            warn!("HISTORY_PATH not set - /api/forecast/history will be unavailable");
            None
        }
    };

    let mut runtime = ForecastRuntime::new(config, registry)?.with_metrics(metrics.clone());
    if let Some(history) = &history {
        runtime = runtime.with_history(history.clone());
    }
    if let Some(path) = &runtime_config.report_path {
        runtime = runtime.with_report_path(path.clone());
    }
    let runtime = Arc::new(runtime);

    let state = AppState::new(runtime.config(), metrics)
        .with_latest(runtime.latest())
        .with_history(history);

    let scheduler = if runtime_config.interval_seconds > 0 {
        let scheduler = ForecastScheduler::new(runtime.clone(), runtime_config.interval_seconds)
            .map_err(|e| format!("Failed to create scheduler: {}", e))?;
        // publish one forecast immediately instead of waiting for the first tick
        if let Err(e) = runtime.run_once(chrono::Utc::now()).await {
            error!(error = %e, "Initial forecast run failed");
        }
        scheduler.start().await;
        Some(scheduler)
    } else {
        info!("FORECAST_INTERVAL_SECONDS is 0 - scheduled forecasts disabled");
        None
    };

    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, state).await {
            error!(error = %e, "HTTP server error");
        }
    });

    // Graceful shutdown
    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
            if let Some(scheduler) = &scheduler {
                scheduler.stop().await;
            }
            info!("API server stopped");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
