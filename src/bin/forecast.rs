//! One-shot forecast run
//!
//! Fetches every configured series, computes the forecast with the active
//! profile, prints the JSON report to stdout and writes it to REPORT_PATH
//! (default `unemployment_forecast.json`). Appends to HISTORY_PATH when set.

use dotenvy::dotenv;
use laborcast::config::{ApiKeys, ForecastConfig};
use laborcast::core::runtime::{ForecastRuntime, RuntimeConfig};
use laborcast::db::HistoryStore;
use laborcast::logging::{self, LogTarget};
use laborcast::sources::SourceRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEFAULT_REPORT_PATH: &str = "unemployment_forecast.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging_to(LogTarget::Stderr);

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ForecastConfig::load(config_path.as_deref())?;
    let runtime_config = RuntimeConfig::from_env();

    info!(profile = %config.active_profile, "Running one-shot forecast");

    let registry = SourceRegistry::from_settings(&config.sources, &ApiKeys::from_env())?;
    let report_path = runtime_config
        .report_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH));

    let mut runtime = ForecastRuntime::new(config, registry)?.with_report_path(report_path);
    if let Some(path) = runtime_config.history_path {
        runtime = runtime.with_history(Arc::new(HistoryStore::open(path).await?));
    }

    let report = runtime.run_once(chrono::Utc::now()).await?;
    println!("{}", report.to_json_pretty()?);
    Ok(())
}
