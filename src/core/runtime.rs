//! Forecast runtime: one full fetch -> forecast -> publish cycle

use crate::config::{ConfigError, ForecastConfig};
use crate::db::{HistoryError, HistoryStore};
use crate::forecast::ForecastEngine;
use crate::metrics::Metrics;
use crate::report::{ForecastReport, ReportError};
use crate::sources::SourceRegistry;
use chrono::{DateTime, Utc};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Output sink failures. Data problems never surface here.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Process-level settings for the runtime, read from the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeConfig {
    /// 0 disables periodic runs
    pub interval_seconds: u64,
    pub report_path: Option<PathBuf>,
    pub history_path: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let path_var = |key: &str| {
            env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };
        Self {
            interval_seconds: env::var("FORECAST_INTERVAL_SECONDS")
                .ok()
                .and_then(|i| i.parse().ok())
                .unwrap_or(0),
            report_path: path_var("REPORT_PATH"),
            history_path: path_var("HISTORY_PATH"),
        }
    }
}

/// Latest published report, shared with the HTTP layer.
pub type LatestReport = Arc<RwLock<Option<ForecastReport>>>;

pub struct ForecastRuntime {
    config: Arc<ForecastConfig>,
    engine: ForecastEngine,
    registry: SourceRegistry,
    history: Option<Arc<HistoryStore>>,
    metrics: Option<Arc<Metrics>>,
    report_path: Option<PathBuf>,
    latest: LatestReport,
}

impl ForecastRuntime {
    /// Binds the engine to the active profile; fails only on invalid configuration.
    pub fn new(config: ForecastConfig, registry: SourceRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = ForecastEngine::new(config.active()?.clone());
        Ok(Self {
            config: Arc::new(config),
            engine,
            registry,
            history: None,
            metrics: None,
            report_path: None,
            latest: Arc::new(RwLock::new(None)),
        })
    }

    pub fn with_history(mut self, history: Arc<HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.registry = self.registry.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn with_report_path(mut self, path: PathBuf) -> Self {
        self.report_path = Some(path);
        self
    }

    pub fn config(&self) -> Arc<ForecastConfig> {
        self.config.clone()
    }

    pub fn latest(&self) -> LatestReport {
        self.latest.clone()
    }

    pub fn history(&self) -> Option<Arc<HistoryStore>> {
        self.history.clone()
    }

    /// Run one cycle. Fetch failures degrade the forecast; only sink errors fail the run,
    /// and a failed run leaves the previously published report in place.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<ForecastReport, RuntimeError> {
        let started = Instant::now();
        let snapshot = self.registry.collect(&self.config.series).await;
        let result = self.engine.forecast(&snapshot, now);

        let report = ForecastReport::from_result(&result);

        // latest is published only after every sink succeeded
        if let Some(path) = &self.report_path {
            report.write_to(path).await.map_err(|e| {
                error!(error = %e, "Failed to write forecast report");
                e
            })?;
        }
        if let Some(history) = &self.history {
            history.append(&report).await.map_err(|e| {
                error!(error = %e, "Failed to append forecast history");
                e
            })?;
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_forecast(&result);
        }
        {
            let mut latest = self.latest.write().await;
            *latest = Some(report.clone());
        }

        info!(
            profile = %report.profile,
            forecast = report.forecast_summary.forecasted_unemployment,
            confidence = report.forecast_summary.confidence_level,
            fallbacks = report.data_quality.fallback_count,
            duration_ms = started.elapsed().as_millis() as u64,
            "Forecast run completed"
        );
        Ok(report)
    }
}
