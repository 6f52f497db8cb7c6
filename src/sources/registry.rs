//! Adapter registry and concurrent snapshot collection

use crate::config::{ApiKeys, SourceSettings};
use crate::forecast::snapshot::IndicatorSnapshot;
use crate::metrics::Metrics;
use crate::models::{Indicator, SeriesSpec, Source};
use crate::sources::bea::BeaSource;
use crate::sources::bls::BlsSource;
use crate::sources::error::FetchError;
use crate::sources::fred::FredSource;
use crate::sources::http::build_client;
use crate::sources::trade::TradeCsvSource;
use crate::sources::IndicatorSource;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One adapter per `Source`.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    adapters: HashMap<Source, Arc<dyn IndicatorSource + Send + Sync>>,
    metrics: Option<Arc<Metrics>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard adapter set: BLS, FRED, BEA, and the trade CSV when a path is configured.
    pub fn from_settings(settings: &SourceSettings, keys: &ApiKeys) -> Result<Self, reqwest::Error> {
        let client = build_client(settings.timeout_secs)?;

        let mut registry = Self::new()
            .with_source(
                BlsSource::new(client.clone(), &settings.bls_base_url, keys.bls.clone())
                    .with_lookback_years(settings.lookback_years)
                    .with_max_retries(settings.max_retries),
            )
            .with_source(
                FredSource::new(client.clone(), &settings.fred_base_url, keys.fred.clone())
                    .with_max_retries(settings.max_retries),
            )
            .with_source(
                BeaSource::new(client, &settings.bea_base_url, keys.bea.clone())
                    .with_lookback_years(settings.lookback_years)
                    .with_max_retries(settings.max_retries),
            );

        if let Some(path) = &settings.trade_csv {
            registry = registry.with_source(TradeCsvSource::new(path.clone()));
        } else {
            debug!("No trade CSV configured, trade indicators will use fallbacks");
        }

        Ok(registry)
    }

    pub fn with_source<S>(mut self, source: S) -> Self
    where
        S: IndicatorSource + Send + Sync + 'static,
    {
        self.register(Arc::new(source));
        self
    }

    pub fn register(&mut self, source: Arc<dyn IndicatorSource + Send + Sync>) {
        self.adapters.insert(source.source(), source);
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.adapters.keys().copied().collect();
        sources.sort_by_key(|s| s.to_string());
        sources
    }

    pub async fn fetch(&self, spec: &SeriesSpec) -> Result<Indicator, FetchError> {
        let adapter = self
            .adapters
            .get(&spec.source)
            .ok_or(FetchError::UnsupportedSource(spec.source))?;
        adapter.fetch(spec).await
    }

    /// Fetch every series concurrently. Results keep the order of `series`.
    pub async fn fetch_all(&self, series: &[SeriesSpec]) -> Vec<(String, Result<Indicator, FetchError>)> {
        let started = Instant::now();
        let results = join_all(series.iter().map(|spec| async move {
            let result = self.fetch(spec).await;
            if let Err(e) = &result {
                warn!(
                    indicator = %spec.indicator,
                    source = %spec.source,
                    series = %spec.series_id,
                    error = %e,
                    "Failed to fetch {} from {}",
                    spec.indicator,
                    spec.source
                );
                if let Some(metrics) = &self.metrics {
                    let label = spec.source.to_string();
                    metrics
                        .fetch_failures_total
                        .with_label_values(&[label.as_str()])
                        .inc();
                }
            }
            (spec.indicator.clone(), result)
        }))
        .await;

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(
            series = series.len(),
            failed = failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "Fetched {} series ({} failed)",
            series.len(),
            failed
        );
        results
    }

    pub async fn collect(&self, series: &[SeriesSpec]) -> IndicatorSnapshot {
        IndicatorSnapshot::from_results(self.fetch_all(series).await)
    }
}
