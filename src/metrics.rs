//! Prometheus metrics for the API server and forecast runs

use crate::models::ForecastResult;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: Gauge,
    pub forecast_runs_total: IntCounter,
    pub forecast_rate: Gauge,
    pub forecast_confidence: Gauge,
    pub forecast_fallback_indicators: Gauge,
    pub fetch_failures_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            Gauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let forecast_runs_total =
            IntCounter::new("forecast_runs_total", "Completed forecast runs")?;
        let forecast_rate =
            Gauge::new("forecast_rate", "Latest forecasted unemployment rate (percent)")?;
        let forecast_confidence =
            Gauge::new("forecast_confidence", "Latest heuristic confidence score (0-100)")?;
        let forecast_fallback_indicators = Gauge::new(
            "forecast_fallback_indicators",
            "Indicators substituted by fallback values in the latest run",
        )?;
        let fetch_failures_total = IntCounterVec::new(
            Opts::new("fetch_failures_total", "Indicator fetch failures by source"),
            &["source"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(forecast_runs_total.clone()))?;
        registry.register(Box::new(forecast_rate.clone()))?;
        registry.register(Box::new(forecast_confidence.clone()))?;
        registry.register(Box::new(forecast_fallback_indicators.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            forecast_runs_total,
            forecast_rate,
            forecast_confidence,
            forecast_fallback_indicators,
            fetch_failures_total,
        })
    }

    pub fn record_forecast(&self, result: &ForecastResult) {
        self.forecast_runs_total.inc();
        self.forecast_rate.set(result.forecast_rate);
        self.forecast_confidence.set(result.confidence);
        self.forecast_fallback_indicators
            .set(result.fallback_count as f64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
