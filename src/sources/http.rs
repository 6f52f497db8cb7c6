//! Shared HTTP plumbing for the REST adapters

use crate::models::Source;
use crate::sources::error::FetchError;
use backon::{ExponentialBuilder, Retryable};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .user_agent(concat!("laborcast/", env!("CARGO_PKG_VERSION")))
        .build()
}

fn retry_policy(max_retries: usize) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(200))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(max_retries)
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout()
        || error.is_connect()
        || error
            .status()
            .map(|s| s.is_server_error() || s.as_u16() == 429)
            .unwrap_or(false)
}

/// Send the request built by `request`, retrying transient failures, and decode JSON.
pub async fn fetch_json<T, F>(
    source_kind: Source,
    max_retries: usize,
    request: F,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = (|| async { request().send().await.and_then(|r| r.error_for_status()) })
        .retry(retry_policy(max_retries))
        .when(is_transient)
        .notify(|e: &reqwest::Error, delay: Duration| {
            warn!(
                source = %source_kind,
                error = %e,
                delay_ms = delay.as_millis() as u64,
                "Transient {} failure, retrying",
                source_kind
            );
        })
        .await
        .map_err(|e| FetchError::from_reqwest(source_kind, e))?;

    response
        .json::<T>()
        .await
        .map_err(|e| FetchError::from_reqwest(source_kind, e))
}

/// Parse a numeric string as published by the statistical agencies ("1,234.5").
pub fn parse_value(series_id: &str, raw: &str) -> Result<f64, FetchError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::NonNumeric {
            series_id: series_id.to_string(),
            value: raw.to_string(),
        })
}

/// First day of the given month, or `None` for an out-of-range month.
pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}
