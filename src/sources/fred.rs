//! FRED (St. Louis Fed) series observations adapter

use crate::models::{Indicator, SeriesSpec, Source};
use crate::sources::error::FetchError;
use crate::sources::http::{fetch_json, parse_value};
use crate::sources::IndicatorSource;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

const OBSERVATIONS_PATH: &str = "/fred/series/observations";
const OBSERVATION_LIMIT: &str = "10";
/// FRED's marker for a missing observation.
const MISSING: &str = ".";

#[derive(Debug, Deserialize)]
struct FredResponse {
    #[serde(default)]
    observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

pub struct FredSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: usize,
}

impl FredSource {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: 2,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[async_trait]
impl IndicatorSource for FredSource {
    fn source(&self) -> Source {
        Source::Fred
    }

    async fn fetch(&self, spec: &SeriesSpec) -> Result<Indicator, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::MissingApiKey(Source::Fred))?;
        let url = format!("{}{}", self.base_url, OBSERVATIONS_PATH);

        let mut query: Vec<(&str, &str)> = vec![
            ("series_id", spec.series_id.as_str()),
            ("api_key", api_key),
            ("file_type", "json"),
            ("sort_order", "desc"),
            ("limit", OBSERVATION_LIMIT),
        ];
        if let Some(units) = spec.transform.as_deref() {
            query.push(("units", units));
        }

        debug!(series = %spec.series_id, "FRED: requesting series {}", spec.series_id);
        let response: FredResponse = fetch_json(Source::Fred, self.max_retries, || {
            self.client.get(&url).query(&query)
        })
        .await?;

        let observation = response
            .observations
            .iter()
            .find(|obs| obs.value.trim() != MISSING)
            .ok_or_else(|| FetchError::NoObservations {
                series_id: spec.series_id.clone(),
            })?;

        let value = parse_value(&spec.series_id, &observation.value)?;
        let timestamp = NaiveDate::parse_from_str(observation.date.trim(), "%Y-%m-%d").map_err(
            |_| FetchError::InvalidPeriod {
                series_id: spec.series_id.clone(),
                value: observation.date.clone(),
            },
        )?;

        Ok(Indicator::new(spec.indicator.clone(), value, Source::Fred, timestamp)
            .with_unit(spec.unit)
            .with_series_id(spec.series_id.clone()))
    }
}
