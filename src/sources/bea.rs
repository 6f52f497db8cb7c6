//! Bureau of Economic Analysis NIPA table adapter
//!
//! Series ids take the form `TABLE:LINE`, e.g. `T10101:1` for real GDP growth.

use crate::models::{Indicator, SeriesSpec, Source};
use crate::sources::error::FetchError;
use crate::sources::http::{fetch_json, month_start, parse_value};
use crate::sources::IndicatorSource;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

const DATA_PATH: &str = "/api/data";

#[derive(Debug, Deserialize)]
struct BeaEnvelope {
    #[serde(rename = "BEAAPI")]
    beaapi: BeaApi,
}

#[derive(Debug, Deserialize)]
struct BeaApi {
    #[serde(rename = "Results")]
    results: Option<BeaResults>,
    #[serde(rename = "Error")]
    error: Option<BeaError>,
}

#[derive(Debug, Default, Deserialize)]
struct BeaResults {
    #[serde(rename = "Data", default)]
    data: Vec<BeaRow>,
    #[serde(rename = "Error")]
    error: Option<BeaError>,
}

#[derive(Debug, Deserialize)]
struct BeaError {
    #[serde(rename = "APIErrorDescription", default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct BeaRow {
    #[serde(rename = "LineNumber")]
    line_number: String,
    #[serde(rename = "TimePeriod")]
    time_period: String,
    #[serde(rename = "DataValue")]
    data_value: String,
}

pub struct BeaSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    lookback_years: i32,
    max_retries: usize,
}

impl BeaSource {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            lookback_years: 2,
            max_retries: 2,
        }
    }

    pub fn with_lookback_years(mut self, years: i32) -> Self {
        self.lookback_years = years.max(1);
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// `2024Q2` -> 2024-04-01
fn quarter_start(period: &str) -> Option<NaiveDate> {
    let (year, quarter) = period.trim().split_once('Q')?;
    let year: i32 = year.parse().ok()?;
    let quarter: u32 = quarter.parse().ok()?;
    if !(1..=4).contains(&quarter) {
        return None;
    }
    month_start(year, (quarter - 1) * 3 + 1)
}

fn split_series_id(series_id: &str) -> (&str, &str) {
    series_id.split_once(':').unwrap_or((series_id, "1"))
}

#[async_trait]
impl IndicatorSource for BeaSource {
    fn source(&self) -> Source {
        Source::Bea
    }

    async fn fetch(&self, spec: &SeriesSpec) -> Result<Indicator, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::MissingApiKey(Source::Bea))?;
        let (table, line) = split_series_id(&spec.series_id);
        let end_year = Utc::now().year();
        let years = ((end_year - self.lookback_years + 1)..=end_year)
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}{}", self.base_url, DATA_PATH);
        let query = [
            ("UserID", api_key),
            ("method", "GetData"),
            ("DataSetName", "NIPA"),
            ("TableName", table),
            ("Frequency", "Q"),
            ("Year", years.as_str()),
            ("ResultFormat", "JSON"),
        ];

        debug!(table = %table, line = %line, "BEA: requesting table {} line {}", table, line);
        let envelope: BeaEnvelope = fetch_json(Source::Bea, self.max_retries, || {
            self.client.get(&url).query(&query)
        })
        .await?;

        let BeaApi { results, error } = envelope.beaapi;
        let results = results.unwrap_or_default();
        if let Some(error) = error.or(results.error) {
            return Err(FetchError::Api {
                source_kind: Source::Bea,
                message: error.description,
            });
        }

        let latest = results
            .data
            .into_iter()
            .filter(|row| row.line_number.trim() == line)
            .filter_map(|row| quarter_start(&row.time_period).map(|date| (date, row)))
            .max_by_key(|(date, _)| *date)
            .ok_or_else(|| FetchError::NoObservations {
                series_id: spec.series_id.clone(),
            })?;

        let (timestamp, row) = latest;
        let value = parse_value(&spec.series_id, &row.data_value)?;

        Ok(Indicator::new(spec.indicator.clone(), value, Source::Bea, timestamp)
            .with_unit(spec.unit)
            .with_series_id(spec.series_id.clone()))
    }
}
