//! Bureau of Labor Statistics public API v2 adapter

use crate::models::{Indicator, SeriesSpec, Source};
use crate::sources::error::FetchError;
use crate::sources::http::{fetch_json, month_start, parse_value};
use crate::sources::IndicatorSource;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

const TIMESERIES_PATH: &str = "/publicAPI/v2/timeseries/data/";

#[derive(Debug, Serialize)]
struct BlsRequest<'a> {
    seriesid: Vec<&'a str>,
    startyear: String,
    endyear: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct BlsResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results")]
    results: Option<BlsResults>,
}

#[derive(Debug, Deserialize)]
struct BlsResults {
    #[serde(default)]
    series: Vec<BlsSeries>,
}

#[derive(Debug, Deserialize)]
struct BlsSeries {
    #[serde(rename = "seriesID")]
    series_id: String,
    #[serde(default)]
    data: Vec<BlsObservation>,
}

#[derive(Debug, Deserialize)]
struct BlsObservation {
    year: String,
    period: String,
    value: String,
}

pub struct BlsSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    lookback_years: i32,
    max_retries: usize,
}

impl BlsSource {
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

/// `M01`..`M12` monthly, `Q01`..`Q04` quarterly. `M13` (annual average) is not a period start.
fn period_start(year: &str, period: &str) -> Option<NaiveDate> {
    let year: i32 = year.trim().parse().ok()?;
    let mut chars = period.trim().chars();
    let kind = chars.next()?;
    let number: u32 = chars.as_str().parse().ok()?;
    match kind {
        'M' if (1..=12).contains(&number) => month_start(year, number),
        'Q' if (1..=4).contains(&number) => month_start(year, (number - 1) * 3 + 1),
        _ => None,
    }
}

#[async_trait]
impl IndicatorSource for BlsSource {
    fn source(&self) -> Source {
        Source::Bls
    }

    async fn fetch(&self, spec: &SeriesSpec) -> Result<Indicator, FetchError> {
        let end_year = Utc::now().year();
        let body = BlsRequest {
            seriesid: vec![spec.series_id.as_str()],
            startyear: (end_year - self.lookback_years + 1).to_string(),
            endyear: end_year.to_string(),
            registrationkey: self.api_key.as_deref(),
        };
        let url = format!("{}{}", self.base_url, TIMESERIES_PATH);

        debug!(series = %spec.series_id, "BLS: requesting series {}", spec.series_id);
        let response: BlsResponse = fetch_json(Source::Bls, self.max_retries, || {
            self.client.post(&url).json(&body)
        })
        .await?;

        if response.status != "REQUEST_SUCCEEDED" {
            return Err(FetchError::Api {
                source_kind: Source::Bls,
                message: if response.message.is_empty() {
                    response.status
                } else {
                    response.message.join("; ")
                },
            });
        }

        let series = response
            .results
            .into_iter()
            .flat_map(|r| r.series)
            .find(|s| s.series_id == spec.series_id)
            .ok_or_else(|| FetchError::NoObservations {
                series_id: spec.series_id.clone(),
            })?;

        // BLS lists the newest observation first; "-" marks an unavailable value.
        let (timestamp, value) = series
            .data
            .iter()
            .filter(|obs| obs.value.trim() != "-")
            .find_map(|obs| period_start(&obs.year, &obs.period).map(|date| (date, obs)))
            .map(|(date, obs)| parse_value(&spec.series_id, &obs.value).map(|v| (date, v)))
            .ok_or_else(|| FetchError::NoObservations {
                series_id: spec.series_id.clone(),
            })??;

        Ok(Indicator::new(spec.indicator.clone(), value, Source::Bls, timestamp)
            .with_unit(spec.unit)
            .with_series_id(spec.series_id.clone()))
    }
}
