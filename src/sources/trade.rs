//! Prediction-market "trade" sentiment from a local CSV export
//!
//! Expected columns: `date,market,sentiment,volume`, sentiment in `[-1, 1]`.
//! The indicator is the volume-weighted mean sentiment of the most recent date.

use crate::models::{Indicator, SeriesSpec, Source};
use crate::sources::error::FetchError;
use crate::sources::IndicatorSource;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Matches every market.
pub const ALL_MARKETS: &str = "*";

#[derive(Debug, Clone, Deserialize)]
pub struct TradeRow {
    pub date: NaiveDate,
    pub market: String,
    pub sentiment: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Aggregate sentiment for one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeSentiment {
    pub date: NaiveDate,
    pub sentiment: f64,
    pub markets: usize,
}

fn matches_market(market: &str, filter: &str) -> bool {
    filter == ALL_MARKETS || market.starts_with(filter)
}

/// Reduce CSV rows to the latest date's sentiment. Rows with non-finite numbers are ignored.
pub fn parse_trade_sentiment<R: Read>(
    reader: R,
    market_filter: &str,
) -> Result<Option<TradeSentiment>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows: Vec<TradeRow> = Vec::new();
    for row in csv_reader.deserialize::<TradeRow>() {
        let row = row?;
        if row.sentiment.is_finite()
            && row.volume.is_finite()
            && matches_market(&row.market, market_filter)
        {
            rows.push(row);
        }
    }

    let latest = match rows.iter().map(|r| r.date).max() {
        Some(date) => date,
        None => return Ok(None),
    };
    let current: Vec<&TradeRow> = rows.iter().filter(|r| r.date == latest).collect();

    let total_volume: f64 = current.iter().map(|r| r.volume.max(0.0)).sum();
    let sentiment = if total_volume > 0.0 {
        current
            .iter()
            .map(|r| r.sentiment.clamp(-1.0, 1.0) * r.volume.max(0.0))
            .sum::<f64>()
            / total_volume
    } else {
        current.iter().map(|r| r.sentiment.clamp(-1.0, 1.0)).sum::<f64>() / current.len() as f64
    };

    Ok(Some(TradeSentiment {
        date: latest,
        sentiment,
        markets: current.len(),
    }))
}

pub struct TradeCsvSource {
    path: PathBuf,
}

impl TradeCsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl IndicatorSource for TradeCsvSource {
    fn source(&self) -> Source {
        Source::Trade
    }

    async fn fetch(&self, spec: &SeriesSpec) -> Result<Indicator, FetchError> {
        let path = self.path.display().to_string();
        let bytes = tokio::fs::read(&self.path).await.map_err(|error| FetchError::Io {
            path: path.clone(),
            error,
        })?;

        let aggregate = parse_trade_sentiment(bytes.as_slice(), &spec.series_id)
            .map_err(|error| FetchError::Csv { path, error })?
            .ok_or_else(|| FetchError::NoObservations {
                series_id: spec.series_id.clone(),
            })?;

        debug!(
            date = %aggregate.date,
            markets = aggregate.markets,
            sentiment = aggregate.sentiment,
            "Trade sentiment aggregated from {} market(s)",
            aggregate.markets
        );

        Ok(
            Indicator::new(spec.indicator.clone(), aggregate.sentiment, Source::Trade, aggregate.date)
                .with_unit(spec.unit)
                .with_series_id(spec.series_id.clone()),
        )
    }
}
