use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit a reading is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Percent,
    Count,
    Currency,
    Index,
}

/// Where a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Bls,
    Fred,
    Bea,
    Trade,
    Synthetic,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::Bls => "bls",
            Source::Fred => "fred",
            Source::Bea => "bea",
            Source::Trade => "trade",
            Source::Synthetic => "synthetic",
        };
        f.write_str(name)
    }
}

/// A single named economic reading, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub name: String,
    pub value: f64,
    pub unit: Unit,
    pub source: Source,
    pub series_id: String,
    pub timestamp: NaiveDate,
    #[serde(default)]
    pub is_fallback: bool,
}

impl Indicator {
    pub fn new(name: impl Into<String>, value: f64, source: Source, timestamp: NaiveDate) -> Self {
        Self {
            name: name.into(),
            value,
            unit: Unit::Index,
            source,
            series_id: String::new(),
            timestamp,
            is_fallback: false,
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_series_id(mut self, series_id: impl Into<String>) -> Self {
        self.series_id = series_id.into();
        self
    }

    pub fn as_fallback(mut self) -> Self {
        self.is_fallback = true;
        self
    }
}

/// Which series feeds which indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub indicator: String,
    pub source: Source,
    pub series_id: String,
    #[serde(default = "default_unit")]
    pub unit: Unit,
    /// Upstream transformation, e.g. FRED `units=chg`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

fn default_unit() -> Unit {
    Unit::Index
}

impl SeriesSpec {
    pub fn new(indicator: &str, source: Source, series_id: &str, unit: Unit) -> Self {
        Self {
            indicator: indicator.to_string(),
            source,
            series_id: series_id.to_string(),
            unit,
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: &str) -> Self {
        self.transform = Some(transform.to_string());
        self
    }
}
