//! Versioned JSON forecast report

use crate::models::{ClampBand, ConfidenceComponent, ForecastResult, TrendDirection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const SCHEMA_VERSION: &str = "laborcast.forecast/v1";

pub const CONFIDENCE_NOTE: &str = "confidence_level is a 0-100 heuristic of input completeness \
and freshness, not a statistical confidence interval";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub current_unemployment: f64,
    pub forecasted_unemployment: f64,
    pub change: f64,
    pub confidence_level: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAdjustment {
    pub name: String,
    pub value: f64,
    pub indicator_value: f64,
    pub is_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub fallback_count: usize,
    pub indicator_count: usize,
    pub base_rate_is_fallback: bool,
    pub confidence_components: Vec<ConfidenceComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub schema_version: String,
    pub generated_date: DateTime<Utc>,
    pub profile: String,
    pub forecast_summary: ForecastSummary,
    pub adjustments: Vec<ReportAdjustment>,
    pub total_adjustment: f64,
    pub clamp: ClampBand,
    pub data_quality: DataQuality,
    pub note: String,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl ForecastReport {
    pub fn from_result(result: &ForecastResult) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_date: result.generated_at,
            profile: result.profile.clone(),
            forecast_summary: ForecastSummary {
                current_unemployment: round_to(result.base_rate, 4),
                forecasted_unemployment: round_to(result.forecast_rate, 4),
                change: round_to(result.change(), 4),
                confidence_level: round_to(result.confidence, 1),
                direction: result.direction,
            },
            adjustments: result
                .adjustments
                .iter()
                .map(|a| ReportAdjustment {
                    name: a.name.clone(),
                    value: round_to(a.value, 4),
                    indicator_value: a.indicator_value,
                    is_fallback: a.is_fallback,
                })
                .collect(),
            total_adjustment: round_to(result.total_adjustment, 4),
            clamp: result.clamp,
            data_quality: DataQuality {
                fallback_count: result.fallback_count,
                indicator_count: result.indicator_count,
                base_rate_is_fallback: result.base_rate_is_fallback,
                confidence_components: result
                    .confidence_components
                    .iter()
                    .map(|c| ConfidenceComponent {
                        name: c.name.clone(),
                        raw_score: round_to(c.raw_score, 2),
                        weight: c.weight,
                    })
                    .collect(),
            },
            note: CONFIDENCE_NOTE.to_string(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report, replacing any previous file at `path`.
    pub async fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json_pretty()?;
        let io_err = |source| ReportError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(path, json).await.map_err(io_err)?;
        info!(path = %path.display(), "Forecast report written to {}", path.display());
        Ok(())
    }
}
