use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `[min, max]` range a raw forecast is restricted to before it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampBand {
    pub min: f64,
    pub max: f64,
}

impl ClampBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, rate: f64) -> f64 {
        if rate.is_nan() {
            return self.min;
        }
        rate.max(self.min).min(self.max)
    }

    pub fn contains(&self, rate: f64) -> bool {
        rate >= self.min && rate <= self.max
    }
}

/// One entry of the audit trail: a single rule's contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub name: String,
    pub value: f64,
    pub indicator_value: f64,
    pub is_fallback: bool,
}

/// A weighted data-quality term of the confidence heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceComponent {
    pub name: String,
    /// 0-100
    pub raw_score: f64,
    pub weight: f64,
}

impl ConfidenceComponent {
    pub fn new(name: &str, raw_score: f64, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            raw_score: raw_score.clamp(0.0, 100.0),
            weight,
        }
    }

    pub fn contribution(&self) -> f64 {
        self.raw_score * self.weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increase,
    Decrease,
    Stable,
}

impl TrendDirection {
    pub fn from_change(change: f64, stable_band: f64) -> Self {
        if change.abs() < stable_band {
            TrendDirection::Stable
        } else if change > 0.0 {
            TrendDirection::Increase
        } else {
            TrendDirection::Decrease
        }
    }
}

/// Output of one forecast run. Built fresh every run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub profile: String,
    pub base_rate: f64,
    pub base_rate_is_fallback: bool,
    pub adjustments: Vec<Adjustment>,
    pub total_adjustment: f64,
    pub unclamped_rate: f64,
    pub forecast_rate: f64,
    pub clamp: ClampBand,
    pub direction: TrendDirection,
    /// Heuristic 0-100 score of data completeness and freshness.
    pub confidence: f64,
    pub confidence_components: Vec<ConfidenceComponent>,
    pub fallback_count: usize,
    pub indicator_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl ForecastResult {
    pub fn change(&self) -> f64 {
        self.forecast_rate - self.base_rate
    }

    pub fn was_clamped(&self) -> bool {
        self.unclamped_rate != self.forecast_rate
    }
}
