//! Shared data models spanning the forecast layers.

pub mod forecast;
pub mod indicators;
pub mod rule;

pub use forecast::{
    Adjustment, ClampBand, ConfidenceComponent, ForecastResult, TrendDirection,
};
pub use indicators::{Indicator, SeriesSpec, Source, Unit};
pub use rule::{AdjustmentRule, Direction, Normalizer};
