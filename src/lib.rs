//! Unemployment-rate forecasting from labor-market indicators.
//!
//! Indicators (BLS, FRED, BEA, prediction-market sentiment) are fetched by
//! [`sources`], turned into percentage-point adjustments by a configuration-driven
//! rule table in [`forecast`], blended onto the current rate, clamped, and scored
//! with a heuristic confidence that drops as fallback values replace live data.

pub mod config;
pub mod core;
pub mod db;
pub mod forecast;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod report;
pub mod sources;

pub use config::{ForecastConfig, ForecastProfile};
pub use forecast::{ForecastEngine, IndicatorSnapshot};
pub use models::{AdjustmentRule, ForecastResult, Indicator};
pub use report::ForecastReport;
