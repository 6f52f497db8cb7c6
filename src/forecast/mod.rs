//! Forecast core: adjustment calculator, blender and confidence scorer.
//!
//! Synchronous and free of I/O. Indicator fetching lives in `sources`.

pub mod adjustment;
pub mod blender;
pub mod confidence;
pub mod engine;
pub mod snapshot;

pub use adjustment::{calculate, contribution};
pub use blender::{blend, Blend};
pub use confidence::{ConfidenceScore, DATA_FRESHNESS, SOURCE_AVAILABILITY};
pub use engine::ForecastEngine;
pub use snapshot::{resolve, FallbackReason, IndicatorSnapshot, ResolvedIndicator};
