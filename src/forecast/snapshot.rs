//! Indicator snapshots and fallback resolution

use crate::models::Indicator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::warn;

/// Complete, deduplicated set of readings available to one forecast run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    indicators: BTreeMap<String, Indicator>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from per-series fetch outcomes. Failed fetches are left out
    /// so the engine substitutes the rule fallback for them.
    pub fn from_results<E, I>(results: I) -> Self
    where
        E: Display,
        I: IntoIterator<Item = (String, Result<Indicator, E>)>,
    {
        let mut snapshot = Self::new();
        for (name, result) in results {
            match result {
                Ok(indicator) => snapshot.insert(indicator),
                Err(e) => {
                    warn!(indicator = %name, error = %e, "Indicator unavailable, fallback will be used");
                }
            }
        }
        snapshot
    }

    /// Insert a reading. A later reading for the same name replaces the earlier one.
    pub fn insert(&mut self, indicator: Indicator) {
        self.indicators.insert(indicator.name.clone(), indicator);
    }

    pub fn with(mut self, indicator: Indicator) -> Self {
        self.insert(indicator);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Indicator> {
        self.indicators.get(name)
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Indicator> {
        self.indicators.values()
    }
}

/// Why a fallback value stands in for a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Not supplied by the adapter layer.
    Missing,
    /// NaN or infinite.
    NonFinite,
    /// The adapter already substituted a synthetic value.
    FlaggedBySource,
}

/// An indicator value ready for the calculator, real or substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIndicator {
    pub name: String,
    pub value: f64,
    pub is_fallback: bool,
    pub timestamp: Option<NaiveDate>,
    pub fallback_reason: Option<FallbackReason>,
}

impl ResolvedIndicator {
    pub fn live(name: &str, value: f64, timestamp: Option<NaiveDate>) -> Self {
        Self {
            name: name.to_string(),
            value,
            is_fallback: false,
            timestamp,
            fallback_reason: None,
        }
    }

    pub fn fallback(name: &str, value: f64, reason: FallbackReason) -> Self {
        Self {
            name: name.to_string(),
            value,
            is_fallback: true,
            timestamp: None,
            fallback_reason: Some(reason),
        }
    }
}

/// Look up `name`, substituting `fallback` when the reading is missing or unusable.
pub fn resolve(snapshot: &IndicatorSnapshot, name: &str, fallback: f64) -> ResolvedIndicator {
    match snapshot.get(name) {
        None => ResolvedIndicator::fallback(name, fallback, FallbackReason::Missing),
        Some(indicator) if !indicator.value.is_finite() => {
            warn!(
                indicator = %name,
                value = %indicator.value,
                "Non-finite indicator value, substituting fallback {}",
                fallback
            );
            ResolvedIndicator::fallback(name, fallback, FallbackReason::NonFinite)
        }
        Some(indicator) if indicator.is_fallback => ResolvedIndicator {
            name: name.to_string(),
            value: indicator.value,
            is_fallback: true,
            timestamp: Some(indicator.timestamp),
            fallback_reason: Some(FallbackReason::FlaggedBySource),
        },
        Some(indicator) => ResolvedIndicator::live(name, indicator.value, Some(indicator.timestamp)),
    }
}
