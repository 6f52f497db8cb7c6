//! Confidence heuristic from data-quality signals
//!
//! `confidence = clamp(base + Σ raw * weight + Σ bonus, 0, cap)`
//!
//! This scores how complete and fresh the inputs were. It is not a calibrated
//! confidence interval and makes no coverage claim.

use crate::config::ConfidenceSettings;
use crate::forecast::snapshot::ResolvedIndicator;
use crate::models::ConfidenceComponent;
use chrono::NaiveDate;

pub const DATA_FRESHNESS: &str = "data_freshness";
pub const SOURCE_AVAILABILITY: &str = "source_availability_ratio";

const FRESH_SCORE: f64 = 100.0;
const STALE_SCORE: f64 = 80.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceScore {
    pub value: f64,
    /// Weighted terms followed by granted bonuses (weight 1.0).
    pub components: Vec<ConfidenceComponent>,
}

fn indicator_freshness(
    indicator: &ResolvedIndicator,
    as_of: NaiveDate,
    settings: &ConfidenceSettings,
) -> f64 {
    if indicator.is_fallback {
        return 0.0;
    }
    match indicator.timestamp {
        Some(ts) if (as_of - ts).num_days() > settings.max_age_for(&indicator.name) => STALE_SCORE,
        Some(_) => FRESH_SCORE,
        // live reading without a date cannot prove it is fresh
        None => STALE_SCORE,
    }
}

/// Mean per-indicator freshness: fresh 100, stale 80, fallback 0.
pub fn freshness_score(
    resolved: &[ResolvedIndicator],
    as_of: NaiveDate,
    settings: &ConfidenceSettings,
) -> f64 {
    if resolved.is_empty() {
        return 0.0;
    }
    let sum: f64 = resolved
        .iter()
        .map(|r| indicator_freshness(r, as_of, settings))
        .sum();
    sum / resolved.len() as f64
}

/// Share of live readings, 0-100.
pub fn availability_ratio(resolved: &[ResolvedIndicator]) -> f64 {
    if resolved.is_empty() {
        return 0.0;
    }
    let live = resolved.iter().filter(|r| !r.is_fallback).count();
    live as f64 / resolved.len() as f64 * 100.0
}

pub fn score(
    settings: &ConfidenceSettings,
    resolved: &[ResolvedIndicator],
    as_of: NaiveDate,
) -> ConfidenceScore {
    let mut components = vec![
        ConfidenceComponent::new(
            DATA_FRESHNESS,
            freshness_score(resolved, as_of, settings),
            settings.freshness_weight,
        ),
        ConfidenceComponent::new(
            SOURCE_AVAILABILITY,
            availability_ratio(resolved),
            settings.availability_weight,
        ),
    ];

    let is_live = |name: &str| resolved.iter().any(|r| r.name == name && !r.is_fallback);
    for bonus in &settings.bonuses {
        // a bonus with no requirements still needs at least one live reading
        let granted = if bonus.requires.is_empty() {
            resolved.iter().any(|r| !r.is_fallback)
        } else {
            bonus.requires.iter().all(|name| is_live(name))
        };
        if granted {
            components.push(ConfidenceComponent::new(&bonus.name, bonus.points, 1.0));
        }
    }

    let raw = settings.base + components.iter().map(|c| c.contribution()).sum::<f64>();
    ConfidenceScore {
        value: raw.max(0.0).min(settings.cap),
        components,
    }
}
