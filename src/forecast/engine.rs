//! Forecast engine: resolve -> adjust -> blend -> score.

use crate::config::ForecastProfile;
use crate::forecast::adjustment;
use crate::forecast::blender;
use crate::forecast::confidence;
use crate::forecast::snapshot::{resolve, IndicatorSnapshot, ResolvedIndicator};
use crate::models::{Adjustment, ForecastResult, TrendDirection};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Stateless forecast calculator bound to one profile.
///
/// Every call is a full recomputation from the snapshot; identical inputs give
/// identical results, so independent runs may execute concurrently.
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    profile: ForecastProfile,
}

impl ForecastEngine {
    pub fn new(profile: ForecastProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ForecastProfile {
        &self.profile
    }

    /// Never fails on data problems: missing or unusable readings fall back and
    /// lower the confidence instead.
    pub fn forecast(&self, snapshot: &IndicatorSnapshot, generated_at: DateTime<Utc>) -> ForecastResult {
        let profile = &self.profile;
        let base = resolve(
            snapshot,
            &profile.base_rate.indicator,
            profile.base_rate.fallback,
        );

        let mut resolved: Vec<ResolvedIndicator> = Vec::with_capacity(profile.rules.len() + 1);
        let mut adjustments: Vec<Adjustment> = Vec::with_capacity(profile.rules.len());
        for rule in &profile.rules {
            let reading = resolve(snapshot, &rule.indicator_name, rule.fallback);
            let adjustment = adjustment::calculate(rule, &reading);
            debug!(
                rule = %adjustment.name,
                indicator_value = adjustment.indicator_value,
                contribution = adjustment.value,
                is_fallback = adjustment.is_fallback,
                "Adjustment {}: {:+.4}pp",
                adjustment.name,
                adjustment.value
            );
            adjustments.push(adjustment);
            resolved.push(reading);
        }

        let blend = blender::blend(base.value, &adjustments, &profile.clamp);
        if blend.forecast_rate != blend.unclamped_rate {
            debug!(
                unclamped = blend.unclamped_rate,
                clamped = blend.forecast_rate,
                "Forecast clamped into [{}, {}]",
                profile.clamp.min,
                profile.clamp.max
            );
        }

        let base_rate_is_fallback = base.is_fallback;
        let base_rate = base.value;
        resolved.insert(0, base);

        let score = confidence::score(&profile.confidence, &resolved, generated_at.date_naive());
        let fallback_count = resolved.iter().filter(|r| r.is_fallback).count();
        let change = blend.forecast_rate - base_rate;
        let direction = TrendDirection::from_change(change, profile.stable_band);

        if fallback_count > 0 {
            let names: Vec<&str> = resolved
                .iter()
                .filter(|r| r.is_fallback)
                .map(|r| r.name.as_str())
                .collect();
            warn!(
                profile = %profile.name,
                fallback_count = fallback_count,
                indicators = ?names,
                "Forecast uses {} fallback value(s)",
                fallback_count
            );
        }
        info!(
            profile = %profile.name,
            base_rate = base_rate,
            total_adjustment = blend.total_adjustment,
            forecast_rate = blend.forecast_rate,
            confidence = score.value,
            "Forecast {:.2}% -> {:.2}% (confidence {:.1})",
            base_rate,
            blend.forecast_rate,
            score.value
        );

        ForecastResult {
            profile: profile.name.clone(),
            base_rate,
            base_rate_is_fallback,
            adjustments,
            total_adjustment: blend.total_adjustment,
            unclamped_rate: blend.unclamped_rate,
            forecast_rate: blend.forecast_rate,
            clamp: profile.clamp,
            direction,
            confidence: score.value,
            confidence_components: score.components,
            fallback_count,
            indicator_count: resolved.len(),
            generated_at,
        }
    }
}
