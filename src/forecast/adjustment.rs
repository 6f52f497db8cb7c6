//! Indicator reading -> signed percentage-point contribution

use crate::forecast::snapshot::ResolvedIndicator;
use crate::models::{Adjustment, AdjustmentRule, Normalizer};

/// Deviation from baseline under the rule's normalizer.
pub fn normalized_deviation(value: f64, rule: &AdjustmentRule) -> f64 {
    let deviation = value - rule.baseline;
    match rule.normalizer {
        Normalizer::Absolute => deviation,
        Normalizer::Relative => deviation / rule.baseline,
        Normalizer::DivideByConstant { k } => deviation / k,
    }
}

/// `direction * normalized(value - baseline) * scale * weight`
///
/// Pure: depends only on `value` and the rule.
pub fn contribution(value: f64, rule: &AdjustmentRule) -> f64 {
    rule.direction.sign() * normalized_deviation(value, rule) * rule.scale * rule.weight
}

pub fn calculate(rule: &AdjustmentRule, resolved: &ResolvedIndicator) -> Adjustment {
    Adjustment {
        name: rule.indicator_name.clone(),
        value: contribution(resolved.value, rule),
        indicator_value: resolved.value,
        is_fallback: resolved.is_fallback,
    }
}
