//! Unit tests for the adjustment calculator

use chrono::NaiveDate;
use laborcast::config::default_rules;
use laborcast::forecast::adjustment::{calculate, contribution, normalized_deviation};
use laborcast::forecast::snapshot::{FallbackReason, ResolvedIndicator};
use laborcast::models::{AdjustmentRule, Direction, Normalizer};

fn claims_rule() -> AdjustmentRule {
    AdjustmentRule::new(
        "initial_claims",
        225_000.0,
        0.3,
        Direction::Raises,
        1.0,
        Normalizer::Relative,
        230_000.0,
    )
}

fn default_rule(name: &str) -> AdjustmentRule {
    default_rules()
        .into_iter()
        .find(|r| r.indicator_name == name)
        .expect("rule present in default table")
}

#[test]
fn test_relative_claims_scenario() {
    let c = contribution(263_000.0, &claims_rule());
    // ((263000 - 225000) / 225000) * 0.3 * 1.0
    assert!((c - 0.050_666_67).abs() < 1e-6, "got {}", c);
}

#[test]
fn test_absolute_normalizer() {
    let rule = AdjustmentRule::new(
        "consumer_sentiment",
        70.0,
        0.01,
        Direction::Lowers,
        1.0,
        Normalizer::Absolute,
        68.0,
    );
    assert!((normalized_deviation(60.0, &rule) + 10.0).abs() < 1e-12);
    // weaker sentiment pushes unemployment up
    assert!((contribution(60.0, &rule) - 0.1).abs() < 1e-12);
}

#[test]
fn test_divide_by_constant_normalizer() {
    let rule = AdjustmentRule::new(
        "payroll_change",
        150.0,
        1.0,
        Direction::Lowers,
        1.0,
        Normalizer::DivideByConstant { k: 1_000.0 },
        150.0,
    );
    assert!((contribution(263.0, &rule) + 0.113).abs() < 1e-12);
}

#[test]
fn test_value_at_baseline_contributes_nothing() {
    for rule in default_rules() {
        assert_eq!(contribution(rule.baseline, &rule), 0.0, "{}", rule.indicator_name);
    }
}

#[test]
fn test_direction_flips_sign() {
    let raises = claims_rule();
    let mut lowers = claims_rule();
    lowers.direction = Direction::Lowers;
    let up = contribution(250_000.0, &raises);
    let down = contribution(250_000.0, &lowers);
    assert!(up > 0.0);
    assert_eq!(up, -down);
}

#[test]
fn test_weight_scales_linearly() {
    let mut rule = claims_rule();
    let full = contribution(250_000.0, &rule);
    rule.weight = 0.5;
    let half = contribution(250_000.0, &rule);
    assert!((full - 2.0 * half).abs() < 1e-12);
}

#[test]
fn test_trade_sentiment_extremes_are_symmetric() {
    let rule = default_rule("trade_sentiment");
    let bullish = contribution(1.0, &rule);
    let bearish = contribution(-1.0, &rule);

    assert!(bullish < 0.0);
    assert!(bearish > 0.0);
    assert_eq!(bullish, -bearish);
    // scale 0.2 * weight 0.01 == 0.2 / 100
    assert!((bearish - 0.002).abs() < 1e-12);
}

#[test]
fn test_calculate_carries_fallback_flag() {
    let rule = claims_rule();
    let live = ResolvedIndicator::live(
        "initial_claims",
        263_000.0,
        NaiveDate::from_ymd_opt(2024, 10, 5),
    );
    let substituted = ResolvedIndicator::fallback("initial_claims", 230_000.0, FallbackReason::Missing);

    let live_adj = calculate(&rule, &live);
    assert_eq!(live_adj.name, "initial_claims");
    assert_eq!(live_adj.indicator_value, 263_000.0);
    assert!(!live_adj.is_fallback);

    let fallback_adj = calculate(&rule, &substituted);
    assert!(fallback_adj.is_fallback);
    assert_eq!(fallback_adj.value, contribution(230_000.0, &rule));
}
