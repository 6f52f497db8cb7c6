//! Unit tests for the forecast engine

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use laborcast::config::{default_rules, ForecastProfile};
use laborcast::forecast::{ForecastEngine, IndicatorSnapshot};
use laborcast::models::{Indicator, Source, TrendDirection};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap()
}

fn observed() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
}

fn reading(name: &str, value: f64) -> Indicator {
    Indicator::new(name, value, Source::Synthetic, observed())
}

/// Every rule fed exactly its baseline, plus a live base rate.
fn baseline_snapshot(base_rate: f64) -> IndicatorSnapshot {
    default_rules().into_iter().fold(
        IndicatorSnapshot::new().with(reading("unemployment_rate", base_rate)),
        |snapshot, rule| snapshot.with(reading(&rule.indicator_name, rule.baseline)),
    )
}

#[test]
fn test_claims_scenario() {
    let engine = ForecastEngine::new(ForecastProfile::broad());
    let snapshot = baseline_snapshot(4.3).with(reading("initial_claims", 263_000.0));

    let result = engine.forecast(&snapshot, now());

    assert!((result.total_adjustment - 0.050_666_67).abs() < 1e-6);
    assert!((result.forecast_rate - 4.350_666_67).abs() < 1e-6);
    assert!(!result.was_clamped());
    assert_eq!(result.direction, TrendDirection::Increase);
    assert_eq!(result.fallback_count, 0);
    assert_eq!(result.indicator_count, 8);
    assert!(!result.base_rate_is_fallback);
    assert_eq!(result.profile, "broad");
    assert_eq!(result.generated_at, now());
}

#[test]
fn test_adjustments_follow_rule_order() {
    let engine = ForecastEngine::new(ForecastProfile::broad());
    let result = engine.forecast(&baseline_snapshot(4.3), now());

    let names: Vec<_> = result.adjustments.iter().map(|a| a.name.as_str()).collect();
    let expected: Vec<_> = default_rules().into_iter().map(|r| r.indicator_name).collect();
    assert_eq!(names, expected);
    assert_eq!(result.total_adjustment, 0.0);
    assert_eq!(result.direction, TrendDirection::Stable);
}

#[test]
fn test_empty_snapshot_uses_fallbacks() {
    let profile = ForecastProfile::broad();
    let engine = ForecastEngine::new(profile.clone());
    let result = engine.forecast(&IndicatorSnapshot::new(), now());

    assert!(result.base_rate_is_fallback);
    assert_eq!(result.base_rate, 4.3);
    assert_eq!(result.fallback_count, 8);
    assert_eq!(result.indicator_count, 8);
    assert!(result.adjustments.iter().all(|a| a.is_fallback));
    assert!((result.total_adjustment - 0.038_819_44).abs() < 1e-6);
    assert_eq!(result.confidence, profile.confidence.base);
}

#[test]
fn test_all_live_fresh_hits_cap() {
    let engine = ForecastEngine::new(ForecastProfile::broad());
    let result = engine.forecast(&baseline_snapshot(4.1), now());
    assert_eq!(result.confidence, 95.0);

    let narrow = ForecastEngine::new(ForecastProfile::narrow());
    // 85 + 5 + 8 + 3 + 2 = 103, capped at 98
    assert_eq!(narrow.forecast(&baseline_snapshot(4.1), now()).confidence, 98.0);
}

#[test]
fn test_non_finite_reading_falls_back() {
    let engine = ForecastEngine::new(ForecastProfile::broad());
    let snapshot = baseline_snapshot(4.3).with(reading("initial_claims", f64::NAN));
    let result = engine.forecast(&snapshot, now());

    let claims = &result.adjustments[0];
    assert!(claims.is_fallback);
    assert_eq!(claims.indicator_value, 230_000.0);
    assert_eq!(result.fallback_count, 1);
    assert!(result.forecast_rate.is_finite());
}

#[test]
fn test_source_flagged_fallback_keeps_value() {
    let engine = ForecastEngine::new(ForecastProfile::broad());
    let snapshot =
        baseline_snapshot(4.3).with(reading("job_openings", 7_500.0).as_fallback());
    let result = engine.forecast(&snapshot, now());

    let openings = result
        .adjustments
        .iter()
        .find(|a| a.name == "job_openings")
        .unwrap();
    assert!(openings.is_fallback);
    assert_eq!(openings.indicator_value, 7_500.0);
}

#[test]
fn test_clamped_into_profile_band() {
    let snapshot = baseline_snapshot(9.5);

    let broad = ForecastEngine::new(ForecastProfile::broad()).forecast(&snapshot, now());
    assert_eq!(broad.forecast_rate, 9.5);

    let narrow = ForecastEngine::new(ForecastProfile::narrow()).forecast(&snapshot, now());
    assert_eq!(narrow.forecast_rate, 8.0);
    assert!(narrow.was_clamped());
    assert_eq!(narrow.direction, TrendDirection::Decrease);
}

#[test]
fn test_identical_inputs_identical_results() {
    let engine = ForecastEngine::new(ForecastProfile::broad());
    let snapshot = baseline_snapshot(4.3)
        .with(reading("initial_claims", 241_000.0))
        .with(reading("consumer_sentiment", 64.2));

    assert_eq!(engine.forecast(&snapshot, now()), engine.forecast(&snapshot, now()));
}

#[test]
fn test_unknown_readings_are_ignored() {
    let engine = ForecastEngine::new(ForecastProfile::broad());
    let with_extra = baseline_snapshot(4.3).with(reading("housing_starts", 1_400.0));
    let result = engine.forecast(&with_extra, now());
    assert_eq!(result.indicator_count, 8);
    assert_eq!(result.total_adjustment, 0.0);
}
