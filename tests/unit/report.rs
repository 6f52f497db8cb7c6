//! Unit tests for the JSON report and the forecast history store

use chrono::{NaiveDate, TimeZone, Utc};
use laborcast::config::ForecastProfile;
use laborcast::db::HistoryStore;
use laborcast::forecast::{ForecastEngine, IndicatorSnapshot};
use laborcast::models::{Indicator, Source};
use laborcast::report::{ForecastReport, SCHEMA_VERSION};
use serde_json::Value;

fn report_at(hour: u32, claims: f64) -> ForecastReport {
    let snapshot = IndicatorSnapshot::new()
        .with(Indicator::new(
            "unemployment_rate",
            4.3,
            Source::Bls,
            NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
        ))
        .with(Indicator::new(
            "initial_claims",
            claims,
            Source::Fred,
            NaiveDate::from_ymd_opt(2024, 10, 26).unwrap(),
        ));
    let generated_at = Utc.with_ymd_and_hms(2024, 11, 1, hour, 0, 0).unwrap();
    let result = ForecastEngine::new(ForecastProfile::broad()).forecast(&snapshot, generated_at);
    ForecastReport::from_result(&result)
}

#[test]
fn test_report_schema() {
    let report = report_at(9, 263_000.0);
    let json: Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

    assert_eq!(json["schema_version"], SCHEMA_VERSION);
    assert_eq!(json["profile"], "broad");
    assert_eq!(json["forecast_summary"]["current_unemployment"], 4.3);
    assert!(json["forecast_summary"]["forecasted_unemployment"].is_f64());
    assert!(json["forecast_summary"]["confidence_level"].is_f64());
    assert_eq!(json["adjustments"].as_array().unwrap().len(), 7);
    assert_eq!(json["clamp"]["min"], 2.0);
    assert_eq!(json["data_quality"]["indicator_count"], 8);
    assert_eq!(json["data_quality"]["fallback_count"], 6);
    assert!(json["note"].as_str().unwrap().contains("heuristic"));
}

#[test]
fn test_report_rounds_values() {
    let report = report_at(9, 263_000.0);
    let claims = &report.adjustments[0];
    assert_eq!(claims.name, "initial_claims");
    assert_eq!(claims.value, 0.0507);
    assert_eq!(claims.indicator_value, 263_000.0);

    let confidence = report.forecast_summary.confidence_level;
    assert_eq!(confidence, (confidence * 10.0).round() / 10.0);
}

#[test]
fn test_report_round_trips_through_json() {
    let report = report_at(9, 263_000.0);
    let text = serde_json::to_string(&report).unwrap();
    let parsed: ForecastReport = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, report);
}

#[tokio::test]
async fn test_write_to_creates_parent_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("forecast.json");

    report_at(9, 263_000.0).write_to(&path).await.unwrap();
    report_at(10, 240_000.0).write_to(&path).await.unwrap();

    let written: ForecastReport =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, report_at(10, 240_000.0));
}

#[tokio::test]
async fn test_history_returns_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path().join("history.jsonl")).await.unwrap();

    for hour in 1..=3 {
        store.append(&report_at(hour, 250_000.0)).await.unwrap();
    }

    let recent = store.recent(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].generated_date.format("%H").to_string(), "03");
    assert_eq!(recent[1].generated_date.format("%H").to_string(), "02");

    assert_eq!(store.recent(10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_history_skips_malformed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.jsonl");
    let store = HistoryStore::open(&path).await.unwrap();

    store.append(&report_at(1, 250_000.0)).await.unwrap();
    {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
    }
    store.append(&report_at(2, 250_000.0)).await.unwrap();

    let recent = store.recent(10).await.unwrap();
    assert_eq!(recent.len(), 2);
}

#[tokio::test]
async fn test_history_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path().join("nested").join("history.jsonl"))
        .await
        .unwrap();
    assert!(store.recent(5).await.unwrap().is_empty());
}
