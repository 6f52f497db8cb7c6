//! Integration tests for the source adapters against mocked upstream APIs

use chrono::NaiveDate;
use laborcast::models::{SeriesSpec, Source, Unit};
use laborcast::sources::http::build_client;
use laborcast::sources::{
    BeaSource, BlsSource, FetchError, FredSource, IndicatorSource, SourceRegistry,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    build_client(5).expect("http client")
}

fn bls_spec() -> SeriesSpec {
    SeriesSpec::new("unemployment_rate", Source::Bls, "LNS14000000", Unit::Percent)
}

fn fred_spec() -> SeriesSpec {
    SeriesSpec::new("initial_claims", Source::Fred, "ICSA", Unit::Count)
}

fn bea_spec() -> SeriesSpec {
    SeriesSpec::new("gdp_growth", Source::Bea, "T10101:1", Unit::Percent)
}

#[tokio::test]
async fn bls_returns_latest_monthly_value() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/publicAPI/v2/timeseries/data/"))
        .and(body_partial_json(json!({
            "seriesid": ["LNS14000000"],
            "registrationkey": "bls-key"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_SUCCEEDED",
            "message": [],
            "Results": {
                "series": [{
                    "seriesID": "LNS14000000",
                    "data": [
                        { "year": "2024", "period": "M10", "value": "-" },
                        { "year": "2024", "period": "M09", "value": "4.1" },
                        { "year": "2024", "period": "M08", "value": "4.2" }
                    ]
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = BlsSource::new(client(), &server.uri(), Some("bls-key".to_string()));
    let indicator = source.fetch(&bls_spec()).await.unwrap();

    assert_eq!(indicator.name, "unemployment_rate");
    assert_eq!(indicator.value, 4.1);
    assert_eq!(indicator.source, Source::Bls);
    assert_eq!(indicator.unit, Unit::Percent);
    assert_eq!(indicator.series_id, "LNS14000000");
    assert_eq!(indicator.timestamp, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
    assert!(!indicator.is_fallback);
}

#[tokio::test]
async fn bls_request_failure_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_NOT_PROCESSED",
            "message": ["Daily threshold for total number of requests allocated has been reached."]
        })))
        .mount(&server)
        .await;

    let source = BlsSource::new(client(), &server.uri(), None);
    let err = source.fetch(&bls_spec()).await.unwrap_err();
    match err {
        FetchError::Api { source_kind, message } => {
            assert_eq!(source_kind, Source::Bls);
            assert!(message.contains("Daily threshold"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn fred_skips_missing_observations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .and(query_param("series_id", "ICSA"))
        .and(query_param("api_key", "fred-key"))
        .and(query_param("file_type", "json"))
        .and(query_param("sort_order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "observations": [
                { "date": "2024-11-02", "value": "." },
                { "date": "2024-10-26", "value": "216,000" }
            ]
        })))
        .mount(&server)
        .await;

    let source = FredSource::new(client(), &server.uri(), Some("fred-key".to_string()));
    let indicator = source.fetch(&fred_spec()).await.unwrap();

    assert_eq!(indicator.value, 216_000.0);
    assert_eq!(indicator.timestamp, NaiveDate::from_ymd_opt(2024, 10, 26).unwrap());
}

#[tokio::test]
async fn fred_passes_units_transform() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .and(query_param("series_id", "PAYEMS"))
        .and(query_param("units", "chg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "observations": [{ "date": "2024-10-01", "value": "12" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = SeriesSpec::new("payroll_change", Source::Fred, "PAYEMS", Unit::Count)
        .with_transform("chg");
    let source = FredSource::new(client(), &server.uri(), Some("fred-key".to_string()));
    let indicator = source.fetch(&spec).await.unwrap();
    assert_eq!(indicator.value, 12.0);
}

#[tokio::test]
async fn fred_without_key_never_calls_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let source = FredSource::new(client(), &server.uri(), None);
    let err = source.fetch(&fred_spec()).await.unwrap_err();
    assert!(matches!(err, FetchError::MissingApiKey(Source::Fred)));
}

#[tokio::test]
async fn fred_all_missing_is_no_observations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "observations": [{ "date": "2024-11-02", "value": "." }]
        })))
        .mount(&server)
        .await;

    let source = FredSource::new(client(), &server.uri(), Some("k".to_string()));
    let err = source.fetch(&fred_spec()).await.unwrap_err();
    assert!(matches!(err, FetchError::NoObservations { .. }));
}

#[tokio::test]
async fn server_error_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let source = FredSource::new(client(), &server.uri(), Some("k".to_string())).with_max_retries(1);
    let err = source.fetch(&fred_spec()).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Status {
            source_kind: Source::Fred,
            status: 503
        }
    ));
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let source = FredSource::new(client(), &server.uri(), Some("k".to_string())).with_max_retries(3);
    let err = source.fetch(&fred_spec()).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 400, .. }));
}

#[tokio::test]
async fn bea_picks_latest_quarter_for_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .and(query_param("UserID", "bea-key"))
        .and(query_param("TableName", "T10101"))
        .and(query_param("DataSetName", "NIPA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BEAAPI": {
                "Results": {
                    "Data": [
                        { "LineNumber": "1", "TimePeriod": "2024Q2", "DataValue": "3.0" },
                        { "LineNumber": "1", "TimePeriod": "2024Q3", "DataValue": "2.8" },
                        { "LineNumber": "2", "TimePeriod": "2024Q4", "DataValue": "9.9" }
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let source = BeaSource::new(client(), &server.uri(), Some("bea-key".to_string()));
    let indicator = source.fetch(&bea_spec()).await.unwrap();

    assert_eq!(indicator.value, 2.8);
    assert_eq!(indicator.timestamp, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    assert_eq!(indicator.source, Source::Bea);
}

#[tokio::test]
async fn bea_error_envelope_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "BEAAPI": {
                "Results": {
                    "Error": { "APIErrorCode": "3", "APIErrorDescription": "The UserID provided is not valid." }
                }
            }
        })))
        .mount(&server)
        .await;

    let source = BeaSource::new(client(), &server.uri(), Some("bad".to_string()));
    let err = source.fetch(&bea_spec()).await.unwrap_err();
    assert!(matches!(err, FetchError::Api { ref message, .. } if message.contains("UserID")));
}

#[tokio::test]
async fn registry_collects_partial_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "observations": [{ "date": "2024-10-26", "value": "216000" }]
        })))
        .mount(&server)
        .await;

    let registry = SourceRegistry::new()
        .with_source(FredSource::new(client(), &server.uri(), Some("k".to_string())));
    assert_eq!(registry.sources(), vec![Source::Fred]);

    let series = vec![fred_spec(), bea_spec()];
    let results = registry.fetch_all(&series).await;
    assert!(results[0].1.is_ok());
    assert!(matches!(
        results[1].1,
        Err(FetchError::UnsupportedSource(Source::Bea))
    ));

    let snapshot = registry.collect(&series).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("initial_claims").unwrap().value, 216_000.0);
    assert!(snapshot.get("gdp_growth").is_none());
}
