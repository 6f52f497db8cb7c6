//! Test utilities for API server integration tests

use axum_test::TestServer;
use laborcast::config::ForecastConfig;
use laborcast::core::http::{create_router, AppState};
use laborcast::core::runtime::LatestReport;
use laborcast::db::HistoryStore;
use laborcast::metrics::Metrics;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Test helper for API server integration tests
#[allow(dead_code)]
pub struct TestApiServer {
    pub server: TestServer,
    pub metrics: Arc<Metrics>,
    pub latest: LatestReport,
    pub history: Option<Arc<HistoryStore>>,
}

impl TestApiServer {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    pub async fn with_history(history: Arc<HistoryStore>) -> Self {
        Self::build(Some(history)).await
    }

    async fn build(history: Option<Arc<HistoryStore>>) -> Self {
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let latest: LatestReport = Arc::new(RwLock::new(None));
        let state = AppState::new(Arc::new(ForecastConfig::default()), metrics.clone())
            .with_latest(latest.clone())
            .with_history(history.clone());

        let app = create_router(state);
        let server = TestServer::new(app).expect("start test server");

        Self {
            server,
            metrics,
            latest,
            history,
        }
    }
}
