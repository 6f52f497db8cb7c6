use crate::models::Source;
use thiserror::Error;

/// Why a single series could not be turned into an `Indicator`.
///
/// Never fatal for a forecast run: the engine substitutes the rule fallback.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} API key is not configured")]
    MissingApiKey(Source),
    #[error("{source_kind} request failed: {error}")]
    Http {
        source_kind: Source,
        #[source]
        error: reqwest::Error,
    },
    #[error("{source_kind} returned HTTP {status}")]
    Status { source_kind: Source, status: u16 },
    #[error("{source_kind} API error: {message}")]
    Api { source_kind: Source, message: String },
    #[error("no observations for series {series_id}")]
    NoObservations { series_id: String },
    #[error("non-numeric value '{value}' for series {series_id}")]
    NonNumeric { series_id: String, value: String },
    #[error("unparseable period '{value}' for series {series_id}")]
    InvalidPeriod { series_id: String, value: String },
    #[error("failed to read {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },
    #[error("malformed CSV in {path}: {error}")]
    Csv {
        path: String,
        #[source]
        error: csv::Error,
    },
    #[error("no adapter registered for source {0}")]
    UnsupportedSource(Source),
}

impl FetchError {
    pub(crate) fn from_reqwest(source_kind: Source, error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => FetchError::Status {
                source_kind,
                status: status.as_u16(),
            },
            None => FetchError::Http { source_kind, error },
        }
    }
}
