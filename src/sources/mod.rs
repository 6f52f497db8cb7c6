//! Indicator source adapters.
//!
//! Each adapter turns one `SeriesSpec` into an `Indicator` or a `FetchError`;
//! the forecast engine decides what a failure means (a fallback value).

use crate::models::{Indicator, SeriesSpec, Source};
use async_trait::async_trait;

pub mod bea;
pub mod bls;
pub mod error;
pub mod fred;
pub mod http;
pub mod registry;
pub mod trade;

pub use bea::BeaSource;
pub use bls::BlsSource;
pub use error::FetchError;
pub use fred::FredSource;
pub use registry::SourceRegistry;
pub use trade::{parse_trade_sentiment, TradeCsvSource, TradeSentiment};

#[async_trait]
pub trait IndicatorSource {
    /// Which upstream this adapter serves
    fn source(&self) -> Source;

    /// Fetch the latest reading for one series
    async fn fetch(&self, spec: &SeriesSpec) -> Result<Indicator, FetchError>;
}
