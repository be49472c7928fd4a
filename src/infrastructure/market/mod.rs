//! Upstream market data sources

mod fear_greed;
mod yahoo;

pub use fear_greed::FearGreedClient;
pub use yahoo::YahooChartClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::errors::FetchError;
use crate::shared::types::SentimentReading;

/// Some upstreams reject requests without a browser-looking agent
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (compatible; indexwatch/0.2)";

/// Historical daily closes for one symbol, oldest first
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<f64>, FetchError>;
}

/// Market sentiment gauge
#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn fetch_sentiment(&self) -> Result<SentimentReading, FetchError>;
}
