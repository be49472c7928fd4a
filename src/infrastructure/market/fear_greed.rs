//! CNN Fear & Greed Index sentiment source

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SentimentSource, USER_AGENT};
use crate::shared::errors::FetchError;
use crate::shared::types::SentimentReading;

const DEFAULT_BASE_URL: &str = "https://production.dataviz.cnn.io";

#[derive(Debug, Deserialize)]
struct GraphData {
    fear_and_greed: FearGreedBlock,
}

#[derive(Debug, Deserialize)]
struct FearGreedBlock {
    score: f64,
    rating: String,
    timestamp: String,
}

/// Current Fear & Greed reading from CNN's dataviz endpoint
pub struct FearGreedClient {
    http_client: Client,
    base_url: String,
}

impl FearGreedClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different host (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn into_reading(block: FearGreedBlock) -> SentimentReading {
        let description = if block.rating.trim().is_empty() {
            "Unknown".to_string()
        } else {
            block.rating
        };
        SentimentReading {
            value: block.score,
            description,
            last_update: block.timestamp,
        }
    }
}

#[async_trait]
impl SentimentSource for FearGreedClient {
    async fn fetch_sentiment(&self) -> Result<SentimentReading, FetchError> {
        let url = format!("{}/index/fearandgreed/graphdata", self.base_url);
        debug!("Fetching Fear & Greed index from {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let payload: GraphData = response.json().await?;
        Ok(Self::into_reading(payload.fear_and_greed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_graphdata_payload() {
        let payload: GraphData = serde_json::from_str(
            r#"{
                "fear_and_greed": {
                    "score": 27.5,
                    "rating": "fear",
                    "timestamp": "2024-01-02T16:00:00+00:00",
                    "previous_close": 30.1
                }
            }"#,
        )
        .unwrap();
        let reading = FearGreedClient::into_reading(payload.fear_and_greed);
        assert_eq!(reading.value, 27.5);
        assert_eq!(reading.description, "fear");
        assert_eq!(reading.last_update, "2024-01-02T16:00:00+00:00");
    }

    #[test]
    fn test_blank_rating_becomes_unknown() {
        let block = FearGreedBlock {
            score: 50.0,
            rating: "  ".to_string(),
            timestamp: "2024-01-02".to_string(),
        };
        let reading = FearGreedClient::into_reading(block);
        assert_eq!(reading.description, "Unknown");
    }
}
