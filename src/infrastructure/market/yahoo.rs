//! Yahoo Finance chart API price source

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{PriceSource, USER_AGENT};
use crate::shared::errors::FetchError;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

/// Daily close history via the public chart endpoint
pub struct YahooChartClient {
    http_client: Client,
    base_url: String,
}

impl YahooChartClient {
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

    fn extract_closes(response: ChartResponse, symbol: &str) -> Result<Vec<f64>, FetchError> {
        if let Some(error) = response.chart.error {
            if !error.is_null() {
                return Err(FetchError::Payload(format!(
                    "chart error for {}: {}",
                    symbol, error
                )));
            }
        }
        let result = response
            .chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| FetchError::Payload(format!("no chart result for {}", symbol)))?;
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Payload(format!("no quote block for {}", symbol)))?;
        // Nulls mark holidays and half-sessions; drop them.
        let closes: Vec<f64> = quote.close.unwrap_or_default().into_iter().flatten().collect();
        Ok(closes)
    }
}

#[async_trait]
impl PriceSource for YahooChartClient {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<f64>, FetchError> {
        // Index symbols carry a caret (^GSPC), which must be escaped in the path.
        let encoded = symbol.replace('^', "%5E");
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            encoded,
            start.timestamp(),
            end.timestamp()
        );
        debug!("Fetching price history for {} from {}", symbol, url);

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let payload: ChartResponse = response.json().await?;
        Self::extract_closes(payload, symbol)
    }
}
