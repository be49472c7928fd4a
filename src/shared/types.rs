//! Common types used across the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One index's historical close prices, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub closes: Vec<f64>,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, closes: Vec<f64>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            closes,
            fetched_at,
        }
    }

    /// Most recent close, i.e. the last element of the chronological series
    pub fn latest_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Market sentiment gauge reading (CNN Fear & Greed Index)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub value: f64,
    pub description: String,
    pub last_update: String,
}

/// One threshold crossing produced by an evaluation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub symbol: String,
    pub display_name: String,
    pub threshold_pct: u32,
    pub drawdown_pct: f64,
    pub day_count: usize,
    pub total_days: usize,
}

/// An index to watch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSymbol {
    pub symbol: String,
    pub display_name: String,
}

impl IndexSymbol {
    pub fn new(symbol: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
        }
    }
}

/// Watch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub indices: Vec<IndexSymbol>,
    pub thresholds_pct: Vec<u32>,
    pub history_years: u32,
    pub cache_ttl_secs: u64,
    pub check_interval_secs: u64,
    pub http_timeout_secs: u64,
    pub state_path: PathBuf,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            indices: vec![
                IndexSymbol::new("^GSPC", "S&P 500"),
                IndexSymbol::new("^NDX", "NASDAQ-100"),
            ],
            thresholds_pct: vec![5, 10, 15, 20],
            history_years: 20,
            cache_ttl_secs: 3600,
            check_interval_secs: 30 * 60,
            http_timeout_secs: 15,
            state_path: PathBuf::from("data/alert_state.json"),
        }
    }
}
