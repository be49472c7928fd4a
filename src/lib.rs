//! Indexwatch - index drawdown monitor with hysteresis alerts
//! Built with Domain-Driven Design principles

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::monitor::{DrawdownMonitor, TickReport};
pub use domain::alert::{AlertKey, AlertState};
pub use domain::drawdown::{
    compute_ath_and_lowest, compute_metrics, frequency_map, DrawdownMetrics,
};
pub use infrastructure::cache::DataCache;
pub use shared::types::{PriceSeries, WatchConfig};
