//! Drawdown domain - peak/trough reduction and historical frequency

mod calculator;
mod frequency;

pub use calculator::{compute_ath_and_lowest, compute_metrics, metrics_from_series, DrawdownMetrics};
pub use frequency::{count_days_at_or_below, frequency_map};
