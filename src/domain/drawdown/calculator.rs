//! Drawdown metrics from an ordered close-price series

use serde::{Deserialize, Serialize};

use crate::shared::errors::MetricsError;
use crate::shared::types::PriceSeries;

/// Drawdown metrics for one index, derived fresh from the full price history.
/// Percentages are raw ratio arithmetic; rounding is a presentation concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownMetrics {
    pub current_price: f64,
    pub ath: f64,
    pub current_drawdown_pct: f64,
    pub lowest_since_ath: f64,
    pub drawdown_at_lowest_pct: f64,
    pub gain_from_lowest_pct: f64,
    pub gain_to_ath_from_current_pct: f64,
    pub gain_to_ath_from_lowest_pct: f64,
}

/// Single left-to-right scan over chronological closes (oldest first).
/// A new ATH resets the running trough to the ATH itself, so the trough is
/// always the minimum observed strictly after the most recent peak.
pub fn compute_ath_and_lowest(closes: &[f64]) -> (f64, f64) {
    let Some((&first, rest)) = closes.split_first() else {
        return (0.0, 0.0);
    };
    let mut ath = first;
    let mut lowest_since_ath = first;
    for &price in rest {
        if price > ath {
            ath = price;
            lowest_since_ath = price;
        } else if price < lowest_since_ath {
            lowest_since_ath = price;
        }
    }
    (ath, lowest_since_ath)
}

/// Derive percentage metrics from current price, ATH and lowest since ATH.
/// A non-positive ATH means the peak-tracking invariant was violated
/// upstream and fails loudly.
pub fn compute_metrics(
    current_price: f64,
    ath: f64,
    lowest_since_ath: f64,
) -> Result<DrawdownMetrics, MetricsError> {
    if ath <= 0.0 {
        return Err(MetricsError::InvalidAth(ath));
    }

    let current_drawdown_pct = (current_price / ath - 1.0) * 100.0;
    let drawdown_at_lowest_pct = (lowest_since_ath / ath - 1.0) * 100.0;

    let gain_from_lowest_pct = if lowest_since_ath > 0.0 {
        (current_price / lowest_since_ath - 1.0) * 100.0
    } else {
        0.0
    };
    let gain_to_ath_from_current_pct = if current_price > 0.0 {
        (ath / current_price - 1.0) * 100.0
    } else {
        0.0
    };
    let gain_to_ath_from_lowest_pct = if lowest_since_ath > 0.0 {
        (ath / lowest_since_ath - 1.0) * 100.0
    } else {
        0.0
    };

    Ok(DrawdownMetrics {
        current_price,
        ath,
        current_drawdown_pct,
        lowest_since_ath,
        drawdown_at_lowest_pct,
        gain_from_lowest_pct,
        gain_to_ath_from_current_pct,
        gain_to_ath_from_lowest_pct,
    })
}

/// Metrics straight from a fetched series. Requires at least two closes.
pub fn metrics_from_series(series: &PriceSeries) -> Result<DrawdownMetrics, MetricsError> {
    if series.closes.len() < 2 {
        return Err(MetricsError::InsufficientHistory(series.closes.len()));
    }
    let current_price = series.closes[series.closes.len() - 1];
    let (ath, lowest_since_ath) = compute_ath_and_lowest(&series.closes);
    compute_metrics(current_price, ath, lowest_since_ath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_scan_empty_and_single() {
        assert_eq!(compute_ath_and_lowest(&[]), (0.0, 0.0));
        assert_eq!(compute_ath_and_lowest(&[42.5]), (42.5, 42.5));
    }

    #[test]
    fn test_scan_tracks_trough_after_peak() {
        let (ath, lowest) = compute_ath_and_lowest(&[100.0, 120.0, 110.0, 115.0]);
        assert_close(ath, 120.0);
        assert_close(lowest, 110.0);
    }

    #[test]
    fn test_scan_new_ath_resets_trough() {
        // New ATH at 105 erases the 90 trough; 102 is the only post-peak value.
        let (ath, lowest) = compute_ath_and_lowest(&[100.0, 90.0, 95.0, 105.0, 102.0]);
        assert_close(ath, 105.0);
        assert_close(lowest, 102.0);
    }

    #[test]
    fn test_scan_ath_is_sequence_maximum() {
        let sequences: &[&[f64]] = &[
            &[1.0, 2.0, 3.0],
            &[3.0, 2.0, 1.0],
            &[100.0, 90.0, 95.0, 105.0, 102.0],
            &[50.0, 50.0, 50.0],
        ];
        for closes in sequences {
            let (ath, _) = compute_ath_and_lowest(closes);
            let max = closes.iter().cloned().fold(f64::MIN, f64::max);
            assert_close(ath, max);
        }
    }

    #[test]
    fn test_metrics_at_ath() {
        let m = compute_metrics(100.0, 100.0, 80.0).unwrap();
        assert_close(m.current_drawdown_pct, 0.0);
        assert_close(m.gain_from_lowest_pct, 25.0);
        assert_close(m.gain_to_ath_from_current_pct, 0.0);
        assert_close(m.gain_to_ath_from_lowest_pct, 25.0);
        assert_close(m.drawdown_at_lowest_pct, -20.0);
    }

    #[test]
    fn test_metrics_in_drawdown() {
        let m = compute_metrics(90.0, 100.0, 80.0).unwrap();
        assert_close(m.current_drawdown_pct, -10.0);
        assert_close(m.gain_from_lowest_pct, 12.5);
        assert!((m.gain_to_ath_from_current_pct - 11.111111).abs() < 1e-5);
    }

    #[test]
    fn test_metrics_rejects_non_positive_ath() {
        assert_eq!(
            compute_metrics(100.0, 0.0, 80.0),
            Err(MetricsError::InvalidAth(0.0))
        );
        assert!(compute_metrics(100.0, -1.0, 80.0).is_err());
    }

    #[test]
    fn test_metrics_guards_zero_denominators() {
        let m = compute_metrics(0.0, 100.0, 0.0).unwrap();
        assert_close(m.gain_from_lowest_pct, 0.0);
        assert_close(m.gain_to_ath_from_current_pct, 0.0);
        assert_close(m.gain_to_ath_from_lowest_pct, 0.0);
    }

    #[test]
    fn test_metrics_from_series_needs_two_closes() {
        let series = PriceSeries::new("^GSPC", vec![100.0], Utc::now());
        assert_eq!(
            metrics_from_series(&series),
            Err(MetricsError::InsufficientHistory(1))
        );

        let series = PriceSeries::new("^GSPC", vec![100.0, 95.0], Utc::now());
        let m = metrics_from_series(&series).unwrap();
        assert_close(m.current_drawdown_pct, -5.0);
    }
}
