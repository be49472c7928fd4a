//! Historical drawdown frequency over a close-price series

use std::collections::HashMap;

/// Count trading days that closed at or below `threshold_pct` from the
/// then-ATH. `threshold_pct` is negative, e.g. -5.0 for "5% drawdown or
/// worse"; a non-negative threshold always yields 0.
pub fn count_days_at_or_below(closes: &[f64], threshold_pct: f64) -> usize {
    if closes.is_empty() || threshold_pct >= 0.0 {
        return 0;
    }
    let threshold_ratio = 1.0 + threshold_pct / 100.0;
    let mut ath = closes[0];
    let mut count = 0;
    for &price in closes {
        if price > ath {
            ath = price;
        }
        if ath > 0.0 && price / ath <= threshold_ratio {
            count += 1;
        }
    }
    count
}

/// Days at or below each positive threshold (5 means "-5% or worse").
/// A day at -15% counts toward the 5, 10 and 15 buckets; callers control
/// which thresholds they pass in. Each threshold rescans the series, which
/// is accepted: the history window is a few thousand trading days.
pub fn frequency_map(closes: &[f64], thresholds_pct: &[u32]) -> HashMap<u32, usize> {
    thresholds_pct
        .iter()
        .map(|&t| (t, count_days_at_or_below(closes, -(t as f64))))
        .collect()
}
