//! Alert hysteresis: one alert per (symbol, threshold) until genuine recovery

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Identity of one alert condition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    pub symbol: String,
    pub threshold_pct: u32,
}

impl AlertKey {
    pub fn new(symbol: impl Into<String>, threshold_pct: u32) -> Self {
        Self {
            symbol: symbol.into(),
            threshold_pct,
        }
    }
}

/// Armed/disarmed state per alert key. Armed means the alert already fired
/// and the drawdown has not yet recovered above the threshold. The armed set
/// is only mutated through the transition methods.
#[derive(Debug, Default)]
pub struct AlertState {
    armed: HashSet<AlertKey>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the in-memory state with a persisted snapshot
    pub fn hydrate(&mut self, keys: HashSet<AlertKey>) {
        self.armed = keys;
    }

    /// Current armed set, for persistence
    pub fn snapshot(&self) -> HashSet<AlertKey> {
        self.armed.clone()
    }

    pub fn armed_len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_armed(&self, symbol: &str, threshold_pct: u32) -> bool {
        self.armed.contains(&AlertKey::new(symbol, threshold_pct))
    }

    /// Pure predicate: fire iff the drawdown is at or beyond the threshold
    /// and the key is currently disarmed. Does not mutate state.
    pub fn should_alert(
        &self,
        symbol: &str,
        threshold_pct: u32,
        current_drawdown_pct: f64,
    ) -> bool {
        if current_drawdown_pct > -(threshold_pct as f64) {
            return false;
        }
        !self.is_armed(symbol, threshold_pct)
    }

    /// Disarmed -> armed. Idempotent.
    pub fn mark_sent(&mut self, symbol: &str, threshold_pct: u32) {
        self.armed.insert(AlertKey::new(symbol, threshold_pct));
    }

    /// Disarm every configured threshold the drawdown has improved past.
    /// Thresholds not yet recovered stay armed.
    pub fn on_recovered(
        &mut self,
        symbol: &str,
        current_drawdown_pct: f64,
        thresholds_pct: &[u32],
    ) {
        for &threshold in thresholds_pct {
            if current_drawdown_pct > -(threshold as f64) {
                self.armed.remove(&AlertKey::new(symbol, threshold));
            }
        }
    }

    /// One evaluation cycle for a symbol. Recoveries are applied before any
    /// firing decision, so a threshold that recovered and re-breached since
    /// the last cycle fires again within this one. Returns the thresholds to
    /// alert on, already marked sent.
    pub fn evaluate_cycle(
        &mut self,
        symbol: &str,
        current_drawdown_pct: f64,
        thresholds_pct: &[u32],
    ) -> Vec<u32> {
        self.on_recovered(symbol, current_drawdown_pct, thresholds_pct);
        let mut fired = Vec::new();
        for &threshold in thresholds_pct {
            if self.should_alert(symbol, threshold, current_drawdown_pct) {
                self.mark_sent(symbol, threshold);
                fired.push(threshold);
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_alert_first_time_below_threshold() {
        let state = AlertState::new();
        assert!(state.should_alert("^GSPC", 5, -6.0));
        assert!(state.should_alert("^GSPC", 10, -11.0));
    }

    #[test]
    fn test_should_alert_false_above_threshold() {
        let state = AlertState::new();
        assert!(!state.should_alert("^GSPC", 5, -3.0));
        assert!(!state.should_alert("^GSPC", 5, 0.0));
    }

    #[test]
    fn test_should_alert_false_after_mark_sent() {
        let mut state = AlertState::new();
        state.mark_sent("^GSPC", 5);
        assert!(!state.should_alert("^GSPC", 5, -6.0));
    }

    #[test]
    fn test_mark_sent_is_idempotent() {
        let mut state = AlertState::new();
        state.mark_sent("^GSPC", 5);
        state.mark_sent("^GSPC", 5);
        assert_eq!(state.armed_len(), 1);
        assert!(state.is_armed("^GSPC", 5));
    }

    #[test]
    fn test_recovery_allows_alert_again() {
        let mut state = AlertState::new();
        state.mark_sent("^GSPC", 5);
        state.on_recovered("^GSPC", -3.0, &[5, 10]);
        assert!(state.should_alert("^GSPC", 5, -6.0));
    }

    #[test]
    fn test_partial_recovery_clears_only_improved_thresholds() {
        // At -6% we are still below -5% so 5 stays armed; we improved past
        // -10% so 10 is disarmed.
        let mut state = AlertState::new();
        state.mark_sent("^GSPC", 5);
        state.mark_sent("^GSPC", 10);
        state.on_recovered("^GSPC", -6.0, &[5, 10]);
        assert!(state.is_armed("^GSPC", 5));
        assert!(!state.is_armed("^GSPC", 10));
    }

    #[test]
    fn test_recovery_is_per_symbol() {
        let mut state = AlertState::new();
        state.mark_sent("^GSPC", 5);
        state.mark_sent("^NDX", 5);
        state.on_recovered("^GSPC", 0.0, &[5]);
        assert!(!state.is_armed("^GSPC", 5));
        assert!(state.is_armed("^NDX", 5));
    }

    #[test]
    fn test_evaluate_cycle_fires_once_per_breach() {
        let mut state = AlertState::new();
        assert_eq!(state.evaluate_cycle("^GSPC", -12.0, &[5, 10, 15]), vec![5, 10]);
        // Same condition next cycle: everything armed, nothing fires.
        assert_eq!(state.evaluate_cycle("^GSPC", -12.0, &[5, 10, 15]), Vec::<u32>::new());
    }

    #[test]
    fn test_evaluate_cycle_refires_after_recovery() {
        let mut state = AlertState::new();
        assert_eq!(state.evaluate_cycle("^GSPC", -6.0, &[5, 10]), vec![5]);
        // Recovered above -5%: disarms, nothing to fire.
        assert_eq!(state.evaluate_cycle("^GSPC", -3.0, &[5, 10]), Vec::<u32>::new());
        // Re-breached: fires again.
        assert_eq!(state.evaluate_cycle("^GSPC", -6.0, &[5, 10]), vec![5]);
    }

    #[test]
    fn test_hydrate_and_snapshot_round_trip() {
        let mut state = AlertState::new();
        state.mark_sent("^GSPC", 5);
        state.mark_sent("^NDX", 10);
        let snapshot = state.snapshot();

        let mut restored = AlertState::new();
        restored.hydrate(snapshot);
        assert!(restored.is_armed("^GSPC", 5));
        assert!(restored.is_armed("^NDX", 10));
        assert_eq!(restored.armed_len(), 2);
    }
}
