// ============================================================
// Layer 5 — Early-Stopping Policy
// ============================================================
// Two-tier policy over the per-epoch validation-accuracy history:
//
//   StopSufficient — accuracy is good enough; keep the model,
//                    further training is not worth the cost.
//   StopStagnant   — accuracy is near the ceiling AND has stopped
//                    growing over the last `stagnation_window`
//                    epochs; stop without saving and let the
//                    caller decide whether to retry.
//
// The thresholds are policy, not structure — they stay
// configurable and only default to the hand-tuned values.

use serde::{Deserialize, Serialize};

/// What the training session should do after an epoch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochDecision {
    Continue,
    StopSufficient,
    StopStagnant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopPolicy {
    /// Validation accuracy (percent) at which training stops and
    /// the artifact is persisted.
    pub sufficient_accuracy: f64,
    /// Validation accuracy (percent) above which a plateau aborts
    /// training without saving.
    pub stagnation_accuracy: f64,
    /// How many trailing accuracy samples the growth check spans.
    /// The check needs `stagnation_window + 1` recorded epochs
    /// before it can trigger at all.
    pub stagnation_window: usize,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            sufficient_accuracy: 96.5,
            stagnation_accuracy: 99.0,
            stagnation_window: 10,
        }
    }
}

impl StopPolicy {
    /// Assess the accuracy history after an epoch appended to it.
    /// The sufficiency check runs first.
    pub fn assess(&self, history: &[f64]) -> EpochDecision {
        let last = match history.last() {
            Some(last) => *last,
            None => return EpochDecision::Continue,
        };
        if last >= self.sufficient_accuracy {
            return EpochDecision::StopSufficient;
        }
        if last >= self.stagnation_accuracy && !self.accuracy_grows(history) {
            return EpochDecision::StopStagnant;
        }
        EpochDecision::Continue
    }

    /// True while the summed epoch-to-epoch deltas over the last
    /// `stagnation_window` samples are positive — or while there
    /// are not yet enough samples to judge.
    fn accuracy_grows(&self, history: &[f64]) -> bool {
        if history.len() <= self.stagnation_window {
            return true;
        }
        let tail = &history[history.len() - self.stagnation_window..];
        let sum_deltas: f64 = tail.windows(2).map(|pair| pair[1] - pair[0]).sum();
        sum_deltas > 0.0
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// A policy whose stagnation tier can actually be reached
    /// (with the defaults the sufficiency tier preempts it).
    fn stagnation_only_policy() -> StopPolicy {
        StopPolicy {
            sufficient_accuracy: 99.9,
            stagnation_accuracy: 99.0,
            stagnation_window: 10,
        }
    }

    #[test]
    fn test_sufficient_fires_regardless_of_history_length() {
        let policy = StopPolicy::default();
        assert_eq!(policy.assess(&[97.0]), EpochDecision::StopSufficient);
    }

    #[test]
    fn test_flat_history_below_ceiling_is_not_stagnant() {
        // 11 points, last-10 deltas sum to -0.5, but the 99.0
        // threshold is never crossed: not a stagnation stop.
        let history = [97.0, 97.0, 97.0, 97.0, 97.0, 97.0, 97.0, 97.0, 97.0, 97.0, 96.5];
        let decision = stagnation_only_policy().assess(&history);
        assert_ne!(decision, EpochDecision::StopStagnant);
    }

    #[test]
    fn test_plateau_above_ceiling_is_stagnant() {
        let mut history = vec![90.0, 95.0];
        history.extend([99.2, 99.2, 99.2, 99.2, 99.2, 99.2, 99.2, 99.2, 99.2, 99.1]);
        assert_eq!(
            stagnation_only_policy().assess(&history),
            EpochDecision::StopStagnant
        );
    }

    #[test]
    fn test_stagnation_needs_eleven_epochs() {
        // Ten flat samples at 99.2: too short for the growth check,
        // so training continues.
        let history = vec![99.2; 10];
        assert_eq!(
            stagnation_only_policy().assess(&history),
            EpochDecision::Continue
        );
    }

    #[test]
    fn test_growing_accuracy_continues() {
        let mut history = vec![99.0];
        history.extend((0..10).map(|i| 99.0 + 0.05 * f64::from(i)));
        assert_eq!(
            stagnation_only_policy().assess(&history),
            EpochDecision::Continue
        );
    }

    #[test]
    fn test_below_both_thresholds_continues() {
        let policy = StopPolicy::default();
        assert_eq!(policy.assess(&[50.0, 60.0, 70.0]), EpochDecision::Continue);
    }

    #[test]
    fn test_empty_history_continues() {
        assert_eq!(StopPolicy::default().assess(&[]), EpochDecision::Continue);
    }
}
