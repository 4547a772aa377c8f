//! Elapsed-time calculation

use serde::{Deserialize, Serialize};

/// Elapsed result of one competitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Elapsed {
    /// Seconds between the first and last observation, never negative.
    Complete(i64),
    /// Fewer than two observations, or data that yields no sensible duration.
    Incomplete,
}

impl Elapsed {
    pub fn seconds(self) -> Option<i64> {
        match self {
            Elapsed::Complete(secs) => Some(secs),
            Elapsed::Incomplete => None,
        }
    }

    pub fn is_complete(self) -> bool {
        matches!(self, Elapsed::Complete(_))
    }
}

/// Reduce a sorted observation sequence to its elapsed duration.
///
/// A negative or overflowing difference counts as incomplete.
pub fn elapsed(sorted: &[i64]) -> Elapsed {
    match sorted {
        [first, .., last] => match last.checked_sub(*first) {
            Some(secs) if secs >= 0 => Elapsed::Complete(secs),
            _ => Elapsed::Incomplete,
        },
        _ => Elapsed::Incomplete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_sequences_are_incomplete() {
        assert_eq!(elapsed(&[]), Elapsed::Incomplete);
        assert_eq!(elapsed(&[100]), Elapsed::Incomplete);
    }

    #[test]
    fn elapsed_is_last_minus_first() {
        assert_eq!(elapsed(&[100, 130, 160]), Elapsed::Complete(60));
        assert_eq!(elapsed(&[100, 100]), Elapsed::Complete(0));
    }

    #[test]
    fn anomalies_are_incomplete() {
        // unsorted input standing in for a clock anomaly
        assert_eq!(elapsed(&[200, 100]), Elapsed::Incomplete);
        assert_eq!(elapsed(&[i64::MIN, i64::MAX]), Elapsed::Incomplete);
    }

    proptest! {
        #[test]
        fn elapsed_is_deterministic(mut seq in prop::collection::vec(-1_000_000i64..1_000_000, 0..30)) {
            seq.sort();
            let result = elapsed(&seq);
            if seq.len() < 2 {
                prop_assert_eq!(result, Elapsed::Incomplete);
            } else {
                prop_assert_eq!(result, Elapsed::Complete(seq[seq.len() - 1] - seq[0]));
            }
            prop_assert_eq!(result, elapsed(&seq));
        }
    }
}
