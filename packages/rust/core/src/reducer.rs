//! Merge registry: the closed set of strategies that combine a stage's
//! proposed field value with the current one.
//!
//! Every strategy is a total, pure function. Absent proposals, empty
//! sequences and zero counters are ordinary inputs, never errors.

use std::fmt;

/// Maximum number of records kept in the bounded history log.
pub const HISTORY_LIMIT: usize = 5;

/// How a proposed value is folded into the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Keep the current value unless a new one is proposed.
    ReplaceIfPresent,
    /// Append proposed items, then keep only the newest `max_len`.
    AppendThenTrim { max_len: usize },
    /// Add one whenever the field is touched; the proposed content is ignored.
    IncrementByOne,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplaceIfPresent => f.write_str("replace-if-present"),
            Self::AppendThenTrim { max_len } => write!(f, "append-then-trim({max_len})"),
            Self::IncrementByOne => f.write_str("increment-by-one"),
        }
    }
}

/// `replace-if-present`.
pub fn replace_if_present<T>(current: T, proposed: Option<T>) -> T {
    proposed.unwrap_or(current)
}

/// `append-then-trim(max_len)`: proposed items land at the end in arrival
/// order; the oldest items are evicted first.
pub fn append_then_trim<T>(mut current: Vec<T>, proposed: Vec<T>, max_len: usize) -> Vec<T> {
    current.extend(proposed);
    if current.len() > max_len {
        let excess = current.len() - max_len;
        current.drain(..excess);
    }
    current
}

/// `increment-by-one`: an absent proposal leaves the counter alone, any
/// present proposal (whatever it carries) counts as one increment.
pub fn increment_by_one<T>(current: u64, proposed: Option<T>) -> u64 {
    match proposed {
        Some(_) => current.saturating_add(1),
        None => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn replace_keeps_current_when_absent() {
        assert_eq!(replace_if_present(Some("a"), None), Some("a"));
        assert_eq!(replace_if_present(vec![1, 2], None), vec![1, 2]);
    }

    #[test]
    fn replace_takes_proposal_even_if_empty() {
        assert_eq!(replace_if_present(vec![1, 2], Some(vec![])), Vec::<i32>::new());
        assert_eq!(replace_if_present(Some("a"), Some(None)), None);
    }

    #[test]
    fn append_trims_from_front() {
        let merged = append_then_trim(vec![1, 2, 3, 4], vec![5, 6, 7], 5);
        assert_eq!(merged, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn append_handles_empty_and_zero_cap() {
        assert_eq!(append_then_trim(Vec::<u8>::new(), vec![], 5), Vec::<u8>::new());
        assert_eq!(append_then_trim(vec![1, 2], vec![3], 0), Vec::<i32>::new());
    }

    #[test]
    fn increment_ignores_proposed_content() {
        assert_eq!(increment_by_one(0, Some(41_u64)), 1);
        assert_eq!(increment_by_one(7, Some("anything")), 8);
        assert_eq!(increment_by_one::<u64>(7, None), 7);
        assert_eq!(increment_by_one(u64::MAX, Some(())), u64::MAX);
    }

    #[test]
    fn strategy_display() {
        assert_eq!(
            MergeStrategy::AppendThenTrim { max_len: HISTORY_LIMIT }.to_string(),
            "append-then-trim(5)"
        );
    }

    proptest! {
        #[test]
        fn append_never_exceeds_cap(
            batches in prop::collection::vec(prop::collection::vec(any::<u16>(), 0..8), 0..20),
            max_len in 0usize..10,
        ) {
            let mut log = Vec::new();
            let mut arrived = Vec::new();
            for batch in batches {
                arrived.extend(batch.iter().copied());
                log = append_then_trim(log, batch, max_len);
                prop_assert!(log.len() <= max_len);
            }
            let expected_start = arrived.len().saturating_sub(max_len);
            prop_assert_eq!(log, arrived[expected_start..].to_vec());
        }

        #[test]
        fn increment_counts_operations(
            proposals in prop::collection::vec(any::<Option<i64>>(), 0..50),
        ) {
            let mut counter = 0_u64;
            for proposed in &proposals {
                let before = counter;
                counter = increment_by_one(counter, *proposed);
                prop_assert!(counter >= before);
            }
            let touched = proposals.iter().filter(|p| p.is_some()).count() as u64;
            prop_assert_eq!(counter, touched);
        }

        #[test]
        fn replace_is_total(current in any::<Option<String>>(), proposed in any::<Option<Option<String>>>()) {
            let expected = proposed.clone().unwrap_or_else(|| current.clone());
            prop_assert_eq!(replace_if_present(current, proposed), expected);
        }
    }
}
