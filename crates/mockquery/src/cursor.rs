//! Current results of a statement.
//!
//! ## State Transitions
//!
//! ```text
//! Empty -> ResultSetActive     (query executed)
//! Empty -> UpdateCountActive   (update executed)
//! *     -> ResultSetActive / UpdateCountActive (next execution)
//! *     -> Closed              (close())
//! ```
//!
//! Every transition closes the result sets it replaces. Generated keys ride
//! on a side channel that only executions touch.

use crate::result_set::ResultSet;

/// Identifier of the result set returned when no keys were generated.
pub const NO_GENERATED_KEYS_ID: &str = "Last statement did not generate any keys";

/// Observable state of a statement's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing executed yet.
    Empty,
    /// The last execution produced result sets.
    ResultSetActive,
    /// The last execution produced update counts.
    UpdateCountActive,
    /// The statement was closed.
    Closed,
}

#[derive(Debug, Default)]
enum Active {
    #[default]
    None,
    ResultSets {
        sets: Vec<ResultSet>,
        index: usize,
    },
    UpdateCounts {
        counts: Vec<i32>,
        index: usize,
    },
}

/// Holder of the last execution's result sets or update counts.
#[derive(Debug, Default)]
pub(crate) struct Cursor {
    active: Active,
    generated_keys: Option<ResultSet>,
    closed: bool,
}

impl Cursor {
    pub(crate) fn state(&self) -> CursorState {
        if self.closed {
            return CursorState::Closed;
        }
        match self.active {
            Active::None => CursorState::Empty,
            Active::ResultSets { .. } => CursorState::ResultSetActive,
            Active::UpdateCounts { .. } => CursorState::UpdateCountActive,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    fn close_current_result_sets(&mut self) {
        if let Active::ResultSets { sets, .. } = &self.active {
            sets.iter().for_each(ResultSet::close);
        }
    }

    pub(crate) fn set_result_sets(&mut self, sets: Vec<ResultSet>) {
        self.close_current_result_sets();
        self.active = Active::ResultSets { sets, index: 0 };
        self.closed = false;
    }

    pub(crate) fn set_update_counts(&mut self, counts: Vec<i32>) {
        self.close_current_result_sets();
        self.active = Active::UpdateCounts { counts, index: 0 };
        self.closed = false;
    }

    pub(crate) fn result_set(&self) -> Option<&ResultSet> {
        match &self.active {
            Active::ResultSets { sets, index } => sets.get(*index),
            _ => None,
        }
    }

    pub(crate) fn update_count(&self) -> i32 {
        match &self.active {
            Active::UpdateCounts { counts, index } => counts.get(*index).copied().unwrap_or(-1),
            _ => -1,
        }
    }

    /// Advance to the next result. Returns whether a further result set is
    /// available.
    pub(crate) fn more_results(&mut self, close_current: bool) -> bool {
        match &mut self.active {
            Active::ResultSets { sets, index } => {
                if *index < sets.len() {
                    if close_current {
                        sets[*index].close();
                    }
                    *index += 1;
                }
                *index < sets.len()
            }
            Active::UpdateCounts { counts, index } => {
                if *index < counts.len() {
                    *index += 1;
                }
                false
            }
            Active::None => false,
        }
    }

    pub(crate) fn set_generated_keys(&mut self, keys: Option<ResultSet>) {
        self.generated_keys = keys;
    }

    /// A fresh copy of the generated keys, or the explicit empty result set.
    pub(crate) fn generated_keys(&self) -> ResultSet {
        self.generated_keys
            .as_ref()
            .map_or_else(|| ResultSet::new(NO_GENERATED_KEYS_ID), ResultSet::fresh_copy)
    }

    pub(crate) fn close(&mut self) {
        self.close_current_result_sets();
        self.closed = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn sets(ids: &[&str]) -> Vec<ResultSet> {
        ids.iter().map(|id| ResultSet::new(*id)).collect()
    }

    #[test]
    fn test_initial_state() {
        let cursor = Cursor::default();
        assert_eq!(cursor.state(), CursorState::Empty);
        assert!(cursor.result_set().is_none());
        assert_eq!(cursor.update_count(), -1);
    }

    #[test]
    fn test_cycle_result_sets() {
        let mut cursor = Cursor::default();
        cursor.set_result_sets(sets(&["a", "b"]));
        assert_eq!(cursor.state(), CursorState::ResultSetActive);
        assert_eq!(cursor.result_set().unwrap().id(), "a");
        assert!(cursor.more_results(true));
        assert_eq!(cursor.result_set().unwrap().id(), "b");
        assert!(!cursor.more_results(true));
        assert!(cursor.result_set().is_none());
        assert!(!cursor.more_results(true));
    }

    #[test]
    fn test_more_results_closes_only_when_asked() {
        let mut cursor = Cursor::default();
        cursor.set_result_sets(sets(&["a", "b", "c"]));
        cursor.more_results(false);
        cursor.more_results(true);
        let Active::ResultSets { sets, .. } = &cursor.active else {
            panic!("expected result sets");
        };
        assert!(!sets[0].is_closed());
        assert!(sets[1].is_closed());
        assert!(!sets[2].is_closed());
    }

    #[test]
    fn test_update_counts_never_report_more_result_sets() {
        let mut cursor = Cursor::default();
        cursor.set_update_counts(vec![1, 2]);
        assert_eq!(cursor.update_count(), 1);
        assert!(!cursor.more_results(true));
        assert_eq!(cursor.update_count(), 2);
        assert!(!cursor.more_results(true));
        assert_eq!(cursor.update_count(), -1);
    }

    #[test]
    fn test_new_execution_replaces_results() {
        let mut cursor = Cursor::default();
        cursor.set_result_sets(sets(&["a", "b"]));
        cursor.more_results(true);
        cursor.set_update_counts(vec![3]);
        assert_eq!(cursor.state(), CursorState::UpdateCountActive);
        assert!(cursor.result_set().is_none());
        cursor.set_result_sets(sets(&["c"]));
        assert_eq!(cursor.result_set().unwrap().id(), "c");
        assert_eq!(cursor.update_count(), -1);
    }

    #[test]
    fn test_close() {
        let mut cursor = Cursor::default();
        cursor.set_result_sets(sets(&["a"]));
        cursor.close();
        assert_eq!(cursor.state(), CursorState::Closed);
        assert!(cursor.result_set().unwrap().is_closed());
        cursor.set_update_counts(vec![1]);
        assert_eq!(cursor.state(), CursorState::UpdateCountActive);
    }

    #[test]
    fn test_generated_keys_default() {
        let mut cursor = Cursor::default();
        assert_eq!(cursor.generated_keys().id(), NO_GENERATED_KEYS_ID);
        cursor.set_generated_keys(Some(ResultSet::new("keys")));
        assert_eq!(cursor.generated_keys().id(), "keys");
    }
}
