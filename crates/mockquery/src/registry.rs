//! Registered responses.
//!
//! Each response kind lives in its own [`KeyedResponses`] table: an ordered
//! list of entries keyed by SQL and, optionally, by a parameter map. Lookups
//! walk the table in registration order and stop at the first entry whose key
//! matches, so earlier registrations win ambiguous matches.
//!
//! ## Lookup order
//!
//! 1. Entries registered with parameters, when the statement has parameters
//! 2. Entries registered with SQL alone
//!
//! The [`Registry`] groups one table per response kind with the global
//! fallbacks used when no keyed entry matches.

use crate::error::Error;
use crate::matcher::{KeyPattern, SqlMatcher};
use crate::params::{ParameterMap, parameters_match};
use crate::result_set::ResultSet;

/// A registered entry, as returned by introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredResponse<T> {
    /// SQL key.
    pub sql: String,
    /// Parameter key, if registered with parameters.
    pub parameters: Option<ParameterMap>,
    /// The registered value.
    pub value: T,
}

/// An ordered table of responses of one kind.
#[derive(Debug, Clone)]
pub struct KeyedResponses<T> {
    entries: Vec<RegisteredResponse<T>>,
    /// One per entry, same order.
    patterns: Vec<KeyPattern>,
}

impl<T> Default for KeyedResponses<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

impl<T> KeyedResponses<T> {
    /// Register `value` under `sql` and optional `parameters`.
    ///
    /// An entry with the same key is replaced in place and keeps its
    /// position; otherwise the entry is appended.
    pub fn insert(&mut self, sql: impl Into<String>, parameters: Option<ParameterMap>, value: T) {
        let sql = sql.into();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.sql == sql && e.parameters == parameters)
        {
            existing.value = value;
            return;
        }
        self.patterns.push(KeyPattern::new(sql.as_str()));
        self.entries.push(RegisteredResponse {
            sql,
            parameters,
            value,
        });
    }

    /// Every value whose key matches, in lookup order.
    ///
    /// Parameter-keyed entries are only considered when `parameters` is
    /// given. `exact_parameters` requires the registered map to equal the
    /// statement's map instead of being a subset of it.
    pub fn matching<'a, 's>(
        &'a self,
        sql: &'s str,
        parameters: Option<&'s ParameterMap>,
        matcher: SqlMatcher,
        exact_parameters: bool,
    ) -> impl Iterator<Item = &'a T> {
        let with_parameters = self.entries.iter().zip(&self.patterns).filter(move |(e, key)| {
            let (Some(registered), Some(actual)) = (&e.parameters, parameters) else {
                return false;
            };
            key.matches(matcher, sql) && parameters_match(registered, actual, exact_parameters)
        });
        let sql_only = self
            .entries
            .iter()
            .zip(&self.patterns)
            .filter(move |(e, key)| e.parameters.is_none() && key.matches(matcher, sql));
        with_parameters.chain(sql_only).map(|(e, _)| &e.value)
    }

    /// The first value whose key matches.
    pub fn find<'a>(
        &'a self,
        sql: &str,
        parameters: Option<&ParameterMap>,
        matcher: SqlMatcher,
        exact_parameters: bool,
    ) -> Option<&'a T> {
        self.matching(sql, parameters, matcher, exact_parameters).next()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entry is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.patterns.clear();
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[RegisteredResponse<T>] {
        &self.entries
    }
}

impl<T: Clone> KeyedResponses<T> {
    /// Owned copy of every entry.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RegisteredResponse<T>> {
        self.entries.clone()
    }
}

/// Every response table and global fallback of one handler.
#[derive(Debug, Clone)]
pub(crate) struct Registry {
    pub(crate) result_sets: KeyedResponses<ResultSet>,
    pub(crate) multi_result_sets: KeyedResponses<Vec<ResultSet>>,
    pub(crate) update_counts: KeyedResponses<i32>,
    pub(crate) multi_update_counts: KeyedResponses<Vec<i32>>,
    pub(crate) errors: KeyedResponses<Error>,
    pub(crate) generated_keys: KeyedResponses<ResultSet>,
    pub(crate) out_parameters: KeyedResponses<ParameterMap>,
    pub(crate) returns_result_set: KeyedResponses<bool>,

    pub(crate) global_result_set: ResultSet,
    pub(crate) global_result_sets: Option<Vec<ResultSet>>,
    pub(crate) global_update_count: i32,
    pub(crate) global_update_counts: Option<Vec<i32>>,
    pub(crate) global_generated_keys: Option<ResultSet>,
    pub(crate) global_out_parameters: ParameterMap,
    pub(crate) global_returns_result_set: Option<bool>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            result_sets: KeyedResponses::default(),
            multi_result_sets: KeyedResponses::default(),
            update_counts: KeyedResponses::default(),
            multi_update_counts: KeyedResponses::default(),
            errors: KeyedResponses::default(),
            generated_keys: KeyedResponses::default(),
            out_parameters: KeyedResponses::default(),
            returns_result_set: KeyedResponses::default(),
            global_result_set: ResultSet::new(""),
            global_result_sets: None,
            global_update_count: 0,
            global_update_counts: None,
            global_generated_keys: None,
            global_out_parameters: ParameterMap::new(),
            global_returns_result_set: None,
        }
    }
}

impl Registry {
    /// Drop every keyed entry and reset the global fallbacks.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
