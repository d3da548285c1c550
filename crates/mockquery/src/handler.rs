//! Result-set handlers: registration, resolution and activity logs.
//!
//! A [`ResultSetHandler`] is a cheap shared handle. The connection keeps one
//! per statement kind and every statement it creates holds a clone, so
//! responses registered through any handle are seen by all statements of
//! that kind, and every execution lands in the same logs.
//!
//! ## Resolution
//!
//! For a query or an update, the handler answers with exactly one response:
//!
//! ```text
//! 1. keyed error            -> returned, statement NOT logged
//! 2. statement logged as executed
//! 3. keyed multi-valued     (result sets / update counts)
//! 4. keyed single-valued
//! 5. global multi-valued, if registered
//! 6. global single-valued
//! ```
//!
//! Errors have no global fallback; only keyed errors are raised.
//!
//! Keyed entries are checked in registration order with the handler's
//! [`SqlMatcher`]; for prepared and callable statements, entries registered
//! with parameters are checked before entries registered with SQL alone.
//!
//! Handlers use `Rc<RefCell<..>>` and are `!Send`: a handler
//! and its statements belong to one test thread.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::kind::{Callable, Parameterized, Plain, Prepared, StatementKind};
use crate::matcher::{MatchMode, SqlMatcher};
use crate::params::ParameterMap;
use crate::registry::{KeyedResponses, RegisteredResponse, Registry};
use crate::result_set::ResultSet;
use crate::sql;

/// Handler for plain statements.
pub type StatementHandler = ResultSetHandler<Plain>;
/// Handler for prepared statements.
pub type PreparedStatementHandler = ResultSetHandler<Prepared>;
/// Handler for callable statements.
pub type CallableStatementHandler = ResultSetHandler<Callable>;

/// A statement execution recorded by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    /// SQL text as executed.
    pub sql: String,
    /// Combined parameters at execution time; empty for plain statements.
    pub parameters: ParameterMap,
}

#[derive(Debug, Default)]
struct HandlerState {
    config: HandlerConfig,
    registry: Registry,
    executed: Vec<ExecutedStatement>,
    returned: Vec<ResultSet>,
}

impl HandlerState {
    fn matcher(&self) -> SqlMatcher {
        self.config.matcher()
    }

    fn find<'a, T>(
        &self,
        table: &'a KeyedResponses<T>,
        sql: &str,
        parameters: Option<&ParameterMap>,
    ) -> Option<&'a T> {
        table.find(
            sql,
            parameters,
            self.matcher(),
            self.config.exact_match_parameters,
        )
    }

    fn registered_error(&self, sql: &str, parameters: Option<&ParameterMap>) -> Option<Error> {
        self.find(&self.registry.errors, sql, parameters).cloned()
    }

    fn log_executed(&mut self, kind: &'static str, sql: &str, parameters: Option<&ParameterMap>) {
        tracing::debug!(
            kind = kind,
            operation = sql::extract_operation(sql),
            sql = sql,
            "statement executed"
        );
        self.executed.push(ExecutedStatement {
            sql: sql.to_owned(),
            parameters: parameters.cloned().unwrap_or_default(),
        });
    }
}

/// Registered result sets are stored as detached copies, so later changes to
/// the caller's handle do not alter the template.
fn detached(sets: &[ResultSet]) -> Vec<ResultSet> {
    sets.iter().map(ResultSet::deep_copy).collect()
}

fn detach_entries<T>(
    entries: Vec<RegisteredResponse<T>>,
    copy: impl Fn(&T) -> T,
) -> Vec<RegisteredResponse<T>> {
    entries
        .into_iter()
        .map(|entry| RegisteredResponse {
            value: copy(&entry.value),
            ..entry
        })
        .collect()
}

/// Registry of canned responses for one statement kind.
///
/// Methods take `&self`; state is shared by every clone of the handle.
pub struct ResultSetHandler<K: StatementKind> {
    state: Rc<RefCell<HandlerState>>,
    _kind: PhantomData<K>,
}

impl<K: StatementKind> Clone for ResultSetHandler<K> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            _kind: PhantomData,
        }
    }
}

impl<K: StatementKind> Default for ResultSetHandler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StatementKind> fmt::Debug for ResultSetHandler<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ResultSetHandler")
            .field("kind", &K::NAME)
            .field("config", &state.config)
            .field("executed", &state.executed.len())
            .field("returned", &state.returned.len())
            .finish_non_exhaustive()
    }
}

impl<K: StatementKind> ResultSetHandler<K> {
    /// Create a handler with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HandlerConfig::default())
    }

    /// Create a handler with the given configuration.
    #[must_use]
    pub fn with_config(config: HandlerConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(HandlerState {
                config,
                ..HandlerState::default()
            })),
            _kind: PhantomData,
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> HandlerConfig {
        self.state.borrow().config.clone()
    }

    /// Replace the configuration.
    pub fn set_config(&self, config: HandlerConfig) {
        self.state.borrow_mut().config = config;
    }

    /// Enable or disable case-sensitive matching.
    pub fn set_case_sensitive(&self, enabled: bool) {
        self.state.borrow_mut().config.case_sensitive = enabled;
    }

    /// Set how SQL keys are matched.
    pub fn set_match_mode(&self, mode: MatchMode) {
        self.state.borrow_mut().config.match_mode = mode;
    }

    /// Keep processing a batch after a failed item.
    pub fn set_continue_on_batch_failure(&self, enabled: bool) {
        self.state.borrow_mut().config.continue_on_batch_failure = enabled;
    }

    // ========================================================================
    // Keyed registration
    // ========================================================================

    /// Register a result set returned by queries matching `sql`.
    pub fn register_result_set(&self, sql: impl Into<String>, result_set: ResultSet) {
        self.state
            .borrow_mut()
            .registry
            .result_sets
            .insert(sql, None, result_set.deep_copy());
    }

    /// Register several result sets returned, in order, by queries matching
    /// `sql`.
    pub fn register_result_sets(&self, sql: impl Into<String>, result_sets: Vec<ResultSet>) {
        self.state
            .borrow_mut()
            .registry
            .multi_result_sets
            .insert(sql, None, detached(&result_sets));
    }

    /// Register the update count of updates matching `sql`.
    pub fn register_update_count(&self, sql: impl Into<String>, count: i32) {
        self.state
            .borrow_mut()
            .registry
            .update_counts
            .insert(sql, None, count);
    }

    /// Register several update counts for updates matching `sql`.
    pub fn register_update_counts(&self, sql: impl Into<String>, counts: Vec<i32>) {
        self.state
            .borrow_mut()
            .registry
            .multi_update_counts
            .insert(sql, None, counts);
    }

    /// Register an error raised by any statement matching `sql`.
    pub fn register_error(&self, sql: impl Into<String>, error: impl Into<Error>) {
        self.state
            .borrow_mut()
            .registry
            .errors
            .insert(sql, None, error.into());
    }

    /// Register the generated keys of statements matching `sql`.
    pub fn register_generated_keys(&self, sql: impl Into<String>, keys: ResultSet) {
        self.state
            .borrow_mut()
            .registry
            .generated_keys
            .insert(sql, None, keys.deep_copy());
    }

    /// Declare whether statements matching `sql` return a result set,
    /// overriding the keyword heuristic.
    pub fn set_returns_result_set(&self, sql: impl Into<String>, returns_result_set: bool) {
        self.state
            .borrow_mut()
            .registry
            .returns_result_set
            .insert(sql, None, returns_result_set);
    }

    // ========================================================================
    // Global fallbacks
    // ========================================================================

    /// Set the result set returned when no keyed entry matches.
    pub fn register_global_result_set(&self, result_set: ResultSet) {
        self.state.borrow_mut().registry.global_result_set = result_set.deep_copy();
    }

    /// Set the result sets returned when no keyed entry matches.
    ///
    /// Takes precedence over the single global result set.
    pub fn register_global_result_sets(&self, result_sets: Vec<ResultSet>) {
        self.state.borrow_mut().registry.global_result_sets = Some(detached(&result_sets));
    }

    /// Set the update count returned when no keyed entry matches.
    pub fn register_global_update_count(&self, count: i32) {
        self.state.borrow_mut().registry.global_update_count = count;
    }

    /// Set the update counts returned when no keyed entry matches.
    ///
    /// Takes precedence over the single global update count.
    pub fn register_global_update_counts(&self, counts: Vec<i32>) {
        self.state.borrow_mut().registry.global_update_counts = Some(counts);
    }

    /// Set the generated keys used when no keyed entry matches.
    pub fn register_global_generated_keys(&self, keys: ResultSet) {
        self.state.borrow_mut().registry.global_generated_keys = Some(keys.deep_copy());
    }

    /// Declare whether statements without a keyed override return a result
    /// set. `None` restores the keyword heuristic.
    pub fn set_global_returns_result_set(&self, returns_result_set: Option<bool>) {
        self.state.borrow_mut().registry.global_returns_result_set = returns_result_set;
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Keyed single result sets, in registration order.
    #[must_use]
    pub fn result_sets(&self) -> Vec<RegisteredResponse<ResultSet>> {
        detach_entries(
            self.state.borrow().registry.result_sets.snapshot(),
            ResultSet::deep_copy,
        )
    }

    /// Keyed result-set lists, in registration order.
    #[must_use]
    pub fn multi_result_sets(&self) -> Vec<RegisteredResponse<Vec<ResultSet>>> {
        detach_entries(
            self.state.borrow().registry.multi_result_sets.snapshot(),
            |sets| detached(sets),
        )
    }

    /// Keyed single update counts, in registration order.
    #[must_use]
    pub fn update_counts(&self) -> Vec<RegisteredResponse<i32>> {
        self.state.borrow().registry.update_counts.snapshot()
    }

    /// Keyed update-count lists, in registration order.
    #[must_use]
    pub fn multi_update_counts(&self) -> Vec<RegisteredResponse<Vec<i32>>> {
        self.state.borrow().registry.multi_update_counts.snapshot()
    }

    /// Keyed errors, in registration order.
    #[must_use]
    pub fn errors(&self) -> Vec<RegisteredResponse<Error>> {
        self.state.borrow().registry.errors.snapshot()
    }

    /// Keyed generated keys, in registration order.
    #[must_use]
    pub fn generated_keys(&self) -> Vec<RegisteredResponse<ResultSet>> {
        detach_entries(
            self.state.borrow().registry.generated_keys.snapshot(),
            ResultSet::deep_copy,
        )
    }

    /// Keyed returns-result-set overrides, in registration order.
    #[must_use]
    pub fn returns_result_set_overrides(&self) -> Vec<RegisteredResponse<bool>> {
        self.state.borrow().registry.returns_result_set.snapshot()
    }

    /// The global single result set.
    #[must_use]
    pub fn global_result_set(&self) -> ResultSet {
        self.state.borrow().registry.global_result_set.deep_copy()
    }

    /// The global result-set list, if registered.
    #[must_use]
    pub fn global_result_sets(&self) -> Option<Vec<ResultSet>> {
        self.state
            .borrow()
            .registry
            .global_result_sets
            .as_deref()
            .map(detached)
    }

    /// The global single update count.
    #[must_use]
    pub fn global_update_count(&self) -> i32 {
        self.state.borrow().registry.global_update_count
    }

    /// The global update-count list, if registered.
    #[must_use]
    pub fn global_update_counts(&self) -> Option<Vec<i32>> {
        self.state.borrow().registry.global_update_counts.clone()
    }

    /// The global generated keys, if registered.
    #[must_use]
    pub fn global_generated_keys(&self) -> Option<ResultSet> {
        self.state
            .borrow()
            .registry
            .global_generated_keys
            .as_ref()
            .map(ResultSet::deep_copy)
    }

    /// The global returns-result-set override.
    #[must_use]
    pub fn global_returns_result_set(&self) -> Option<bool> {
        self.state.borrow().registry.global_returns_result_set
    }

    // ========================================================================
    // Logs
    // ========================================================================

    /// SQL of every executed statement, in execution order.
    #[must_use]
    pub fn executed_statements(&self) -> Vec<String> {
        self.state
            .borrow()
            .executed
            .iter()
            .map(|e| e.sql.clone())
            .collect()
    }

    /// Every result set handed to a caller, in hand-out order.
    ///
    /// Entries share their instance with the statement that received them,
    /// so cursor movement, updates and closing done by the caller show here.
    #[must_use]
    pub fn returned_result_sets(&self) -> Vec<ResultSet> {
        self.state.borrow().returned.clone()
    }

    // ========================================================================
    // Clearing
    // ========================================================================

    /// Remove keyed result sets, single and multiple.
    pub fn clear_result_sets(&self) {
        let mut state = self.state.borrow_mut();
        state.registry.result_sets.clear();
        state.registry.multi_result_sets.clear();
    }

    /// Remove keyed update counts, single and multiple.
    pub fn clear_update_counts(&self) {
        let mut state = self.state.borrow_mut();
        state.registry.update_counts.clear();
        state.registry.multi_update_counts.clear();
    }

    /// Remove keyed errors.
    pub fn clear_errors(&self) {
        self.state.borrow_mut().registry.errors.clear();
    }

    /// Remove keyed generated keys.
    pub fn clear_generated_keys(&self) {
        self.state.borrow_mut().registry.generated_keys.clear();
    }

    /// Remove keyed returns-result-set overrides.
    pub fn clear_returns_result_set(&self) {
        self.state.borrow_mut().registry.returns_result_set.clear();
    }

    /// Reset the global result sets to an empty result set.
    pub fn clear_global_result_sets(&self) {
        let mut state = self.state.borrow_mut();
        state.registry.global_result_set = ResultSet::new("");
        state.registry.global_result_sets = None;
    }

    /// Reset the global update counts to zero.
    pub fn clear_global_update_counts(&self) {
        let mut state = self.state.borrow_mut();
        state.registry.global_update_count = 0;
        state.registry.global_update_counts = None;
    }

    /// Remove the global generated keys.
    pub fn clear_global_generated_keys(&self) {
        self.state.borrow_mut().registry.global_generated_keys = None;
    }

    /// Empty the executed-statement log.
    pub fn clear_executed_statements(&self) {
        self.state.borrow_mut().executed.clear();
    }

    /// Empty the returned-result-set log.
    pub fn clear_returned_result_sets(&self) {
        self.state.borrow_mut().returned.clear();
    }

    /// Drop every registration and both logs. Configuration is kept.
    pub fn clear_all(&self) {
        let mut state = self.state.borrow_mut();
        state.registry.clear();
        state.executed.clear();
        state.returned.clear();
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Decide whether `sql` returns a result set.
    ///
    /// A keyed override wins, then the global override, then
    /// [`sql::is_select`].
    #[must_use]
    pub fn is_query(&self, sql: &str) -> bool {
        self.is_query_with(sql, None)
    }

    pub(crate) fn is_query_with(&self, sql: &str, parameters: Option<&ParameterMap>) -> bool {
        let state = self.state.borrow();
        if let Some(flag) = state.find(&state.registry.returns_result_set, sql, parameters) {
            return *flag;
        }
        state
            .registry
            .global_returns_result_set
            .unwrap_or_else(|| sql::is_select(sql))
    }

    /// Resolve the result sets of a query. The first element is the one the
    /// caller sees first; the list may be empty.
    pub(crate) fn resolve_query(
        &self,
        sql: &str,
        parameters: Option<&ParameterMap>,
    ) -> Result<Vec<ResultSet>> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.registered_error(sql, parameters) {
            tracing::debug!(kind = K::NAME, sql = sql, "raising registered error");
            return Err(error);
        }
        state.log_executed(K::NAME, sql, parameters);

        let (source, templates) =
            if let Some(sets) = state.find(&state.registry.multi_result_sets, sql, parameters) {
                ("keyed multiple", sets.clone())
            } else if let Some(set) = state.find(&state.registry.result_sets, sql, parameters) {
                ("keyed single", vec![set.clone()])
            } else if let Some(sets) = &state.registry.global_result_sets {
                ("global multiple", sets.clone())
            } else {
                ("global single", vec![state.registry.global_result_set.clone()])
            };
        tracing::debug!(kind = K::NAME, source, count = templates.len(), "resolved query");

        let handed_out: Vec<ResultSet> = templates.iter().map(ResultSet::fresh_copy).collect();
        state.returned.extend(handed_out.iter().cloned());
        Ok(handed_out)
    }

    /// Resolve the update counts of an update; the list may be empty.
    pub(crate) fn resolve_update(
        &self,
        sql: &str,
        parameters: Option<&ParameterMap>,
    ) -> Result<Vec<i32>> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.registered_error(sql, parameters) {
            tracing::debug!(kind = K::NAME, sql = sql, "raising registered error");
            return Err(error);
        }
        state.log_executed(K::NAME, sql, parameters);

        let (source, counts) =
            if let Some(counts) = state.find(&state.registry.multi_update_counts, sql, parameters) {
                ("keyed multiple", counts.clone())
            } else if let Some(count) = state.find(&state.registry.update_counts, sql, parameters) {
                ("keyed single", vec![*count])
            } else if let Some(counts) = &state.registry.global_update_counts {
                ("global multiple", counts.clone())
            } else {
                ("global single", vec![state.registry.global_update_count])
            };
        tracing::debug!(kind = K::NAME, source, ?counts, "resolved update");
        Ok(counts)
    }

    /// Keyed generated keys for `sql`, else the global ones.
    pub(crate) fn resolve_generated_keys(
        &self,
        sql: &str,
        parameters: Option<&ParameterMap>,
    ) -> Option<ResultSet> {
        let state = self.state.borrow();
        state
            .find(&state.registry.generated_keys, sql, parameters)
            .or(state.registry.global_generated_keys.as_ref())
            .map(ResultSet::fresh_copy)
    }

    /// Output parameters for `sql`, unfiltered.
    ///
    /// Checks entries keyed by SQL and parameters, then by SQL alone, then
    /// the global map; the first non-empty map wins.
    pub(crate) fn resolve_out_parameters(
        &self,
        sql: &str,
        parameters: Option<&ParameterMap>,
    ) -> ParameterMap {
        let state = self.state.borrow();
        let keyed = state
            .registry
            .out_parameters
            .matching(
                sql,
                parameters,
                state.matcher(),
                state.config.exact_match_parameters,
            )
            .find(|map| !map.is_empty());
        keyed
            .unwrap_or(&state.registry.global_out_parameters)
            .clone()
    }
}

impl<K: Parameterized> ResultSetHandler<K> {
    /// Require registered parameter maps to equal the statement's.
    pub fn set_exact_match_parameters(&self, enabled: bool) {
        self.state.borrow_mut().config.exact_match_parameters = enabled;
    }

    /// Register a result set for queries matching `sql` and `parameters`.
    pub fn register_result_set_with_parameters(
        &self,
        sql: impl Into<String>,
        parameters: ParameterMap,
        result_set: ResultSet,
    ) {
        self.state
            .borrow_mut()
            .registry
            .result_sets
            .insert(sql, Some(parameters), result_set.deep_copy());
    }

    /// Register result sets for queries matching `sql` and `parameters`.
    pub fn register_result_sets_with_parameters(
        &self,
        sql: impl Into<String>,
        parameters: ParameterMap,
        result_sets: Vec<ResultSet>,
    ) {
        self.state
            .borrow_mut()
            .registry
            .multi_result_sets
            .insert(sql, Some(parameters), detached(&result_sets));
    }

    /// Register an update count for updates matching `sql` and `parameters`.
    pub fn register_update_count_with_parameters(
        &self,
        sql: impl Into<String>,
        parameters: ParameterMap,
        count: i32,
    ) {
        self.state
            .borrow_mut()
            .registry
            .update_counts
            .insert(sql, Some(parameters), count);
    }

    /// Register update counts for updates matching `sql` and `parameters`.
    pub fn register_update_counts_with_parameters(
        &self,
        sql: impl Into<String>,
        parameters: ParameterMap,
        counts: Vec<i32>,
    ) {
        self.state
            .borrow_mut()
            .registry
            .multi_update_counts
            .insert(sql, Some(parameters), counts);
    }

    /// Register an error for statements matching `sql` and `parameters`.
    pub fn register_error_with_parameters(
        &self,
        sql: impl Into<String>,
        parameters: ParameterMap,
        error: impl Into<Error>,
    ) {
        self.state
            .borrow_mut()
            .registry
            .errors
            .insert(sql, Some(parameters), error.into());
    }

    /// Register generated keys for statements matching `sql` and
    /// `parameters`.
    pub fn register_generated_keys_with_parameters(
        &self,
        sql: impl Into<String>,
        parameters: ParameterMap,
        keys: ResultSet,
    ) {
        self.state
            .borrow_mut()
            .registry
            .generated_keys
            .insert(sql, Some(parameters), keys.deep_copy());
    }

    /// Every execution with the parameters it ran with.
    #[must_use]
    pub fn executed_statement_parameters(&self) -> Vec<ExecutedStatement> {
        self.state.borrow().executed.clone()
    }
}

impl ResultSetHandler<Callable> {
    /// Only expose output parameters that the statement registered.
    pub fn set_must_register_out_parameters(&self, enabled: bool) {
        self.state.borrow_mut().config.must_register_out_parameters = enabled;
    }

    /// Register output parameters for calls matching `sql`.
    pub fn register_out_parameters(&self, sql: impl Into<String>, outputs: ParameterMap) {
        self.state
            .borrow_mut()
            .registry
            .out_parameters
            .insert(sql, None, outputs);
    }

    /// Register output parameters for calls matching `sql` and `parameters`.
    pub fn register_out_parameters_with_parameters(
        &self,
        sql: impl Into<String>,
        parameters: ParameterMap,
        outputs: ParameterMap,
    ) {
        self.state
            .borrow_mut()
            .registry
            .out_parameters
            .insert(sql, Some(parameters), outputs);
    }

    /// Set the output parameters used when no keyed entry matches.
    pub fn register_global_out_parameters(&self, outputs: ParameterMap) {
        self.state.borrow_mut().registry.global_out_parameters = outputs;
    }

    /// Keyed output parameters, in registration order.
    #[must_use]
    pub fn out_parameters(&self) -> Vec<RegisteredResponse<ParameterMap>> {
        self.state.borrow().registry.out_parameters.snapshot()
    }

    /// The global output parameters.
    #[must_use]
    pub fn global_out_parameters(&self) -> ParameterMap {
        self.state.borrow().registry.global_out_parameters.clone()
    }

    /// Remove keyed output parameters.
    pub fn clear_out_parameters(&self) {
        self.state.borrow_mut().registry.out_parameters.clear();
    }

    /// Reset the global output parameters to an empty map.
    pub fn clear_global_out_parameters(&self) {
        self.state.borrow_mut().registry.global_out_parameters.clear();
    }
}
