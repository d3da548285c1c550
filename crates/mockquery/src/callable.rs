//! Callable statements: stored-procedure calls with output parameters.
//!
//! Parameters may be set by 1-based index or by case-sensitive name. After
//! every successful execution the statement resolves its output parameters
//! from the handler and, when the handler requires it, drops outputs that
//! were never registered with [`CallableStatement::register_out_parameter`].

use std::cell::Cell;
use std::collections::BTreeMap;

use mockquery_types::{FromSql, SqlValue, convert};

use crate::error::Result;
use crate::handler::ResultSetHandler;
use crate::kind::Callable;
use crate::params::{OutParameterSet, ParamKey, ParameterMap};
use crate::prepared::ParameterizedStatement;
use crate::result_set::ResultSet;
use crate::statement::{AutoGeneratedKeys, cursor_accessors};
use crate::wrapper::Wrapper;

/// A callable statement.
#[derive(Debug)]
pub struct CallableStatement {
    inner: ParameterizedStatement<Callable>,
    registered: OutParameterSet,
    last_out_parameters: ParameterMap,
    was_null: Cell<bool>,
}

impl CallableStatement {
    /// Prepare the call `sql` against `handler`.
    #[must_use]
    pub fn new(handler: ResultSetHandler<Callable>, sql: impl Into<String>) -> Self {
        Self {
            inner: ParameterizedStatement::new(handler, sql.into(), AutoGeneratedKeys::None),
            registered: OutParameterSet::new(),
            last_out_parameters: ParameterMap::new(),
            was_null: Cell::new(false),
        }
    }

    /// The handler answering this statement.
    #[must_use]
    pub fn handler(&self) -> &ResultSetHandler<Callable> {
        &self.inner.core.handler
    }

    /// The call's SQL.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.inner.sql
    }

    // ========================================================================
    // Input parameters
    // ========================================================================

    /// Set a parameter by index or name.
    pub fn set(&mut self, key: impl Into<ParamKey>, value: impl Into<SqlValue>) {
        self.inner.parameters.set(key, value);
    }

    /// Set a parameter to NULL.
    pub fn set_null(&mut self, key: impl Into<ParamKey>) {
        self.inner.parameters.set(key, SqlValue::Null);
    }

    /// A parameter by index or name.
    #[must_use]
    pub fn parameter(&self, key: impl Into<ParamKey>) -> Option<&SqlValue> {
        self.inner.parameters.get(&key.into())
    }

    /// Indexed and named parameters merged.
    #[must_use]
    pub fn parameters(&self) -> ParameterMap {
        self.inner.parameters.combined()
    }

    /// Indexed parameters.
    #[must_use]
    pub fn indexed_parameters(&self) -> &BTreeMap<usize, SqlValue> {
        self.inner.parameters.indexed()
    }

    /// Named parameters.
    #[must_use]
    pub fn named_parameters(&self) -> &BTreeMap<String, SqlValue> {
        self.inner.parameters.named()
    }

    /// Remove every indexed and named parameter.
    pub fn clear_parameters(&mut self) {
        self.inner.parameters.clear();
    }

    // ========================================================================
    // Output registration
    // ========================================================================

    /// Register an output parameter.
    pub fn register_out_parameter(&mut self, key: impl Into<ParamKey>) {
        self.registered.register(key);
    }

    /// Register an output parameter with a SQL type code. The type is not
    /// kept.
    pub fn register_out_parameter_with_type(&mut self, key: impl Into<ParamKey>, _sql_type: i32) {
        self.registered.register(key);
    }

    /// Register an output parameter with a SQL type code and type name.
    /// Neither is kept.
    pub fn register_out_parameter_with_type_name(
        &mut self,
        key: impl Into<ParamKey>,
        _sql_type: i32,
        _type_name: &str,
    ) {
        self.registered.register(key);
    }

    /// Check whether an output parameter is registered.
    #[must_use]
    pub fn is_out_parameter_registered(&self, key: impl Into<ParamKey>) -> bool {
        self.registered.contains(&key.into())
    }

    /// Registered output parameters.
    #[must_use]
    pub fn registered_out_parameters(&self) -> &OutParameterSet {
        &self.registered
    }

    /// Forget every output registration.
    pub fn clear_registered_out_parameters(&mut self) {
        self.registered.clear();
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn resolve_out_parameters(&self, parameters: &ParameterMap) -> ParameterMap {
        let handler = &self.inner.core.handler;
        let outputs = handler.resolve_out_parameters(&self.inner.sql, Some(parameters));
        if handler.config().must_register_out_parameters {
            self.registered.filter(outputs)
        } else {
            outputs
        }
    }

    fn refresh_out_parameters(&mut self, parameters: &ParameterMap) {
        self.last_out_parameters = self.resolve_out_parameters(parameters);
        tracing::debug!(
            sql = %self.inner.sql,
            outputs = self.last_out_parameters.len(),
            "resolved output parameters"
        );
    }

    /// Execute as a query and return the first result set.
    pub fn execute_query(&mut self) -> Result<Option<ResultSet>> {
        let parameters = self.inner.parameters.combined();
        self.inner.run_query(&parameters)?;
        self.refresh_out_parameters(&parameters);
        Ok(self.inner.core.cursor.result_set().cloned())
    }

    /// Execute as an update and return the (first) update count.
    pub fn execute_update(&mut self) -> Result<i32> {
        let parameters = self.inner.parameters.combined();
        let count = self.inner.run_update(&parameters)?;
        self.refresh_out_parameters(&parameters);
        Ok(count)
    }

    /// Execute as a query or an update. Returns `true` for a query.
    pub fn execute(&mut self) -> Result<bool> {
        let parameters = self.inner.parameters.combined();
        let is_query = self.inner.run(&parameters)?;
        self.refresh_out_parameters(&parameters);
        Ok(is_query)
    }

    /// Queue the current parameters for the next batch.
    pub fn add_batch(&mut self) {
        self.inner.add_batch();
    }

    /// Drop every queued parameter set.
    pub fn clear_batch(&mut self) {
        self.inner.batch.clear();
    }

    /// Run the call once per queued parameter set. Output parameters are
    /// not refreshed.
    pub fn execute_batch(&mut self) -> Result<Vec<i32>> {
        self.inner.run_batch()
    }

    // ========================================================================
    // Output access
    // ========================================================================

    /// Output parameters of the last successful execution.
    #[must_use]
    pub fn out_parameters(&self) -> &ParameterMap {
        &self.last_out_parameters
    }

    /// Raw output parameter. Updates [`CallableStatement::was_null`].
    #[must_use]
    pub fn get_object(&self, key: impl Into<ParamKey>) -> Option<SqlValue> {
        self.was_null.set(false);
        let value = self.last_out_parameters.get(&key.into()).cloned();
        if value.as_ref().is_none_or(SqlValue::is_null) {
            self.was_null.set(true);
        }
        value
    }

    /// Typed output parameter. Absent or NULL values convert to the
    /// target's default (`0`, `false`, `None`).
    pub fn get<T: FromSql>(&self, key: impl Into<ParamKey>) -> Result<T> {
        let value = self.get_object(key);
        Ok(convert(value.as_ref())?)
    }

    /// Whether the last output read was absent or NULL.
    #[must_use]
    pub fn was_null(&self) -> bool {
        self.was_null.get()
    }

    cursor_accessors!(inner.core);
}

impl Wrapper for CallableStatement {}
