//! Prepared statements.
//!
//! The SQL is fixed when the statement is prepared; parameters are set
//! between executions and take part in response lookup.

use mockquery_types::SqlValue;

use crate::batch;
use crate::error::Result;
use crate::handler::ResultSetHandler;
use crate::kind::{Parameterized, Prepared};
use crate::params::{ParamKey, ParameterMap, ParameterStore};
use crate::result_set::ResultSet;
use crate::statement::{AutoGeneratedKeys, StatementCore, cursor_accessors};
use crate::wrapper::Wrapper;

/// Execution state shared by prepared and callable statements.
#[derive(Debug)]
pub(crate) struct ParameterizedStatement<K: Parameterized> {
    pub(crate) core: StatementCore<K>,
    pub(crate) sql: String,
    pub(crate) parameters: ParameterStore,
    pub(crate) batch: Vec<ParameterMap>,
    pub(crate) generated_keys: AutoGeneratedKeys,
}

impl<K: Parameterized> ParameterizedStatement<K> {
    pub(crate) fn new(
        handler: ResultSetHandler<K>,
        sql: String,
        generated_keys: AutoGeneratedKeys,
    ) -> Self {
        Self {
            core: StatementCore::new(handler),
            sql,
            parameters: ParameterStore::new(),
            batch: Vec::new(),
            generated_keys,
        }
    }

    pub(crate) fn run_query(&mut self, parameters: &ParameterMap) -> Result<()> {
        self.core.run_query(&self.sql, Some(parameters))
    }

    pub(crate) fn run_update(&mut self, parameters: &ParameterMap) -> Result<i32> {
        let count = self.core.run_update(&self.sql, Some(parameters))?;
        self.core
            .apply_generated_keys(&self.sql, Some(parameters), self.generated_keys);
        Ok(count)
    }

    pub(crate) fn run(&mut self, parameters: &ParameterMap) -> Result<bool> {
        let is_query = self.core.handler.is_query_with(&self.sql, Some(parameters));
        if is_query {
            self.run_query(parameters)?;
        } else {
            self.run_update(parameters)?;
        }
        Ok(is_query)
    }

    pub(crate) fn add_batch(&mut self) {
        self.batch.push(self.parameters.combined());
    }

    pub(crate) fn run_batch(&mut self) -> Result<Vec<i32>> {
        let continue_on_failure = self.core.continue_on_batch_failure();
        let Self {
            core,
            sql,
            batch: items,
            ..
        } = self;
        let sql = sql.as_str();
        batch::run_batch(items.as_slice(), continue_on_failure, |parameters| {
            core.run_batch_item(sql, Some(parameters))
        })
    }
}

/// A prepared statement with positional parameters.
#[derive(Debug)]
pub struct PreparedStatement {
    inner: ParameterizedStatement<Prepared>,
}

impl PreparedStatement {
    /// Prepare `sql` against `handler`.
    #[must_use]
    pub fn new(handler: ResultSetHandler<Prepared>, sql: impl Into<String>) -> Self {
        Self::with_generated_keys(handler, sql, AutoGeneratedKeys::None)
    }

    /// Prepare `sql`, fixing whether updates expose generated keys.
    #[must_use]
    pub fn with_generated_keys(
        handler: ResultSetHandler<Prepared>,
        sql: impl Into<String>,
        generated_keys: AutoGeneratedKeys,
    ) -> Self {
        Self {
            inner: ParameterizedStatement::new(handler, sql.into(), generated_keys),
        }
    }

    /// The handler answering this statement.
    #[must_use]
    pub fn handler(&self) -> &ResultSetHandler<Prepared> {
        &self.inner.core.handler
    }

    /// The prepared SQL.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.inner.sql
    }

    /// Whether updates resolve generated keys.
    #[must_use]
    pub fn returns_generated_keys(&self) -> bool {
        self.inner.generated_keys == AutoGeneratedKeys::Return
    }

    /// Set the parameter at a 1-based `index`.
    pub fn set(&mut self, index: usize, value: impl Into<SqlValue>) {
        self.inner.parameters.set_indexed(index, value);
    }

    /// Set the parameter at `index` to NULL.
    pub fn set_null(&mut self, index: usize) {
        self.inner.parameters.set_indexed(index, SqlValue::Null);
    }

    /// The parameter at `index`.
    #[must_use]
    pub fn parameter(&self, index: usize) -> Option<&SqlValue> {
        self.inner.parameters.get(&ParamKey::Index(index))
    }

    /// Every parameter currently set.
    #[must_use]
    pub fn parameters(&self) -> ParameterMap {
        self.inner.parameters.combined()
    }

    /// Remove every parameter.
    pub fn clear_parameters(&mut self) {
        self.inner.parameters.clear();
    }

    /// Execute as a query and return the first result set.
    pub fn execute_query(&mut self) -> Result<Option<ResultSet>> {
        let parameters = self.inner.parameters.combined();
        self.inner.run_query(&parameters)?;
        Ok(self.inner.core.cursor.result_set().cloned())
    }

    /// Execute as an update and return the (first) update count.
    pub fn execute_update(&mut self) -> Result<i32> {
        let parameters = self.inner.parameters.combined();
        self.inner.run_update(&parameters)
    }

    /// Execute as a query or an update. Returns `true` for a query.
    pub fn execute(&mut self) -> Result<bool> {
        let parameters = self.inner.parameters.combined();
        self.inner.run(&parameters)
    }

    /// Check how the prepared SQL would be classified with the current
    /// parameters.
    #[must_use]
    pub fn is_query(&self) -> bool {
        let parameters = self.inner.parameters.combined();
        self.inner
            .core
            .handler
            .is_query_with(&self.inner.sql, Some(&parameters))
    }

    /// Queue the current parameters for the next batch.
    pub fn add_batch(&mut self) {
        self.inner.add_batch();
    }

    /// Drop every queued parameter set.
    pub fn clear_batch(&mut self) {
        self.inner.batch.clear();
    }

    /// Queued parameter sets.
    #[must_use]
    pub fn batch(&self) -> &[ParameterMap] {
        &self.inner.batch
    }

    /// Run the prepared SQL once per queued parameter set.
    pub fn execute_batch(&mut self) -> Result<Vec<i32>> {
        self.inner.run_batch()
    }

    cursor_accessors!(inner.core);
}

impl Wrapper for PreparedStatement {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::batch::EXECUTE_FAILED;
    use crate::handler::PreparedStatementHandler;
    use crate::params::parameter_map;

    #[test]
    fn test_parameters_select_response() {
        let handler = PreparedStatementHandler::new();
        handler.register_result_set("select", ResultSet::new("any"));
        handler.register_result_set_with_parameters(
            "select",
            parameter_map([(ParamKey::Index(1), SqlValue::Int(5))]),
            ResultSet::new("five"),
        );
        let mut stmt = PreparedStatement::new(handler, "select * from t where id = ?");
        stmt.set(1, 5);
        assert_eq!(stmt.execute_query().unwrap().unwrap().id(), "five");
        stmt.set(1, 6);
        assert_eq!(stmt.execute_query().unwrap().unwrap().id(), "any");
    }

    #[test]
    fn test_exact_parameter_matching() {
        let handler = PreparedStatementHandler::new();
        handler.set_exact_match_parameters(true);
        handler.register_update_count_with_parameters(
            "update",
            parameter_map([(ParamKey::Index(1), SqlValue::Int(5))]),
            9,
        );
        let mut stmt = PreparedStatement::new(handler, "update t set a = ? where b = ?");
        stmt.set(1, 5);
        assert_eq!(stmt.execute_update().unwrap(), 9);
        stmt.set(2, 1);
        assert_eq!(stmt.execute_update().unwrap(), 0);
    }

    #[test]
    fn test_generated_keys_flag_fixed_at_prepare() {
        let handler = PreparedStatementHandler::new();
        handler.register_global_generated_keys(ResultSet::new("keys"));
        let mut with_keys = PreparedStatement::with_generated_keys(
            handler.clone(),
            "insert into t values (?)",
            AutoGeneratedKeys::Return,
        );
        assert!(with_keys.returns_generated_keys());
        with_keys.execute_update().unwrap();
        assert_eq!(with_keys.generated_keys().id(), "keys");

        let mut without = PreparedStatement::new(handler, "insert into t values (?)");
        without.execute_update().unwrap();
        assert_ne!(without.generated_keys().id(), "keys");
    }

    #[test]
    fn test_batch_runs_each_parameter_set() {
        let handler = PreparedStatementHandler::new();
        handler.register_update_count_with_parameters(
            "insert",
            parameter_map([(ParamKey::Index(1), SqlValue::from("a"))]),
            1,
        );
        handler.register_update_count_with_parameters(
            "insert",
            parameter_map([(ParamKey::Index(1), SqlValue::from("b"))]),
            2,
        );
        let mut stmt = PreparedStatement::new(handler.clone(), "insert into t values (?)");
        stmt.set(1, "a");
        stmt.add_batch();
        stmt.set(1, "b");
        stmt.add_batch();
        assert_eq!(stmt.execute_batch().unwrap(), vec![1, 2]);
        let executed = handler.executed_statement_parameters();
        assert_eq!(executed.len(), 2);
        assert_eq!(
            executed[1].parameters.get(&ParamKey::Index(1)),
            Some(&SqlValue::from("b"))
        );
    }

    #[test]
    fn test_query_in_batch_fails() {
        let handler = PreparedStatementHandler::new();
        let mut stmt = PreparedStatement::new(handler, "select * from t");
        stmt.add_batch();
        let err = stmt.execute_batch().unwrap_err();
        assert_eq!(err.update_counts(), Some(&[EXECUTE_FAILED][..]));
    }
}
