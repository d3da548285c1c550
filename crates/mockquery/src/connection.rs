//! Mock connection.
//!
//! A [`Connection`] owns one handler per statement kind and hands a clone of
//! the matching handler to every statement it creates. It also records the
//! transaction activity a test may want to assert on: commits, rollbacks and
//! savepoints.
//!
//! ## Example
//!
//! ```rust
//! use mockquery::{Connection, ResultSet};
//!
//! let mut conn = Connection::new();
//! conn.statement_handler()
//!     .register_result_set("from users", ResultSet::new("users").with_row(["alice"]));
//!
//! let mut stmt = conn.create_statement();
//! let rs = stmt.execute_query("SELECT name FROM users").unwrap().unwrap();
//! assert!(rs.next());
//! assert_eq!(rs.get::<String>(1).unwrap(), "alice");
//!
//! conn.commit();
//! assert_eq!(conn.commit_count(), 1);
//! ```

use std::collections::BTreeMap;

use crate::callable::CallableStatement;
use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::handler::{CallableStatementHandler, PreparedStatementHandler, StatementHandler};
use crate::prepared::PreparedStatement;
use crate::statement::{AutoGeneratedKeys, Statement};
use crate::transaction::{IsolationLevel, Savepoint};
use crate::wrapper::Wrapper;

/// A mock database connection.
#[derive(Debug)]
pub struct Connection {
    statement_handler: StatementHandler,
    prepared_handler: PreparedStatementHandler,
    callable_handler: CallableStatementHandler,
    savepoints: BTreeMap<u32, Savepoint>,
    savepoint_count: u32,
    closed: bool,
    auto_commit: bool,
    read_only: bool,
    isolation_level: IsolationLevel,
    catalog: Option<String>,
    commits: u32,
    rollbacks: u32,
    client_info: BTreeMap<String, String>,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    /// Create a connection whose handlers use the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HandlerConfig::default())
    }

    /// Create a connection applying `config` to all three handlers.
    #[must_use]
    pub fn with_config(config: HandlerConfig) -> Self {
        Self {
            statement_handler: StatementHandler::with_config(config.clone()),
            prepared_handler: PreparedStatementHandler::with_config(config.clone()),
            callable_handler: CallableStatementHandler::with_config(config),
            savepoints: BTreeMap::new(),
            savepoint_count: 0,
            closed: false,
            auto_commit: false,
            read_only: false,
            isolation_level: IsolationLevel::default(),
            catalog: None,
            commits: 0,
            rollbacks: 0,
            client_info: BTreeMap::new(),
        }
    }

    // ========================================================================
    // Handlers and statements
    // ========================================================================

    /// Handler for plain statements.
    #[must_use]
    pub fn statement_handler(&self) -> &StatementHandler {
        &self.statement_handler
    }

    /// Handler for prepared statements.
    #[must_use]
    pub fn prepared_statement_handler(&self) -> &PreparedStatementHandler {
        &self.prepared_handler
    }

    /// Handler for callable statements.
    #[must_use]
    pub fn callable_statement_handler(&self) -> &CallableStatementHandler {
        &self.callable_handler
    }

    /// Create a plain statement.
    #[must_use]
    pub fn create_statement(&self) -> Statement {
        Statement::new(self.statement_handler.clone())
    }

    /// Prepare `sql`.
    #[must_use]
    pub fn prepare_statement(&self, sql: impl Into<String>) -> PreparedStatement {
        PreparedStatement::new(self.prepared_handler.clone(), sql)
    }

    /// Prepare `sql` with a raw generated-keys flag.
    ///
    /// Fails with [`Error::InvalidArgument`] unless the flag is
    /// [`crate::RETURN_GENERATED_KEYS`] or [`crate::NO_GENERATED_KEYS`].
    pub fn prepare_statement_with_keys(
        &self,
        sql: impl Into<String>,
        auto_generated_keys: i32,
    ) -> Result<PreparedStatement> {
        let keys = AutoGeneratedKeys::try_from(auto_generated_keys)?;
        Ok(PreparedStatement::with_generated_keys(
            self.prepared_handler.clone(),
            sql,
            keys,
        ))
    }

    /// Prepare `sql` so that executions resolve generated keys for the given
    /// 1-based key column indexes.
    ///
    /// The column list is accepted as is; this behaves like
    /// [`crate::RETURN_GENERATED_KEYS`].
    #[must_use]
    pub fn prepare_statement_with_key_columns(
        &self,
        sql: impl Into<String>,
        column_indexes: &[usize],
    ) -> PreparedStatement {
        tracing::trace!(columns = ?column_indexes, "key columns requested");
        PreparedStatement::with_generated_keys(
            self.prepared_handler.clone(),
            sql,
            AutoGeneratedKeys::Return,
        )
    }

    /// Prepare `sql` so that executions resolve generated keys for the named
    /// key columns. Behaves like [`crate::RETURN_GENERATED_KEYS`].
    #[must_use]
    pub fn prepare_statement_with_key_names(
        &self,
        sql: impl Into<String>,
        column_names: &[&str],
    ) -> PreparedStatement {
        tracing::trace!(columns = ?column_names, "key columns requested");
        PreparedStatement::with_generated_keys(
            self.prepared_handler.clone(),
            sql,
            AutoGeneratedKeys::Return,
        )
    }

    /// Prepare the call `sql`.
    #[must_use]
    pub fn prepare_call(&self, sql: impl Into<String>) -> CallableStatement {
        CallableStatement::new(self.callable_handler.clone(), sql)
    }

    /// The SQL a driver would send for `sql`: unchanged.
    #[must_use]
    pub fn native_sql(&self, sql: &str) -> String {
        sql.to_owned()
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Record a commit.
    pub fn commit(&mut self) {
        self.commits += 1;
        tracing::debug!(commits = self.commits, "commit");
    }

    /// Record a rollback.
    pub fn rollback(&mut self) {
        self.rollbacks += 1;
        tracing::debug!(rollbacks = self.rollbacks, "rollback");
    }

    /// Number of commits so far.
    #[must_use]
    pub fn commit_count(&self) -> u32 {
        self.commits
    }

    /// Number of rollbacks so far, including rollbacks to a savepoint.
    #[must_use]
    pub fn rollback_count(&self) -> u32 {
        self.rollbacks
    }

    /// Reset the commit counter.
    pub fn reset_commit_count(&mut self) {
        self.commits = 0;
    }

    /// Reset the rollback counter.
    pub fn reset_rollback_count(&mut self) {
        self.rollbacks = 0;
    }

    /// Create an unnamed savepoint.
    pub fn set_savepoint(&mut self) -> Savepoint {
        self.set_savepoint_named("")
    }

    /// Create a named savepoint.
    pub fn set_savepoint_named(&mut self, name: impl Into<String>) -> Savepoint {
        let savepoint = Savepoint::new(self.savepoint_count, name);
        self.savepoint_count += 1;
        tracing::debug!(id = savepoint.id, name = %savepoint.name, "savepoint created");
        self.savepoints.insert(savepoint.id, savepoint.clone());
        savepoint
    }

    fn usable_savepoint(&mut self, savepoint: &Savepoint) -> Result<&mut Savepoint> {
        let Some(current) = self.savepoints.get_mut(&savepoint.id) else {
            tracing::warn!(id = savepoint.id, "unknown savepoint");
            return Err(Error::Savepoint(format!(
                "Savepoint with id {} does not exist",
                savepoint.id
            )));
        };
        if let Err(e) = current.ensure_usable() {
            tracing::warn!(id = current.id, error = %e, "savepoint misuse");
            return Err(e);
        }
        Ok(current)
    }

    /// Release a savepoint.
    ///
    /// Fails if the savepoint is unknown, already released or rolled back.
    pub fn release_savepoint(&mut self, savepoint: &Savepoint) -> Result<()> {
        self.usable_savepoint(savepoint)?.released = true;
        Ok(())
    }

    /// Roll back to a savepoint. Counts as a rollback.
    ///
    /// Fails if the savepoint is unknown, already released or rolled back.
    pub fn rollback_to(&mut self, savepoint: &Savepoint) -> Result<()> {
        self.usable_savepoint(savepoint)?.rolled_back = true;
        self.rollback();
        Ok(())
    }

    /// Every savepoint created since the last reset, by id.
    #[must_use]
    pub fn savepoint_map(&self) -> &BTreeMap<u32, Savepoint> {
        &self.savepoints
    }

    /// A savepoint by id.
    #[must_use]
    pub fn savepoint(&self, id: u32) -> Option<&Savepoint> {
        self.savepoints.get(&id)
    }

    /// Forget every savepoint. Ids keep increasing.
    pub fn reset_savepoints(&mut self) {
        self.savepoints.clear();
    }

    // ========================================================================
    // Connection properties
    // ========================================================================

    /// Whether auto-commit is on (default: off).
    #[must_use]
    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// Set auto-commit.
    pub fn set_auto_commit(&mut self, enabled: bool) {
        self.auto_commit = enabled;
    }

    /// Whether the connection is read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Set read-only mode.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Current isolation level.
    #[must_use]
    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    /// Set the isolation level.
    pub fn set_isolation_level(&mut self, level: IsolationLevel) {
        self.isolation_level = level;
    }

    /// Current catalog.
    #[must_use]
    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    /// Set the catalog.
    pub fn set_catalog(&mut self, catalog: impl Into<String>) {
        self.catalog = Some(catalog.into());
    }

    /// A client-info property.
    #[must_use]
    pub fn client_info(&self, name: &str) -> Option<&str> {
        self.client_info.get(name).map(String::as_str)
    }

    /// Every client-info property.
    #[must_use]
    pub fn client_info_map(&self) -> &BTreeMap<String, String> {
        &self.client_info
    }

    /// Set one client-info property.
    pub fn set_client_info(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.client_info.insert(name.into(), value.into());
    }

    /// Replace every client-info property.
    pub fn replace_client_info(&mut self, properties: BTreeMap<String, String>) {
        self.client_info = properties;
    }

    /// Close the connection. Statements keep working.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Check if the connection was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Valid means not closed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.closed
    }
}

impl Wrapper for Connection {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::matcher::MatchMode;

    #[test]
    fn test_config_applies_to_all_handlers() {
        let conn = Connection::with_config(HandlerConfig::new().exact().case_sensitive(true));
        assert_eq!(conn.statement_handler().config().match_mode, MatchMode::Exact);
        assert!(conn.prepared_statement_handler().config().case_sensitive);
        assert_eq!(
            conn.callable_statement_handler().config().match_mode,
            MatchMode::Exact
        );
    }

    #[test]
    fn test_statements_share_connection_handlers() {
        let conn = Connection::new();
        conn.statement_handler().register_update_count("update", 5);
        let mut stmt = conn.create_statement();
        assert_eq!(stmt.execute_update("update t").unwrap(), 5);
        assert_eq!(conn.statement_handler().executed_statements().len(), 1);
    }

    #[test]
    fn test_savepoint_ids_are_monotonic() {
        let mut conn = Connection::new();
        let a = conn.set_savepoint_named("a");
        let b = conn.set_savepoint_named("a");
        assert_eq!(a.id(), 0);
        assert_eq!(b.id(), 1);
        conn.reset_savepoints();
        assert_eq!(conn.set_savepoint().id(), 2);
    }

    #[test]
    fn test_release_twice_fails() {
        let mut conn = Connection::new();
        let sp = conn.set_savepoint();
        conn.release_savepoint(&sp).unwrap();
        assert!(matches!(
            conn.release_savepoint(&sp),
            Err(Error::Savepoint(_))
        ));
        assert!(conn.savepoint(sp.id()).unwrap().is_released());
    }

    #[test]
    fn test_rollback_to_counts_as_rollback() {
        let mut conn = Connection::new();
        let sp = conn.set_savepoint_named("x");
        conn.rollback_to(&sp).unwrap();
        assert_eq!(conn.rollback_count(), 1);
        assert!(conn.savepoint(sp.id()).unwrap().is_rolled_back());
        assert!(conn.rollback_to(&sp).is_err());
        assert_eq!(conn.rollback_count(), 1);
    }

    #[test]
    fn test_unknown_savepoint() {
        let mut conn = Connection::new();
        let sp = conn.set_savepoint();
        conn.reset_savepoints();
        assert!(matches!(
            conn.release_savepoint(&sp),
            Err(Error::Savepoint(_))
        ));
    }

    #[test]
    fn test_invalid_generated_keys_flag() {
        let conn = Connection::new();
        assert!(matches!(
            conn.prepare_statement_with_keys("insert", 5),
            Err(Error::InvalidArgument(_))
        ));
        let stmt = conn
            .prepare_statement_with_keys("insert", crate::statement::RETURN_GENERATED_KEYS)
            .unwrap();
        assert!(stmt.returns_generated_keys());
    }

    #[test]
    fn test_prepare_with_key_columns_returns_keys() {
        let conn = Connection::new();
        assert!(
            conn.prepare_statement_with_key_columns("insert", &[1])
                .returns_generated_keys()
        );
        assert!(
            conn.prepare_statement_with_key_names("insert", &["id"])
                .returns_generated_keys()
        );
        assert!(
            conn.prepare_statement_with_key_names("insert", &[])
                .returns_generated_keys()
        );
    }

    #[test]
    fn test_properties() {
        let mut conn = Connection::new();
        assert!(!conn.auto_commit());
        conn.set_auto_commit(true);
        conn.set_isolation_level(IsolationLevel::Serializable);
        conn.set_catalog("main");
        conn.set_client_info("app", "tests");
        assert!(conn.auto_commit());
        assert_eq!(conn.isolation_level(), IsolationLevel::Serializable);
        assert_eq!(conn.catalog(), Some("main"));
        assert_eq!(conn.client_info("app"), Some("tests"));
        assert!(conn.is_valid());
        conn.close();
        assert!(!conn.is_valid());
    }
}
