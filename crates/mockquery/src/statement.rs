//! Plain statements and the execution core shared by every statement kind.

use crate::batch::{self, BatchOutcome};
use crate::config::StatementOptions;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::handler::ResultSetHandler;
use crate::kind::{Plain, StatementKind};
use crate::params::ParameterMap;
use crate::result_set::ResultSet;
use crate::wrapper::Wrapper;

/// Raw flag asking an execution to produce generated keys.
pub const RETURN_GENERATED_KEYS: i32 = 1;
/// Raw flag asking an execution not to produce generated keys.
pub const NO_GENERATED_KEYS: i32 = 2;

/// Whether an execution should expose generated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoGeneratedKeys {
    /// Resolve generated keys after executing.
    Return,
    /// Clear generated keys.
    #[default]
    None,
}

impl TryFrom<i32> for AutoGeneratedKeys {
    type Error = Error;

    fn try_from(flag: i32) -> Result<Self> {
        match flag {
            RETURN_GENERATED_KEYS => Ok(Self::Return),
            NO_GENERATED_KEYS => Ok(Self::None),
            other => Err(Error::InvalidArgument(format!(
                "autoGeneratedKeys must be either RETURN_GENERATED_KEYS or NO_GENERATED_KEYS, got {other}"
            ))),
        }
    }
}

impl From<AutoGeneratedKeys> for i32 {
    fn from(keys: AutoGeneratedKeys) -> Self {
        match keys {
            AutoGeneratedKeys::Return => RETURN_GENERATED_KEYS,
            AutoGeneratedKeys::None => NO_GENERATED_KEYS,
        }
    }
}

/// Handler, cursor and options of one statement.
#[derive(Debug)]
pub(crate) struct StatementCore<K: StatementKind> {
    pub(crate) handler: ResultSetHandler<K>,
    pub(crate) cursor: Cursor,
    pub(crate) options: StatementOptions,
}

impl<K: StatementKind> StatementCore<K> {
    pub(crate) fn new(handler: ResultSetHandler<K>) -> Self {
        Self {
            handler,
            cursor: Cursor::default(),
            options: StatementOptions::default(),
        }
    }

    /// Resolve a query and make its result sets current.
    pub(crate) fn run_query(&mut self, sql: &str, parameters: Option<&ParameterMap>) -> Result<()> {
        let sets = self.handler.resolve_query(sql, parameters)?;
        self.cursor.set_result_sets(sets);
        self.cursor.set_generated_keys(None);
        Ok(())
    }

    /// Resolve an update, make its counts current and return the first one
    /// (zero for an empty list).
    pub(crate) fn run_update(&mut self, sql: &str, parameters: Option<&ParameterMap>) -> Result<i32> {
        let counts = self.handler.resolve_update(sql, parameters)?;
        let first = counts.first().copied().unwrap_or(0);
        self.cursor.set_update_counts(counts);
        self.cursor.set_generated_keys(None);
        Ok(first)
    }

    /// Run `sql` as a query or an update, depending on its classification.
    pub(crate) fn run(&mut self, sql: &str, parameters: Option<&ParameterMap>) -> Result<bool> {
        let is_query = self.handler.is_query_with(sql, parameters);
        if is_query {
            self.run_query(sql, parameters)?;
        } else {
            self.run_update(sql, parameters)?;
        }
        Ok(is_query)
    }

    /// Run `sql` as a batch item.
    pub(crate) fn run_batch_item(
        &mut self,
        sql: &str,
        parameters: Option<&ParameterMap>,
    ) -> Result<BatchOutcome> {
        if self.handler.is_query_with(sql, parameters) {
            return Ok(BatchOutcome::ReturnsResultSet {
                sql: sql.to_owned(),
            });
        }
        self.run_update(sql, parameters).map(BatchOutcome::Updated)
    }

    pub(crate) fn apply_generated_keys(
        &mut self,
        sql: &str,
        parameters: Option<&ParameterMap>,
        keys: AutoGeneratedKeys,
    ) {
        let resolved = match keys {
            AutoGeneratedKeys::Return => self.handler.resolve_generated_keys(sql, parameters),
            AutoGeneratedKeys::None => None,
        };
        self.cursor.set_generated_keys(resolved);
    }

    pub(crate) fn continue_on_batch_failure(&self) -> bool {
        self.handler.config().continue_on_batch_failure
    }
}

/// Shared cursor, options and lifecycle accessors for statement types.
macro_rules! cursor_accessors {
    ($($core:ident).+) => {
        /// The current result set, if the last execution produced one and
        /// the cursor has not moved past it.
        ///
        /// The returned handle shares the instance held by the statement and
        /// the handler's returned-result-set log.
        #[must_use]
        pub fn result_set(&self) -> Option<$crate::result_set::ResultSet> {
            self.$($core).+.cursor.result_set().cloned()
        }

        /// The current update count; `-1` when there is none.
        #[must_use]
        pub fn update_count(&self) -> i32 {
            self.$($core).+.cursor.update_count()
        }

        /// Advance to the next result, closing the current result set.
        ///
        /// Returns whether a further result set is available.
        pub fn more_results(&mut self) -> bool {
            self.$($core).+.cursor.more_results(true)
        }

        /// Advance to the next result, optionally keeping the current result
        /// set open.
        pub fn more_results_with(&mut self, close_current: bool) -> bool {
            self.$($core).+.cursor.more_results(close_current)
        }

        /// The generated keys of the last execution.
        ///
        /// Without keys this is an empty result set whose id is
        /// [`crate::cursor::NO_GENERATED_KEYS_ID`].
        #[must_use]
        pub fn generated_keys(&self) -> $crate::result_set::ResultSet {
            self.$($core).+.cursor.generated_keys()
        }

        /// State of the current results.
        #[must_use]
        pub fn state(&self) -> $crate::cursor::CursorState {
            self.$($core).+.cursor.state()
        }

        /// Close the statement and its current result sets.
        ///
        /// Executing again is still possible and reopens the statement.
        pub fn close(&mut self) {
            self.$($core).+.cursor.close();
        }

        /// Check if the statement is closed.
        #[must_use]
        pub fn is_closed(&self) -> bool {
            self.$($core).+.cursor.is_closed()
        }

        /// Statement options.
        #[must_use]
        pub fn options(&self) -> &$crate::config::StatementOptions {
            &self.$($core).+.options
        }

        /// Replace the statement options.
        pub fn set_options(&mut self, options: $crate::config::StatementOptions) {
            self.$($core).+.options = options;
        }

        /// Record a query timeout. Nothing ever times out.
        pub fn set_query_timeout(&mut self, timeout: std::time::Duration) {
            self.$($core).+.options.query_timeout = Some(timeout);
        }

        /// Record a maximum row count. Result sets are not truncated.
        pub fn set_max_rows(&mut self, max: u32) {
            self.$($core).+.options.max_rows = max;
        }

        /// Record a fetch size hint.
        pub fn set_fetch_size(&mut self, size: u32) {
            self.$($core).+.options.fetch_size = size;
        }

        /// Record a cursor name.
        pub fn set_cursor_name(&mut self, name: impl Into<String>) {
            self.$($core).+.options.cursor_name = Some(name.into());
        }

        /// Record whether the statement may be pooled.
        pub fn set_poolable(&mut self, poolable: bool) {
            self.$($core).+.options.poolable = poolable;
        }

        /// Request cancellation. There is never anything to cancel.
        pub fn cancel(&self) {
            tracing::trace!("cancel requested on mock statement");
        }
    };
}

pub(crate) use cursor_accessors;

/// A plain statement: SQL is supplied on every execution.
#[derive(Debug)]
pub struct Statement {
    core: StatementCore<Plain>,
    batch: Vec<String>,
}

impl Statement {
    /// Create a statement backed by `handler`.
    #[must_use]
    pub fn new(handler: ResultSetHandler<Plain>) -> Self {
        Self {
            core: StatementCore::new(handler),
            batch: Vec::new(),
        }
    }

    /// The handler answering this statement.
    #[must_use]
    pub fn handler(&self) -> &ResultSetHandler<Plain> {
        &self.core.handler
    }

    /// Execute a query and return its first result set.
    ///
    /// `None` when the resolved response is an empty list of result sets.
    pub fn execute_query(&mut self, sql: &str) -> Result<Option<ResultSet>> {
        self.core.run_query(sql, None)?;
        Ok(self.core.cursor.result_set().cloned())
    }

    /// Execute an update and return its (first) update count.
    pub fn execute_update(&mut self, sql: &str) -> Result<i32> {
        self.core.run_update(sql, None)
    }

    /// Execute an update, then resolve or clear generated keys according to
    /// the raw `auto_generated_keys` flag.
    ///
    /// The flag is validated before anything runs.
    pub fn execute_update_with_keys(&mut self, sql: &str, auto_generated_keys: i32) -> Result<i32> {
        let keys = AutoGeneratedKeys::try_from(auto_generated_keys)?;
        let count = self.core.run_update(sql, None)?;
        self.core.apply_generated_keys(sql, None, keys);
        Ok(count)
    }

    /// Execute `sql` as a query or update. Returns `true` for a query.
    pub fn execute(&mut self, sql: &str) -> Result<bool> {
        self.core.run(sql, None)
    }

    /// Like [`Statement::execute`], with a raw generated-keys flag.
    pub fn execute_with_keys(&mut self, sql: &str, auto_generated_keys: i32) -> Result<bool> {
        let keys = AutoGeneratedKeys::try_from(auto_generated_keys)?;
        let is_query = self.core.run(sql, None)?;
        self.core.apply_generated_keys(sql, None, keys);
        Ok(is_query)
    }

    /// Execute an update and resolve generated keys for the given 1-based
    /// key column indexes.
    ///
    /// The column list is accepted as is: the registered generated keys are
    /// returned whole, as with [`RETURN_GENERATED_KEYS`].
    pub fn execute_update_with_key_columns(
        &mut self,
        sql: &str,
        column_indexes: &[usize],
    ) -> Result<i32> {
        tracing::trace!(columns = ?column_indexes, "key columns requested");
        self.update_returning_keys(sql)
    }

    /// Execute an update and resolve generated keys for the named key
    /// columns. Behaves like [`RETURN_GENERATED_KEYS`].
    pub fn execute_update_with_key_names(
        &mut self,
        sql: &str,
        column_names: &[&str],
    ) -> Result<i32> {
        tracing::trace!(columns = ?column_names, "key columns requested");
        self.update_returning_keys(sql)
    }

    /// Like [`Statement::execute`], resolving generated keys for the given
    /// 1-based key column indexes.
    pub fn execute_with_key_columns(&mut self, sql: &str, column_indexes: &[usize]) -> Result<bool> {
        tracing::trace!(columns = ?column_indexes, "key columns requested");
        self.run_returning_keys(sql)
    }

    /// Like [`Statement::execute`], resolving generated keys for the named
    /// key columns.
    pub fn execute_with_key_names(&mut self, sql: &str, column_names: &[&str]) -> Result<bool> {
        tracing::trace!(columns = ?column_names, "key columns requested");
        self.run_returning_keys(sql)
    }

    fn update_returning_keys(&mut self, sql: &str) -> Result<i32> {
        let count = self.core.run_update(sql, None)?;
        self.core
            .apply_generated_keys(sql, None, AutoGeneratedKeys::Return);
        Ok(count)
    }

    fn run_returning_keys(&mut self, sql: &str) -> Result<bool> {
        let is_query = self.core.run(sql, None)?;
        self.core
            .apply_generated_keys(sql, None, AutoGeneratedKeys::Return);
        Ok(is_query)
    }

    /// Check how `sql` would be classified.
    #[must_use]
    pub fn is_query(&self, sql: &str) -> bool {
        self.core.handler.is_query(sql)
    }

    /// Queue `sql` for the next batch.
    pub fn add_batch(&mut self, sql: impl Into<String>) {
        self.batch.push(sql.into());
    }

    /// Drop every queued batch item.
    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    /// Queued batch items.
    #[must_use]
    pub fn batch(&self) -> &[String] {
        &self.batch
    }

    /// Run every queued item. Queued items are kept.
    pub fn execute_batch(&mut self) -> Result<Vec<i32>> {
        let continue_on_failure = self.core.continue_on_batch_failure();
        let core = &mut self.core;
        batch::run_batch(&self.batch, continue_on_failure, |sql| {
            core.run_batch_item(sql, None)
        })
    }

    cursor_accessors!(core);
}

impl Wrapper for Statement {}
