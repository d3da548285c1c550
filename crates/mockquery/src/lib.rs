//! # mockquery
//!
//! Canned-response SQL test double.
//!
//! Code under test talks to a [`Connection`] and its statements as it would
//! to a real database driver. Tests register responses on the connection's
//! handlers beforehand and inspect what was executed afterwards.
//!
//! ## Features
//!
//! - **Three statement kinds**: plain, prepared and callable, each answered
//!   by its own handler
//! - **Flexible matching**: contains, exact or regular-expression SQL keys,
//!   optionally case-sensitive
//! - **Parameter-keyed responses** for prepared and callable statements
//! - **Batches** with stop-at-first-failure or continue semantics
//! - **Output parameters** for stored-procedure calls
//! - **Transaction bookkeeping**: commits, rollbacks and savepoints
//!
//! ## Resolution Order
//!
//! ```text
//! registered error  -> returned before the statement is logged
//! keyed multiple    -> keyed single
//! global multiple   -> global single (empty result set / update count 0)
//! ```
//!
//! Parameter-keyed entries always win over SQL-only entries.
//! Errors are registered per SQL key only: there is no global error
//! registration, so a statement without a matching error key never fails.
//!
//! Result sets handed to a statement are shared with the handler's
//! returned-result-set log, so closing or advancing them shows there too.
//!
//! ## Example
//!
//! ```rust
//! use mockquery::{Connection, ResultSet, SqlError};
//! use mockquery::verify::verify_statement_executed;
//!
//! let conn = Connection::new();
//! let handler = conn.prepared_statement_handler();
//! handler.register_result_set(
//!     "from accounts",
//!     ResultSet::new("accounts")
//!         .with_columns(["id", "owner"])
//!         .with_row([mockquery::SqlValue::Int(1), "alice".into()]),
//! );
//! handler.register_error("delete", SqlError::new("permission denied"));
//!
//! let mut stmt = conn.prepare_statement("SELECT * FROM accounts WHERE id = ?");
//! stmt.set(1, 1);
//! let rs = stmt.execute_query().unwrap().unwrap();
//! assert!(rs.next());
//! assert_eq!(rs.get_by_name::<String>("owner").unwrap(), "alice");
//!
//! let mut delete = conn.prepare_statement("DELETE FROM accounts");
//! assert!(delete.execute_update().is_err());
//!
//! verify_statement_executed(&conn, "from accounts").unwrap();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod batch;
pub mod callable;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod handler;
pub mod kind;
pub mod matcher;
pub mod params;
pub mod prepared;
pub mod registry;
pub mod result_set;
pub mod sql;
pub mod statement;
pub mod transaction;
pub mod verify;
pub mod wrapper;

// Core types
pub use connection::Connection;
pub use error::{Error, Result, SqlError};

// Configuration
pub use config::{HandlerConfig, StatementOptions};
pub use matcher::{MatchMode, SqlMatcher};

// Handlers
pub use handler::{
    CallableStatementHandler, ExecutedStatement, PreparedStatementHandler, ResultSetHandler,
    StatementHandler,
};
pub use registry::RegisteredResponse;

// Statements and results
pub use batch::EXECUTE_FAILED;
pub use callable::CallableStatement;
pub use cursor::{CursorState, NO_GENERATED_KEYS_ID};
pub use params::{ParamKey, ParameterMap};
pub use prepared::PreparedStatement;
pub use result_set::{Column, ResultSet};
pub use statement::{AutoGeneratedKeys, NO_GENERATED_KEYS, RETURN_GENERATED_KEYS, Statement};

// Transactions
pub use transaction::{IsolationLevel, Savepoint};

pub use wrapper::Wrapper;

// Re-export value types
pub use bytes::Bytes;
pub use mockquery_types::{FromSql, SqlValue, TypeError};
