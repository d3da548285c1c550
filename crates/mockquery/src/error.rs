//! Error types.

use thiserror::Error;

/// A database error as a real driver would report it.
///
/// Registered against a SQL key, it is returned verbatim whenever a matching
/// statement is executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SqlError {
    /// Human-readable message.
    pub message: String,
    /// Five-character SQLSTATE code, if any.
    pub sql_state: Option<String>,
    /// Vendor error code.
    pub error_code: i32,
}

impl SqlError {
    /// Create an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            error_code: 0,
        }
    }

    /// Set the SQLSTATE code.
    #[must_use]
    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }

    /// Set the vendor error code.
    #[must_use]
    pub fn with_error_code(mut self, code: i32) -> Self {
        self.error_code = code;
        self
    }
}

/// Errors that can occur during mock operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A registered error matched the executed statement.
    #[error("SQL error: {0}")]
    Sql(#[from] SqlError),

    /// One or more batch items failed.
    #[error("batch update failed: {message}")]
    BatchUpdate {
        /// Message of the failure that triggered the error.
        message: String,
        /// SQLSTATE of the triggering failure.
        sql_state: Option<String>,
        /// Vendor code of the triggering failure.
        error_code: i32,
        /// Per-item outcomes; failed items are [`crate::batch::EXECUTE_FAILED`].
        update_counts: Vec<i32>,
    },

    /// A caller-supplied argument is outside its permitted values.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Savepoint misuse (already released or rolled back, or unknown).
    #[error("savepoint error: {0}")]
    Savepoint(String),

    /// The requested capability is not provided by the mock.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A verification against recorded activity failed.
    #[error("verification failed: {0}")]
    Verify(String),

    /// Value conversion error.
    #[error("type error: {0}")]
    Type(#[from] mockquery_types::TypeError),
}

impl Error {
    /// Check if this is an aggregate batch failure.
    #[must_use]
    pub fn is_batch_failure(&self) -> bool {
        matches!(self, Self::BatchUpdate { .. })
    }

    /// Per-item outcomes if this is a batch failure.
    #[must_use]
    pub fn update_counts(&self) -> Option<&[i32]> {
        match self {
            Self::BatchUpdate { update_counts, .. } => Some(update_counts),
            _ => None,
        }
    }

    /// The bare message, without the variant prefix used by `Display`.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Sql(e) => e.message.clone(),
            Self::BatchUpdate { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// SQLSTATE carried by the error, if any.
    #[must_use]
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Sql(e) => e.sql_state.as_deref(),
            Self::BatchUpdate { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Vendor error code; zero for errors that carry none.
    #[must_use]
    pub fn error_code(&self) -> i32 {
        match self {
            Self::Sql(e) => e.error_code,
            Self::BatchUpdate { error_code, .. } => *error_code,
            _ => 0,
        }
    }
}

/// Result type for mock operations.
pub type Result<T> = std::result::Result<T, Error>;
