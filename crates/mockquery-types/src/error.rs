//! Type conversion error types.

use thiserror::Error;

/// Errors that can occur during value conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// Value is null when the target type has no null representation.
    #[error("unexpected null value")]
    UnexpectedNull,

    /// Type mismatch during conversion.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: String,
    },

    /// Textual value could not be parsed as the target type.
    #[error("cannot parse {value:?} as {target}")]
    Parse {
        /// Target type name.
        target: &'static str,
        /// The offending text.
        value: String,
    },

    /// Invalid date/time value.
    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),

    /// Invalid decimal value.
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    /// Invalid UUID value.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}
