//! Transaction bookkeeping.
//!
//! This module provides transaction isolation levels and the savepoints a
//! [`crate::Connection`] hands out. Nothing is ever committed or undone; the
//! connection only records what was asked of it.

use crate::error::{Error, Result};

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Transactions are not supported.
    None,

    /// Read uncommitted (dirty reads allowed).
    ReadUncommitted,

    /// Read committed (the default).
    #[default]
    ReadCommitted,

    /// Repeatable read.
    RepeatableRead,

    /// Serializable (highest isolation).
    Serializable,
}

impl IsolationLevel {
    /// The driver-level numeric code of this isolation level.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::ReadUncommitted => 1,
            Self::ReadCommitted => 2,
            Self::RepeatableRead => 4,
            Self::Serializable => 8,
        }
    }

    /// Get the isolation level name as written in SQL.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

impl TryFrom<i32> for IsolationLevel {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::ReadUncommitted),
            2 => Ok(Self::ReadCommitted),
            4 => Ok(Self::RepeatableRead),
            8 => Ok(Self::Serializable),
            other => Err(Error::InvalidArgument(format!(
                "unknown transaction isolation level {other}"
            ))),
        }
    }
}

/// A savepoint created by a connection.
///
/// Identity is the numeric id, assigned from a per-connection counter;
/// names need not be unique. A released or rolled-back savepoint stays in
/// the connection's savepoint map but rejects further use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Savepoint {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) released: bool,
    pub(crate) rolled_back: bool,
}

impl Savepoint {
    pub(crate) fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            released: false,
            rolled_back: false,
        }
    }

    /// Get the savepoint id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Get the savepoint name; empty for unnamed savepoints.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the savepoint was released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Check if the connection was rolled back to this savepoint.
    #[must_use]
    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }

    /// Fail if the savepoint can no longer be released or rolled back to.
    pub(crate) fn ensure_usable(&self) -> Result<()> {
        if self.released {
            return Err(Error::Savepoint(format!(
                "Savepoint with id {} and name {} is released",
                self.id, self.name
            )));
        }
        if self.rolled_back {
            return Err(Error::Savepoint(format!(
                "Savepoint with id {} and name {} is rolled back",
                self.id, self.name
            )));
        }
        Ok(())
    }
}
