//! Assertions over what a [`Connection`] recorded.
//!
//! Each check returns [`Error::Verify`] describing the mismatch, so tests can
//! propagate it with `?` or unwrap it for a readable failure.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::handler::ResultSetHandler;
use crate::kind::StatementKind;

fn executed_matching<K: StatementKind>(handler: &ResultSetHandler<K>, sql: &str) -> bool {
    let matcher = handler.config().matcher();
    handler
        .executed_statements()
        .iter()
        .any(|executed| matcher.matches(sql, executed))
}

fn executed_anywhere(conn: &Connection, sql: &str) -> bool {
    executed_matching(conn.statement_handler(), sql)
        || executed_matching(conn.prepared_statement_handler(), sql)
        || executed_matching(conn.callable_statement_handler(), sql)
}

/// Fail unless a statement matching `sql` was executed by any statement kind.
pub fn verify_statement_executed(conn: &Connection, sql: &str) -> Result<()> {
    if executed_anywhere(conn, sql) {
        return Ok(());
    }
    Err(Error::Verify(format!("Statement {sql} not executed.")))
}

/// Fail if a statement matching `sql` was executed.
pub fn verify_statement_not_executed(conn: &Connection, sql: &str) -> Result<()> {
    if executed_anywhere(conn, sql) {
        return Err(Error::Verify(format!("Statement {sql} was executed.")));
    }
    Ok(())
}

/// Fail unless a result set with `id` was returned by any statement kind.
pub fn verify_result_set_returned(conn: &Connection, id: &str) -> Result<()> {
    let returned = conn
        .statement_handler()
        .returned_result_sets()
        .into_iter()
        .chain(conn.prepared_statement_handler().returned_result_sets())
        .chain(conn.callable_statement_handler().returned_result_sets())
        .any(|rs| rs.id() == id);
    if returned {
        return Ok(());
    }
    Err(Error::Verify(format!("ResultSet {id} not returned.")))
}

/// Fail unless exactly `expected` commits were recorded.
pub fn verify_commits(conn: &Connection, expected: u32) -> Result<()> {
    let actual = conn.commit_count();
    if actual == expected {
        return Ok(());
    }
    Err(Error::Verify(format!(
        "Expected {expected} commits, actual {actual} commits"
    )))
}

/// Fail unless exactly `expected` rollbacks were recorded.
pub fn verify_rollbacks(conn: &Connection, expected: u32) -> Result<()> {
    let actual = conn.rollback_count();
    if actual == expected {
        return Ok(());
    }
    Err(Error::Verify(format!(
        "Expected {expected} rollbacks, actual {actual} rollbacks"
    )))
}

/// Fail unless the savepoint `id` exists and was released.
pub fn verify_savepoint_released(conn: &Connection, id: u32) -> Result<()> {
    match conn.savepoint(id) {
        None => Err(Error::Verify(format!("No Savepoint with index {id} present."))),
        Some(sp) if sp.is_released() => Ok(()),
        Some(_) => Err(Error::Verify(format!("Savepoint with index {id} not released."))),
    }
}

/// Fail unless the savepoint `id` exists and was rolled back to.
pub fn verify_savepoint_rolled_back(conn: &Connection, id: u32) -> Result<()> {
    match conn.savepoint(id) {
        None => Err(Error::Verify(format!("No Savepoint with index {id} present."))),
        Some(sp) if sp.is_rolled_back() => Ok(()),
        Some(_) => Err(Error::Verify(format!(
            "Savepoint with index {id} not rolled back."
        ))),
    }
}
