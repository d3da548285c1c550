//! Batch execution.
//!
//! A batch is a list of items (SQL strings for plain statements, parameter
//! sets for prepared and callable ones) run one by one through the update
//! path. Items that would return a result set are rejected. Each position of
//! the returned array holds the item's update count, or [`EXECUTE_FAILED`].
//!
//! ## Failure policy
//!
//! - stop at the first failure: raise [`Error::BatchUpdate`] whose counts
//!   cover items `0..=i`, with position `i` set to [`EXECUTE_FAILED`]
//! - continue on failure: run every item, then raise with the full array
//!
//! A failing item that itself raised a batch error is re-raised unchanged.

use crate::error::{Error, Result, SqlError};

/// Status code of a batch item that failed.
pub const EXECUTE_FAILED: i32 = -3;

/// What running one batch item produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BatchOutcome {
    /// The item ran as an update.
    Updated(i32),
    /// The item is classified as a query and was not run.
    ReturnsResultSet {
        /// SQL of the rejected item.
        sql: String,
    },
}

/// Run `items` through `step` under the given failure policy.
pub(crate) fn run_batch<I>(
    items: &[I],
    continue_on_failure: bool,
    mut step: impl FnMut(&I) -> Result<BatchOutcome>,
) -> Result<Vec<i32>> {
    let mut results = vec![0; items.len()];
    let mut last_failure: Option<Error> = None;

    for (index, item) in items.iter().enumerate() {
        let failure = match step(item) {
            Ok(BatchOutcome::Updated(count)) => {
                results[index] = count;
                continue;
            }
            Ok(BatchOutcome::ReturnsResultSet { sql }) => SqlError::new(format!(
                "SQL {sql} in the list of batches returned a ResultSet."
            ))
            .into(),
            Err(e) => e,
        };

        let failure = failed_result(&mut results, index, failure);
        tracing::debug!(index, error = %failure, "batch item failed");
        if !continue_on_failure {
            return Err(failure);
        }
        last_failure = Some(failure);
    }

    match last_failure {
        Some(failure) => {
            tracing::debug!(items = results.len(), "batch finished with failures");
            Err(Error::BatchUpdate {
                message: failure.message(),
                sql_state: failure.sql_state().map(str::to_owned),
                error_code: failure.error_code(),
                update_counts: results,
            })
        }
        None => {
            tracing::debug!(items = results.len(), "batch finished");
            Ok(results)
        }
    }
}

fn failed_result(results: &mut [i32], index: usize, cause: Error) -> Error {
    results[index] = EXECUTE_FAILED;
    if cause.is_batch_failure() {
        return cause;
    }
    Error::BatchUpdate {
        message: cause.message(),
        sql_state: cause.sql_state().map(str::to_owned),
        error_code: cause.error_code(),
        update_counts: results[..=index].to_vec(),
    }
}
