//! The atomic counter-cell primitive.
//!
//! One row per entity class holds the highest sequence value ever issued.
//! The only write path is [`update_counter`]: an immediate transaction that
//! reads the current value (absent allowed), applies a pure function, and
//! commits the result. Racing writers are serialized by SQLite's write
//! lock; a writer that cannot acquire it within the busy timeout backs off
//! and retries up to the caller's budget.
//!
//! The update function may run several times (once per attempt), so it must
//! be pure: no I/O, no side effects, same output for the same input.

use rusqlite::{Connection, ErrorCode as SqliteErrorCode, OptionalExtension, TransactionBehavior};
use std::time::Duration;
use tracing::debug;

use runbook_core::model::EntityClass;

use crate::error::{Result, StoreError};

/// Default attempts at the atomic update before surfacing a conflict.
pub const DEFAULT_RETRY_BUDGET: u32 = 8;

/// Pause between attempts when the write lock is contended.
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Read the counter cell for a class. `None` means the cell was never
/// written (or was deleted out-of-band) — the allocator's bootstrap case.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] on a storage failure.
pub fn read_counter(conn: &Connection, class: EntityClass) -> Result<Option<i64>> {
    let value = conn
        .query_row(
            "SELECT value FROM counters WHERE class = ?1",
            [class.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Atomically update the counter cell for a class.
///
/// Applies `f` to the current value inside an immediate transaction and
/// commits the result, retrying up to `retry_budget` times when another
/// writer holds the lock. Returns the committed value.
///
/// # Errors
///
/// [`StoreError::AllocationConflict`] when every attempt lost the race;
/// [`StoreError::Unavailable`] on any other storage failure.
pub fn update_counter<F>(
    conn: &mut Connection,
    class: EntityClass,
    retry_budget: u32,
    f: F,
) -> Result<i64>
where
    F: Fn(Option<i64>) -> i64,
{
    let attempts = retry_budget.max(1);
    for attempt in 1..=attempts {
        match try_update(conn, class, &f) {
            Ok(value) => return Ok(value),
            Err(error) if is_contention(&error) => {
                debug!(
                    class = class.as_str(),
                    attempt,
                    "counter update contended; backing off"
                );
                std::thread::sleep(RETRY_BACKOFF);
            }
            Err(error) => return Err(StoreError::Unavailable(error)),
        }
    }

    Err(StoreError::AllocationConflict { class, attempts })
}

fn try_update<F>(conn: &mut Connection, class: EntityClass, f: &F) -> rusqlite::Result<i64>
where
    F: Fn(Option<i64>) -> i64,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current: Option<i64> = tx
        .query_row(
            "SELECT value FROM counters WHERE class = ?1",
            [class.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    let next = f(current);
    tx.execute(
        "INSERT INTO counters (class, value) VALUES (?1, ?2)
         ON CONFLICT(class) DO UPDATE SET value = excluded.value",
        (class.as_str(), next),
    )?;

    tx.commit()?;
    Ok(next)
}

/// Busy/locked outcomes are contention; everything else is a real failure.
fn is_contention(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == SqliteErrorCode::DatabaseBusy
                || failure.code == SqliteErrorCode::DatabaseLocked
    )
}
