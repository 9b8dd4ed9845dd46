//! The sequential-ID allocator.
//!
//! Allocation never trusts the counter cell alone. Every call first scans
//! the records table for the true observed maximum, then advances the cell
//! through the atomic update with `base = max(current, observed)`. A cell
//! that was reset, deleted, or never initialized (first deployment, or a
//! crash that persisted a record but not the counter) heals forward instead
//! of re-issuing taken values.

use rusqlite::Connection;
use tracing::{debug, warn};

use runbook_core::model::{EntityClass, SequentialId};

use crate::counter;
use crate::error::Result;

/// Highest numeric suffix among existing records of a class; 0 when none
/// exist.
///
/// # Errors
///
/// Returns [`crate::StoreError::Unavailable`] on a storage failure.
pub fn observed_max(conn: &Connection, class: EntityClass) -> Result<u32> {
    let max: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), 0) FROM records WHERE class = ?1",
        [class.as_str()],
        |row| row.get(0),
    )?;
    Ok(u32::try_from(max).unwrap_or(0))
}

/// Allocate the next sequential ID for a class.
///
/// # Errors
///
/// [`crate::StoreError::AllocationConflict`] when the atomic update lost
/// its race beyond `retry_budget` attempts — callers should retry the whole
/// allocation; [`crate::StoreError::Unavailable`] on storage failure.
pub fn allocate_next(
    conn: &mut Connection,
    class: EntityClass,
    retry_budget: u32,
) -> Result<SequentialId> {
    let observed = observed_max(conn, class)?;

    // Informational only: the atomic update below makes its own decision
    // from the value it reads inside the transaction.
    let seen = counter::read_counter(conn, class)?;
    if observed > 0 && seen.is_none_or(|value| value < i64::from(observed)) {
        warn!(
            class = class.as_str(),
            observed,
            counter = ?seen,
            "counter cell is behind the records table; healing forward"
        );
    }

    let committed = counter::update_counter(conn, class, retry_budget, |current| {
        let base = current.map_or_else(
            || i64::from(observed),
            |value| value.max(i64::from(observed)),
        );
        base + 1
    })?;
    debug!(class = class.as_str(), committed, "allocated sequential id");

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = committed as u32;
    Ok(SequentialId::new(class, value))
}

/// Recompute the observed maximum and unconditionally overwrite the counter
/// cell with it. Administrative repair after manual edits/deletions; not
/// used on the creation hot path.
///
/// # Errors
///
/// Same failure modes as [`allocate_next`].
pub fn resync(conn: &mut Connection, class: EntityClass, retry_budget: u32) -> Result<u32> {
    let observed = observed_max(conn, class)?;
    let committed =
        counter::update_counter(conn, class, retry_budget, |_| i64::from(observed))?;
    debug!(class = class.as_str(), committed, "resynced counter cell");

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = committed as u32;
    Ok(value)
}
