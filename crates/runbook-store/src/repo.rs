//! The record/task repository.
//!
//! Mostly keyed CRUD over the two tables; the core-relevant guarantees live
//! in [`create_record`] (exactly one allocator call, and the ID is consumed
//! even when the subsequent insert fails — never retried with the same
//! value) and the two transition functions (read-plan-append-write inside
//! one immediate transaction per record, so transitions on the same record
//! are linearized by the store).
//!
//! Trails are run through the audit normalizer on every read, so a column
//! corrupted by an out-of-band write still comes back consistent.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, warn};

use runbook_core::audit::{self, HistoryEntry};
use runbook_core::model::{
    Actor, DocStatus, EntityClass, NewRecord, NewTask, RecordFields, RecordPatch, SequentialId,
    StepAssignees, StepStatus, TaskFields,
};
use runbook_core::workflow;

use crate::alloc;
use crate::error::{Result, StoreError};

/// Generate a fresh opaque storage key. Keys are never reused; 128 random
/// bits keep collisions out of the picture.
fn fresh_key(prefix: &str) -> String {
    format!("{prefix}_{:032x}", rand::random::<u128>())
}

fn parse_history(json: &str) -> Vec<HistoryEntry> {
    audit::normalize(audit::parse_stored_trail(json))
}

struct RecordRow {
    key: String,
    class: String,
    seq: i64,
    title: String,
    status: String,
    owner_email: String,
    payload: String,
    history: String,
    created_at_us: i64,
    updated_at_us: i64,
}

const RECORD_COLUMNS: &str = "record_key, class, seq, seq_id, title, status, owner_email, \
                              payload, history, created_at_us, updated_at_us";

fn record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        key: row.get(0)?,
        class: row.get(1)?,
        seq: row.get(2)?,
        // Column 3 (seq_id) is derivable; kept stored for uniqueness checks.
        title: row.get(4)?,
        status: row.get(5)?,
        owner_email: row.get(6)?,
        payload: row.get(7)?,
        history: row.get(8)?,
        created_at_us: row.get(9)?,
        updated_at_us: row.get(10)?,
    })
}

fn record_from_row(row: RecordRow) -> Result<RecordFields> {
    let class: EntityClass = row.class.parse().map_err(|_| StoreError::CorruptRow {
        key: row.key.clone(),
        source: serde_json::Error::io(std::io::Error::other(format!(
            "unknown entity class '{}'",
            row.class
        ))),
    })?;
    let status: DocStatus = row.status.parse().map_err(|_| StoreError::CorruptRow {
        key: row.key.clone(),
        source: serde_json::Error::io(std::io::Error::other(format!(
            "unknown status '{}'",
            row.status
        ))),
    })?;
    let payload =
        serde_json::from_str(&row.payload).map_err(|source| StoreError::CorruptRow {
            key: row.key.clone(),
            source,
        })?;
    let history = parse_history(&row.history);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let seq = row.seq as u32;
    Ok(RecordFields {
        id: SequentialId::new(class, seq),
        key: row.key,
        title: row.title,
        status,
        owner_email: row.owner_email,
        payload,
        history,
        created_at_us: row.created_at_us,
        updated_at_us: row.updated_at_us,
    })
}

struct TaskRow {
    key: String,
    record_key: String,
    position: i64,
    title: String,
    status: String,
    owner_email: Option<String>,
    reviewer_email: Option<String>,
    approver_email: Option<String>,
    history: String,
    created_at_us: i64,
    updated_at_us: i64,
}

const TASK_COLUMNS: &str = "task_key, record_key, position, title, status, owner_email, \
                            reviewer_email, approver_email, history, created_at_us, updated_at_us";

fn task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        key: row.get(0)?,
        record_key: row.get(1)?,
        position: row.get(2)?,
        title: row.get(3)?,
        status: row.get(4)?,
        owner_email: row.get(5)?,
        reviewer_email: row.get(6)?,
        approver_email: row.get(7)?,
        history: row.get(8)?,
        created_at_us: row.get(9)?,
        updated_at_us: row.get(10)?,
    })
}

fn task_from_row(row: TaskRow) -> Result<TaskFields> {
    let status: StepStatus = row.status.parse().map_err(|_| StoreError::CorruptRow {
        key: row.key.clone(),
        source: serde_json::Error::io(std::io::Error::other(format!(
            "unknown step status '{}'",
            row.status
        ))),
    })?;
    let history = parse_history(&row.history);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let position = row.position as u32;
    Ok(TaskFields {
        key: row.key,
        record_key: row.record_key,
        position,
        title: row.title,
        status,
        assignees: StepAssignees {
            owner_email: row.owner_email,
            reviewer_email: row.reviewer_email,
            approver_email: row.approver_email,
        },
        history,
        created_at_us: row.created_at_us,
        updated_at_us: row.updated_at_us,
    })
}

fn history_json(key: &str, history: &[HistoryEntry]) -> Result<String> {
    serde_json::to_string(history).map_err(|source| StoreError::CorruptRow {
        key: key.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Create a counted record: allocate its sequential ID, then persist the
/// row bearing that ID.
///
/// The allocator is called exactly once. If the insert afterwards fails,
/// the allocated value stays consumed — the next creation takes the next
/// value, leaving a gap rather than risking a duplicate.
///
/// # Errors
///
/// Allocation errors pass through; insert failures surface as
/// [`StoreError::Unavailable`].
pub fn create_record(
    conn: &mut Connection,
    new: &NewRecord,
    now: DateTime<Utc>,
    retry_budget: u32,
) -> Result<RecordFields> {
    let id = alloc::allocate_next(conn, new.class, retry_budget)?;
    let key = fresh_key("rec");
    let now_us = now.timestamp_micros();
    let payload = serde_json::to_string(&new.payload).map_err(|source| StoreError::CorruptRow {
        key: key.clone(),
        source,
    })?;

    let inserted = conn.execute(
        "INSERT INTO records (record_key, class, seq, seq_id, title, status, owner_email,
                              payload, history, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '[]', ?9, ?9)",
        (
            &key,
            new.class.as_str(),
            i64::from(id.value()),
            id.to_string(),
            &new.title,
            DocStatus::Draft.as_str(),
            &new.owner_email,
            &payload,
            now_us,
        ),
    );

    match inserted {
        Ok(_) => {
            debug!(key, id = %id, "created record");
            get_record(conn, &key)
        }
        Err(error) => {
            warn!(id = %id, %error, "record insert failed after allocation; id is consumed");
            Err(StoreError::Unavailable(error))
        }
    }
}

/// Fetch a record by its opaque storage key.
///
/// # Errors
///
/// [`StoreError::RecordNotFound`] when no such row exists.
pub fn get_record(conn: &Connection, key: &str) -> Result<RecordFields> {
    let row = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM records WHERE record_key = ?1"),
            [key],
            record_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::RecordNotFound { key: key.to_string() })?;
    record_from_row(row)
}

/// Fetch a record by its sequential ID.
///
/// # Errors
///
/// [`StoreError::RecordNotFound`] when no such row exists.
pub fn get_by_seq_id(conn: &Connection, id: SequentialId) -> Result<RecordFields> {
    let row = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM records WHERE seq_id = ?1"),
            [id.to_string()],
            record_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::RecordNotFound { key: id.to_string() })?;
    record_from_row(row)
}

/// Resolve `key_or_id` as a sequential ID first, then as a storage key.
///
/// # Errors
///
/// [`StoreError::RecordNotFound`] when neither resolves.
pub fn find_record(conn: &Connection, key_or_id: &str) -> Result<RecordFields> {
    if let Ok(id) = key_or_id.parse::<SequentialId>() {
        return get_by_seq_id(conn, id);
    }
    get_record(conn, key_or_id)
}

/// List records, optionally filtered by class and status, ordered by class
/// then sequence.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] on a storage failure.
pub fn list_records(
    conn: &Connection,
    class: Option<EntityClass>,
    status: Option<DocStatus>,
) -> Result<Vec<RecordFields>> {
    let mut sql = format!("SELECT {RECORD_COLUMNS} FROM records");
    let mut clauses = Vec::new();
    let mut params: Vec<String> = Vec::new();
    if let Some(class) = class {
        params.push(class.as_str().to_string());
        clauses.push(format!("class = ?{}", params.len()));
    }
    if let Some(status) = status {
        params.push(status.as_str().to_string());
        clauses.push(format!("status = ?{}", params.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY class, seq");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), record_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

/// Apply a partial content mutation (title/payload) to a record.
///
/// Status is not patchable here; it only moves through
/// [`transition_record`].
///
/// # Errors
///
/// [`StoreError::RecordNotFound`] when no such row exists.
pub fn update_record(
    conn: &mut Connection,
    key: &str,
    patch: &RecordPatch,
    now: DateTime<Utc>,
) -> Result<RecordFields> {
    if patch.is_empty() {
        return get_record(conn, key);
    }

    let payload_json = match &patch.payload {
        Some(value) => Some(serde_json::to_string(value).map_err(|source| {
            StoreError::CorruptRow {
                key: key.to_string(),
                source,
            }
        })?),
        None => None,
    };

    let changed = conn.execute(
        "UPDATE records SET
             title = COALESCE(?2, title),
             payload = COALESCE(?3, payload),
             updated_at_us = ?4
         WHERE record_key = ?1",
        (key, patch.title.as_deref(), payload_json.as_deref(), now.timestamp_micros()),
    )?;
    if changed == 0 {
        return Err(StoreError::RecordNotFound { key: key.to_string() });
    }
    get_record(conn, key)
}

/// Delete a record (tasks cascade). The counter is untouched; the gap is
/// accepted.
///
/// # Errors
///
/// [`StoreError::RecordNotFound`] when no such row exists.
pub fn delete_record(conn: &mut Connection, key: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM records WHERE record_key = ?1", [key])?;
    if changed == 0 {
        return Err(StoreError::RecordNotFound { key: key.to_string() });
    }
    debug!(key, "deleted record");
    Ok(())
}

/// Apply a validated status transition to a record and append its audit
/// entry, all inside one immediate transaction.
///
/// # Errors
///
/// [`StoreError::RecordNotFound`], [`StoreError::Workflow`] for
/// invalid/forbidden transitions, [`StoreError::Unavailable`] on storage
/// failure.
pub fn transition_record(
    conn: &mut Connection,
    key_or_id: &str,
    requested: DocStatus,
    actor: &Actor,
    comment: Option<String>,
    now: DateTime<Utc>,
    require_reject_comment: bool,
) -> Result<RecordFields> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let record = find_record_tx(&tx, key_or_id)?;
    let plan = workflow::plan_doc_transition(
        record.status,
        requested,
        actor,
        &record.owner_email,
        comment,
        now,
        require_reject_comment,
    )?;

    let mut history = record.history;
    history.push(plan.entry);
    history.sort_by_key(|entry| entry.decided_at);

    tx.execute(
        "UPDATE records SET status = ?2, history = ?3, updated_at_us = ?4
         WHERE record_key = ?1",
        (
            &record.key,
            plan.next.as_str(),
            history_json(&record.key, &history)?,
            now.timestamp_micros(),
        ),
    )?;
    tx.commit()?;

    debug!(key = record.key, status = plan.next.as_str(), "applied record transition");
    get_record(conn, &record.key)
}

fn find_record_tx(tx: &Transaction<'_>, key_or_id: &str) -> Result<RecordFields> {
    let (sql, param) = key_or_id.parse::<SequentialId>().map_or_else(
        |_| ("record_key", key_or_id.to_string()),
        |id| ("seq_id", id.to_string()),
    );
    let row = tx
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM records WHERE {sql} = ?1"),
            [param],
            record_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::RecordNotFound {
            key: key_or_id.to_string(),
        })?;
    record_from_row(row)
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Add a step/task under a record. Position defaults to the next free slot.
///
/// # Errors
///
/// [`StoreError::RecordNotFound`] when the parent record does not exist.
pub fn add_task(
    conn: &mut Connection,
    record_key: &str,
    new: &NewTask,
    now: DateTime<Utc>,
) -> Result<TaskFields> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let parent_exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM records WHERE record_key = ?1)",
        [record_key],
        |row| row.get(0),
    )?;
    if !parent_exists {
        return Err(StoreError::RecordNotFound {
            key: record_key.to_string(),
        });
    }

    let position = match new.position {
        Some(position) => i64::from(position),
        None => {
            let max: i64 = tx.query_row(
                "SELECT COALESCE(MAX(position), 0) FROM tasks WHERE record_key = ?1",
                [record_key],
                |row| row.get(0),
            )?;
            max + 1
        }
    };

    let key = fresh_key("tsk");
    let now_us = now.timestamp_micros();
    tx.execute(
        "INSERT INTO tasks (task_key, record_key, position, title, status, owner_email,
                            reviewer_email, approver_email, history, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '[]', ?9, ?9)",
        (
            &key,
            record_key,
            position,
            &new.title,
            StepStatus::NotStarted.as_str(),
            new.assignees.owner_email.as_deref(),
            new.assignees.reviewer_email.as_deref(),
            new.assignees.approver_email.as_deref(),
            now_us,
        ),
    )?;
    tx.commit()?;

    debug!(key, record_key, position, "added task");
    get_task(conn, &key)
}

/// Fetch a task by key.
///
/// # Errors
///
/// [`StoreError::TaskNotFound`] when no such row exists.
pub fn get_task(conn: &Connection, key: &str) -> Result<TaskFields> {
    let row = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_key = ?1"),
            [key],
            task_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::TaskNotFound { key: key.to_string() })?;
    task_from_row(row)
}

/// List a record's tasks in step order.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] on a storage failure.
pub fn list_tasks(conn: &Connection, record_key: &str) -> Result<Vec<TaskFields>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE record_key = ?1 ORDER BY position"
    ))?;
    let rows = stmt.query_map([record_key], task_row)?;

    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(task_from_row(row?)?);
    }
    Ok(tasks)
}

/// Apply a validated step transition to a task, appending its audit entry
/// inside one immediate transaction.
///
/// # Errors
///
/// [`StoreError::TaskNotFound`], [`StoreError::Workflow`], or
/// [`StoreError::Unavailable`].
pub fn transition_task(
    conn: &mut Connection,
    task_key: &str,
    requested: StepStatus,
    actor: &Actor,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<TaskFields> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let row = tx
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_key = ?1"),
            [task_key],
            task_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::TaskNotFound {
            key: task_key.to_string(),
        })?;
    let task = task_from_row(row)?;

    let plan = workflow::plan_step_transition(
        task.status,
        requested,
        actor,
        &task.assignees,
        comment,
        now,
    )?;

    let mut history = task.history;
    history.push(plan.entry);
    history.sort_by_key(|entry| entry.decided_at);

    tx.execute(
        "UPDATE tasks SET status = ?2, history = ?3, updated_at_us = ?4 WHERE task_key = ?1",
        (
            task_key,
            plan.next.as_str(),
            history_json(task_key, &history)?,
            now.timestamp_micros(),
        ),
    )?;
    tx.commit()?;

    debug!(key = task_key, status = plan.next.as_str(), "applied task transition");
    get_task(conn, task_key)
}
