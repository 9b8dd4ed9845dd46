//! Canonical SQLite schema for the runbook store.
//!
//! The schema is normalized for the access paths the core needs:
//! - `records` keeps the counted entities (SOP, project, template) with
//!   their sequential IDs, status, and JSON trail
//! - `tasks` keeps the per-step execution records under a parent record
//! - `counters` holds one high-water-mark cell per entity class, mutated
//!   only through the allocator's atomic update
//! - `store_meta` tracks the schema version for migrations

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    record_key TEXT PRIMARY KEY,
    class TEXT NOT NULL CHECK (class IN ('sop', 'project', 'tpl')),
    seq INTEGER NOT NULL CHECK (seq >= 1),
    seq_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    status TEXT NOT NULL CHECK (status IN ('draft', 'in-review', 'approved', 'archived')),
    owner_email TEXT NOT NULL DEFAULT '',
    payload TEXT NOT NULL DEFAULT '{}',
    history TEXT NOT NULL DEFAULT '[]',
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    UNIQUE (class, seq)
);

CREATE TABLE IF NOT EXISTS tasks (
    task_key TEXT PRIMARY KEY,
    record_key TEXT NOT NULL REFERENCES records(record_key) ON DELETE CASCADE,
    position INTEGER NOT NULL CHECK (position >= 1),
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    status TEXT NOT NULL CHECK (status IN (
        'not-started', 'in-progress', 'ready-to-review',
        'ready-to-approve', 'approved', 'rejected'
    )),
    owner_email TEXT,
    reviewer_email TEXT,
    approver_email TEXT,
    history TEXT NOT NULL DEFAULT '[]',
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS counters (
    class TEXT PRIMARY KEY CHECK (class IN ('sop', 'project', 'tpl')),
    value INTEGER NOT NULL CHECK (value >= 0)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
"#;

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_records_class_seq
    ON records(class, seq DESC);

CREATE INDEX IF NOT EXISTS idx_records_class_status
    ON records(class, status);

CREATE INDEX IF NOT EXISTS idx_tasks_record_position
    ON tasks(record_key, position);
"#;

/// Indexes the latest schema must contain; checked by migration tests.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_records_class_seq",
    "idx_records_class_status",
    "idx_tasks_record_position",
];
