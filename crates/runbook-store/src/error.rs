//! Store-level error taxonomy.
//!
//! Contention on the counter cell is a normal, retryable outcome
//! ([`StoreError::AllocationConflict`]); callers redo the whole allocation.
//! A missing counter row is never an error — the allocator treats it as the
//! bootstrap case. A missing record on read/transition is.

use runbook_core::error::ErrorCode;
use runbook_core::model::EntityClass;
use runbook_core::workflow::WorkflowError;

/// Errors surfaced by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport/infra failure talking to SQLite.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    /// The atomic counter update lost its race beyond the retry budget.
    #[error("counter update for class '{class}' still contended after {attempts} attempts")]
    AllocationConflict { class: EntityClass, attempts: u32 },

    /// No record with this key or sequential ID.
    #[error("record '{key}' not found")]
    RecordNotFound { key: String },

    /// No task with this key.
    #[error("task '{key}' not found")]
    TaskNotFound { key: String },

    /// A transition was rejected by the workflow rules.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// A stored column could not be decoded.
    #[error("corrupt stored data for '{key}': {source}")]
    CorruptRow {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Unavailable(_) => ErrorCode::StoreUnavailable,
            Self::AllocationConflict { .. } => ErrorCode::AllocationConflict,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::Workflow(err) => err.error_code(),
            Self::CorruptRow { .. } => ErrorCode::InternalUnexpected,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        self.error_code().hint()
    }

    /// Returns `true` for outcomes the caller should simply retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::AllocationConflict { .. })
    }
}

/// Store-level result alias.
pub type Result<T> = std::result::Result<T, StoreError>;
