//! Persisted field sets for records and tasks, plus the request/patch
//! shapes consumed by the repository.

use serde::{Deserialize, Serialize};

use crate::audit::HistoryEntry;
use crate::model::actor::StepAssignees;
use crate::model::id::{EntityClass, SequentialId};
use crate::model::status::{DocStatus, StepStatus};

/// All persisted fields for a counted record (SOP, project, template).
///
/// `key` is the opaque storage key (immutable, never reused); `id` is the
/// human-readable sequential identifier assigned once at creation. The
/// `payload` holds the entity-specific form fields the core does not
/// interpret. Timestamps are microseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub key: String,
    pub id: SequentialId,
    pub title: String,
    pub status: DocStatus,
    pub owner_email: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

impl RecordFields {
    /// The entity class, carried by the sequential ID.
    #[must_use]
    pub const fn class(&self) -> EntityClass {
        self.id.class()
    }
}

/// All persisted fields for one step/task under a record.
///
/// Tasks carry no sequential ID and no counter; `position` gives the step
/// order within the parent record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFields {
    pub key: String,
    pub record_key: String,
    pub position: u32,
    pub title: String,
    pub status: StepStatus,
    #[serde(default)]
    pub assignees: StepAssignees,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

/// A validated creation request for a counted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub class: EntityClass,
    pub title: String,
    pub owner_email: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// A validated creation request for a step/task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    /// Explicit step position; defaults to appending after the last step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default)]
    pub assignees: StepAssignees,
}

/// A keyed partial mutation for record content.
///
/// Status is deliberately absent: it is owned by the workflow layer and can
/// only change through a validated transition.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl RecordPatch {
    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.payload.is_none()
    }
}
