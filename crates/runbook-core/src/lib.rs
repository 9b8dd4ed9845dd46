//! runbook-core: domain model and pure logic for the runbook tracker.
//!
//! This crate holds everything that does not touch storage: entity classes
//! and sequential identifiers, the closed status enums with their
//! transition rules, the workflow planner that turns a requested transition
//! into an audit entry, the audit-trail normalizer, and project
//! configuration. The storage side (counter cells, the allocator, the
//! record repository) lives in `runbook-store`.

pub mod audit;
pub mod config;
pub mod error;
pub mod model;
pub mod workflow;

pub use audit::{HistoryAction, HistoryEntry, RawHistoryEntry};
pub use error::ErrorCode;
pub use model::{
    Actor, DocStatus, EntityClass, NewRecord, NewTask, RecordFields, RecordPatch, Role,
    SequentialId, StepAssignees, StepStatus, TaskFields,
};
pub use workflow::{DocTransition, StepTransition, WorkflowError};
