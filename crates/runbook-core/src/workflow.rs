//! The status state machine: validates a requested transition, checks the
//! actor's authority, and produces the audit entry to append.
//!
//! Planning is pure — the caller supplies the decision instant and persists
//! the resulting plan — so every rule here is testable without a store.
//!
//! Document rules are strict (`draft -> in-review -> approved`, with
//! rejection back to draft). Step rules are deliberately permissive: any
//! authorized actor may set any step status directly, which keeps the
//! correction path (moving a step backward) open. Only the role checks and
//! the no-op guard apply.

use chrono::{DateTime, Utc};

use crate::audit::{HistoryAction, HistoryEntry};
use crate::error::ErrorCode;
use crate::model::actor::{Actor, Role, StepAssignees};
use crate::model::status::{DocStatus, InvalidDocTransition, InvalidStepTransition, StepStatus};

/// Errors from transition planning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// The requested status is not reachable from the current one.
    #[error("invalid transition from '{from}' to '{to}': {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: &'static str,
    },

    /// The actor lacks the role or designation for this transition.
    #[error("'{actor}' may not move this to '{requested}': {reason}")]
    Forbidden {
        actor: String,
        requested: String,
        reason: &'static str,
    },

    /// Project policy requires a comment when returning a document to draft.
    #[error("a comment is required when rejecting a document")]
    CommentRequired,
}

impl WorkflowError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidTransition { .. } | Self::CommentRequired => {
                ErrorCode::InvalidStatusTransition
            }
            Self::Forbidden { .. } => ErrorCode::ActorForbidden,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        self.error_code().hint()
    }
}

impl From<InvalidDocTransition> for WorkflowError {
    fn from(err: InvalidDocTransition) -> Self {
        Self::InvalidTransition {
            from: err.from.as_str().to_string(),
            to: err.to.as_str().to_string(),
            reason: err.reason,
        }
    }
}

impl From<InvalidStepTransition> for WorkflowError {
    fn from(err: InvalidStepTransition) -> Self {
        Self::InvalidTransition {
            from: err.from.as_str().to_string(),
            to: err.to.as_str().to_string(),
            reason: err.reason,
        }
    }
}

/// An accepted document transition: the new status plus the audit entry to
/// append before persisting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTransition {
    pub next: DocStatus,
    pub entry: HistoryEntry,
}

/// An accepted step transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTransition {
    pub next: StepStatus,
    pub entry: HistoryEntry,
}

/// Derive the audit action from the shape of a document transition.
#[must_use]
pub const fn derive_doc_action(from: DocStatus, to: DocStatus) -> HistoryAction {
    match (from, to) {
        (DocStatus::Draft, DocStatus::InReview) => HistoryAction::Submitted,
        (DocStatus::InReview, DocStatus::Approved) => HistoryAction::Approved,
        (DocStatus::InReview, DocStatus::Draft) => HistoryAction::Rejected,
        _ => HistoryAction::Updated,
    }
}

/// Derive the audit action for a step transition from its destination.
#[must_use]
pub const fn derive_step_action(to: StepStatus) -> HistoryAction {
    match to {
        StepStatus::Approved => HistoryAction::Approved,
        StepStatus::Rejected => HistoryAction::Rejected,
        _ => HistoryAction::Updated,
    }
}

fn forbidden(actor: &Actor, requested: &str, reason: &'static str) -> WorkflowError {
    WorkflowError::Forbidden {
        actor: actor.name.clone(),
        requested: requested.to_string(),
        reason,
    }
}

/// Role check for document transitions.
///
/// Submission (`draft -> in-review`) is open to the document owner or an
/// admin. Review decisions (`in-review -> approved` / `in-review -> draft`)
/// require the reviewer or admin role.
fn authorize_doc(
    current: DocStatus,
    requested: DocStatus,
    actor: &Actor,
    owner_email: &str,
) -> Result<(), WorkflowError> {
    if actor.is_admin() {
        return Ok(());
    }
    match (current, requested) {
        (DocStatus::Draft, DocStatus::InReview) => {
            if actor.email_matches(owner_email) {
                Ok(())
            } else {
                Err(forbidden(
                    actor,
                    requested.as_str(),
                    "only the document owner may submit for review",
                ))
            }
        }
        (DocStatus::InReview, _) => {
            if actor.role == Role::Reviewer {
                Ok(())
            } else {
                Err(forbidden(
                    actor,
                    requested.as_str(),
                    "review decisions require the reviewer role",
                ))
            }
        }
        _ => Err(forbidden(
            actor,
            requested.as_str(),
            "no role grants this transition",
        )),
    }
}

/// Role check for step transitions: the step's designated owner, reviewer,
/// or approver, or an admin. A step with no designees is admin-only.
fn authorize_step(
    requested: StepStatus,
    actor: &Actor,
    assignees: &StepAssignees,
) -> Result<(), WorkflowError> {
    if actor.is_admin() || assignees.includes(actor) {
        return Ok(());
    }
    let reason = if assignees.is_empty() {
        "step has no designated actors; only an admin may move it"
    } else {
        "only the step's designated owner, reviewer, or approver may move it"
    };
    Err(forbidden(actor, requested.as_str(), reason))
}

fn build_entry(
    status: String,
    previous: String,
    action: HistoryAction,
    actor: &Actor,
    comment: Option<String>,
    decided_at: DateTime<Utc>,
) -> HistoryEntry {
    HistoryEntry {
        status,
        decided_at,
        decided_by: Some(actor.name.clone()),
        decided_by_email: Some(actor.email.clone()),
        comment: comment.filter(|c| !c.trim().is_empty()),
        action: Some(action),
        previous_status: Some(previous),
    }
}

/// Plan a document transition.
///
/// # Errors
///
/// [`WorkflowError::InvalidTransition`] when the lifecycle forbids the
/// move, [`WorkflowError::Forbidden`] when the actor lacks authority, and
/// [`WorkflowError::CommentRequired`] when policy demands a rejection
/// comment and none was given.
pub fn plan_doc_transition(
    current: DocStatus,
    requested: DocStatus,
    actor: &Actor,
    owner_email: &str,
    comment: Option<String>,
    decided_at: DateTime<Utc>,
    require_reject_comment: bool,
) -> Result<DocTransition, WorkflowError> {
    current.can_transition_to(requested)?;
    authorize_doc(current, requested, actor, owner_email)?;

    let action = derive_doc_action(current, requested);
    if require_reject_comment
        && action == HistoryAction::Rejected
        && comment.as_deref().is_none_or(|c| c.trim().is_empty())
    {
        return Err(WorkflowError::CommentRequired);
    }

    Ok(DocTransition {
        next: requested,
        entry: build_entry(
            requested.as_str().to_string(),
            current.as_str().to_string(),
            action,
            actor,
            comment,
            decided_at,
        ),
    })
}

/// Plan a step transition.
///
/// # Errors
///
/// [`WorkflowError::InvalidTransition`] for a no-op and
/// [`WorkflowError::Forbidden`] when the actor is neither designated nor
/// an admin.
pub fn plan_step_transition(
    current: StepStatus,
    requested: StepStatus,
    actor: &Actor,
    assignees: &StepAssignees,
    comment: Option<String>,
    decided_at: DateTime<Utc>,
) -> Result<StepTransition, WorkflowError> {
    current.can_transition_to(requested)?;
    authorize_step(requested, actor, assignees)?;

    Ok(StepTransition {
        next: requested,
        entry: build_entry(
            requested.as_str().to_string(),
            current.as_str().to_string(),
            derive_step_action(requested),
            actor,
            comment,
            decided_at,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("fixed instant")
    }

    fn admin() -> Actor {
        Actor::new("Root", "root@co", Role::Admin)
    }

    fn reviewer() -> Actor {
        Actor::new("Rae", "rae@co", Role::Reviewer)
    }

    fn owner() -> Actor {
        Actor::new("Omar", "omar@co", Role::Member)
    }

    #[test]
    fn draft_to_approved_is_invalid_even_for_admin() {
        let err = plan_doc_transition(
            DocStatus::Draft,
            DocStatus::Approved,
            &admin(),
            "omar@co",
            None,
            at(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert_eq!(err.error_code(), ErrorCode::InvalidStatusTransition);
    }

    #[test]
    fn owner_submits_draft() {
        let plan = plan_doc_transition(
            DocStatus::Draft,
            DocStatus::InReview,
            &owner(),
            "omar@co",
            None,
            at(),
            false,
        )
        .expect("owner may submit");
        assert_eq!(plan.next, DocStatus::InReview);
        assert_eq!(plan.entry.action, Some(HistoryAction::Submitted));
        assert_eq!(plan.entry.previous_status.as_deref(), Some("draft"));
        assert_eq!(plan.entry.status, "in-review");
        assert_eq!(plan.entry.decided_by_email.as_deref(), Some("omar@co"));
    }

    #[test]
    fn non_owner_member_cannot_submit() {
        let stranger = Actor::new("Sal", "sal@co", Role::Member);
        let err = plan_doc_transition(
            DocStatus::Draft,
            DocStatus::InReview,
            &stranger,
            "omar@co",
            None,
            at(),
            false,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::ActorForbidden);
    }

    #[test]
    fn reviewer_approves_in_review() {
        let plan = plan_doc_transition(
            DocStatus::InReview,
            DocStatus::Approved,
            &reviewer(),
            "omar@co",
            None,
            at(),
            false,
        )
        .expect("reviewer approves");
        assert_eq!(plan.entry.action, Some(HistoryAction::Approved));
        assert_eq!(plan.entry.previous_status.as_deref(), Some("in-review"));
    }

    #[test]
    fn admin_approves_in_review() {
        let plan = plan_doc_transition(
            DocStatus::InReview,
            DocStatus::Approved,
            &admin(),
            "omar@co",
            None,
            at(),
            false,
        )
        .expect("admin approves");
        assert_eq!(plan.entry.action, Some(HistoryAction::Approved));
    }

    #[test]
    fn owner_cannot_approve_own_submission() {
        let err = plan_doc_transition(
            DocStatus::InReview,
            DocStatus::Approved,
            &owner(),
            "omar@co",
            None,
            at(),
            false,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::ActorForbidden);
    }

    #[test]
    fn rejection_derives_rejected_action() {
        let plan = plan_doc_transition(
            DocStatus::InReview,
            DocStatus::Draft,
            &reviewer(),
            "omar@co",
            Some("needs sign-off column".into()),
            at(),
            false,
        )
        .expect("reviewer rejects");
        assert_eq!(plan.next, DocStatus::Draft);
        assert_eq!(plan.entry.action, Some(HistoryAction::Rejected));
        assert_eq!(plan.entry.comment.as_deref(), Some("needs sign-off column"));
    }

    #[test]
    fn reject_comment_policy_enforced() {
        let err = plan_doc_transition(
            DocStatus::InReview,
            DocStatus::Draft,
            &reviewer(),
            "omar@co",
            Some("   ".into()),
            at(),
            true,
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::CommentRequired);

        // Approval is unaffected by the policy.
        plan_doc_transition(
            DocStatus::InReview,
            DocStatus::Approved,
            &reviewer(),
            "omar@co",
            None,
            at(),
            true,
        )
        .expect("approval needs no comment");
    }

    #[test]
    fn blank_comment_is_dropped_from_entry() {
        let plan = plan_doc_transition(
            DocStatus::Draft,
            DocStatus::InReview,
            &owner(),
            "omar@co",
            Some("  ".into()),
            at(),
            false,
        )
        .expect("submit");
        assert!(plan.entry.comment.is_none());
    }

    #[test]
    fn designated_actor_moves_step_any_direction() {
        let assignees = StepAssignees {
            owner_email: Some("omar@co".into()),
            ..StepAssignees::default()
        };

        // Forward.
        let plan = plan_step_transition(
            StepStatus::NotStarted,
            StepStatus::InProgress,
            &owner(),
            &assignees,
            None,
            at(),
        )
        .expect("forward move");
        assert_eq!(plan.entry.action, Some(HistoryAction::Updated));

        // Backward correction is allowed.
        plan_step_transition(
            StepStatus::ReadyToApprove,
            StepStatus::InProgress,
            &owner(),
            &assignees,
            None,
            at(),
        )
        .expect("backward correction");

        // Skipping ahead is allowed too.
        let plan = plan_step_transition(
            StepStatus::NotStarted,
            StepStatus::Approved,
            &owner(),
            &assignees,
            None,
            at(),
        )
        .expect("direct set");
        assert_eq!(plan.entry.action, Some(HistoryAction::Approved));
    }

    #[test]
    fn step_noop_is_invalid() {
        let err = plan_step_transition(
            StepStatus::InProgress,
            StepStatus::InProgress,
            &admin(),
            &StepAssignees::default(),
            None,
            at(),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn undesignated_actor_cannot_move_step() {
        let assignees = StepAssignees {
            reviewer_email: Some("rae@co".into()),
            ..StepAssignees::default()
        };
        let stranger = Actor::new("Sal", "sal@co", Role::Reviewer);
        let err = plan_step_transition(
            StepStatus::InProgress,
            StepStatus::ReadyToReview,
            &stranger,
            &assignees,
            None,
            at(),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::ActorForbidden);
    }

    #[test]
    fn unassigned_step_is_admin_only() {
        let err = plan_step_transition(
            StepStatus::NotStarted,
            StepStatus::InProgress,
            &owner(),
            &StepAssignees::default(),
            None,
            at(),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::ActorForbidden);

        plan_step_transition(
            StepStatus::NotStarted,
            StepStatus::InProgress,
            &admin(),
            &StepAssignees::default(),
            None,
            at(),
        )
        .expect("admin may move undesignated step");
    }

    #[test]
    fn step_rejection_derives_rejected_action() {
        let plan = plan_step_transition(
            StepStatus::ReadyToReview,
            StepStatus::Rejected,
            &admin(),
            &StepAssignees::default(),
            Some("evidence missing".into()),
            at(),
        )
        .expect("reject step");
        assert_eq!(plan.entry.action, Some(HistoryAction::Rejected));
    }
}
