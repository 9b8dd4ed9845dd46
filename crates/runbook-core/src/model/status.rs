//! Closed status enums for documents and steps, with the transition rules
//! checked by the workflow planner.
//!
//! Statuses are never assigned to a record directly; every change goes
//! through [`crate::workflow`], which validates the transition and appends
//! the matching audit entry.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifecycle states for a reviewed document (SOP, project, template).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocStatus {
    Draft,
    InReview,
    Approved,
    Archived,
}

impl DocStatus {
    /// All document states in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Draft, Self::InReview, Self::Approved, Self::Archived];

    /// Canonical wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InReview => "in-review",
            Self::Approved => "approved",
            Self::Archived => "archived",
        }
    }

    /// Human-facing label for terminal output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::InReview => "In Review",
            Self::Approved => "Approved",
            Self::Archived => "Archived",
        }
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// Valid transitions:
    /// - `draft -> in-review` (submission)
    /// - `in-review -> approved`
    /// - `in-review -> draft` (rejection / return for rework)
    ///
    /// Everything else, including no-op transitions, is rejected. `approved`
    /// and `archived` are terminal from the caller's perspective.
    pub fn can_transition_to(self, target: Self) -> Result<(), InvalidDocTransition> {
        if self == target {
            return Err(InvalidDocTransition {
                from: self,
                to: target,
                reason: "no-op transition is not allowed",
            });
        }

        let allowed = matches!(
            (self, target),
            (Self::Draft, Self::InReview)
                | (Self::InReview, Self::Approved)
                | (Self::InReview, Self::Draft)
        );

        if allowed {
            Ok(())
        } else {
            Err(InvalidDocTransition {
                from: self,
                to: target,
                reason: "transition not allowed by review lifecycle",
            })
        }
    }
}

/// Execution states for a single step/task under a project.
///
/// The nominal forward order is `not-started -> in-progress ->
/// ready-to-review -> ready-to-approve -> approved`, with `rejected`
/// reachable from the review stages. The workflow layer deliberately allows
/// authorized actors to set any state directly (corrections move backward);
/// only no-op transitions are rejected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStatus {
    NotStarted,
    InProgress,
    ReadyToReview,
    ReadyToApprove,
    Approved,
    Rejected,
}

impl StepStatus {
    /// All step states in nominal order.
    pub const ALL: [Self; 6] = [
        Self::NotStarted,
        Self::InProgress,
        Self::ReadyToReview,
        Self::ReadyToApprove,
        Self::Approved,
        Self::Rejected,
    ];

    /// Canonical wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::ReadyToReview => "ready-to-review",
            Self::ReadyToApprove => "ready-to-approve",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Human-facing label for terminal output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::ReadyToReview => "Ready to Review",
            Self::ReadyToApprove => "Ready to Approve",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Validate a step transition. Authorized actors may set any state
    /// directly; only a no-op is rejected.
    pub fn can_transition_to(self, target: Self) -> Result<(), InvalidStepTransition> {
        if self == target {
            return Err(InvalidStepTransition {
                from: self,
                to: target,
                reason: "no-op transition is not allowed",
            });
        }
        Ok(())
    }
}

/// Error returned when a document transition is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDocTransition {
    pub from: DocStatus,
    pub to: DocStatus,
    pub reason: &'static str,
}

/// Error returned when a step transition is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidStepTransition {
    pub from: StepStatus,
    pub to: StepStatus,
    pub reason: &'static str,
}

/// Error returned when parsing a status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseStatusError {}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace([' ', '_'], "-")
}

impl FromStr for DocStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "draft" => Ok(Self::Draft),
            "in-review" => Ok(Self::InReview),
            "approved" => Ok(Self::Approved),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseStatusError {
                expected: "document status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for StepStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            // Legacy trail labels from older clients map onto the closed
            // enum: "draft" was the unstarted state, "review" the
            // ready-to-review stage, "approved-final" the terminal approval.
            "not-started" | "draft" => Ok(Self::NotStarted),
            "in-progress" => Ok(Self::InProgress),
            "ready-to-review" | "review" => Ok(Self::ReadyToReview),
            "ready-to-approve" => Ok(Self::ReadyToApprove),
            "approved" | "approved-final" | "approvedfinal" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseStatusError {
                expected: "step status",
                got: s.to_string(),
            }),
        }
    }
}

impl Serialize for DocStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for StepStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StepStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
