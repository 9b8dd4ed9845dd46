//! Actors, roles, and per-step assignee sets used for transition
//! authorization.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The three authorization roles.
///
/// `Admin` may perform any transition. `Reviewer` decides in-review
/// documents. `Member` may only act where designated (document owner, or a
/// step's assigned owner/reviewer/approver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Reviewer,
    Member,
}

impl Role {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Reviewer => "reviewer",
            Self::Member => "member",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Member
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole {
    pub raw: String,
}

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown role '{}': expected one of admin, reviewer, member",
            self.raw
        )
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "reviewer" => Ok(Self::Reviewer),
            "member" => Ok(Self::Member),
            _ => Err(UnknownRole { raw: s.to_string() }),
        }
    }
}

/// The identity performing a mutation: display name, email, and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl Actor {
    /// Build an actor identity.
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    /// Returns `true` for the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Case-insensitive email comparison, the identity check used for
    /// ownership and step-assignee authorization.
    #[must_use]
    pub fn email_matches(&self, other: &str) -> bool {
        self.email.eq_ignore_ascii_case(other.trim())
    }
}

/// The designated actors for one step: owner, reviewer, approver.
///
/// Assignments are optional; a step with no designees can only be moved by
/// an admin.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepAssignees {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_email: Option<String>,
}

impl StepAssignees {
    /// Returns `true` if the actor is one of the designated emails.
    #[must_use]
    pub fn includes(&self, actor: &Actor) -> bool {
        [&self.owner_email, &self.reviewer_email, &self.approver_email]
            .into_iter()
            .flatten()
            .any(|email| actor.email_matches(email))
    }

    /// Returns `true` when no designees are assigned at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owner_email.is_none() && self.reviewer_email.is_none() && self.approver_email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(email: &str, role: Role) -> Actor {
        Actor::new("Test Actor", email, role)
    }

    #[test]
    fn role_display_parse_roundtrips() {
        for role in [Role::Admin, Role::Reviewer, Role::Member] {
            let reparsed: Role = role.to_string().parse().expect("should parse");
            assert_eq!(role, reparsed);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn role_defaults_to_member() {
        assert_eq!(Role::default(), Role::Member);
    }

    #[test]
    fn email_match_is_case_insensitive() {
        let a = actor("Jo@Example.com", Role::Member);
        assert!(a.email_matches("jo@example.com"));
        assert!(a.email_matches("  JO@EXAMPLE.COM "));
        assert!(!a.email_matches("other@example.com"));
    }

    #[test]
    fn assignees_includes_any_designated_email() {
        let assignees = StepAssignees {
            owner_email: Some("owner@co".into()),
            reviewer_email: None,
            approver_email: Some("approver@co".into()),
        };
        assert!(assignees.includes(&actor("OWNER@co", Role::Member)));
        assert!(assignees.includes(&actor("approver@co", Role::Member)));
        assert!(!assignees.includes(&actor("stranger@co", Role::Member)));
    }

    #[test]
    fn empty_assignees() {
        assert!(StepAssignees::default().is_empty());
        assert!(!StepAssignees {
            reviewer_email: Some("r@co".into()),
            ..StepAssignees::default()
        }
        .is_empty());
    }
}
