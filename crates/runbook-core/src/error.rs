use std::fmt;

/// Machine-readable error codes surfaced to operators and API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    RecordNotFound,
    TaskNotFound,
    InvalidStatusTransition,
    ActorForbidden,
    InvalidEnumValue,
    AllocationConflict,
    StoreUnavailable,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::RecordNotFound => "E2001",
            Self::TaskNotFound => "E2002",
            Self::InvalidStatusTransition => "E2003",
            Self::ActorForbidden => "E2004",
            Self::InvalidEnumValue => "E2005",
            Self::AllocationConflict => "E3001",
            Self::StoreUnavailable => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::RecordNotFound => "Record not found",
            Self::TaskNotFound => "Task not found",
            Self::InvalidStatusTransition => "Invalid status transition",
            Self::ActorForbidden => "Actor lacks the required role",
            Self::InvalidEnumValue => "Invalid class/status/role value",
            Self::AllocationConflict => "Sequential ID allocation conflict",
            Self::StoreUnavailable => "Store unavailable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `rbk init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .runbook/config.toml and retry."),
            Self::RecordNotFound | Self::TaskNotFound => None,
            Self::InvalidStatusTransition => {
                Some("Documents move draft -> in-review -> approved (or back to draft).")
            }
            Self::ActorForbidden => {
                Some("Ask an admin, the designated reviewer, or the record owner to act.")
            }
            Self::InvalidEnumValue => Some("Use one of the documented class/status/role values."),
            Self::AllocationConflict => {
                Some("Another writer won the counter race repeatedly. Retry the creation.")
            }
            Self::StoreUnavailable => Some("Check that the store file is reachable and writable."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
