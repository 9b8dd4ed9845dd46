//! Audit-trail entries and the normalization boundary.
//!
//! History entries historically arrive from loosely-validated sources:
//! timestamps come as epoch seconds, epoch milliseconds, or ISO strings, and
//! field names vary between snake_case and camelCase. All of that is coerced
//! here, in one place, rather than ad hoc at each read site. Entries missing
//! a status or a parseable timestamp are dropped, never persisted — a lossy
//! but safe policy.
//!
//! Normalization is idempotent: running an already-normalized trail through
//! [`normalize`] yields the identical list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Epoch values below this are seconds; at or above, milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// The action recorded alongside a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Submitted,
    Approved,
    Rejected,
    Returned,
    Updated,
}

impl HistoryAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Returned => "returned",
            Self::Updated => "updated",
        }
    }

    /// Lenient parse used during sanitization; unknown labels yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "returned" => Some(Self::Returned),
            "updated" => Some(Self::Updated),
            _ => None,
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable entry in a record's or task's audit trail.
///
/// `status` stays a string here: trails are shared between document and
/// step records, and must survive statuses written by older clients. The
/// workflow layer always writes canonical wire strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: String,
    pub decided_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<HistoryAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<String>,
}

/// A history entry as read from storage or a client, before sanitization.
///
/// Every field is optional and `decided_at` is an arbitrary JSON value;
/// camelCase aliases cover entries written by the pre-Rust clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHistoryEntry {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "decidedAt")]
    pub decided_at: Option<serde_json::Value>,
    #[serde(default, alias = "decidedBy")]
    pub decided_by: Option<String>,
    #[serde(default, alias = "decidedByEmail")]
    pub decided_by_email: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, alias = "previousStatus")]
    pub previous_status: Option<String>,
}

/// Coerce a loosely-typed timestamp into a UTC instant.
///
/// Numbers below `1e12` are epoch seconds, otherwise epoch milliseconds.
/// Strings are parsed as RFC 3339, falling back to a naive
/// `YYYY-MM-DDTHH:MM:SS` form interpreted as UTC. Returns `None` for
/// anything unparseable.
#[must_use]
pub fn coerce_instant(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Number(n) => {
            let raw = n.as_f64()?;
            if !raw.is_finite() || raw < 0.0 {
                return None;
            }
            let micros = if raw < EPOCH_MILLIS_THRESHOLD {
                raw * 1_000_000.0
            } else {
                raw * 1_000.0
            };
            if micros > i64::MAX as f64 {
                return None;
            }
            #[allow(clippy::cast_possible_truncation)]
            let micros = micros as i64;
            DateTime::from_timestamp_micros(micros)
        }
        serde_json::Value::String(s) => parse_instant_str(s),
        _ => None,
    }
}

fn parse_instant_str(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Naive fallback without zone designator, taken as UTC.
    chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Sanitize one raw entry. Returns `None` (drop) when the status is missing
/// or blank, or the timestamp cannot be coerced.
#[must_use]
pub fn sanitize(raw: RawHistoryEntry) -> Option<HistoryEntry> {
    let status = raw.status.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let Some(status) = status else {
        debug!("dropping history entry with missing status");
        return None;
    };

    let Some(decided_at) = raw.decided_at.as_ref().and_then(coerce_instant) else {
        debug!(status, "dropping history entry with unparseable decided_at");
        return None;
    };

    // An unknown action label loses the action, not the entry.
    let action = raw.action.as_deref().and_then(HistoryAction::parse);

    Some(HistoryEntry {
        status: status.to_string(),
        decided_at,
        decided_by: raw.decided_by.filter(|s| !s.trim().is_empty()),
        decided_by_email: raw.decided_by_email.filter(|s| !s.trim().is_empty()),
        comment: raw.comment.filter(|s| !s.trim().is_empty()),
        action,
        previous_status: raw.previous_status.filter(|s| !s.trim().is_empty()),
    })
}

/// Sanitize and chronologically sort a raw trail.
///
/// The sort is stable, so entries with identical timestamps keep their
/// stored order; they are not deduplicated (they stay distinguishable by
/// action/comment).
#[must_use]
pub fn normalize(raw: Vec<RawHistoryEntry>) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = raw.into_iter().filter_map(sanitize).collect();
    entries.sort_by_key(|entry| entry.decided_at);
    entries
}

/// Append a new entry to an existing (possibly dirty) trail and return the
/// normalized result.
#[must_use]
pub fn append(existing: Vec<RawHistoryEntry>, entry: HistoryEntry) -> Vec<HistoryEntry> {
    let mut entries = normalize(existing);
    entries.push(entry);
    entries.sort_by_key(|e| e.decided_at);
    entries
}

/// Parse a trail from its stored JSON form, tolerating malformed entries.
///
/// A column that fails to parse as a JSON array yields an empty trail
/// (logged) rather than an error; individual bad entries are dropped by
/// [`normalize`].
#[must_use]
pub fn parse_stored_trail(json: &str) -> Vec<RawHistoryEntry> {
    match serde_json::from_str::<Vec<serde_json::Value>>(json) {
        Ok(values) => values
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<RawHistoryEntry>(v) {
                Ok(raw) => Some(raw),
                Err(error) => {
                    debug!(%error, "dropping undecodable history entry");
                    None
                }
            })
            .collect(),
        Err(error) => {
            debug!(%error, "stored history is not a JSON array; treating as empty");
            Vec::new()
        }
    }
}
