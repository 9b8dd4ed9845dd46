//! Entity classes and human-readable sequential identifiers.
//!
//! Every counted entity (SOP, project, template) carries two identities: an
//! opaque storage key assigned by the store, and a [`SequentialId`] such as
//! `sop-007` issued exactly once by the allocator. The class prefix doubles
//! as the wire string for the class itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three counted entity classes. Each has its own independent counter
/// cell and ID prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityClass {
    Sop,
    Project,
    Template,
}

impl EntityClass {
    /// All entity classes in counter order.
    pub const ALL: [Self; 3] = [Self::Sop, Self::Project, Self::Template];

    /// Canonical wire string; also the sequential-ID prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sop => "sop",
            Self::Project => "project",
            Self::Template => "tpl",
        }
    }

    /// Alias for [`as_str`](Self::as_str) where the prefix role is meant.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        self.as_str()
    }
}

/// Error returned when parsing an unknown entity-class string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityClass {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownEntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown entity class '{}': expected one of sop, project, tpl",
            self.raw
        )
    }
}

impl std::error::Error for UnknownEntityClass {}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityClass {
    type Err = UnknownEntityClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sop" => Ok(Self::Sop),
            "project" => Ok(Self::Project),
            // "template" accepted for operator convenience; "tpl" is canonical.
            "tpl" | "template" => Ok(Self::Template),
            _ => Err(UnknownEntityClass { raw: s.to_string() }),
        }
    }
}

impl Serialize for EntityClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityClass {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A human-readable, monotonically issued identifier such as `sop-007`.
///
/// The numeric suffix is zero-padded to three digits; values above 999
/// render at their natural width. Ordering is by class, then value, which
/// matches issuance order within one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequentialId {
    class: EntityClass,
    value: u32,
}

impl SequentialId {
    /// Build an ID from a class and an already-issued counter value.
    ///
    /// Counter values start at 1; the allocator never issues 0.
    #[must_use]
    pub const fn new(class: EntityClass, value: u32) -> Self {
        Self { class, value }
    }

    /// The entity class this ID belongs to.
    #[must_use]
    pub const fn class(self) -> EntityClass {
        self.class
    }

    /// The numeric suffix (always >= 1 for allocator-issued IDs).
    #[must_use]
    pub const fn value(self) -> u32 {
        self.value
    }
}

impl fmt::Display for SequentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:03}", self.class.prefix(), self.value)
    }
}

/// Error returned when parsing a malformed sequential ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSequentialIdError {
    /// The unparseable input string.
    pub raw: String,
}

impl fmt::Display for ParseSequentialIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid sequential id '{}': expected <sop|project|tpl>-<digits>, e.g. sop-007",
            self.raw
        )
    }
}

impl std::error::Error for ParseSequentialIdError {}

impl FromStr for SequentialId {
    type Err = ParseSequentialIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSequentialIdError { raw: s.to_string() };

        let (prefix, digits) = s.trim().rsplit_once('-').ok_or_else(err)?;
        let class = EntityClass::from_str(prefix).map_err(|_| err())?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let value: u32 = digits.parse().map_err(|_| err())?;
        if value == 0 {
            return Err(err());
        }

        Ok(Self { class, value })
    }
}

impl Serialize for SequentialId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SequentialId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
