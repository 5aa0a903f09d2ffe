//! Domain model types used throughout the border registry.
//!
//! These types bridge the merge logic, the store, and the web API.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `strftime` pattern of archive keys: local clock, second precision.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Crossing timestamp -> allowed decision.
pub type Archive = BTreeMap<String, bool>;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The (first name, last name, birth date) triple that locates a person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.first_name, self.last_name, self.birth_date)
    }
}

// ---------------------------------------------------------------------------
// Forbidden staff
// ---------------------------------------------------------------------------

/// Incoming `forbidden_staff` value: one item or a list of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForbiddenStaff {
    Single(String),
    Many(Vec<String>),
}

impl ForbiddenStaff {
    /// Normalize to a set; duplicates collapse.
    pub fn into_set(self) -> BTreeSet<String> {
        match self {
            Self::Single(item) => BTreeSet::from([item]),
            Self::Many(items) => items.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// A validated crossing submission.
///
/// Build one from raw JSON with `Submission::from_json` so that missing
/// fields are reported together. Descriptive attributes keep whatever
/// non-null JSON value the client sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub status: Value,
    pub address: Value,
    pub phone_number: Value,
    pub height: Value,
    pub nationality: Value,
    pub eye_color: Value,
    pub forbidden_staff: ForbiddenStaff,
    pub allowed: bool,
}

impl Submission {
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birth_date: self.birth_date.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Person record
// ---------------------------------------------------------------------------

/// The API-visible state of one person. The store's internal id is never
/// part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub status: Value,
    pub address: Value,
    pub phone_number: Value,
    pub height: Value,
    pub nationality: Value,
    pub eye_color: Value,
    pub forbidden_staff: BTreeSet<String>,
    pub archive: Archive,
}

impl PersonRecord {
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birth_date: self.birth_date.clone(),
        }
    }
}
