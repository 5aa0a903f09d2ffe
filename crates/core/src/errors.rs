//! Error types for the border registry core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. The
//! top-level [`CoreError`] unifies the validation and store errors a merge
//! can produce; [`ConfigError`] is only raised at startup.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Error returned by a full validate-then-merge call.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// A submission payload was rejected before reaching the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The request body is valid JSON but not an object.
    #[error("submission must be a JSON object")]
    NotAnObject,

    /// One or more required fields are absent or `null`.
    #[error("missing or null required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// `forbidden_staff` is neither a string nor a list of strings.
    #[error("forbidden_staff must be a string or a list of strings")]
    InvalidForbiddenStaff,

    /// A field is present but has the wrong JSON type.
    #[error("invalid value for '{field}': expected {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors from the SQLite persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying rusqlite error.
    #[error("store error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// A bootstrap migration failed.
    #[error("store migration failed (version {version}): {detail}")]
    MigrationFailed {
        version: u32,
        detail: String,
    },

    /// A JSON column held something that does not decode.
    #[error("corrupt '{column}' column for record {id}: {detail}")]
    CorruptColumn {
        id: String,
        column: &'static str,
        detail: String,
    },

    /// A record could not be encoded for storage.
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The write matched no record and none could be created.
    #[error("record not found after upsert: {0}")]
    NotFound(String),

    /// Generic I/O error (e.g. file permissions).
    #[error("store I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the failure is a lock contention or busy timeout that the
    /// caller may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::SqliteError(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
