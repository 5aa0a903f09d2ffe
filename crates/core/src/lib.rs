//! Border registry core library.
//!
//! This crate provides the foundational components for recording border
//! crossings: configuration, the person record model, payload validation,
//! SQLite persistence, and the upsert-and-merge logic.

pub mod config;
pub mod db;
pub mod errors;
pub mod lister;
pub mod merger;
pub mod models;
pub mod validation;

// Re-exports for convenience.
pub use config::AppConfig;
pub use db::Database;
pub use lister::RecordLister;
pub use merger::RecordMerger;
pub use models::{ForbiddenStaff, PersonRecord, Submission};
