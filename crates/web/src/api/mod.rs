//! REST API endpoint modules.

pub mod persons;
pub mod status;
