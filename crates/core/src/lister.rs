//! Listing of the most recently stored person records.

use tracing::debug;

use crate::db::Database;
use crate::errors::StoreError;
use crate::models::PersonRecord;

/// Default size of the "last records" window.
pub const DEFAULT_LAST_N: usize = 10;

pub struct RecordLister<'a> {
    db: &'a Database,
}

impl<'a> RecordLister<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// The last `n` records in storage order, or all of them if there are
    /// fewer than `n`.
    pub fn last_n(&self, n: usize) -> Result<Vec<PersonRecord>, StoreError> {
        let mut records = self.db.find_all()?;
        let skip = records.len().saturating_sub(n);
        debug!(total = records.len(), n, "listing last records");
        Ok(records.split_off(skip))
    }
}
