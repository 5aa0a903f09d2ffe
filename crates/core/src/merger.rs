//! Upsert-and-merge of crossing submissions into person records.
//!
//! Scalar attributes are overwritten on every submission. The crossing
//! archive and the forbidden-staff set only ever grow.

use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, info};

use crate::db::queries::{self, RecordFilter};
use crate::db::Database;
use crate::errors::{CoreError, StoreError};
use crate::models::{Archive, PersonRecord, Submission, ARCHIVE_TIMESTAMP_FORMAT};

/// Source of crossing timestamps.
pub type Clock = fn() -> NaiveDateTime;

/// The local wall clock, the default [`Clock`].
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Merges submissions into the store, one transaction per submission.
pub struct RecordMerger<'a> {
    db: &'a Database,
    clock: Clock,
}

impl<'a> RecordMerger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self::with_clock(db, local_now)
    }

    pub fn with_clock(db: &'a Database, clock: Clock) -> Self {
        Self { db, clock }
    }

    /// Validate a raw JSON payload and merge it at the clock's current time.
    ///
    /// Validation failures never touch the store.
    pub fn merge_json(&self, payload: &Value) -> Result<PersonRecord, CoreError> {
        let submission = Submission::from_json(payload)?;
        Ok(self.merge(submission)?)
    }

    /// Merge a submission, stamping the crossing with the clock.
    pub fn merge(&self, submission: Submission) -> Result<PersonRecord, StoreError> {
        self.merge_at(submission, (self.clock)())
    }

    /// Merge a submission, stamping the crossing with `now`.
    ///
    /// Lookup, merge and write run in one immediate transaction, so two
    /// submissions for the same identity can never both build on the same
    /// prior state.
    pub fn merge_at(
        &self,
        submission: Submission,
        now: NaiveDateTime,
    ) -> Result<PersonRecord, StoreError> {
        let key = submission.identity();
        let stamp = now.format(ARCHIVE_TIMESTAMP_FORMAT).to_string();

        self.db.transaction(|conn| {
            let existing = queries::find_by_identity(conn, &key)?;
            let incoming = submission.forbidden_staff.into_set();

            let (filter, archive, forbidden_staff) = match existing {
                Some(stored) => {
                    let mut archive = stored.record.archive;
                    if archive.insert(stamp.clone(), submission.allowed).is_some() {
                        debug!(identity = %key, stamp = %stamp, "archive slot overwritten");
                    }
                    let mut forbidden_staff = stored.record.forbidden_staff;
                    forbidden_staff.extend(incoming);
                    (RecordFilter::Id(stored.id), archive, forbidden_staff)
                }
                None => (
                    RecordFilter::Identity(key.clone()),
                    Archive::from([(stamp.clone(), submission.allowed)]),
                    incoming,
                ),
            };
            let created = matches!(filter, RecordFilter::Identity(_));

            let fields = PersonRecord {
                first_name: submission.first_name,
                last_name: submission.last_name,
                birth_date: submission.birth_date,
                status: submission.status,
                address: submission.address,
                phone_number: submission.phone_number,
                height: submission.height,
                nationality: submission.nationality,
                eye_color: submission.eye_color,
                forbidden_staff,
                archive,
            };
            let record = queries::find_one_and_upsert(conn, &filter, &fields)?;

            info!(
                identity = %key,
                created,
                allowed = submission.allowed,
                crossings = record.archive.len(),
                forbidden_items = record.forbidden_staff.len(),
                "merged crossing submission"
            );
            Ok(record)
        })
    }
}
