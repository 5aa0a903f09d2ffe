//! End-to-end tests for the merge and listing flow against a real SQLite
//! file.
//!
//! These tests exercise `RecordMerger` and `RecordLister` with:
//! - File-backed databases in a temp directory
//! - Several `Database` handles opened on the same file
//! - Concurrent submissions for the same identity

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use tempfile::TempDir;

use border_registry_core::db::Database;
use border_registry_core::errors::{CoreError, ValidationError};
use border_registry_core::models::{ForbiddenStaff, Submission};
use border_registry_core::{RecordLister, RecordMerger};

// ===========================================================================
// Helpers
// ===========================================================================

fn open_db(dir: &TempDir) -> Database {
    let db = Database::new(dir.path().join("border.db"), Duration::from_secs(10))
        .expect("failed to open store");
    db.initialize().expect("failed to initialize store");
    db
}

fn ana(staff: serde_json::Value, allowed: bool) -> serde_json::Value {
    json!({
        "first_name": "Ana",
        "last_name": "Kovac",
        "birth_date": "01/01/1990",
        "status": "ok",
        "address": "x",
        "phone_number": "123",
        "height": "170",
        "nationality": "HR",
        "eye_color": "brown",
        "forbidden_staff": staff,
        "allowed": allowed
    })
}

fn stamp(minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 14)
        .unwrap()
        .and_hms_opt(8, minute, second)
        .unwrap()
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_two_crossings_for_the_same_person() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let merger = RecordMerger::new(&db);

    let first = Submission::from_json(&ana(json!("knife"), true)).unwrap();
    let record = merger.merge_at(first, stamp(0, 0)).unwrap();
    assert_eq!(record.forbidden_staff, BTreeSet::from(["knife".to_string()]));
    assert_eq!(record.archive.len(), 1);
    assert_eq!(record.archive.values().copied().collect::<Vec<_>>(), vec![true]);

    let second = Submission::from_json(&ana(json!(["lighter"]), false)).unwrap();
    let record = merger.merge_at(second, stamp(1, 0)).unwrap();
    assert_eq!(
        record.forbidden_staff,
        BTreeSet::from(["knife".to_string(), "lighter".to_string()])
    );
    assert_eq!(record.archive.len(), 2);
    assert_eq!(record.archive.values().filter(|allowed| **allowed).count(), 1);

    // The record survives reopening the file.
    drop(merger);
    drop(db);
    let reopened = open_db(&dir);
    let listed = RecordLister::new(&reopened).last_n(10).unwrap();
    assert_eq!(listed, vec![record]);
}

#[test]
fn test_non_string_attributes_are_stored_as_sent() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let merger = RecordMerger::new(&db);

    let mut body = ana(json!("knife"), true);
    body["height"] = json!(170);
    body["phone_number"] = json!(123);
    body["address"] = json!({"city": "Zagreb", "street": "Ilica 1"});
    let record = merger.merge_json(&body).unwrap();
    assert_eq!(record.height, json!(170));

    drop(merger);
    drop(db);
    let reopened = open_db(&dir);
    let listed = RecordLister::new(&reopened).last_n(10).unwrap();
    let value = serde_json::to_value(&listed[0]).unwrap();
    assert_eq!(value["height"], json!(170));
    assert_eq!(value["phone_number"], json!(123));
    assert_eq!(value["address"]["city"], "Zagreb");
}

#[test]
fn test_rejected_payload_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let merger = RecordMerger::new(&db);

    for bad in [json!(42), json!({"item": "knife"})] {
        let err = merger.merge_json(&ana(bad, true)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidForbiddenStaff)
        ));
    }
    let mut missing = ana(json!("knife"), true);
    missing.as_object_mut().unwrap().remove("eye_color");
    assert!(matches!(
        merger.merge_json(&missing),
        Err(CoreError::Validation(ValidationError::MissingFields(_)))
    ));

    assert_eq!(db.count_persons().unwrap(), 0);
}

#[test]
fn test_listing_bound_over_many_people() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let merger = RecordMerger::new(&db);

    for i in 0..15u32 {
        let mut body = ana(json!("knife"), true);
        body["first_name"] = json!(format!("Ana{i}"));
        merger
            .merge_at(Submission::from_json(&body).unwrap(), stamp(i, 0))
            .unwrap();
    }

    let listed = RecordLister::new(&db).last_n(10).unwrap();
    assert_eq!(listed.len(), 10);
    assert_eq!(listed[0].first_name, "Ana5");
    assert_eq!(listed[9].first_name, "Ana14");
    for record in &listed {
        let value = serde_json::to_value(record).unwrap();
        assert!(value.get("id").is_none());
    }
}

#[test]
fn test_concurrent_submissions_lose_no_updates() {
    const THREADS: u32 = 8;
    const PER_THREAD: u32 = 5;

    let dir = TempDir::new().unwrap();
    // Two handles on one file: contention both within and across connections.
    let handles = [Arc::new(open_db(&dir)), Arc::new(open_db(&dir))];

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&handles[(t % 2) as usize]);
            thread::spawn(move || {
                let merger = RecordMerger::new(&db);
                for i in 0..PER_THREAD {
                    let mut sub = Submission::from_json(&ana(json!("knife"), true)).unwrap();
                    sub.forbidden_staff = ForbiddenStaff::Single(format!("item-{t}-{i}"));
                    merger.merge_at(sub, stamp(t, i)).expect("merge failed");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let records = handles[0].find_all().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.archive.len(), (THREADS * PER_THREAD) as usize);
    assert_eq!(record.forbidden_staff.len(), (THREADS * PER_THREAD) as usize);
    for t in 0..THREADS {
        for i in 0..PER_THREAD {
            assert!(record.forbidden_staff.contains(&format!("item-{t}-{i}")));
        }
    }
}
