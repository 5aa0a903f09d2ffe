//! Typed queries over the `persons` collection.
//!
//! The free functions take a `&Connection` so they can run inside
//! [`Database::transaction`]; the `impl Database` helpers lock the
//! connection for one-off calls.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::Database;
use crate::errors::StoreError;
use crate::models::{Archive, IdentityKey, PersonRecord};

// ---------------------------------------------------------------------------
// Domain structs returned by queries
// ---------------------------------------------------------------------------

/// A stored person together with its internal id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPerson {
    pub id: String,
    pub record: PersonRecord,
}

/// Which row an upsert targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    /// Match on (first_name, last_name, birth_date); used on creation.
    Identity(IdentityKey),
    /// Match on the internal id of an existing record.
    Id(String),
}

const PERSON_COLUMNS: &str = "id, first_name, last_name, birth_date, status, address,
     phone_number, height, nationality, eye_color, forbidden_staff, archive";

/// Column values before the JSON columns are decoded.
struct RawPerson {
    id: String,
    first_name: String,
    last_name: String,
    birth_date: String,
    status: String,
    address: String,
    phone_number: String,
    height: String,
    nationality: String,
    eye_color: String,
    forbidden_staff: String,
    archive: String,
}

impl RawPerson {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            birth_date: row.get(3)?,
            status: row.get(4)?,
            address: row.get(5)?,
            phone_number: row.get(6)?,
            height: row.get(7)?,
            nationality: row.get(8)?,
            eye_color: row.get(9)?,
            forbidden_staff: row.get(10)?,
            archive: row.get(11)?,
        })
    }

    fn decode(self) -> Result<StoredPerson, StoreError> {
        let id = self.id;
        let forbidden_staff: BTreeSet<String> =
            decode_column(&id, "forbidden_staff", &self.forbidden_staff)?;
        let archive: Archive = decode_column(&id, "archive", &self.archive)?;

        let record = PersonRecord {
            first_name: self.first_name,
            last_name: self.last_name,
            birth_date: self.birth_date,
            status: decode_column(&id, "status", &self.status)?,
            address: decode_column(&id, "address", &self.address)?,
            phone_number: decode_column(&id, "phone_number", &self.phone_number)?,
            height: decode_column(&id, "height", &self.height)?,
            nationality: decode_column(&id, "nationality", &self.nationality)?,
            eye_color: decode_column(&id, "eye_color", &self.eye_color)?,
            forbidden_staff,
            archive,
        };
        Ok(StoredPerson { id, record })
    }
}

fn decode_column<T: DeserializeOwned>(
    id: &str,
    column: &'static str,
    text: &str,
) -> Result<T, StoreError> {
    serde_json::from_str(text).map_err(|e| StoreError::CorruptColumn {
        id: id.to_string(),
        column,
        detail: e.to_string(),
    })
}

/// Values of the columns stored as JSON text.
struct JsonColumns {
    status: String,
    address: String,
    phone_number: String,
    height: String,
    nationality: String,
    eye_color: String,
    forbidden_staff: String,
    archive: String,
}

impl JsonColumns {
    fn encode(fields: &PersonRecord) -> Result<Self, StoreError> {
        Ok(Self {
            status: serde_json::to_string(&fields.status)?,
            address: serde_json::to_string(&fields.address)?,
            phone_number: serde_json::to_string(&fields.phone_number)?,
            height: serde_json::to_string(&fields.height)?,
            nationality: serde_json::to_string(&fields.nationality)?,
            eye_color: serde_json::to_string(&fields.eye_color)?,
            forbidden_staff: serde_json::to_string(&fields.forbidden_staff)?,
            archive: serde_json::to_string(&fields.archive)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Connection-level queries
// ---------------------------------------------------------------------------

/// Look up a person by identity key.
pub fn find_by_identity(
    conn: &Connection,
    key: &IdentityKey,
) -> Result<Option<StoredPerson>, StoreError> {
    let sql = format!(
        "SELECT {PERSON_COLUMNS} FROM persons
         WHERE first_name = ?1 AND last_name = ?2 AND birth_date = ?3"
    );
    let raw = conn
        .query_row(
            &sql,
            params![key.first_name, key.last_name, key.birth_date],
            RawPerson::from_row,
        )
        .optional()?;
    raw.map(RawPerson::decode).transpose()
}

/// Look up a person by internal id.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<StoredPerson>, StoreError> {
    let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1");
    let raw = conn
        .query_row(&sql, params![id], RawPerson::from_row)
        .optional()?;
    raw.map(RawPerson::decode).transpose()
}

/// Create or update the record matched by `filter`, setting every field to
/// `fields`, and return the post-write state.
///
/// An identity filter with no match inserts under a fresh internal id. An id
/// filter with no match inserts under that id. Existing internal ids are
/// never rewritten.
pub fn find_one_and_upsert(
    conn: &Connection,
    filter: &RecordFilter,
    fields: &PersonRecord,
) -> Result<PersonRecord, StoreError> {
    let json = JsonColumns::encode(fields)?;

    let id = match filter {
        RecordFilter::Identity(key) => {
            let new_id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO persons (id, first_name, last_name, birth_date, status, address,
                 phone_number, height, nationality, eye_color, forbidden_staff, archive)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT (first_name, last_name, birth_date) DO UPDATE SET
                    status = excluded.status,
                    address = excluded.address,
                    phone_number = excluded.phone_number,
                    height = excluded.height,
                    nationality = excluded.nationality,
                    eye_color = excluded.eye_color,
                    forbidden_staff = excluded.forbidden_staff,
                    archive = excluded.archive",
                params![
                    new_id,
                    key.first_name,
                    key.last_name,
                    key.birth_date,
                    json.status,
                    json.address,
                    json.phone_number,
                    json.height,
                    json.nationality,
                    json.eye_color,
                    json.forbidden_staff,
                    json.archive,
                ],
            )?;
            debug!(identity = %key, "upserted person by identity");
            return find_by_identity(conn, key)?
                .map(|stored| stored.record)
                .ok_or_else(|| StoreError::NotFound(key.to_string()));
        }
        RecordFilter::Id(id) => id,
    };

    let changed = conn.execute(
        "UPDATE persons SET first_name = ?2, last_name = ?3, birth_date = ?4, status = ?5,
         address = ?6, phone_number = ?7, height = ?8, nationality = ?9, eye_color = ?10,
         forbidden_staff = ?11, archive = ?12
         WHERE id = ?1",
        params![
            id,
            fields.first_name,
            fields.last_name,
            fields.birth_date,
            json.status,
            json.address,
            json.phone_number,
            json.height,
            json.nationality,
            json.eye_color,
            json.forbidden_staff,
            json.archive,
        ],
    )?;
    if changed == 0 {
        conn.execute(
            "INSERT INTO persons (id, first_name, last_name, birth_date, status, address,
             phone_number, height, nationality, eye_color, forbidden_staff, archive)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id,
                fields.first_name,
                fields.last_name,
                fields.birth_date,
                json.status,
                json.address,
                json.phone_number,
                json.height,
                json.nationality,
                json.eye_color,
                json.forbidden_staff,
                json.archive,
            ],
        )?;
    }
    debug!(id = %id, inserted = changed == 0, "upserted person by id");

    find_by_id(conn, id)?
        .map(|stored| stored.record)
        .ok_or_else(|| StoreError::NotFound(id.clone()))
}

/// Every record in storage (insertion) order, internal ids stripped.
pub fn find_all(conn: &Connection) -> Result<Vec<PersonRecord>, StoreError> {
    let sql = format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY seq ASC");
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
        .query_map([], RawPerson::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter()
        .map(|raw| raw.decode().map(|stored| stored.record))
        .collect()
}

// ---------------------------------------------------------------------------
// Database helpers
// ---------------------------------------------------------------------------

impl Database {
    /// Look up a person by identity key.
    pub fn find_by_identity(&self, key: &IdentityKey) -> Result<Option<StoredPerson>, StoreError> {
        find_by_identity(&self.conn(), key)
    }

    /// Every record in storage order, internal ids stripped.
    pub fn find_all(&self) -> Result<Vec<PersonRecord>, StoreError> {
        find_all(&self.conn())
    }

    /// Total number of stored persons.
    pub fn count_persons(&self) -> Result<i64, StoreError> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))?;
        Ok(count)
    }
}
