//! Store schema definitions and migration runner.
//!
//! Migrations are simple SQL strings applied in order. The SQLite
//! `user_version` pragma tracks which migrations have already been applied.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::StoreError;

/// All migrations, in order. Each entry is `(version, description, sql)`.
static MIGRATIONS: &[(u32, &str, &str)] = &[(
    1,
    "persons collection",
    r#"
    CREATE TABLE IF NOT EXISTS persons (
        seq             INTEGER PRIMARY KEY AUTOINCREMENT,
        id              TEXT    NOT NULL UNIQUE,
        first_name      TEXT    NOT NULL,
        last_name       TEXT    NOT NULL,
        birth_date      TEXT    NOT NULL,
        -- JSON text from here down
        status          TEXT    NOT NULL,
        address         TEXT    NOT NULL,
        phone_number    TEXT    NOT NULL,
        height          TEXT    NOT NULL,
        nationality     TEXT    NOT NULL,
        eye_color       TEXT    NOT NULL,
        forbidden_staff TEXT    NOT NULL DEFAULT '[]',
        archive         TEXT    NOT NULL DEFAULT '{}',
        UNIQUE (first_name, last_name, birth_date)
    );
    "#,
)];

/// Run all pending migrations against `conn`.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_schema_version(conn)?;
    info!(
        current_version,
        target_version = MIGRATIONS.last().map(|m| m.0).unwrap_or(0),
        "checking store migrations"
    );

    for &(version, description, sql) in MIGRATIONS {
        if version > current_version {
            info!(version, description, "applying migration");
            conn.execute_batch(sql)
                .map_err(|e| StoreError::MigrationFailed {
                    version,
                    detail: e.to_string(),
                })?;
            conn.pragma_update(None, "user_version", version)?;
            debug!(version, "migration applied successfully");
        }
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<u32, StoreError> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}
