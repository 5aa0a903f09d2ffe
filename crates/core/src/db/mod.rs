//! SQLite persistence layer for the border registry.
//!
//! Provides a [`Database`] handle with WAL-mode journaling, a bounded busy
//! timeout, automatic schema bootstrap, and the person-collection queries
//! used by the merger and lister.

pub mod queries;
pub mod schema;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::errors::StoreError;

/// Main store handle wrapping a SQLite connection.
///
/// The inner connection is wrapped in a `Mutex` so that `Database` is
/// `Send + Sync` and can be shared behind an `Arc`. Holding the guard
/// serializes every write issued through this handle.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite store at `path`.
    ///
    /// Lock waits are capped by `busy_timeout`; past it an operation fails
    /// instead of blocking.
    pub fn new<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening store");

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.busy_timeout(busy_timeout)?;

        debug!(busy_timeout_ms = busy_timeout.as_millis() as u64, "store opened with WAL mode");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the store described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::new(&config.path, Duration::from_millis(config.busy_timeout_ms))
    }

    /// Open an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run all schema migrations to bring the store up to date.
    pub fn initialize(&self) -> Result<(), StoreError> {
        info!("initializing store schema");
        let conn = self.conn();
        schema::run_migrations(&conn)?;
        debug!("store schema is up to date");
        Ok(())
    }

    /// Obtain a lock on the underlying connection.
    ///
    /// If the Mutex is poisoned (a previous holder panicked), the lock is
    /// recovered rather than propagating a panic.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("store mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Execute a closure inside an immediate SQLite transaction. If the
    /// closure returns `Ok`, the transaction is committed; otherwise it is
    /// rolled back.
    ///
    /// The write lock is taken at `BEGIN`, so no other connection can write
    /// between the closure's reads and its writes.
    pub fn transaction<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().expect("failed to create in-memory store");
        db.initialize().expect("failed to initialize schema");
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("border.db");
        let db = Database::new(&path, Duration::from_secs(1)).expect("failed to create file store");
        db.initialize().expect("failed to initialize schema");
        assert!(path.exists());
    }

    #[test]
    fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("from-config.db"),
            busy_timeout_ms: 250,
        };
        let db = Database::open(&config).unwrap();
        db.initialize().unwrap();
        assert!(config.path.exists());
    }

    #[test]
    fn test_transaction_rollback() {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();

        let result: Result<(), StoreError> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO persons (id, first_name, last_name, birth_date, status, address,
                 phone_number, height, nationality, eye_color)
                 VALUES ('r1', 'A', 'B', 'C', 's', 'a', 'p', 'h', 'n', 'e')",
                [],
            )?;
            Err(StoreError::NotFound("forced".into()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
