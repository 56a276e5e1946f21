//! SQLite persistence for sessions and tasks
//!
//! `Store` owns a single connection. It is not shared: the state actor is its
//! only user, which serializes every write.

mod migrations;
mod sessions;
mod tasks;

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};

pub use migrations::MigrationManager;

/// Errors from the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed store
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path` and run migrations
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Store::open: called");
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "Opened store");
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("Store::open_in_memory: called");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        // Needed on every connection for ON DELETE CASCADE
        conn.execute_batch("PRAGMA foreign_keys=ON")?;
        MigrationManager::initialize(&conn)?;
        Ok(Self { conn })
    }
}
