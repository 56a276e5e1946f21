//! Schema migrations
//!
//! Versions are tracked in `schema_version`; each migration runs in its own
//! transaction.

use rusqlite::{Connection, Transaction};
use std::collections::HashMap;
use tracing::{debug, info};

/// Current database schema version
const CURRENT_VERSION: u32 = 1;

type Migration = fn(&Transaction) -> rusqlite::Result<()>;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Create the version table and apply every pending migration
    pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
        debug!("MigrationManager::initialize: called");
        conn.execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)", [])?;

        let current_version = Self::get_version(conn)?;
        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
        }
        Ok(())
    }

    fn apply_migration(conn: &Connection, version: u32) -> rusqlite::Result<()> {
        let migrations = get_migrations();
        let Some(migration) = migrations.get(&version) else {
            return Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ));
        };

        let tx = conn.unchecked_transaction()?;
        migration(&tx)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
        info!(version, "Applied schema migration");
        Ok(())
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> rusqlite::Result<u32> {
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
            row.get(0)
        })
    }
}

fn get_migrations() -> HashMap<u32, Migration> {
    let mut migrations: HashMap<u32, Migration> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations
}

/// Migration v1: sessions and tasks
fn migration_v1(tx: &Transaction) -> rusqlite::Result<()> {
    tx.execute(
        "CREATE TABLE sessions (
            id INTEGER PRIMARY KEY,
            owner TEXT NOT NULL,
            date TEXT NOT NULL,
            palace_theme TEXT NOT NULL DEFAULT 'Default',
            is_completed INTEGER NOT NULL DEFAULT 0,
            palace_image TEXT NULL,
            created_ts INTEGER NOT NULL,
            UNIQUE(owner, date)
        )",
        [],
    )?;

    // `sort_order` holds the sub-task layer position
    tx.execute(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY,
            session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            parent_id INTEGER NULL REFERENCES tasks(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            category TEXT NOT NULL CHECK(category IN ('creative','analytical','physical','administrative')),
            complexity INTEGER NOT NULL CHECK(complexity BETWEEN 1 AND 5),
            is_completed INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NULL,
            time_estimate INTEGER NULL,
            layer_image TEXT NULL,
            layer_revealed_image TEXT NULL,
            palace_image TEXT NULL,
            complete_palace_image TEXT NULL,
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;

    tx.execute("CREATE INDEX idx_tasks_session ON tasks(session_id)", [])?;
    tx.execute("CREATE INDEX idx_tasks_parent ON tasks(parent_id)", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        assert_eq!(MigrationManager::get_version(&conn).unwrap(), CURRENT_VERSION);

        MigrationManager::initialize(&conn).unwrap();
        assert_eq!(MigrationManager::get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_tables_exist() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('sessions','tasks')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }
}
