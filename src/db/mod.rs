//! The symbol database: a single SQLite connection layered with the schema, pragmas, and
//! transaction contract described in spec §4.2.

mod content;
mod queries;
mod records;
mod schema;
mod symbols;

use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::Result;
use crate::path::require_absolute;

pub use queries::SymbolRow;

/// The schema version this build understands. Bumped only on an incompatible layout change;
/// `open()` refuses to touch a database stamped with a different value.
const SCHEMA_VERSION: i64 = 1;

/// Owns the one connection this engine ever opens. All mutation from worker threads is
/// serialised by the caller (the build driver holds a `Mutex<SymbolDatabase>`); this type
/// itself does no locking.
pub struct SymbolDatabase {
    conn: Connection,
}

impl SymbolDatabase {
    /// Open (or create) the database at `path`. Pragmas favour throughput over fsync
    /// durability: the database is a derived artifact, and the worst case of a crash is a
    /// re-index, not data loss.
    pub fn open(path: &Path) -> Result<Self> {
        let fresh = !path.exists();
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA synchronous = OFF;
             PRAGMA journal_mode = MEMORY;
             PRAGMA temp_store = MEMORY;",
        )?;

        queries::register_regexp(&conn)?;

        let mut db = SymbolDatabase { conn };
        db.schema_version_check_or_init(fresh)?;
        if fresh {
            db.create_schema()?;
            info!(path = %path.display(), "created new clink database");
        } else {
            debug!(path = %path.display(), "opened existing clink database");
        }
        Ok(db)
    }

    /// Open an in-memory database, useful for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "PRAGMA synchronous = OFF;
             PRAGMA journal_mode = MEMORY;
             PRAGMA temp_store = MEMORY;",
        )?;
        queries::register_regexp(&conn)?;
        let mut db = SymbolDatabase { conn };
        db.schema_version_check_or_init(true)?;
        db.create_schema()?;
        Ok(db)
    }

    /// Begin the single transaction that wraps an entire build (spec §4.2/§4.6).
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    pub fn commit_transaction(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    pub fn rollback_transaction(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn schema_version_check_or_init(&mut self, fresh: bool) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
            [],
        )?;

        if fresh {
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
            return Ok(());
        }

        let stored: Option<i64> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |r| r.get(0))
            .ok();

        match stored {
            Some(v) if v == SCHEMA_VERSION => Ok(()),
            Some(v) => Err(crate::error::ClinkError::NotRecoverable(format!(
                "database schema version {v} is not supported by this build (expected {SCHEMA_VERSION})"
            ))),
            None => {
                // A database that predates the schema_version table: stamp it rather than
                // refuse to open it.
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    [SCHEMA_VERSION],
                )?;
                Ok(())
            }
        }
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_creates_schema() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        let count: i64 = db
            .conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='records'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn require_absolute_rejects_relative() {
        assert!(require_absolute(Path::new("relative/path")).is_err());
        assert!(require_absolute(Path::new("/absolute/path")).is_ok());
    }
}
