//! FileRecord CRUD (spec §4.2): `add_record`, `find_record`, and the purge cascade used by
//! `remove`.

use std::path::Path;

use rusqlite::params;
use tracing::debug;

use crate::error::{ClinkError, Result};
use crate::path::require_absolute;
use crate::symbol::FileRecord;
use super::SymbolDatabase;

impl SymbolDatabase {
    /// Upsert a FileRecord for `path`.
    pub fn add_record(&self, path: &Path, hash: u64, timestamp: i64) -> Result<()> {
        require_absolute(path)?;
        let path_str = path.to_str().ok_or_else(|| {
            ClinkError::invalid_argument(format!("path is not valid UTF-8: {}", path.display()))
        })?;

        self.conn.execute(
            "INSERT INTO records (path, hash, timestamp) VALUES (?1, ?2, ?3)
             ON CONFLICT(path) DO UPDATE SET hash = excluded.hash, timestamp = excluded.timestamp",
            params![path_str, hash as i64, timestamp],
        )?;
        Ok(())
    }

    /// Look up the stored FileRecord for `path`.
    pub fn find_record(&self, path: &Path) -> Result<FileRecord> {
        require_absolute(path)?;
        let path_str = path.to_str().ok_or_else(|| {
            ClinkError::invalid_argument(format!("path is not valid UTF-8: {}", path.display()))
        })?;

        self.conn
            .query_row(
                "SELECT hash, timestamp FROM records WHERE path = ?1",
                [path_str],
                |row| {
                    let hash: i64 = row.get(0)?;
                    let timestamp: i64 = row.get(1)?;
                    Ok(FileRecord {
                        path: path.to_path_buf(),
                        hash: hash as u64,
                        timestamp,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    ClinkError::not_found(format!("no record for {}", path.display()))
                }
                other => ClinkError::Database(other),
            })
    }

    /// The record id for `path`, if one exists. Used internally by `add_symbol`/`add_line`
    /// to resolve the foreign-key column.
    pub(super) fn record_id(&self, path: &Path) -> Result<i64> {
        let path_str = path.to_str().ok_or_else(|| {
            ClinkError::invalid_argument(format!("path is not valid UTF-8: {}", path.display()))
        })?;
        self.conn
            .query_row("SELECT id FROM records WHERE path = ?1", [path_str], |r| r.get(0))
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => ClinkError::NotRecoverable(format!(
                    "symbol/content referenced path {} with no FileRecord",
                    path.display()
                )),
                other => ClinkError::Database(other),
            })
    }

    /// Delete `path`'s FileRecord and cascade to its symbols and content rows (spec §8
    /// "Purge cascade").
    pub fn remove(&self, path: &Path) -> Result<()> {
        require_absolute(path)?;
        let path_str = path.to_str().ok_or_else(|| {
            ClinkError::invalid_argument(format!("path is not valid UTF-8: {}", path.display()))
        })?;

        let id: Option<i64> = self
            .conn
            .query_row("SELECT id FROM records WHERE path = ?1", [path_str], |r| r.get(0))
            .ok();

        let Some(id) = id else {
            debug!(path = %path.display(), "remove: no record, nothing to do");
            return Ok(());
        };

        self.conn.execute("DELETE FROM content WHERE path = ?1", [id])?;
        self.conn.execute("DELETE FROM symbols WHERE path = ?1", [id])?;
        self.conn.execute("DELETE FROM records WHERE id = ?1", [id])?;
        debug!(path = %path.display(), "purged record and cascaded rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SymbolDatabase;

    #[test]
    fn add_and_find_record_round_trips() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        db.add_record(Path::new("/t/a.c"), 42, 1000).unwrap();
        let record = db.find_record(Path::new("/t/a.c")).unwrap();
        assert_eq!(record.hash, 42);
        assert_eq!(record.timestamp, 1000);
    }

    #[test]
    fn add_record_is_upsert() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        db.add_record(Path::new("/t/a.c"), 1, 100).unwrap();
        db.add_record(Path::new("/t/a.c"), 2, 200).unwrap();
        let record = db.find_record(Path::new("/t/a.c")).unwrap();
        assert_eq!(record.hash, 2);
        assert_eq!(record.timestamp, 200);
    }

    #[test]
    fn find_record_missing_is_not_found() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        assert!(matches!(
            db.find_record(Path::new("/nope")),
            Err(ClinkError::NotFound(_))
        ));
    }

    #[test]
    fn relative_path_is_rejected() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        assert!(matches!(
            db.add_record(Path::new("relative.c"), 1, 1),
            Err(ClinkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn remove_cascades_to_symbols_and_content() {
        use crate::symbol::{Category, Symbol};

        let db = SymbolDatabase::open_in_memory().unwrap();
        db.add_record(Path::new("/t/a.c"), 1, 1).unwrap();
        db.add_symbol(&Symbol::new(
            Category::Definition,
            "foo",
            Path::new("/t/a.c").to_path_buf(),
            1,
            1,
            "",
        ))
        .unwrap();
        db.add_line(Path::new("/t/a.c"), 1, "int foo();").unwrap();

        db.remove(Path::new("/t/a.c")).unwrap();

        assert!(db.find_record(Path::new("/t/a.c")).is_err());
        let count: i64 = db
            .connection()
            .query_row("SELECT count(*) FROM symbols", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
        let count: i64 = db
            .connection()
            .query_row("SELECT count(*) FROM content", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
