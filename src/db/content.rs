//! `add_line` — the highlighter stage's per-line upsert (spec §4.2, §4.4).

use std::path::Path;

use rusqlite::params;

use crate::error::Result;
use crate::path::require_absolute;
use super::SymbolDatabase;

impl SymbolDatabase {
    /// Upsert a ContentLine. Highlighting is independent of parse order, so this may arrive
    /// before or after the Symbols whose `context` it eventually populates.
    pub fn add_line(&self, path: &Path, lineno: u32, body: &str) -> Result<()> {
        require_absolute(path)?;
        let path_id = self.record_id(path)?;

        self.conn.execute(
            "INSERT INTO content (path, line, body) VALUES (?1, ?2, ?3)
             ON CONFLICT(path, line) DO UPDATE SET body = excluded.body",
            params![path_id, lineno, body],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_line_upserts() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        db.add_record(Path::new("/t/a.c"), 1, 1).unwrap();
        db.add_line(Path::new("/t/a.c"), 1, "first").unwrap();
        db.add_line(Path::new("/t/a.c"), 1, "second").unwrap();

        let count: i64 = db
            .connection()
            .query_row("SELECT count(*) FROM content", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
