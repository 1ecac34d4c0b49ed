//! `add_symbol` — the hot-path insert the build driver calls once per emitted Symbol
//! (spec §4.2, §4.6).

use std::path::Path;

use rusqlite::params;
use tracing::trace;

use crate::error::{ClinkError, Result};
use crate::path::require_absolute;
use crate::symbol::Symbol;
use super::SymbolDatabase;

impl SymbolDatabase {
    /// Insert `symbol`, deduping on the `(name, path, category, line, col)` uniqueness tuple
    /// (spec §8 "Insertion idempotence"). A duplicate insert is not an error.
    pub fn add_symbol(&self, symbol: &Symbol) -> Result<()> {
        require_absolute(&symbol.path)?;
        if symbol.name.is_empty() {
            return Err(ClinkError::invalid_argument("symbol name must not be empty"));
        }

        let path_id = self.record_id(&symbol.path)?;

        self.conn.execute(
            "INSERT INTO symbols (name, path, category, line, col, parent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(name, path, category, line, col) DO NOTHING",
            params![
                symbol.name,
                path_id,
                symbol.category as i64,
                symbol.lineno,
                symbol.colno,
                symbol.parent,
            ],
        )?;
        trace!(name = %symbol.name, line = symbol.lineno, "inserted symbol");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Category;

    #[test]
    fn duplicate_insert_is_idempotent() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        db.add_record(Path::new("/t/a.c"), 1, 1).unwrap();
        let sym = Symbol::new(Category::Definition, "foo", Path::new("/t/a.c").to_path_buf(), 1, 1, "");
        db.add_symbol(&sym).unwrap();
        db.add_symbol(&sym).unwrap();

        let count: i64 = db
            .connection()
            .query_row("SELECT count(*) FROM symbols", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn add_symbol_rejects_relative_path() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        let sym = Symbol::new(Category::Definition, "foo", Path::new("rel.c").to_path_buf(), 1, 1, "");
        assert!(matches!(db.add_symbol(&sym), Err(ClinkError::InvalidArgument(_))));
    }

    #[test]
    fn add_symbol_without_record_is_not_recoverable() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        let sym = Symbol::new(Category::Definition, "foo", Path::new("/t/missing.c").to_path_buf(), 1, 1, "");
        assert!(matches!(db.add_symbol(&sym), Err(ClinkError::NotRecoverable(_))));
    }
}
