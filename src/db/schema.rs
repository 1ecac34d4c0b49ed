//! Table creation for the three-table schema mandated by spec §6.

use tracing::debug;

use crate::error::Result;
use super::SymbolDatabase;

impl SymbolDatabase {
    pub(super) fn create_schema(&mut self) -> Result<()> {
        debug!("creating clink schema");

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY,
                path TEXT UNIQUE NOT NULL,
                hash INTEGER,
                timestamp INTEGER
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS symbols (
                name TEXT NOT NULL,
                path INTEGER NOT NULL REFERENCES records(id),
                category INTEGER NOT NULL,
                line INTEGER NOT NULL,
                col INTEGER NOT NULL,
                parent TEXT NOT NULL DEFAULT '',
                UNIQUE(name, path, category, line, col)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS content (
                path INTEGER NOT NULL REFERENCES records(id),
                line INTEGER NOT NULL,
                body TEXT NOT NULL,
                UNIQUE(path, line)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_symbols_parent ON symbols(parent)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_symbols_path ON symbols(path)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_content_path ON content(path)",
            [],
        )?;

        debug!("clink schema created");
        Ok(())
    }
}
