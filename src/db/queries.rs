//! The seven regex-driven find queries (spec §4.2) and the custom SQLite `regexp` function
//! that backs them.
//!
//! Patterns are POSIX-extended, anchored with implicit `^…$`, matching the contract of the
//! original `re_sqlite.c`/`re.c` (`regcomp(..., REG_EXTENDED | REG_NOSUB)`); here the `regex`
//! crate stands in for libc's `<regex.h>`.

use std::path::PathBuf;
use std::sync::Mutex;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::error::{ClinkError, Result};
use crate::symbol::Category;
use super::SymbolDatabase;

/// One row of a `find_*` query: a Symbol joined to its (possibly absent) highlighted
/// context line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRow {
    pub name: String,
    pub path: PathBuf,
    pub category: Category,
    pub lineno: u32,
    pub colno: u32,
    pub parent: String,
    pub context: Option<String>,
}

fn anchor(pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(&format!("^(?:{pattern})$")).map_err(ClinkError::from)
}

/// Register the `regexp(pattern, text)` scalar function used by every find query, and
/// `file_match(pattern, path)` which additionally matches any `/`-bounded suffix of `path` —
/// the generalisation spec §4.2 describes so that `find_file("clink.h")` matches
/// `/a/b/include/clink/clink.h`.
pub(super) fn register_regexp(conn: &Connection) -> Result<()> {
    let cache: Mutex<std::collections::HashMap<String, regex::Regex>> = Mutex::new(Default::default());
    let cache = std::sync::Arc::new(cache);

    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    {
        let cache = cache.clone();
        conn.create_scalar_function("regexp", 2, flags, move |ctx| {
            let pattern: String = ctx.get(0)?;
            let text: String = ctx.get(1)?;
            let mut cache = cache.lock().unwrap();
            let re = match cache.get(&pattern) {
                Some(re) => re.clone(),
                None => {
                    let re = anchor(&pattern).map_err(|e| {
                        rusqlite::Error::UserFunctionError(Box::new(e))
                    })?;
                    cache.insert(pattern.clone(), re.clone());
                    re
                }
            };
            Ok(re.is_match(&text))
        })?;
    }

    conn.create_scalar_function("file_match", 2, flags, move |ctx| {
        let pattern: String = ctx.get(0)?;
        let path: String = ctx.get(1)?;
        let mut cache = cache.lock().unwrap();
        let re = match cache.get(&pattern) {
            Some(re) => re.clone(),
            None => {
                let re = anchor(&pattern).map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
                cache.insert(pattern.clone(), re.clone());
                re
            }
        };

        if re.is_match(&path) {
            return Ok(true);
        }
        for (i, b) in path.bytes().enumerate() {
            if b == b'/' && i + 1 < path.len() && re.is_match(&path[i + 1..]) {
                return Ok(true);
            }
        }
        Ok(false)
    })?;

    Ok(())
}

const ROW_SQL: &str = "SELECT s.name, r.path, s.category, s.line, s.col, s.parent, c.body
     FROM symbols s
     JOIN records r ON r.id = s.path
     LEFT JOIN content c ON c.path = s.path AND c.line = s.line
     WHERE {cond}
     ORDER BY r.path, s.line, s.col";

fn row_from(row: &rusqlite::Row<'_>) -> rusqlite::Result<SymbolRow> {
    let category_raw: i64 = row.get(2)?;
    let category = Category::from_i64(category_raw).unwrap_or(Category::Reference);
    Ok(SymbolRow {
        name: row.get(0)?,
        path: PathBuf::from(row.get::<_, String>(1)?),
        category,
        lineno: row.get(3)?,
        colno: row.get(4)?,
        parent: row.get(5)?,
        context: row.get(6)?,
    })
}

impl SymbolDatabase {
    fn find_by(&self, cond: &str, pattern: &str) -> Result<Vec<SymbolRow>> {
        let sql = ROW_SQL.replace("{cond}", cond);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([pattern], row_from)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Every symbol of any category whose name matches `pattern`.
    pub fn find_symbol(&self, pattern: &str) -> Result<Vec<SymbolRow>> {
        self.find_by("regexp(?1, s.name)", pattern)
    }

    /// Definitions matching `pattern`.
    pub fn find_definition(&self, pattern: &str) -> Result<Vec<SymbolRow>> {
        self.find_by(
            &format!("s.category = {} AND regexp(?1, s.name)", Category::Definition as i64),
            pattern,
        )
    }

    /// Call sites whose target name matches `pattern` — "who calls `pattern`".
    pub fn find_caller(&self, pattern: &str) -> Result<Vec<SymbolRow>> {
        self.find_by(
            &format!("s.category = {} AND regexp(?1, s.name)", Category::FunctionCall as i64),
            pattern,
        )
    }

    /// Calls made from within the function named `parent_pattern` — "what does `pattern`
    /// call".
    pub fn find_call(&self, parent_pattern: &str) -> Result<Vec<SymbolRow>> {
        self.find_by(
            &format!("s.category = {} AND regexp(?1, s.parent)", Category::FunctionCall as i64),
            parent_pattern,
        )
    }

    /// Files whose path matches `pattern`, or whose path has a `/`-bounded suffix matching
    /// it (so `find_file("clink.h")` finds `/a/b/include/clink/clink.h`).
    pub fn find_file(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT path FROM records WHERE file_match(?1, path) ORDER BY path")?;
        let rows = stmt
            .query_map([pattern], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().map(PathBuf::from).collect())
    }

    /// Files that `#include` something matching `pattern`.
    pub fn find_includer(&self, pattern: &str) -> Result<Vec<SymbolRow>> {
        self.find_by(
            &format!("s.category = {} AND regexp(?1, s.name)", Category::Include as i64),
            pattern,
        )
    }

    /// Assignment targets matching `pattern`.
    pub fn find_assignment(&self, pattern: &str) -> Result<Vec<SymbolRow>> {
        self.find_by(
            &format!("s.category = {} AND regexp(?1, s.name)", Category::Assignment as i64),
            pattern,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;
    use std::path::Path;

    fn seed(db: &SymbolDatabase) {
        db.add_record(Path::new("/t/a.c"), 1, 1).unwrap();
        db.add_symbol(&Symbol::new(
            Category::Definition,
            "sym-name",
            Path::new("/t/a.c").to_path_buf(),
            1,
            1,
            "",
        ))
        .unwrap();
        db.add_symbol(&Symbol::new(
            Category::Definition,
            "another-sym-name",
            Path::new("/t/a.c").to_path_buf(),
            2,
            1,
            "",
        ))
        .unwrap();
    }

    #[test]
    fn regex_anchoring_matches_exactly() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        seed(&db);
        let rows = db.find_definition("sym-.*").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "sym-name");
    }

    #[test]
    fn find_symbol_is_anchored_not_substring() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        db.add_record(Path::new("/t/a.c"), 1, 1).unwrap();
        db.add_symbol(&Symbol::new(Category::Definition, "foo", Path::new("/t/a.c").to_path_buf(), 1, 1, ""))
            .unwrap();
        db.add_symbol(&Symbol::new(Category::Definition, "foobar", Path::new("/t/a.c").to_path_buf(), 2, 1, ""))
            .unwrap();
        db.add_symbol(&Symbol::new(Category::Definition, "myfoo", Path::new("/t/a.c").to_path_buf(), 3, 1, ""))
            .unwrap();

        let rows = db.find_symbol("foo").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "foo");
    }

    #[test]
    fn find_file_matches_suffix() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        db.add_record(Path::new("/a/b/include/clink/clink.h"), 1, 1).unwrap();
        let found = db.find_file("clink.h").unwrap();
        assert_eq!(found, vec![PathBuf::from("/a/b/include/clink/clink.h")]);
    }

    #[test]
    fn find_call_by_parent() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        db.add_record(Path::new("/t/a.c"), 1, 1).unwrap();
        db.add_symbol(&Symbol::new(
            Category::FunctionCall,
            "helper",
            Path::new("/t/a.c").to_path_buf(),
            5,
            3,
            "main",
        ))
        .unwrap();

        let rows = db.find_call("main").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "helper");

        let empty = db.find_call("main2").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn results_are_ordered_by_path_line_col() {
        let db = SymbolDatabase::open_in_memory().unwrap();
        db.add_record(Path::new("/t/a.c"), 1, 1).unwrap();
        db.add_symbol(&Symbol::new(Category::Reference, "x", Path::new("/t/a.c").to_path_buf(), 3, 1, ""))
            .unwrap();
        db.add_symbol(&Symbol::new(Category::Reference, "x", Path::new("/t/a.c").to_path_buf(), 1, 5, ""))
            .unwrap();
        db.add_symbol(&Symbol::new(Category::Reference, "x", Path::new("/t/a.c").to_path_buf(), 1, 2, ""))
            .unwrap();

        let rows = db.find_symbol("x").unwrap();
        let lines: Vec<(u32, u32)> = rows.iter().map(|r| (r.lineno, r.colno)).collect();
        assert_eq!(lines, vec![(1, 2), (1, 5), (3, 1)]);
    }
}
