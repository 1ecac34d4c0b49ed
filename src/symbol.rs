//! The data model shared by every parser, the highlighter, and the database (spec §3).

use std::path::PathBuf;

/// The five kinds of cross-reference this engine records.
///
/// The discriminant values are part of the on-disk schema (spec §6) and must not be
/// reordered: `symbols.category` stores these as plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i64)]
pub enum Category {
    Definition = 0,
    FunctionCall = 1,
    Reference = 2,
    Include = 3,
    Assignment = 4,
}

impl Category {
    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Category::Definition),
            1 => Some(Category::FunctionCall),
            2 => Some(Category::Reference),
            3 => Some(Category::Include),
            4 => Some(Category::Assignment),
            _ => None,
        }
    }
}

/// One cross-reference record emitted by a parser.
///
/// `path` is always absolute and equal to the file the parser was given; `parent` is the
/// enclosing definition's name at the point of emission, or empty if there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub category: Category,
    pub name: String,
    pub path: PathBuf,
    pub lineno: u32,
    pub colno: u32,
    pub parent: String,
    /// Denormalised highlighted text of the line this symbol lives on. Absent until the
    /// highlighter stage fills it in; queries populate this by joining to `content`.
    pub context: Option<String>,
}

impl Symbol {
    pub fn new(
        category: Category,
        name: impl Into<String>,
        path: PathBuf,
        lineno: u32,
        colno: u32,
        parent: impl Into<String>,
    ) -> Self {
        Symbol {
            category,
            name: name.into(),
            path,
            lineno,
            colno,
            parent: parent.into(),
            context: None,
        }
    }
}

/// A row per indexed file: used to decide whether a file has changed since the last build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub hash: u64,
    pub timestamp: i64,
}
