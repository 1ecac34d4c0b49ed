//! Clink - a source-code cross-reference indexer for C, C++, and assembly.
//!
//! Builds a relational index of definitions, calls, references, includes, and assignments by
//! walking a source tree, parsing each recognised file, and optionally attaching a
//! syntax-highlighted copy of each line for display. Query access is read-only and never
//! mutates the index.

pub mod config;
pub mod db;
pub mod driver;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod parsing;
pub mod path;
pub mod queue;
pub mod repl;
pub mod symbol;

pub use error::{ClinkError, Result};
pub use symbol::{Category, FileRecord, Symbol};
