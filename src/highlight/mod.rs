//! The Vim bridge (spec §4.4): two strategies for producing syntax-highlighted line content,
//! both driving Vim as a child process since Clink cannot reimplement a user's syntax rules.

mod colour;
pub mod html;
pub mod vterm;

use crate::error::Result;

/// Produce ANSI-escaped content lines for a source file. Implementations own whatever
/// scratch resources they need (temp directories, child processes) via RAII: every exit
/// path, including early error returns, releases them.
pub trait Highlighter {
    /// Returns `(lineno, body)` pairs, one per line of the file, in order.
    fn highlight(&self, path: &std::path::Path) -> Result<Vec<(u32, String)>>;
}

pub use html::HtmlHighlighter;
pub use vterm::VtermHighlighter;
