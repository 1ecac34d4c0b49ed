//! The Cscope-compatible line-oriented wire protocol (spec §6).
//!
//! This module formats one reply for one query; the interactive readline loop around it is
//! an external collaborator's responsibility (`main` wires stdin/stdout to [`run_one`] in
//! line-oriented mode).

use std::fmt::Write as _;

use crate::db::{SymbolDatabase, SymbolRow};

/// The ten Cscope query commands. `4`/`5`/`6`/`9` are accepted but always answer
/// `cscope: 0 lines` (find-text, change-text, find-pattern, find-assignments — unimplemented).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    FindSymbol,
    FindDefinition,
    FindCallers,
    FindCallees,
    FindText,
    ChangeText,
    FindFile,
    FindIncluders,
    FindPattern,
    FindAssignments,
}

impl Command {
    fn from_digit(digit: char) -> Option<Self> {
        Some(match digit {
            '0' => Command::FindSymbol,
            '1' => Command::FindDefinition,
            '2' => Command::FindCallees,
            '3' => Command::FindCallers,
            '4' => Command::FindText,
            '5' => Command::ChangeText,
            '6' => Command::FindPattern,
            '7' => Command::FindFile,
            '8' => Command::FindIncluders,
            '9' => Command::FindAssignments,
            _ => return None,
        })
    }
}

/// Parse one line of the form `<digit><query>` (no space between the command digit and the
/// query text, matching Cscope's line-mode wire format).
pub fn parse_line(line: &str) -> Option<(Command, &str)> {
    let mut chars = line.chars();
    let digit = chars.next()?;
    let command = Command::from_digit(digit)?;
    Some((command, chars.as_str()))
}

/// Format matched rows into a cscope reply. `use_parent` selects the second field per
/// command: the enclosing symbol for find-symbol/find-caller/find-includer, the symbol's own
/// name for find-definition/find-call.
fn format_rows(rows: &[SymbolRow], use_parent: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "cscope: {} lines", rows.len());
    for row in rows {
        let context = row.context.as_deref().unwrap_or("");
        let label = if use_parent { row.parent.as_str() } else { row.name.as_str() };
        let _ = writeln!(out, "{} {} {} {}", row.path.display(), label, row.lineno, context);
    }
    out
}

fn format_files(paths: &[std::path::PathBuf]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "cscope: {} lines", paths.len());
    for path in paths {
        let _ = writeln!(out, "{} {} 0 ", path.display(), path.display());
    }
    out
}

/// Run one query against `db` and return its formatted reply, including the trailing
/// newline after the header line and after each record.
pub fn run_one(db: &SymbolDatabase, command: Command, query: &str) -> String {
    match command {
        Command::FindSymbol => db
            .find_symbol(query)
            .map(|rows| format_rows(&rows, true))
            .unwrap_or_else(|_| "cscope: 0 lines\n".to_string()),
        Command::FindDefinition => db
            .find_definition(query)
            .map(|rows| format_rows(&rows, false))
            .unwrap_or_else(|_| "cscope: 0 lines\n".to_string()),
        Command::FindCallers => db
            .find_caller(query)
            .map(|rows| format_rows(&rows, true))
            .unwrap_or_else(|_| "cscope: 0 lines\n".to_string()),
        Command::FindCallees => db
            .find_call(query)
            .map(|rows| format_rows(&rows, false))
            .unwrap_or_else(|_| "cscope: 0 lines\n".to_string()),
        Command::FindFile => db
            .find_file(query)
            .map(|paths| format_files(&paths))
            .unwrap_or_else(|_| "cscope: 0 lines\n".to_string()),
        Command::FindIncluders => db
            .find_includer(query)
            .map(|rows| format_rows(&rows, true))
            .unwrap_or_else(|_| "cscope: 0 lines\n".to_string()),
        Command::FindText | Command::ChangeText | Command::FindPattern | Command::FindAssignments => {
            "cscope: 0 lines\n".to_string()
        }
    }
}
