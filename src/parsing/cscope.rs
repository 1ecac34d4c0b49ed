//! Optional fallback parser that shells out to a system `cscope` binary and reads back its
//! database (spec §4.3.4), ported from `parse_with_cscope.c`.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use crate::error::{ClinkError, Result};
use crate::symbol::{Category, Symbol};
use super::Parser;

/// Whether a compatible `cscope` binary is on `PATH`. Probed once per process, not once per
/// file, per spec §4.3.4.
pub fn is_available() -> bool {
    static PROBE: OnceLock<bool> = OnceLock::new();
    *PROBE.get_or_init(|| {
        Command::new("cscope")
            .arg("-V")
            .output()
            .map(|o| o.status.success() || !o.stdout.is_empty() || !o.stderr.is_empty())
            .unwrap_or(false)
    })
}

pub struct CscopeParser;

impl Parser for CscopeParser {
    fn parse(&self, path: &Path) -> Result<Vec<Symbol>> {
        let dir = tempfile::tempdir()?;
        let out_path = dir.path().join("cscope.out");

        let status = Command::new("cscope")
            .arg("-b")
            .arg("-c")
            .arg(format!("-f{}", out_path.display()))
            .arg("--")
            .arg(path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;

        if !status.success() {
            return Err(ClinkError::NotRecoverable(format!(
                "cscope exited with {status} while indexing {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(&out_path)?;
        parse_database(&contents, path)
    }
}

fn parse_database(contents: &str, filename: &Path) -> Result<Vec<Symbol>> {
    let target = filename.to_string_lossy();
    let mut lines = contents.lines();

    let header = lines.next().ok_or_else(|| ClinkError::NotRecoverable("empty cscope database".into()))?;
    if !header.starts_with("cscope 15 ") {
        return Err(ClinkError::NotRecoverable(format!(
            "unsupported cscope database header: {header}"
        )));
    }

    let mut symbols = Vec::new();
    let mut in_file = false;
    let mut lineno: u32 = 0;
    let mut parent = String::new();

    for raw in lines {
        if let Some(rest) = raw.strip_prefix('@') {
            if rest.is_empty() {
                break;
            }
            in_file = rest == target;
            parent.clear();
            continue;
        }

        if !in_file {
            continue;
        }

        let Some(rest) = raw.strip_prefix('\t') else {
            // a line-number marker: "<number> <source text>"
            if let Some((num, _)) = raw.split_once(' ') {
                if let Ok(n) = num.parse() {
                    lineno = n;
                }
            }
            continue;
        };

        let mut chars = rest.chars();
        let Some(mark) = chars.next() else { continue };
        let body: String = chars.collect();

        let (category, can_be_parent, resets_parent) = match mark {
            '$' | '#' | 'c' | 'e' | 's' | 'u' => (Some(Category::Definition), true, false),
            'g' | 'l' | 'm' | 'p' | 't' => (Some(Category::Definition), false, false),
            '`' => (Some(Category::FunctionCall), false, false),
            '~' => (Some(Category::Include), false, false),
            '=' => (Some(Category::Assignment), false, false),
            '}' | ')' | ';' => (None, false, true),
            _ => (Some(Category::Reference), false, false),
        };

        if resets_parent {
            parent.clear();
            continue;
        }

        let Some(category) = category else { continue };
        if body.is_empty() {
            continue;
        }

        symbols.push(Symbol::new(
            category,
            body.clone(),
            filename.to_path_buf(),
            lineno,
            1,
            parent.clone(),
        ));

        if can_be_parent {
            parent = body;
        }
    }

    Ok(symbols)
}
