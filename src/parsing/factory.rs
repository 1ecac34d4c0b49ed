//! Selects a [`Parser`] for a given file extension (spec §4.3).

use std::path::Path;

use super::{AsmParser, ClangParser, CscopeParser, GenericParser, Language, Parser};
use crate::config::Config;

const ASM_EXTENSIONS: &[&str] = &["s", "S", "asm"];
const C_EXTENSIONS: &[&str] = &["c", "h", "cc", "cpp", "cxx", "hpp", "hh", "C"];
const PYTHON_EXTENSIONS: &[&str] = &["py"];
const TABLEGEN_EXTENSIONS: &[&str] = &["td"];
const MODULE_DEF_EXTENSIONS: &[&str] = &["def"];

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Pick the parser that handles `path`, or `None` if no parser recognises its extension.
///
/// The C/C++ parser is libclang-backed and is only offered when libclang could be located
/// (`ClangParser::is_available`, re-exported here). When a `cscope` binary is on `PATH` it
/// takes priority over the fuzzy C parser, matching the preference order spec §4.3.4
/// describes for the "optional fallback".
pub fn select(path: &Path, config: &Config) -> Option<Box<dyn Parser>> {
    let ext = extension_of(path)?;

    if ASM_EXTENSIONS.contains(&ext) {
        return Some(Box::new(AsmParser));
    }

    if C_EXTENSIONS.contains(&ext) {
        if super::clang_parser::is_available() {
            return Some(Box::new(ClangParser::new(config.include_dirs.clone())));
        }
        if super::cscope::is_available() {
            return Some(Box::new(CscopeParser));
        }
        return Some(Box::new(super::FuzzyCParser));
    }

    if PYTHON_EXTENSIONS.contains(&ext) {
        return Some(Box::new(GenericParser::new(Language::PYTHON)));
    }

    if TABLEGEN_EXTENSIONS.contains(&ext) {
        return Some(Box::new(GenericParser::new(Language::TABLEGEN)));
    }

    if MODULE_DEF_EXTENSIONS.contains(&ext) {
        return Some(Box::new(GenericParser::new(Language::MODULE_DEF)));
    }

    None
}

/// True if `path` has an extension any parser recognises.
pub fn is_recognised(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| {
        ASM_EXTENSIONS.contains(&ext)
            || C_EXTENSIONS.contains(&ext)
            || PYTHON_EXTENSIONS.contains(&ext)
            || TABLEGEN_EXTENSIONS.contains(&ext)
            || MODULE_DEF_EXTENSIONS.contains(&ext)
    })
}
