//! Parser family (spec §4.3): each source language is handled by one `Parser` impl, selected
//! by [`factory::select`] on file extension (and, for the Cscope fallback, on whether a
//! compatible binary is present on `PATH`).

mod asm;
mod clang_parser;
mod cscope;
pub mod factory;
mod fuzzy_c;
mod generic;

use std::path::Path;

use crate::error::Result;
use crate::symbol::Symbol;

/// Given a path, emit the sequence of Symbols found in it. All emitted Symbols carry an
/// absolute `path` equal to `path` and a `parent` reflecting the enclosing definition at the
/// point of emission.
pub trait Parser {
    fn parse(&self, path: &Path) -> Result<Vec<Symbol>>;
}

pub use asm::AsmParser;
pub use clang_parser::ClangParser;
pub use cscope::CscopeParser;
pub use fuzzy_c::FuzzyCParser;
pub use generic::{GenericParser, Language};
