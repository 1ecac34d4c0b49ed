//! Parameterised keyword/identifier parser (spec §4.3.5), ported from `parse_generic.c`.
//! Shared by the TableGen, Python, Module-Definition, and bare-preprocessor languages.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::symbol::{Category, Symbol};
use super::Parser;

/// Per-language parameters the generic scanner is driven by.
pub struct Language {
    pub keywords: &'static [&'static str],
    pub defn_leaders: &'static [&'static str],
}

impl Language {
    pub const PYTHON: Language = Language {
        keywords: &[
            "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
            "continue", "def", "del", "elif", "else", "except", "finally", "for", "from",
            "global", "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass",
            "raise", "return", "try", "while", "with", "yield",
        ],
        defn_leaders: &["def", "class"],
    };

    pub const TABLEGEN: Language = Language {
        keywords: &[
            "class", "def", "defm", "defset", "dump", "field", "foreach", "if", "in", "include",
            "let", "multiclass", "then", "else",
        ],
        defn_leaders: &["class", "def", "defm", "multiclass"],
    };

    pub const MODULE_DEF: Language = Language {
        keywords: &["LIBRARY", "EXPORTS", "DATA", "HEAPSIZE", "STACKSIZE", "SECTIONS"],
        defn_leaders: &["LIBRARY"],
    };

    pub const CPP_TEXT: Language = Language {
        keywords: &["define", "include", "ifdef", "ifndef", "endif", "undef", "pragma"],
        defn_leaders: &["define"],
    };
}

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_id_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub struct GenericParser {
    pub language: Language,
}

impl GenericParser {
    pub fn new(language: Language) -> Self {
        GenericParser { language }
    }
}

impl Parser for GenericParser {
    fn parse(&self, path: &Path) -> Result<Vec<Symbol>> {
        let text = fs::read_to_string(path)?;
        let bytes = text.as_bytes();
        let mut symbols = Vec::new();

        let mut lineno: u32 = 1;
        let mut colno: u32 = 1;
        let mut last_defn_leader = false;

        let mut i = 0usize;
        while i < bytes.len() {
            let c = bytes[i] as char;

            if is_id_start(c) {
                let start = i;
                let start_col = colno;
                while i < bytes.len() && is_id_continue(bytes[i] as char) {
                    i += 1;
                    colno += 1;
                }
                let ident = &text[start..i];

                let is_keyword = self.language.keywords.contains(&ident);
                let is_defn_leader = self.language.defn_leaders.contains(&ident);

                if !is_keyword {
                    let category = if last_defn_leader && !is_defn_leader {
                        Category::Definition
                    } else {
                        Category::Reference
                    };
                    symbols.push(Symbol::new(
                        category,
                        ident,
                        path.to_path_buf(),
                        lineno,
                        start_col,
                        "",
                    ));
                }

                last_defn_leader = is_defn_leader;
                continue;
            }

            if !c.is_whitespace() {
                last_defn_leader = false;
            }

            if c == '\n' {
                lineno += 1;
                colno = 1;
            } else {
                colno += 1;
            }
            i += 1;
        }

        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn python_def_leader_marks_next_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.py");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "def helper():").unwrap();
        drop(f);

        let parser = GenericParser::new(Language::PYTHON);
        let symbols = parser.parse(&path).unwrap();
        let helper = symbols.iter().find(|s| s.name == "helper").unwrap();
        assert_eq!(helper.category, Category::Definition);
    }

    #[test]
    fn keywords_are_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.py");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "if x:\n    return x").unwrap();
        drop(f);

        let parser = GenericParser::new(Language::PYTHON);
        let symbols = parser.parse(&path).unwrap();
        assert!(symbols.iter().all(|s| s.name != "if" && s.name != "return"));
    }
}
