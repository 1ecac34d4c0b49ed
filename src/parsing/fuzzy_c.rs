//! Character-level C/C++ parser used when libclang is not wanted (spec §4.3.3). A heuristic
//! brace/paren-depth scanner, not a real preprocessor or grammar.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::symbol::{Category, Symbol};
use super::Parser;

const KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex", "_Imaginary", "class",
    "namespace", "template", "typename", "public", "private", "protected", "virtual", "friend",
    "new", "delete", "this", "operator", "using", "try", "catch", "throw", "explicit",
];

const LEADERS: &[&str] = &["enum", "struct", "union", "class"];

const TYPE_WORDS: &[&str] = &[
    "int", "char", "long", "short", "unsigned", "signed", "float", "double", "void", "const",
    "static", "extern", "struct", "union", "enum", "auto", "volatile", "register", "inline",
    "_Bool", "size_t", "bool",
];

fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_id_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A character-level scanner that tracks just enough structure (brace depth, the previous
/// identifier token) to guess whether an identifier is a Definition, a FunctionCall, or a
/// Reference.
pub struct FuzzyCParser;

impl Parser for FuzzyCParser {
    fn parse(&self, path: &Path) -> Result<Vec<Symbol>> {
        let text = fs::read_to_string(path)?;
        let bytes = text.as_bytes();
        let mut symbols = Vec::new();

        let mut lineno: u32 = 1;
        let mut colno: u32 = 1;
        let mut brace_depth: i32 = 0;

        let mut prev_token = String::new();
        let mut pending_parent: Option<String> = None;
        let mut current_parent = String::new();

        let mut i = 0usize;
        while i < bytes.len() {
            let c = bytes[i] as char;

            // line comment
            if c == '/' && i + 1 < bytes.len() && bytes[i + 1] as char == '/' {
                while i < bytes.len() && bytes[i] as char != '\n' {
                    i += 1;
                }
                continue;
            }

            // block comment
            if c == '/' && i + 1 < bytes.len() && bytes[i + 1] as char == '*' {
                i += 2;
                colno += 2;
                while i + 1 < bytes.len() && !(bytes[i] as char == '*' && bytes[i + 1] as char == '/') {
                    if bytes[i] as char == '\n' {
                        lineno += 1;
                        colno = 1;
                    } else {
                        colno += 1;
                    }
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                colno += 2;
                continue;
            }

            // string and char literals
            if c == '"' || c == '\'' {
                let quote = c;
                i += 1;
                colno += 1;
                while i < bytes.len() {
                    let d = bytes[i] as char;
                    if d == '\\' && i + 1 < bytes.len() {
                        i += 2;
                        colno += 2;
                        continue;
                    }
                    if d == quote {
                        i += 1;
                        colno += 1;
                        break;
                    }
                    if d == '\n' {
                        lineno += 1;
                        colno = 1;
                    } else {
                        colno += 1;
                    }
                    i += 1;
                }
                continue;
            }

            if is_id_start(c) {
                let start = i;
                let start_col = colno;
                while i < bytes.len() && is_id_continue(bytes[i] as char) {
                    i += 1;
                    colno += 1;
                }
                let ident = &text[start..i];

                // skip whitespace to see the next significant character
                let mut j = i;
                while j < bytes.len() && (bytes[j] as char).is_whitespace() {
                    j += 1;
                }
                let next_char = bytes.get(j).map(|b| *b as char);

                if KEYWORDS.contains(&ident) {
                    prev_token = ident.to_string();
                    continue;
                }

                let category = if LEADERS.contains(&prev_token.as_str()) && next_char == Some('{') {
                    Category::Definition
                } else if TYPE_WORDS.contains(&prev_token.as_str()) {
                    if brace_depth == 0 && next_char == Some('(') {
                        pending_parent = Some(ident.to_string());
                    }
                    Category::Definition
                } else if brace_depth > 0 && next_char == Some('(') {
                    Category::FunctionCall
                } else {
                    Category::Reference
                };

                symbols.push(Symbol::new(
                    category,
                    ident,
                    path.to_path_buf(),
                    lineno,
                    start_col,
                    current_parent.clone(),
                ));

                prev_token = ident.to_string();
                continue;
            }

            if c == '{' {
                brace_depth += 1;
                if brace_depth == 1 {
                    if let Some(name) = pending_parent.take() {
                        current_parent = name;
                    }
                }
            } else if c == '}' {
                brace_depth -= 1;
                if brace_depth <= 0 {
                    brace_depth = 0;
                    current_parent.clear();
                }
            }

            if c == '\n' {
                lineno += 1;
                colno = 1;
            } else {
                colno += 1;
            }
            if !c.is_whitespace() {
                // a non-identifier, non-brace token breaks a pending leader/type chain
                if c != '(' && c != ')' && c != '*' && c != '&' {
                    prev_token.clear();
                }
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
    fn simple_variable_definition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "int x = 0;").unwrap();
        drop(f);

        let symbols = FuzzyCParser.parse(&path).unwrap();
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["x"]);
        assert_eq!(symbols[0].category, Category::Definition);
    }

    #[test]
    fn function_call_inside_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.c");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "void main(void) {{\n  helper();\n}}").unwrap();
        drop(f);

        let symbols = FuzzyCParser.parse(&path).unwrap();
        let call = symbols.iter().find(|s| s.name == "helper").unwrap();
        assert_eq!(call.category, Category::FunctionCall);
        assert_eq!(call.parent, "main");
    }

    #[test]
    fn strings_and_comments_are_drained() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.c");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "// foo(bar)").unwrap();
        writeln!(f, "const char *s = \"x(y)\";").unwrap();
        drop(f);

        let symbols = FuzzyCParser.parse(&path).unwrap();
        assert!(symbols.iter().all(|s| s.name != "foo" && s.name != "bar" && s.name != "x" && s.name != "y"));
    }
}
