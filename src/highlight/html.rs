//! HTML-capture highlighting strategy (spec §4.4), ported from `vim_highlight.c`: puppet Vim
//! into `:TOhtml`, then parse the generated CSS + `<pre>` body with regexes and string search.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tempfile::TempDir;

use crate::error::{ClinkError, Result};
use super::colour::html_colour_to_ansi;
use super::Highlighter;

static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\.([A-Za-z][A-Za-z0-9]+)\s*\{\s*(?:color:\s*#([0-9A-Fa-f]{6});\s*)?(?:background-color:\s*#([0-9A-Fa-f]{6});\s*(?:padding-bottom:\s*1px;\s*)?)?(font-weight:\s*bold;\s*)?(font-style:\s*italic;\s*)?(text-decoration:\s*underline;\s*)?"#,
    )
    .unwrap()
});

#[derive(Clone)]
struct Style {
    fg: u8,
    bg: u8,
    bold: bool,
    underline: bool,
}

const NO_COLOUR: u8 = 9;

/// Drives `vim -n +set nonumber +TOhtml +w <tmp> +qa!` over a source file, scrapes the
/// resulting CSS classes and `<pre>` body, and re-renders it as ANSI-escaped text.
pub struct HtmlHighlighter;

impl Highlighter for HtmlHighlighter {
    fn highlight(&self, path: &Path) -> Result<Vec<(u32, String)>> {
        let dir = TempDir::new()?;
        let output = dir.path().join("temp.html");

        convert_to_html(path, &output)?;
        let html = fs::read_to_string(&output)?;
        // `dir` is dropped (and its contents removed) when this function returns, on every
        // path including the `?` early returns above.

        let (styles, body) = split_document(&html)?;
        let mut lines = Vec::new();
        for (idx, line) in body.lines().enumerate() {
            if line == "</pre>" {
                break;
            }
            lines.push(((idx + 1) as u32, from_html(&styles, line)));
        }
        Ok(lines)
    }
}

fn convert_to_html(input: &Path, output: &Path) -> Result<()> {
    let save_command = format!("+w {}", output.display());
    let status = Command::new("vim")
        .arg("-n")
        .arg("+set nonumber")
        .arg("+TOhtml")
        .arg(&save_command)
        .arg("+qa!")
        .arg(input)
        .status()?;
    if !status.success() {
        return Err(ClinkError::NotRecoverable(format!(
            "vim exited with {status} while highlighting {}",
            input.display()
        )));
    }
    Ok(())
}

fn split_document(html: &str) -> Result<(HashMap<String, Style>, &str)> {
    let mut styles = HashMap::new();
    let mut body_start = None;

    for (offset, line) in line_offsets(html) {
        if line.starts_with('.') {
            if let Some(caps) = STYLE_RE.captures(line) {
                let name = caps.get(1).unwrap().as_str().to_string();
                let style = Style {
                    fg: caps
                        .get(2)
                        .and_then(|m| html_colour_to_ansi(m.as_str()))
                        .unwrap_or(NO_COLOUR),
                    bg: caps
                        .get(3)
                        .and_then(|m| html_colour_to_ansi(m.as_str()))
                        .unwrap_or(NO_COLOUR),
                    bold: caps.get(4).is_some(),
                    underline: caps.get(6).is_some(),
                };
                styles.insert(name, style);
            }
            continue;
        }

        if line == "<pre id='vimCodeElement'>" {
            body_start = Some(offset + line.len() + 1);
            break;
        }
    }

    let start = body_start.ok_or_else(|| {
        ClinkError::NotRecoverable("vim TOhtml output missing <pre id='vimCodeElement'>".into())
    })?;
    Ok((styles, &html[start..]))
}

fn line_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.lines().map(move |line| {
        let this = offset;
        offset += line.len() + 1;
        (this, line)
    })
}

const HTML_DECODE: &[(&str, char)] = &[
    ("amp;", '&'),
    ("gt;", '>'),
    ("lt;", '<'),
    ("nbsp;", ' '),
    ("quot;", '"'),
];

const SPAN_OPEN: &str = "<span class=\"";
const SPAN_CLOSE: &str = "</span>";

fn from_html(styles: &HashMap<String, Style>, line: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '&' {
            let rest: String = chars[i + 1..].iter().collect();
            if let Some((key, value)) = HTML_DECODE.iter().find(|(k, _)| rest.starts_with(k)) {
                out.push(*value);
                i += 1 + key.len();
                continue;
            }
        } else if chars[i] == '<' {
            let rest: String = chars[i..].iter().collect();
            if let Some(name_start) = rest.strip_prefix(SPAN_OPEN) {
                if let Some(end) = name_start.find("\">") {
                    let name = &name_start[..end];
                    if let Some(style) = styles.get(name) {
                        out.push_str(&format!(
                            "\x1b[3{};4{}{}{}m",
                            style.fg,
                            style.bg,
                            if style.bold { ";1" } else { "" },
                            if style.underline { ";4" } else { "" },
                        ));
                        i += SPAN_OPEN.len() + end + 2;
                        continue;
                    }
                }
            } else if rest.starts_with(SPAN_CLOSE) {
                out.push_str("\x1b[0m");
                i += SPAN_CLOSE.len();
                continue;
            }
        }

        out.push(chars[i]);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_entities_and_spans() {
        let mut styles = HashMap::new();
        styles.insert(
            "Style1".to_string(),
            Style { fg: 2, bg: 9, bold: false, underline: false },
        );
        let rendered = from_html(&styles, "Hello <span class=\"Style1\">world</span>!");
        assert_eq!(rendered, "Hello \x1b[32;49mworld\x1b[0m!");
    }

    #[test]
    fn decodes_html_entities() {
        let styles = HashMap::new();
        assert_eq!(from_html(&styles, "a &amp; b &lt;c&gt;"), "a & b <c>");
    }

    #[test]
    fn parses_style_block() {
        let html = ".Style1 { color: #ff6060; font-weight: bold; }\n<pre id='vimCodeElement'>\nx\n</pre>\n";
        let (styles, body) = split_document(html).unwrap();
        let style = styles.get("Style1").unwrap();
        assert_eq!(style.fg, 1);
        assert!(style.bold);
        assert_eq!(body.lines().next(), Some("x"));
    }
}
