//! Virtual-terminal highlighting strategy (spec §4.4): run Vim attached to an in-memory
//! terminal emulator and read back its screen. An alternative to [`super::html`] that avoids
//! depending on `:TOhtml`, at the cost of implementing a small slice of ANSI/CSI.

use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

use crate::error::{ClinkError, Result};
use super::Highlighter;

const ROWS: usize = 200;
const COLS: usize = 240;

#[derive(Clone, Copy, Default, PartialEq, Eq)]
struct CellStyle {
    fg: Option<u8>,
    bg: Option<u8>,
    bold: bool,
    underline: bool,
}

#[derive(Clone, Copy)]
struct Cell {
    ch: char,
    style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Cell { ch: ' ', style: CellStyle::default() }
    }
}

/// A minimal ANSI/CSI interpreter: cursor moves (A,B,C,D,E,F,G,H), erase-in-display (J), and
/// SGR (m) covering reset/bold/underline/8-colour fg/bg. Enough to render what Vim emits when
/// run with `TERM=ansi` and no alternate screen.
struct Screen {
    cells: Vec<Vec<Cell>>,
    row: usize,
    col: usize,
    style: CellStyle,
}

impl Screen {
    fn new() -> Self {
        Screen {
            cells: vec![vec![Cell::default(); COLS]; ROWS],
            row: 0,
            col: 0,
            style: CellStyle::default(),
        }
    }

    fn feed(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    let mut params = String::new();
                    let mut final_byte = None;
                    for d in chars.by_ref() {
                        if d.is_ascii_alphabetic() || d == '~' {
                            final_byte = Some(d);
                            break;
                        }
                        params.push(d);
                    }
                    if let Some(cmd) = final_byte {
                        self.apply_csi(&params, cmd);
                    }
                }
                continue;
            }
            if c == '\r' {
                self.col = 0;
                continue;
            }
            if c == '\n' {
                self.row = (self.row + 1).min(ROWS - 1);
                continue;
            }
            if self.row < ROWS && self.col < COLS {
                self.cells[self.row][self.col] = Cell { ch: c, style: self.style };
                self.col += 1;
            }
        }
    }

    fn apply_csi(&mut self, params: &str, cmd: char) {
        let nums: Vec<i64> = params
            .split(';')
            .map(|p| p.parse().unwrap_or(0))
            .collect();
        let n = |i: usize, default: i64| nums.get(i).copied().filter(|&v| v != 0).unwrap_or(default);

        match cmd {
            'A' => self.row = self.row.saturating_sub(n(0, 1) as usize),
            'B' => self.row = (self.row + n(0, 1) as usize).min(ROWS - 1),
            'C' => self.col = (self.col + n(0, 1) as usize).min(COLS - 1),
            'D' => self.col = self.col.saturating_sub(n(0, 1) as usize),
            'E' => {
                self.row = (self.row + n(0, 1) as usize).min(ROWS - 1);
                self.col = 0;
            }
            'F' => {
                self.row = self.row.saturating_sub(n(0, 1) as usize);
                self.col = 0;
            }
            'G' => self.col = (n(0, 1) as usize - 1).min(COLS - 1),
            'H' => {
                self.row = (n(0, 1) as usize - 1).min(ROWS - 1);
                self.col = (n(1, 1) as usize - 1).min(COLS - 1);
            }
            'J' => {
                let mode = nums.first().copied().unwrap_or(0);
                match mode {
                    2 | 3 => {
                        for row in self.cells.iter_mut() {
                            row.fill(Cell::default());
                        }
                    }
                    0 => {
                        for row in self.cells[self.row + 1..].iter_mut() {
                            row.fill(Cell::default());
                        }
                        self.cells[self.row][self.col..].fill(Cell::default());
                    }
                    _ => {}
                }
            }
            'm' => self.apply_sgr(&nums),
            _ => {}
        }
    }

    fn apply_sgr(&mut self, nums: &[i64]) {
        if nums.is_empty() {
            self.style = CellStyle::default();
            return;
        }
        let mut i = 0;
        while i < nums.len() {
            match nums[i] {
                0 => self.style = CellStyle::default(),
                1 => self.style.bold = true,
                4 => self.style.underline = true,
                22 => self.style.bold = false,
                24 => self.style.underline = false,
                30..=37 => self.style.fg = Some((nums[i] - 30) as u8),
                39 => self.style.fg = None,
                40..=47 => self.style.bg = Some((nums[i] - 40) as u8),
                49 => self.style.bg = None,
                _ => {}
            }
            i += 1;
        }
    }

    fn render_line(&self, row: usize) -> String {
        let mut out = String::new();
        let mut current = CellStyle::default();
        let mut emitted_reset = false;

        let mut end = COLS;
        while end > 0 && self.cells[row][end - 1].ch == ' ' {
            end -= 1;
        }

        for cell in &self.cells[row][..end] {
            if cell.style != current {
                current = cell.style;
                out.push_str(&sgr_for(&current));
                emitted_reset = true;
            }
            out.push(cell.ch);
        }
        if emitted_reset {
            out.push_str("\x1b[0m");
        }
        out
    }
}

fn sgr_for(style: &CellStyle) -> String {
    let mut parts = vec!["0".to_string()];
    if style.bold {
        parts.push("1".to_string());
    }
    if style.underline {
        parts.push("4".to_string());
    }
    if let Some(fg) = style.fg {
        parts.push((30 + fg).to_string());
    }
    if let Some(bg) = style.bg {
        parts.push((40 + bg).to_string());
    }
    format!("\x1b[{}m", parts.join(";"))
}

/// Runs Vim under a pseudo terminal-free `TERM=ansi` script mode and reads its raw escape
/// output back into an in-memory [`Screen`].
pub struct VtermHighlighter;

impl Highlighter for VtermHighlighter {
    fn highlight(&self, path: &Path) -> Result<Vec<(u32, String)>> {
        let dir = TempDir::new()?;
        let script = dir.path().join("script.vim");
        std::fs::write(&script, "redraw!\n")?;

        let mut child = Command::new("vim")
            .arg("-n")
            .arg("-Z")
            .arg("-u")
            .arg("NONE")
            .arg("-es")
            .arg("-c")
            .arg("syntax on")
            .arg("-c")
            .arg(format!("source {}", script.display()))
            .arg("-c")
            .arg("qa!")
            .arg(path)
            .env("TERM", "ansi")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        // `dir` (and `child`, via `wait_with_output` below) are released on every exit path:
        // the TempDir is removed on drop and the child is reaped by `wait_with_output`.

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ClinkError::NotRecoverable(format!(
                "vim exited with {} while highlighting {}",
                output.status,
                path.display()
            )));
        }

        let mut screen = Screen::new();
        screen.feed(&output.stdout);

        let source_lines = std::fs::read_to_string(path)?.lines().count();
        let mut lines = Vec::with_capacity(source_lines);
        for row in 0..source_lines.min(ROWS) {
            lines.push(((row + 1) as u32, screen.render_line(row)));
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sgr_reset_clears_style() {
        let mut screen = Screen::new();
        screen.feed(b"\x1b[31mred\x1b[0mplain");
        let line = screen.render_line(0);
        assert!(line.starts_with("\x1b[0;31mred\x1b[0m"));
        assert!(line.ends_with("plain"));
    }

    #[test]
    fn cursor_motion_moves_position() {
        let mut screen = Screen::new();
        screen.feed(b"abc\x1b[2Dxy");
        assert_eq!(screen.render_line(0), "axy");
    }
}
