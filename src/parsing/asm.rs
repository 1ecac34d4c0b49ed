//! Fuzzy, regex-based assembly parser (spec §4.3.1), ported from `parse_asm.c`'s four
//! line-oriented regex families.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;
use std::sync::LazyLock;

use crate::error::Result;
use crate::symbol::{Category, Symbol};
use super::Parser;

static DEFINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*#[ \t]*define[ \t]+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[ \t]*#[ \t]*include[ \t]*(<[^>]*>|"[^"]*")"#).unwrap()
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*([A-Za-z._][A-Za-z0-9._$@]*)[ \t]*:").unwrap()
});

// Branch/call mnemonics across ARM, AVR, MIPS, PowerPC, RISC-V and x86. A flat
// cross-architecture union, over-matching accepted as the documented trade-off (spec §9).
const MNEMONICS: &str = concat!(
    "b|beq|bne|bcs|bhs|bcc|blo|bmi|bpl|bvs|bvc|bhi|bls|bge|blt|bgt|ble|bal|bl",
    "|bleq|blne|blcs|blhs|blcc|bllo|blmi|blpl|blvs|blvc|blhi|blls|blge|bllt",
    "|blgt|blle|blal|blx|blxeq|blxne|blxcs|blxhs|blxcc|blxlo|blxmi|blxpl|blxvs",
    "|blxvc|blxhi|blxls|blxge|blxlt|blxgt|blxle|blxal",
    "|brcc|brcs|breq|brge|brhc|brhs|brid|brie|brlo|brlt|brmi|brme|brpl|brsh",
    "|brtc|brts|brvc|brvs|jmp",
    "|j|jal",
    "|ba|bla|bdnz",
    "|call|callq|ja|jae|jb|jbe|jc|jcxz|je|jecxz|jg|jge|jl|jle|jna|jnae|jnb",
    "|jnbe|jnc|jne|jng|jnge|jnl|jnle|jno|jnp|jns|jnz|jo|jp|jpe|jpo|js|jz",
);

static CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^[ \t]*(?:{MNEMONICS})[ \t]+([A-Za-z._][A-Za-z0-9._$@]*)"
    ))
    .unwrap()
});

/// Line-oriented heuristic parser for assembly sources.
pub struct AsmParser;

impl Parser for AsmParser {
    fn parse(&self, path: &Path) -> Result<Vec<Symbol>> {
        let f = File::open(path)?;
        let reader = BufReader::new(f);

        let mut symbols = Vec::new();
        let mut parent = String::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = (idx + 1) as u32;

            if let Some(caps) = DEFINE.captures(&line) {
                let m = caps.get(1).unwrap();
                symbols.push(Symbol::new(
                    Category::Definition,
                    m.as_str(),
                    path.to_path_buf(),
                    lineno,
                    m.start() as u32 + 1,
                    parent.clone(),
                ));
                continue;
            }

            if let Some(caps) = INCLUDE.captures(&line) {
                let m = caps.get(1).unwrap();
                let name = &m.as_str()[1..m.as_str().len() - 1];
                symbols.push(Symbol::new(
                    Category::Include,
                    name,
                    path.to_path_buf(),
                    lineno,
                    m.start() as u32 + 2,
                    parent.clone(),
                ));
                continue;
            }

            if let Some(caps) = FUNCTION.captures(&line) {
                let m = caps.get(1).unwrap();
                symbols.push(Symbol::new(
                    Category::Definition,
                    m.as_str(),
                    path.to_path_buf(),
                    lineno,
                    m.start() as u32 + 1,
                    parent.clone(),
                ));
                parent = m.as_str().to_string();
                continue;
            }

            if let Some(caps) = CALL.captures(&line) {
                let m = caps.get(1).unwrap();
                symbols.push(Symbol::new(
                    Category::FunctionCall,
                    m.as_str(),
                    path.to_path_buf(),
                    lineno,
                    m.start() as u32 + 1,
                    parent.clone(),
                ));
            }
        }

        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn definition_and_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.s");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "foo:").unwrap();
        writeln!(f, "  call bar").unwrap();
        drop(f);

        let symbols = AsmParser.parse(&path).unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].category, Category::Definition);
        assert_eq!(symbols[0].name, "foo");
        assert_eq!(symbols[1].category, Category::FunctionCall);
        assert_eq!(symbols[1].name, "bar");
        assert_eq!(symbols[1].parent, "foo");
    }

    #[test]
    fn define_and_include() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.s");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "#define FOO 1").unwrap();
        writeln!(f, "#include <bar.inc>").unwrap();
        drop(f);

        let symbols = AsmParser.parse(&path).unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].category, Category::Definition);
        assert_eq!(symbols[0].name, "FOO");
        assert_eq!(symbols[1].category, Category::Include);
        assert_eq!(symbols[1].name, "bar.inc");
    }
}
