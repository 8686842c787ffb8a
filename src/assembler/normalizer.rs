//! First pass: case folding, comment stripping and pseudo-instruction
//! expansion.
//!
//! Comments start with `--` and run to the end of the line.
//! Pseudo-instructions expand into real instructions as follows:
//!
//! ```nasm
//! NOP            -- ADD $0, $0
//! LIW $1, 300    -- LIU $1, 1 / LIL $1, 44 / ADD $0, $0
//! MOVE $1, $2    -- AND $1, $0 / OR $1, $2
//! LHI 0x1234     -- LHH 18 / LHL 52
//! LLO 0x1234     -- LLH 18 / LLL 52
//! ```
use std::fmt;
use once_cell::sync::Lazy;
use regex::Regex;
use super::diagnostics::Context;
use super::error::{Abort, Error};
use super::lexer::{is_identifier, tokenize_const};

/// The canonical no-op: add the zero register to itself.
pub const NOP_EXPANSION: &str = "ADD $0, $0";

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"--.*$").unwrap());
static LIW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^LIW\s+\$(\d{1,2})\s*,\s*(0X[0-9A-F]+|0B[01]+|[+-]?\d+)\s*$").unwrap()
});
static MOVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^MOVE\s+\$(\d{1,2})\s*,\s*\$(\d{1,2})\s*$").unwrap());
static LOAD_HILO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(LHI|LLO)\s+(0X[0-9A-F]+|\d+)\s*$").unwrap());

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceLine {
    pub line_number: usize,
    pub text: String,
}

impl SourceLine {
    /// Splits raw source text into numbered lines, starting at 1.
    pub fn read(source: &str) -> Vec<SourceLine> {
        source
            .lines()
            .enumerate()
            .map(|(idx, text)| SourceLine { line_number: idx + 1, text: text.to_owned() })
            .collect()
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NormalizedLine {
    pub origin_line: usize,
    pub label: Option<String>,
    pub text: String,
}

impl NormalizedLine {
    pub fn new<S: Into<String>>(origin_line: usize, label: Option<String>, text: S) -> Self {
        NormalizedLine { origin_line, label, text: text.into() }
    }
}

impl fmt::Display for NormalizedLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.label {
            Some(label) if self.text.is_empty() => write!(f, "{}:", label),
            Some(label) => write!(f, "{}: {}", label, self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

/// Normalizes every source line. Only `MADD` aborts; every other
/// problem is reported and the offending line dropped.
pub fn normalize(lines: &[SourceLine], ctx: &mut Context) -> Result<Vec<NormalizedLine>, Abort> {
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let nline = line.line_number;
        let upper = line.text.to_uppercase();
        let stripped = COMMENT.replace(upper.trim(), "");
        let text = stripped.trim();
        if text.is_empty() {
            continue;
        }

        let (label, body) = split_label(text);
        let mnemonic = body.split_whitespace().next().unwrap_or("");

        match mnemonic {
            "NOP" => {
                if body == "NOP" {
                    out.push(NormalizedLine::new(nline, label, NOP_EXPANSION));
                } else {
                    ctx.error(nline, Error::MalformedPseudo(body.to_owned()))?;
                }
            }

            "LIW" | "MOVE" | "LHI" | "LLO" => {
                // The label must land on the first expanded instruction,
                // so it gets a line of its own.
                if let Some(label) = label {
                    ctx.debug(format!("Line {}: label followed by {}", nline, mnemonic));
                    out.push(NormalizedLine::new(nline, Some(label), ""));
                }
                match expand(mnemonic, body) {
                    Ok(expansion) => out.extend(
                        expansion.into_iter().map(|text| NormalizedLine::new(nline, None, text)),
                    ),
                    Err(e) => ctx.error(nline, e)?,
                }
            }

            "MADD" => return Err(ctx.fatal(nline, Error::Unimplemented("MADD".to_owned()))),

            _ => out.push(NormalizedLine::new(nline, label, body)),
        }
    }

    Ok(out)
}

/// Splits `LABEL: rest` into its parts. Text whose prefix is not an
/// identifier is returned untouched.
pub fn split_label(text: &str) -> (Option<String>, &str) {
    if let Some(idx) = text.find(':') {
        let label = text[..idx].trim();
        if is_identifier(label) {
            return (Some(label.to_owned()), text[idx + 1..].trim());
        }
    }
    (None, text)
}

fn expand(mnemonic: &str, body: &str) -> Result<Vec<String>, Error> {
    let malformed = || Error::MalformedPseudo(body.to_owned());

    match mnemonic {
        "LIW" => {
            let caps = LIW.captures(body).ok_or_else(malformed)?;
            let value = tokenize_const(&caps[2]).ok_or_else(malformed)?;
            if value < -32768 || value > 0xFFFF {
                return Err(Error::FieldRange { value, width: 16 });
            }
            let word = value & 0xFFFF;
            Ok(vec![
                format!("LIU ${}, {}", &caps[1], word / 256),
                format!("LIL ${}, {}", &caps[1], word % 256),
                // Pipeline hazard padding after the load.
                NOP_EXPANSION.to_owned(),
            ])
        }

        "MOVE" => {
            let caps = MOVE.captures(body).ok_or_else(malformed)?;
            Ok(vec![
                format!("AND ${}, $0", &caps[1]),
                format!("OR ${}, ${}", &caps[1], &caps[2]),
            ])
        }

        _ => {
            let caps = LOAD_HILO.captures(body).ok_or_else(malformed)?;
            let value = tokenize_const(&caps[2]).ok_or_else(malformed)?;
            if value > 0xFFFF {
                return Err(Error::FieldRange { value, width: 16 });
            }
            let (high, low) = if &caps[1] == "LHI" { ("LHH", "LHL") } else { ("LLH", "LLL") };
            Ok(vec![
                format!("{} {}", high, value / 256),
                format!("{} {}", low, value % 256),
            ])
        }
    }
}
