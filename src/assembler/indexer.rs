//! Second pass: directives, label binding and address assignment.
//!
//! ```nasm
//! .ADDRESS 0x100         -- next instruction lands on 256
//! .CONSTANT LIMIT = 0x40 -- LIMIT is a plain integer, not an address
//! LOOP: SUB $1, $2       -- LOOP is bound to the current address
//! ```
use std::collections::{BTreeMap, HashSet};
use once_cell::sync::Lazy;
use regex::Regex;
use super::diagnostics::Context;
use super::error::{Abort, Error};
use super::lexer::tokenize_const;
use super::normalizer::NormalizedLine;

/// Highest word address of the flat address space.
pub const MAX_ADDRESS: u32 = 0xFFFF;

static ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\.ADDRESS\s+(0X[0-9A-F]+|\d+)\s*$").unwrap());
static CONSTANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\.CONSTANT\s+(\w+)\s*=\s*(0B[01]+|0X[0-9A-F]+|[+-]?\d+)\s*$").unwrap()
});

/// Label and constant values, keyed by upper-case name.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<String, i64>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Binds `name`. A name already bound keeps its first value.
    pub fn define(&mut self, name: &str, value: i64) -> Result<(), Error> {
        if self.symbols.contains_key(name) {
            return Err(Error::Redefinition(name.to_owned()));
        }
        self.symbols.insert(name.to_owned(), value);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<i64, Error> {
        self.get(name).ok_or_else(|| Error::UndefinedSymbol(name.to_owned()))
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.symbols.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.symbols.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IndexedInstruction {
    pub address: u16,
    pub origin_line: usize,
    pub text: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Index {
    pub symbols: SymbolTable,
    pub code: Vec<IndexedInstruction>,
}

/// Assigns an address to every instruction and builds the symbol table.
pub fn index(lines: &[NormalizedLine], ctx: &mut Context) -> Result<Index, Abort> {
    let mut indexer = Indexer {
        counter: 0,
        occupied: HashSet::new(),
        out: Index::default(),
    };

    for line in lines {
        indexer.line(line, ctx)?;
    }

    ctx.debug(format!(
        "indexed {} instruction(s), {} symbol(s)",
        indexer.out.code.len(),
        indexer.out.symbols.len()
    ));
    Ok(indexer.out)
}

struct Indexer {
    counter: u32,
    occupied: HashSet<u16>,
    out: Index,
}

impl Indexer {
    fn line(&mut self, line: &NormalizedLine, ctx: &mut Context) -> Result<(), Abort> {
        let nline = line.origin_line;

        if let Some(label) = &line.label {
            match self.out.symbols.define(label, i64::from(self.counter)) {
                Ok(()) => ctx.debug(format!("Line {}: label {} = {}", nline, label, self.counter)),
                Err(e) => ctx.error(nline, e)?,
            }
        }

        let text = line.text.as_str();
        if text.is_empty() {
            return Ok(());
        }
        if text.starts_with('.') {
            return self.directive(nline, text, ctx);
        }

        if self.counter > MAX_ADDRESS {
            return ctx.error(nline, Error::FieldRange { value: i64::from(self.counter), width: 16 });
        }

        let address = self.counter as u16;
        if !self.occupied.insert(address) {
            ctx.warning(Some(nline), format!("address {} is already occupied, the later instruction wins", address));
        }
        self.out.code.push(IndexedInstruction {
            address,
            origin_line: nline,
            text: text.to_owned(),
        });
        self.counter += 1;
        Ok(())
    }

    fn directive(&mut self, nline: usize, text: &str, ctx: &mut Context) -> Result<(), Abort> {
        let invalid = || Error::InvalidDirective(text.to_owned());

        if let Some(caps) = ADDRESS.captures(text) {
            return match tokenize_const(&caps[1]) {
                Some(value) if value <= i64::from(MAX_ADDRESS) => {
                    self.counter = value as u32;
                    Ok(())
                }
                Some(value) => ctx.error(nline, Error::FieldRange { value, width: 16 }),
                None => ctx.error(nline, invalid()),
            };
        }

        if let Some(caps) = CONSTANT.captures(text) {
            let value = match tokenize_const(&caps[2]) {
                Some(value) => value,
                None => return ctx.error(nline, invalid()),
            };
            return match self.out.symbols.define(&caps[1], value) {
                Ok(()) => Ok(()),
                Err(e) => ctx.error(nline, e),
            };
        }

        ctx.error(nline, invalid())
    }
}
