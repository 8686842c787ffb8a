//! Third pass: turns indexed instructions into 16-bit machine words.
//!
//! Words are built by shifting fields into place; text only appears
//! at the listing boundary.
use std::collections::BTreeMap;
use std::fmt;
use super::ast::*;
use super::diagnostics::Context;
use super::error::{Abort, Error};
use super::indexer::{Index, SymbolTable};
use super::parser::parse;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct EncodedWord {
    pub address: u16,
    pub origin_line: usize,
    pub bits: u16,
}

impl fmt::Display for EncodedWord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016b}", self.bits)
    }
}

/// Two's complement field: `-(2^(n-1))..=2^(n-1)-1`.
pub fn signed_field(value: i64, width: u32) -> Result<u16, Error> {
    let min = -(1i64 << (width - 1));
    let max = (1i64 << (width - 1)) - 1;
    if value < min || value > max {
        return Err(Error::FieldRange { value, width });
    }
    if value < 0 {
        Ok(((1i64 << width) + value) as u16)
    } else {
        Ok(value as u16)
    }
}

/// Plain binary field: `0..=2^n-1`.
pub fn unsigned_field(value: i64, width: u32) -> Result<u16, Error> {
    if value < 0 || value >= (1i64 << width) {
        return Err(Error::FieldRange { value, width });
    }
    Ok(value as u16)
}

/// Byte immediates may be written signed or unsigned.
pub fn byte_field(value: i64) -> Result<u16, Error> {
    if value < -128 || value > 255 {
        return Err(Error::FieldRange { value, width: 8 });
    }
    Ok((value & 0xFF) as u16)
}

/// Renders `value` as an `n`-character two's complement bit string.
#[cfg(test)]
pub fn to_bits(value: i64, width: u32) -> Result<String, Error> {
    Ok(format!("{:0w$b}", signed_field(value, width)?, w = width as usize))
}

/// Encodes every indexed instruction.
///
/// Malformed lines and unresolved symbols are reported and produce no
/// word. A branch that cannot reach its target, or an unimplemented
/// instruction, aborts the run.
///
/// Words come out in address order. When two instructions share an
/// address the later one in the source wins.
pub fn encode(index: &Index, ctx: &mut Context) -> Result<Vec<EncodedWord>, Abort> {
    let mut words = BTreeMap::new();

    for ins in &index.code {
        let nline = ins.origin_line;
        let result = parse(&ins.text)
            .and_then(|parsed| encode_instruction(&parsed, ins.address, &index.symbols));

        match result {
            Ok(bits) => {
                ctx.debug(format!("0x{:04X}: {} => {:016b}", ins.address, ins.text, bits));
                words.insert(ins.address, EncodedWord { address: ins.address, origin_line: nline, bits });
            }
            Err(e @ Error::Displacement { .. }) | Err(e @ Error::Unimplemented(_)) => {
                return Err(ctx.fatal(nline, e));
            }
            Err(e) => ctx.error(nline, e)?,
        }
    }

    Ok(words.into_iter().map(|(_, word)| word).collect())
}

/// Encodes one instruction placed at `address`.
pub fn encode_instruction(ins: &Instruction, address: u16, symbols: &SymbolTable) -> Result<u16, Error> {
    use Instruction::*;
    let operands = match ins {
        R { func, ra, rb } => ra.to_u16() << 8 | rb.to_u16() << 4 | func.func(),
        S { func, ra, shamt } => ra.to_u16() << 8 | unsigned_field(*shamt, 4)? << 4 | func.func(),
        L { ra, byte, .. } => ra.to_u16() << 8 | byte_field(resolve_byte(byte, symbols)?)?,
        J { op, target, predicate } => {
            let width = op.target_width();
            let field = match target {
                Target::Literal(value) => unsigned_field(*value, width)?,
                Target::Label(name) => {
                    let offset = symbols.resolve(name)?.saturating_sub(i64::from(address));
                    signed_field(offset, width).map_err(|_| Error::Displacement {
                        address,
                        mnemonic: op.to_string(),
                        offset,
                    })?
                }
            };
            let predicate = match (op, predicate) {
                (JOp::BZ, Some(p)) => p.bits() << 10,
                (JOp::BZ, None) => return Err(Error::Malformed(ins.to_string())),
                _ => 0,
            };
            predicate | field
        }
        W { ra, rb, offset, .. } => ra.to_u16() << 8 | rb.to_u16() << 4 | signed_field(*offset, 4)?,
        M1 { func, data } => func.func() << 8 | byte_field(*data)?,
        M3 { func, reg } => func.func() << 8 | reg.to_u16(),
        Stk { func, reg } => reg.to_u16() << 8 | func.func(),
        Hab => 0,
    };
    Ok(ins.opcode() << 12 | operands)
}

fn resolve_byte(byte: &ByteOperand, symbols: &SymbolTable) -> Result<i64, Error> {
    match byte {
        ByteOperand::Literal(value) => Ok(*value),
        ByteOperand::Symbol(name, select) => {
            let value = symbols.resolve(name)?;
            Ok(match select {
                Select::Whole => value,
                Select::Upper => value.div_euclid(256),
                Select::Lower => value.rem_euclid(256),
            })
        }
    }
}
