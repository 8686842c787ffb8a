//! Turns machine words back into canonical assembly text.
//!
//! Jump and branch targets come back as literal fields, so the decoded
//! text reassembles to the same word at any address.
use std::convert::TryFrom;
use super::ast::*;

pub fn decode(word: u16) -> Option<Instruction> {
    use Instruction::*;

    let opcode = word >> 12;
    let a = (word >> 8) & 0xF;
    let b = (word >> 4) & 0xF;
    let c = word & 0xF;
    let reg = |v: u16| Register::try_from(v).ok();

    match opcode {
        OPCODE_R => Some(R { func: RFunc::from_func(c)?, ra: reg(a)?, rb: reg(b)? }),
        OPCODE_S => Some(S { func: SFunc::from_func(c)?, ra: reg(a)?, shamt: i64::from(b) }),
        OPCODE_STK if b == 0 => Some(Stk { func: StkFunc::from_func(c)?, reg: reg(a)? }),
        OPCODE_M => match M3Func::from_func(a) {
            Some(func) if b == 0 => Some(M3 { func, reg: reg(c)? }),
            Some(_) => None,
            None => Some(M1 { func: M1Func::from_func(a)?, data: i64::from(word & 0xFF) }),
        },
        _ if word == HAB_WORD => Some(Hab),
        _ => {
            if let Some(op) = LOp::from_opcode(opcode) {
                return Some(L { op, ra: reg(a)?, byte: ByteOperand::Literal(i64::from(word & 0xFF)) });
            }
            if let Some(op) = WOp::from_opcode(opcode) {
                return match op {
                    WOp::JR if b == 0 && c == 0 => Some(W { op, ra: reg(a)?, rb: Register::R0, offset: 0 }),
                    WOp::JR => None,
                    _ => Some(W { op, ra: reg(a)?, rb: reg(b)?, offset: sign_extend(c, 4) }),
                };
            }
            if let Some(op) = JOp::from_opcode(opcode) {
                return match op {
                    JOp::BZ => Some(J {
                        op,
                        target: Target::Literal(i64::from(word & 0x3FF)),
                        predicate: Some(Predicate::from_bits((word >> 10) & 0b11)?),
                    }),
                    _ => Some(J { op, target: Target::Literal(i64::from(word & 0xFFF)), predicate: None }),
                };
            }
            None
        }
    }
}

fn sign_extend(value: u16, width: u32) -> i64 {
    let value = i64::from(value);
    if value >= 1 << (width - 1) {
        value - (1 << width)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use crate::assembler::diagnostics::Context;

    fn words(source: &str) -> Vec<u16> {
        let mut ctx = Context::default();
        let assembly = assemble(source, &mut ctx).unwrap();
        assert!(ctx.status().is_success(), "{:?}", ctx.diagnostics());
        assembly.words.iter().map(|w| w.bits).collect()
    }

    #[test]
    fn test_reassembly_is_idempotent() {
        let program = "
            .CONSTANT DATA = 0x1234
            START: LIW $1, 300
            MOVE $2, $1
            LIU $3, %DATA%U
            LIL $3, %DATA%L
            SHL $1, 3
            ROR $2, $15
            NOR $4, $5
            LW $6, -8($7)
            SW $6, 7($7)
            LHI 0xBEEF
            LLO 42
            AIS -3
            MFLO $8
            MTHI $9
            PUSH $10
            SPWR $11
            LOOP: BZ %END%,T
            BZ %LOOP%,N
            BHLEQ %START%
            JAL %LOOP%
            J 4095
            JR $12
            END: HAB
        ";
        let first = words(program);
        let decoded: Vec<String> = first.iter().map(|w| decode(*w).unwrap().to_string()).collect();
        let second = words(&decoded.join("\n"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode(0b0000_0000_0000_0010).unwrap().to_string(), "ADD $0, $0");
        assert_eq!(decode(0b0101_0001_0011_1110).unwrap().to_string(), "LW $1, -2($3)");
        assert_eq!(decode(0b1010_01_1111111111).unwrap().to_string(), "BZ 1023,T");
        assert_eq!(decode(0b1001_1111_1111_1110).unwrap().to_string(), "JAL 4094");
        assert_eq!(decode(0b1110_0000_1100_1000).unwrap().to_string(), "LHL 200");
        assert_eq!(decode(0b1110_1001_0000_0011).unwrap().to_string(), "MFLO $3");
        assert_eq!(decode(HAB_WORD), Some(Instruction::Hab));
    }

    #[test]
    fn test_undecodable_words() {
        for word in &[
            0b0000_0000_0000_0100u16, // unknown R function
            0b0001_0000_0000_0011,    // unknown S function
            0b0010_0001_0001_0000,    // STK reserved bits
            0b0011_0000_0000_0000,    // unassigned opcode
            0b0110_0000_0000_0000,    // unassigned opcode
            0b0111_0001_0000_0001,    // JR with an offset
            0b1010_11_0000000000,     // BZ predicate 11
            0b1110_0111_0000_0000,    // unknown M1 function
            0b1110_1000_0001_0000,    // M3 reserved bits
            0b1111_0000_0000_0001,    // not HAB
        ] {
            assert_eq!(decode(*word), None, "{:016b}", word);
        }
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0b0111, 4), 7);
        assert_eq!(sign_extend(0b1000, 4), -8);
        assert_eq!(sign_extend(0b1111, 4), -1);
    }
}
