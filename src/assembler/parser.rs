//! The Parser module takes the token stream of one normalized line
//! and converts it into an `Instruction`.
use std::collections::VecDeque;
use std::convert::TryFrom;
use super::ast::*;
use super::error::Error;
use super::lexer::{tokenize_line, Token};

/// Mnemonics reserved for the floating point unit, which does not exist yet.
const FLOATING_POINT: &[&str] = &[
    "FADD", "FADDP", "FSUB", "FSUBP", "FSUBR", "FSUBRP",
    "FMUL", "FMULP", "FDIV", "FDIVP", "FDIVR", "FDIVRP", "FABS", "FCHS",
    "FSIN", "FSINP", "FCOS", "FCOSP", "FTAN", "FTANP",
    "FASIN", "FASINP", "FACOS", "FACOSP", "ABS", "ABP",
    "FMLD", "FMST", "FMSTP", "FSLD", "FSST", "FSSTP", "FSX",
];

/// Parses one normalized instruction line.
pub fn parse(line: &str) -> Result<Instruction, Error> {
    Parser::new(line)?.run()
}

pub fn is_floating_point(mnemonic: &str) -> bool {
    FLOATING_POINT.contains(&mnemonic)
}

pub struct Parser {
    text: String,
    mnemonic: String,
    tokens: VecDeque<Token>,
}

impl Parser {
    pub fn new(line: &str) -> Result<Self, Error> {
        let (mnemonic, tokens) = tokenize_line(line)?;
        Ok(Parser {
            text: line.trim().to_owned(),
            mnemonic,
            tokens: VecDeque::from(tokens),
        })
    }

    /// Run the parser, consuming itself. Leftover operands are an error.
    pub fn run(mut self) -> Result<Instruction, Error> {
        let ins = self.instruction()?;
        if !self.tokens.is_empty() {
            return Err(self.malformed());
        }
        Ok(ins)
    }

    fn instruction(&mut self) -> Result<Instruction, Error> {
        let op = self.mnemonic.clone();
        let op = op.as_str();

        if is_floating_point(op) {
            return Err(Error::Unimplemented(format!("floating point instruction {}", op)));
        }

        if let Ok(func) = op.parse::<RFunc>() {
            return Ok(Instruction::R { func, ra: self.register()?, rb: self.register()? });
        }

        if let Ok(func) = op.parse::<SFunc>() {
            return Ok(Instruction::S { func, ra: self.register()?, shamt: self.shift_amount()? });
        }

        if let Ok(op) = op.parse::<LOp>() {
            return Ok(Instruction::L { op, ra: self.register()?, byte: self.byte()? });
        }

        if let Ok(op) = op.parse::<JOp>() {
            let target = self.target()?;
            let predicate = match op {
                JOp::BZ => Some(self.predicate()?),
                _ => None,
            };
            return Ok(Instruction::J { op, target, predicate });
        }

        if let Ok(op) = op.parse::<WOp>() {
            let ra = self.register()?;
            return match op {
                // Jump register is a W-type with no base and no offset.
                WOp::JR => Ok(Instruction::W { op, ra, rb: Register::R0, offset: 0 }),
                _ => {
                    let (offset, rb) = self.memory()?;
                    Ok(Instruction::W { op, ra, rb, offset })
                }
            };
        }

        if let Ok(func) = op.parse::<M1Func>() {
            return Ok(Instruction::M1 { func, data: self.immediate()? });
        }

        if let Ok(func) = op.parse::<M3Func>() {
            return Ok(Instruction::M3 { func, reg: self.register()? });
        }

        if let Ok(func) = op.parse::<StkFunc>() {
            return Ok(Instruction::Stk { func, reg: self.register()? });
        }

        match op {
            "HAB" => Ok(Instruction::Hab),
            _ => Err(self.malformed()),
        }
    }

    fn register(&mut self) -> Result<Register, Error> {
        match self.consume() {
            Some(Token::Reg(id)) => Register::try_from(id),
            _ => Err(self.malformed()),
        }
    }

    /// Shift amounts are written either as `3` or historically as `$3`.
    fn shift_amount(&mut self) -> Result<i64, Error> {
        match self.consume() {
            Some(Token::Reg(id)) => Ok(i64::from(id)),
            Some(Token::Val(val)) => Ok(val),
            _ => Err(self.malformed()),
        }
    }

    fn immediate(&mut self) -> Result<i64, Error> {
        match self.consume() {
            Some(Token::Val(val)) => Ok(val),
            _ => Err(self.malformed()),
        }
    }

    fn byte(&mut self) -> Result<ByteOperand, Error> {
        match self.consume() {
            Some(Token::Val(val)) => Ok(ByteOperand::Literal(val)),
            Some(Token::Sym(name, select)) => Ok(ByteOperand::Symbol(name, select)),
            _ => Err(self.malformed()),
        }
    }

    fn target(&mut self) -> Result<Target, Error> {
        match self.consume() {
            Some(Token::Val(val)) => Ok(Target::Literal(val)),
            Some(Token::Sym(name, Select::Whole)) => Ok(Target::Label(name)),
            _ => Err(self.malformed()),
        }
    }

    fn predicate(&mut self) -> Result<Predicate, Error> {
        match self.consume() {
            Some(Token::Word(word)) => word.parse::<Predicate>().map_err(|_| self.malformed()),
            _ => Err(self.malformed()),
        }
    }

    fn memory(&mut self) -> Result<(i64, Register), Error> {
        match self.consume() {
            Some(Token::Mem(offset, base)) => match *offset {
                Token::Val(val) => Ok((val, Register::try_from(base)?)),
                _ => Err(Error::SymbolicOffset(self.text.clone())),
            },
            _ => Err(self.malformed()),
        }
    }

    fn malformed(&self) -> Error {
        Error::Malformed(self.text.clone())
    }

    /// Pops a token off the operand list and returns it.
    /// Returns None if no tokens are left.
    #[inline]
    fn consume(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_operands() {
        for a in 0..=15u16 {
            for b in 0..=15u16 {
                let ins = parse(&format!("XOR ${}, ${}", a, b)).unwrap();
                assert_eq!(ins, Instruction::R {
                    func: RFunc::XOR,
                    ra: Register::try_from(a).unwrap(),
                    rb: Register::try_from(b).unwrap(),
                });
            }
        }
        assert_eq!(parse("ADD $16, $0"), Err(Error::FieldRange { value: 16, width: 4 }));
    }

    #[test]
    fn test_parse_each_format() {
        assert_eq!(parse("SHL $1, $3"), Ok(Instruction::S { func: SFunc::SHL, ra: Register::R1, shamt: 3 }));
        assert_eq!(parse("ROR $2, 15"), Ok(Instruction::S { func: SFunc::ROR, ra: Register::R2, shamt: 15 }));
        assert_eq!(parse("LIL $1, 44"), Ok(Instruction::L {
            op: LOp::LIL, ra: Register::R1, byte: ByteOperand::Literal(44),
        }));
        assert_eq!(parse("LIU $1, %DATA%U"), Ok(Instruction::L {
            op: LOp::LIU, ra: Register::R1, byte: ByteOperand::Symbol("DATA".to_owned(), Select::Upper),
        }));
        assert_eq!(parse("JAL %FUNC%"), Ok(Instruction::J {
            op: JOp::JAL, target: Target::Label("FUNC".to_owned()), predicate: None,
        }));
        assert_eq!(parse("J 100"), Ok(Instruction::J {
            op: JOp::J, target: Target::Literal(100), predicate: None,
        }));
        assert_eq!(parse("BZ %LOOP%,N"), Ok(Instruction::J {
            op: JOp::BZ, target: Target::Label("LOOP".to_owned()), predicate: Some(Predicate::N),
        }));
        assert_eq!(parse("SW $1, 3($2)"), Ok(Instruction::W {
            op: WOp::SW, ra: Register::R1, rb: Register::R2, offset: 3,
        }));
        assert_eq!(parse("JR $5"), Ok(Instruction::W {
            op: WOp::JR, ra: Register::R5, rb: Register::R0, offset: 0,
        }));
        assert_eq!(parse("AIH -4"), Ok(Instruction::M1 { func: M1Func::AIH, data: -4 }));
        assert_eq!(parse("MTLO $9"), Ok(Instruction::M3 { func: M3Func::MTLO, reg: Register::R9 }));
        assert_eq!(parse("PUSH $14"), Ok(Instruction::Stk { func: StkFunc::PUSH, reg: Register::R14 }));
        assert_eq!(parse("HAB"), Ok(Instruction::Hab));
    }

    #[test]
    fn test_malformed() {
        for line in &[
            "ADD $1",
            "ADD $1, $2, $3",
            "ADD $1, 2",
            "BZ %LOOP%",
            "BZ %LOOP%,Q",
            "J %LOOP%U",
            "J LOOP",
            "LW $1, $2",
            "JR $1, $2",
            "HAB $1",
            "LIW $1, 5",
            "FOO $1",
            "ADDI $1, 5",
            "BEQ $1, 2($3)",
        ] {
            assert_eq!(parse(line), Err(Error::Malformed(line.to_string())), "{}", line);
        }
    }

    #[test]
    fn test_symbolic_offset() {
        assert_eq!(parse("LW $1, %OFF%($2)"), Err(Error::SymbolicOffset("LW $1, %OFF%($2)".to_owned())));
    }

    #[test]
    fn test_floating_point() {
        assert!(matches!(parse("FADDP"), Err(Error::Unimplemented(_))));
        assert!(matches!(parse("FMLD $3"), Err(Error::Unimplemented(_))));
        assert!(matches!(parse("FABS"), Err(Error::Unimplemented(_))));
        assert!(matches!(parse("FCHS"), Err(Error::Unimplemented(_))));
        assert!(is_floating_point("FSSTP"));
        assert!(!is_floating_point("FOO"));
    }
}
