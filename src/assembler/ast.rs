//! This AST describes a single normalized ANEM instruction.
//!
//! Every instruction is one 16-bit word. The top four bits select the
//! format; the remaining twelve are laid out per format:
//!
//! ```text
//! R    0000 ra   rb    func     ADD $1, $2
//! S    0001 ra   shamt func     SHL $1, 3
//! STK  0010 reg  0000  func     PUSH $4
//! W    01xx ra   rb    offset   LW $1, -2($3) / JR $5
//! J    10xx target (12 bits)    J %LOOP% / BZ %LOOP%,T
//! L    110x ra   byte           LIU $1, %DATA%U
//! M1   1110 func data           LHL 200
//! M3   1110 func 0000  reg      MFHI $2
//! HAB  1111 0000 0000  0000     HAB
//! ```
//!
//! `BZ` spends the top two bits of its target on the branch predicate.

use std::convert::TryFrom;
use std::fmt;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use super::error::Error;

pub const OPCODE_R: u16 = 0b0000;
pub const OPCODE_S: u16 = 0b0001;
pub const OPCODE_STK: u16 = 0b0010;
pub const OPCODE_M: u16 = 0b1110;
pub const HAB_WORD: u16 = 0b1111_0000_0000_0000;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Format {
    R,
    S,
    L,
    J,
    W,
    M1,
    M3,
    Stk,
    Hab,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    R   { func: RFunc,  ra: Register, rb: Register },
    S   { func: SFunc,  ra: Register, shamt: i64 },
    L   { op: LOp,      ra: Register, byte: ByteOperand },
    J   { op: JOp,      target: Target, predicate: Option<Predicate> },
    W   { op: WOp,      ra: Register, rb: Register, offset: i64 },
    M1  { func: M1Func, data: i64 },
    M3  { func: M3Func, reg: Register },
    Stk { func: StkFunc, reg: Register },
    Hab,
}

impl Instruction {
    pub fn format(&self) -> Format {
        use Instruction::*;
        match self {
            R { .. }   => Format::R,
            S { .. }   => Format::S,
            L { .. }   => Format::L,
            J { .. }   => Format::J,
            W { .. }   => Format::W,
            M1 { .. }  => Format::M1,
            M3 { .. }  => Format::M3,
            Stk { .. } => Format::Stk,
            Hab        => Format::Hab,
        }
    }

    /// Returns the opcode of the instruction.
    pub fn opcode(&self) -> u16 {
        use Instruction::*;
        match self {
            R { .. }           => OPCODE_R,
            S { .. }           => OPCODE_S,
            L { op, .. }       => op.opcode(),
            J { op, .. }       => op.opcode(),
            W { op, .. }       => op.opcode(),
            M1 { .. } |
            M3 { .. }          => OPCODE_M,
            Stk { .. }         => OPCODE_STK,
            Hab                => HAB_WORD >> 12,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;
        match self {
            R { func, ra, rb }             => write!(f, "{} {}, {}", func, ra, rb),
            S { func, ra, shamt }          => write!(f, "{} {}, {}", func, ra, shamt),
            L { op, ra, byte }             => write!(f, "{} {}, {}", op, ra, byte),
            J { op, target, predicate: Some(p) } => write!(f, "{} {},{}", op, target, p),
            J { op, target, predicate: None }    => write!(f, "{} {}", op, target),
            W { op: WOp::JR, ra, .. }      => write!(f, "JR {}", ra),
            W { op, ra, rb, offset }       => write!(f, "{} {}, {}({})", op, ra, offset, rb),
            M1 { func, data }              => write!(f, "{} {}", func, data),
            M3 { func, reg }               => write!(f, "{} {}", func, reg),
            Stk { func, reg }              => write!(f, "{} {}", func, reg),
            Hab                            => write!(f, "HAB"),
        }
    }
}

/// Two-register ALU operations.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum RFunc {
    AND,
    OR,
    ADD,
    MUL,
    SUB,
    SLT,
    SGT,
    NOR,
    XOR,
}

impl RFunc {
    pub fn func(self) -> u16 {
        use RFunc::*;
        match self {
            AND => 0b0000,
            OR  => 0b0001,
            ADD => 0b0010,
            MUL => 0b0011,
            SUB => 0b0110,
            SLT => 0b0111,
            SGT => 0b1000,
            NOR => 0b1100,
            XOR => 0b1111,
        }
    }

    pub fn from_func(bits: u16) -> Option<Self> {
        RFunc::iter().find(|f| f.func() == bits)
    }
}

/// Shifts and rotates.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum SFunc {
    SAR,
    SHR,
    SHL,
    ROR,
    ROL,
}

impl SFunc {
    pub fn func(self) -> u16 {
        use SFunc::*;
        match self {
            SAR => 0b0000,
            SHR => 0b0001,
            SHL => 0b0010,
            ROR => 0b0100,
            ROL => 0b1000,
        }
    }

    pub fn from_func(bits: u16) -> Option<Self> {
        SFunc::iter().find(|f| f.func() == bits)
    }
}

/// Byte-immediate loads.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum LOp {
    LIU,
    LIL,
}

impl LOp {
    pub fn opcode(self) -> u16 {
        match self {
            LOp::LIU => 0b1100,
            LOp::LIL => 0b1101,
        }
    }

    pub fn from_opcode(bits: u16) -> Option<Self> {
        LOp::iter().find(|op| op.opcode() == bits)
    }
}

/// Jumps and branches.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum JOp {
    J,
    JAL,
    BZ,
    BHLEQ,
}

impl JOp {
    pub fn opcode(self) -> u16 {
        use JOp::*;
        match self {
            J     => 0b1000,
            JAL   => 0b1001,
            BZ    => 0b1010,
            BHLEQ => 0b1011,
        }
    }

    pub fn from_opcode(bits: u16) -> Option<Self> {
        JOp::iter().find(|op| op.opcode() == bits)
    }

    /// Width of the target field. `BZ` gives two bits to its predicate.
    pub fn target_width(self) -> u32 {
        match self {
            JOp::BZ => 10,
            _ => 12,
        }
    }
}

/// Memory access and jump-register.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum WOp {
    SW,
    LW,
    JR,
}

impl WOp {
    pub fn opcode(self) -> u16 {
        match self {
            WOp::SW => 0b0100,
            WOp::LW => 0b0101,
            WOp::JR => 0b0111,
        }
    }

    pub fn from_opcode(bits: u16) -> Option<Self> {
        WOp::iter().find(|op| op.opcode() == bits)
    }
}

/// Byte-wide operations on the internal HI/LO registers.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum M1Func {
    LHL,
    LHH,
    LLL,
    LLH,
    AIS,
    AIH,
    AIL,
}

impl M1Func {
    pub fn func(self) -> u16 {
        use M1Func::*;
        match self {
            LHL => 0b0000,
            LHH => 0b0001,
            LLL => 0b0010,
            LLH => 0b0011,
            AIS => 0b0100,
            AIH => 0b0101,
            AIL => 0b0110,
        }
    }

    pub fn from_func(bits: u16) -> Option<Self> {
        M1Func::iter().find(|f| f.func() == bits)
    }
}

/// HI/LO register transfers. Shares the M1 opcode.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum M3Func {
    MFHI,
    MFLO,
    MTHI,
    MTLO,
}

impl M3Func {
    pub fn func(self) -> u16 {
        use M3Func::*;
        match self {
            MFHI => 0b1000,
            MFLO => 0b1001,
            MTHI => 0b1010,
            MTLO => 0b1011,
        }
    }

    pub fn from_func(bits: u16) -> Option<Self> {
        M3Func::iter().find(|f| f.func() == bits)
    }
}

/// Stack operations.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum StkFunc {
    PUSH,
    POP,
    SPRD,
    SPWR,
}

impl StkFunc {
    pub fn func(self) -> u16 {
        use StkFunc::*;
        match self {
            PUSH => 0b0000,
            POP  => 0b0001,
            SPRD => 0b0010,
            SPWR => 0b0011,
        }
    }

    pub fn from_func(bits: u16) -> Option<Self> {
        StkFunc::iter().find(|f| f.func() == bits)
    }
}

/// `BZ` predicate: true, not-zero, or unconditional-else.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter)]
pub enum Predicate {
    T,
    N,
    X,
}

impl Predicate {
    pub fn bits(self) -> u16 {
        match self {
            Predicate::T => 0b01,
            Predicate::N => 0b10,
            Predicate::X => 0b00,
        }
    }

    pub fn from_bits(bits: u16) -> Option<Self> {
        Predicate::iter().find(|p| p.bits() == bits)
    }
}

/// Which part of a symbol's value a byte operand takes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Select {
    Whole,
    Upper,
    Lower,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ByteOperand {
    Literal(i64),
    Symbol(String, Select),
}

impl fmt::Display for ByteOperand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ByteOperand::Literal(v) => write!(f, "{}", v),
            ByteOperand::Symbol(name, Select::Whole) => write!(f, "%{}%", name),
            ByteOperand::Symbol(name, Select::Upper) => write!(f, "%{}%U", name),
            ByteOperand::Symbol(name, Select::Lower) => write!(f, "%{}%L", name),
        }
    }
}

/// A literal target is stored as-is; a label becomes a relative displacement.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Target {
    Literal(i64),
    Label(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::Literal(v) => write!(f, "{}", v),
            Target::Label(name) => write!(f, "%{}%", name),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}", *self as u8)
    }
}

impl TryFrom<u16> for Register {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        use Register::*;
        // Register ID must be between 0 and 15.
        match value {
            0  => Ok(R0),
            1  => Ok(R1),
            2  => Ok(R2),
            3  => Ok(R3),
            4  => Ok(R4),
            5  => Ok(R5),
            6  => Ok(R6),
            7  => Ok(R7),
            8  => Ok(R8),
            9  => Ok(R9),
            10 => Ok(R10),
            11 => Ok(R11),
            12 => Ok(R12),
            13 => Ok(R13),
            14 => Ok(R14),
            15 => Ok(R15),
            _  => Err(Error::FieldRange { value: i64::from(value), width: 4 }),
        }
    }
}

impl Register {
    /// Convert the register to its four-bit field value.
    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register() {
        for i in 0..=15u16 {
            let reg = Register::try_from(i).unwrap();
            assert_eq!(reg.to_u16(), i);
            assert_eq!(reg.to_string(), format!("${}", i));
        }
        assert_eq!(Register::try_from(16), Err(Error::FieldRange { value: 16, width: 4 }));
        assert!(Register::try_from(99).is_err());
    }

    #[test]
    fn test_function_codes_are_unique() {
        for f in RFunc::iter() {
            assert_eq!(RFunc::from_func(f.func()), Some(f));
        }
        for f in SFunc::iter() {
            assert_eq!(SFunc::from_func(f.func()), Some(f));
        }
        for f in M1Func::iter() {
            assert_eq!(M1Func::from_func(f.func()), Some(f));
        }
        for f in M3Func::iter() {
            assert_eq!(M3Func::from_func(f.func()), Some(f));
            assert!(M1Func::from_func(f.func()).is_none());
        }
        for f in StkFunc::iter() {
            assert_eq!(StkFunc::from_func(f.func()), Some(f));
        }
        assert_eq!(RFunc::from_func(0b0100), None);
    }

    #[test]
    fn test_opcodes_do_not_overlap() {
        let mut seen = vec![OPCODE_R, OPCODE_S, OPCODE_STK, OPCODE_M, HAB_WORD >> 12];
        seen.extend(LOp::iter().map(LOp::opcode));
        seen.extend(JOp::iter().map(JOp::opcode));
        seen.extend(WOp::iter().map(WOp::opcode));
        let count = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), count);
    }

    #[test]
    fn test_mnemonics_parse() {
        assert_eq!("ADD".parse::<RFunc>(), Ok(RFunc::ADD));
        assert_eq!("SAR".parse::<SFunc>(), Ok(SFunc::SAR));
        assert_eq!("BHLEQ".parse::<JOp>(), Ok(JOp::BHLEQ));
        assert_eq!("N".parse::<Predicate>(), Ok(Predicate::N));
        assert!("add".parse::<RFunc>().is_err());
        assert!("LIW".parse::<LOp>().is_err());
    }

    #[test]
    fn test_display() {
        let ins = Instruction::W { op: WOp::LW, ra: Register::R1, rb: Register::R3, offset: -2 };
        assert_eq!(ins.to_string(), "LW $1, -2($3)");
        assert_eq!(ins.format(), Format::W);

        let ins = Instruction::J {
            op: JOp::BZ,
            target: Target::Label("LOOP".to_string()),
            predicate: Some(Predicate::T),
        };
        assert_eq!(ins.to_string(), "BZ %LOOP%,T");
        assert_eq!(ins.opcode(), 0b1010);

        let ins = Instruction::L {
            op: LOp::LIU,
            ra: Register::R1,
            byte: ByteOperand::Symbol("DATA".to_string(), Select::Upper),
        };
        assert_eq!(ins.to_string(), "LIU $1, %DATA%U");
        assert_eq!(Instruction::Hab.to_string(), "HAB");
        assert_eq!(Instruction::Hab.opcode(), 0b1111);
    }
}
