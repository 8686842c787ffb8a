//! Error kinds raised while translating a single line, and the
//! abort that terminates a whole run.
use thiserror::Error;

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("unsupported or malformed instruction: {0}")]
    Malformed(String),

    #[error("malformed pseudo-instruction: {0}")]
    MalformedPseudo(String),

    #[error("invalid directive: {0}")]
    InvalidDirective(String),

    #[error("undefined symbol `{0}`")]
    UndefinedSymbol(String),

    #[error("symbol `{0}` is already defined")]
    Redefinition(String),

    #[error("value {value} does not fit in a {width}-bit field")]
    FieldRange { value: i64, width: u32 },

    #[error("INST {address}: {mnemonic} cannot jump to intended place. OFFSET = {offset}")]
    Displacement { address: u16, mnemonic: String, offset: i64 },

    #[error("symbolic offsets are not supported in memory operands: {0}")]
    SymbolicOffset(String),

    #[error("{0} is not implemented")]
    Unimplemented(String),
}

/// Raised once the fatal flag is set and an error is reported.
/// Carries the line and the error that ended the run.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("assembly aborted on line {line}: {cause}")]
pub struct Abort {
    pub line: usize,
    pub cause: Error,
}
