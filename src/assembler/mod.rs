//! The Assembler module is in charge of taking an
//! ANEM source file and producing one 16-bit word
//! per instruction.
//!
//! It does this in three strictly sequential passes:
//! the normalizer expands pseudo-instructions, the
//! indexer assigns addresses and collects symbols, and
//! the encoder parses and packs every instruction.
//! All passes report into a shared `Context`.

pub mod ast;
pub mod decoder;
pub mod diagnostics;
pub mod encoder;
pub mod error;
pub mod indexer;
pub mod lexer;
pub mod listing;
pub mod normalizer;
pub mod parser;

use self::diagnostics::Context;
use self::encoder::EncodedWord;
use self::error::Abort;
use self::indexer::Index;
use self::normalizer::{NormalizedLine, SourceLine};

/// Output of every pass of one run.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Assembly {
    pub normalized: Vec<NormalizedLine>,
    pub index: Index,
    pub words: Vec<EncodedWord>,
}

/// Runs all three passes over `source`.
pub fn assemble(source: &str, ctx: &mut Context) -> Result<Assembly, Abort> {
    let normalized = normalizer::normalize(&SourceLine::read(source), ctx)?;
    let index = indexer::index(&normalized, ctx)?;
    let words = encoder::encode(&index, ctx)?;
    Ok(Assembly { normalized, index, words })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::error::Error;

    #[test]
    fn test_assemble() {
        let source = "
            -- count down from five
            .CONSTANT COUNT = 5
            .ADDRESS 0x100
            START: LIW $1, 5
            LIL $2, %COUNT%
            LOOP: SUB $1, $2
            BZ %DONE%,T
            J %LOOP%
            DONE: HAB
        ";
        let mut ctx = Context::default();
        let assembly = assemble(source, &mut ctx).unwrap();

        assert!(ctx.status().is_success());
        assert_eq!(assembly.index.symbols.get("START"), Some(256));
        assert_eq!(assembly.index.symbols.get("LOOP"), Some(260));
        assert_eq!(assembly.index.symbols.get("DONE"), Some(263));
        assert_eq!(assembly.index.symbols.get("COUNT"), Some(5));

        let addresses: Vec<u16> = assembly.words.iter().map(|w| w.address).collect();
        assert_eq!(addresses, (256..=263).collect::<Vec<u16>>());

        let bits: Vec<String> = assembly.words.iter().map(|w| w.to_string()).collect();
        assert_eq!(bits, vec![
            "1100000100000000",
            "1101000100000101",
            "0000000000000010",
            "1101001000000101",
            "0000000100100110",
            "1010010000000010",
            "1000111111111110",
            "1111000000000000",
        ]);
    }

    #[test]
    fn test_abort_keeps_earlier_diagnostics() {
        let mut ctx = Context::default();
        let result = assemble(".BOGUS\nFOO\nJ %FAR%\n.ADDRESS 3000\nFAR: HAB", &mut ctx);

        assert!(matches!(result, Err(Abort { line: 3, cause: Error::Displacement { .. } })));
        assert_eq!(ctx.errors(), 3);
        assert_eq!(ctx.status().to_string(), "3 error(s) 0 warning(s)");
    }
}
