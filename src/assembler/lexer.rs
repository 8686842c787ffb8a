//! This lexer tokenizes a single normalized ANEM instruction.
//!
//! A line is a mnemonic followed by comma-separated operands.
//! Operands are classified independently; whether a combination
//! makes sense is the parser's job.
use super::ast::Select;
use super::error::Error;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    /// `$N`
    Reg(u16),
    /// `12`, `-3`, `0x1F`, `0b101`
    Val(i64),
    /// `%NAME%`, `%NAME%U`, `%NAME%L`
    Sym(String, Select),
    /// `offset($N)`
    Mem(Box<Token>, u16),
    /// A bare word, e.g. a branch predicate.
    Word(String),
}

/// Splits a line into its mnemonic and operand tokens.
pub fn tokenize_line(line: &str) -> Result<(String, Vec<Token>), Error> {
    let line = line.trim();
    let (mnemonic, rest) = match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], line[idx..].trim()),
        None => (line, ""),
    };

    if mnemonic.is_empty() {
        return Err(Error::Malformed(line.to_owned()));
    }

    let mut operands = Vec::with_capacity(3);
    if !rest.is_empty() {
        for operand in rest.split(',') {
            match process_token(operand.trim()) {
                Some(tok) => operands.push(tok),
                None => return Err(Error::Malformed(line.to_owned())),
            }
        }
    }

    Ok((mnemonic.to_owned(), operands))
}

fn process_token(sb: &str) -> Option<Token> {
    // Empty operands come from stray commas.
    if sb.is_empty() {
        return None;
    }

    tokenize_mem(sb)
        .or_else(|| tokenize_reg(sb))
        .or_else(|| tokenize_sym(sb))
        .or_else(|| tokenize_const(sb).map(Token::Val))
        .or_else(|| tokenize_word(sb))
}

fn tokenize_mem(sb: &str) -> Option<Token> {
    let inner = sb.strip_suffix(')')?;
    let open = inner.find('(')?;
    let offset = inner[..open].trim();
    let base = match tokenize_reg(inner[open + 1..].trim())? {
        Token::Reg(id) => id,
        _ => return None,
    };

    let offset = tokenize_sym(offset).or_else(|| tokenize_const(offset).map(Token::Val))?;
    Some(Token::Mem(Box::new(offset), base))
}

fn tokenize_reg(sb: &str) -> Option<Token> {
    let digits = sb.strip_prefix('$')?;
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u16>().ok().map(Token::Reg)
}

fn tokenize_sym(sb: &str) -> Option<Token> {
    let body = sb.strip_prefix('%')?;
    let close = body.find('%')?;
    let name = &body[..close];
    if !is_identifier(name) {
        return None;
    }

    let select = match &body[close + 1..] {
        "" => Select::Whole,
        "U" | "u" => Select::Upper,
        "L" | "l" => Select::Lower,
        _ => return None,
    };
    Some(Token::Sym(name.to_owned(), select))
}

fn tokenize_word(sb: &str) -> Option<Token> {
    if is_identifier(sb) {
        Some(Token::Word(sb.to_owned()))
    } else {
        None
    }
}

/// Parses a decimal (optionally signed), `0x` hexadecimal or `0b`
/// binary literal.
pub fn tokenize_const(sb: &str) -> Option<i64> {
    let (digits, radix) = if let Some(hex) = sb.strip_prefix("0x").or_else(|| sb.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = sb.strip_prefix("0b").or_else(|| sb.strip_prefix("0B")) {
        (bin, 2)
    } else {
        let unsigned = sb.strip_prefix('-').or_else(|| sb.strip_prefix('+')).unwrap_or(sb);
        if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        return sb.parse::<i64>().ok();
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    i64::from_str_radix(digits, radix).ok()
}

pub fn is_identifier(sb: &str) -> bool {
    !sb.is_empty() && sb.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_reg() {
        for i in 0..=99u16 {
            assert_eq!(tokenize_reg(&format!("${}", i)), Some(Token::Reg(i)));
            assert_eq!(tokenize_reg(&format!("{}", i)), None);
            assert_eq!(tokenize_reg(&format!("{}$", i)), None);
        }

        assert_eq!(tokenize_reg("$100"), None);
        assert_eq!(tokenize_reg("$"), None);
        assert_eq!(tokenize_reg("$A"), None);
        assert_eq!(tokenize_reg("$-1"), None);
    }

    #[test]
    fn test_tokenize_const() {
        for i in 0..=u8::MAX {
            let v = i64::from(i);
            assert_eq!(tokenize_const(&format!("{}", i)), Some(v));
            assert_eq!(tokenize_const(&format!("-{}", i)), Some(-v));
            assert_eq!(tokenize_const(&format!("0x{:x}", i)), Some(v));
            assert_eq!(tokenize_const(&format!("0X{:X}", i)), Some(v));
            assert_eq!(tokenize_const(&format!("0b{:b}", i)), Some(v));
            assert_eq!(tokenize_const(&format!("0B{:b}", i)), Some(v));
        }

        // No octal: a leading zero is still decimal.
        assert_eq!(tokenize_const("010"), Some(10));
        assert_eq!(tokenize_const("+7"), Some(7));
        assert_eq!(tokenize_const("0x"), None);
        assert_eq!(tokenize_const("0x-5"), None);
        assert_eq!(tokenize_const("0b102"), None);
        assert_eq!(tokenize_const("12A"), None);
        assert_eq!(tokenize_const("-"), None);
    }

    #[test]
    fn test_tokenize_sym() {
        assert_eq!(tokenize_sym("%LOOP%"), Some(Token::Sym("LOOP".to_owned(), Select::Whole)));
        assert_eq!(tokenize_sym("%DATA_1%U"), Some(Token::Sym("DATA_1".to_owned(), Select::Upper)));
        assert_eq!(tokenize_sym("%DATA%L"), Some(Token::Sym("DATA".to_owned(), Select::Lower)));
        assert_eq!(tokenize_sym("%DATA%X"), None);
        assert_eq!(tokenize_sym("%%"), None);
        assert_eq!(tokenize_sym("%LOOP"), None);
        assert_eq!(tokenize_sym("LOOP"), None);
    }

    #[test]
    fn test_process_token() {
        assert_eq!(process_token(""), None);
        assert_eq!(process_token("$6"), Some(Token::Reg(6)));
        assert_eq!(process_token("$12"), Some(Token::Reg(12)));
        assert_eq!(process_token("146"), Some(Token::Val(146)));
        assert_eq!(process_token("0x46"), Some(Token::Val(70)));
        assert_eq!(process_token("T"), Some(Token::Word("T".to_owned())));
        assert_eq!(process_token("-2($3)"), Some(Token::Mem(Box::new(Token::Val(-2)), 3)));
        assert_eq!(process_token("0X4($15)"), Some(Token::Mem(Box::new(Token::Val(4)), 15)));
        assert_eq!(
            process_token("%OFF%($1)"),
            Some(Token::Mem(Box::new(Token::Sym("OFF".to_owned(), Select::Whole)), 1))
        );
        assert_eq!(process_token("($1)"), None);
        assert_eq!(process_token("4($X)"), None);
        assert_eq!(process_token("$1A"), None);
        assert_eq!(process_token("#5"), None);
    }

    #[test]
    fn test_tokenize_line() {
        assert_eq!(tokenize_line("HAB"), Ok(("HAB".to_owned(), vec![])));
        assert_eq!(
            tokenize_line("ADD $1,$2"),
            Ok(("ADD".to_owned(), vec![Token::Reg(1), Token::Reg(2)]))
        );
        assert_eq!(
            tokenize_line("  LIL \t$0,   0x56  "),
            Ok(("LIL".to_owned(), vec![Token::Reg(0), Token::Val(0x56)]))
        );
        assert_eq!(
            tokenize_line("BZ %LOOP%,T"),
            Ok(("BZ".to_owned(), vec![Token::Sym("LOOP".to_owned(), Select::Whole), Token::Word("T".to_owned())]))
        );
        // Invalid configurations of valid tokens are allowed here.
        assert_eq!(
            tokenize_line("LIU $0, 0x56, $1"),
            Ok(("LIU".to_owned(), vec![Token::Reg(0), Token::Val(0x56), Token::Reg(1)]))
        );

        assert!(tokenize_line("ADD $1,,$2").is_err());
        assert!(tokenize_line("ADD $1,").is_err());
        assert!(tokenize_line("").is_err());
    }
}
