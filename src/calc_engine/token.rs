use crate::error::EvalError;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
}

impl Op {
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Star => "*",
            Op::Slash => "/",
            Op::DoubleSlash => "//",
            Op::Percent => "%",
            Op::DoubleStar => "**",
            Op::Amp => "&",
            Op::Pipe => "|",
            Op::Caret => "^",
            Op::Tilde => "~",
            Op::Shl => "<<",
            Op::Shr => ">>",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Op(Op),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            _ if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '[' => {
                tokens.push(Token::LBracket);
                chars.next();
            }
            ']' => {
                tokens.push(Token::RBracket);
                chars.next();
            }
            ',' => {
                tokens.push(Token::Comma);
                chars.next();
            }
            '+' | '-' | '%' | '&' | '|' | '^' | '~' => {
                chars.next();
                tokens.push(Token::Op(match c {
                    '+' => Op::Plus,
                    '-' => Op::Minus,
                    '%' => Op::Percent,
                    '&' => Op::Amp,
                    '|' => Op::Pipe,
                    '^' => Op::Caret,
                    _ => Op::Tilde,
                }));
            }
            '*' | '/' => {
                chars.next();
                let doubled = chars.next_if_eq(&c).is_some();
                tokens.push(Token::Op(match (c, doubled) {
                    ('*', false) => Op::Star,
                    ('*', true) => Op::DoubleStar,
                    ('/', false) => Op::Slash,
                    _ => Op::DoubleSlash,
                }));
            }
            '<' | '>' => {
                chars.next();
                if chars.next_if_eq(&c).is_none() {
                    return Err(EvalError::syntax(format!("unexpected character '{}'", c)));
                }
                tokens.push(Token::Op(if c == '<' { Op::Shl } else { Op::Shr }));
            }
            '0'..='9' => {
                tokens.push(Token::Number(number(&mut chars)?));
            }
            '.' => {
                let mut ahead = chars.clone();
                ahead.next();
                if !matches!(ahead.peek(), Some(d) if d.is_ascii_digit()) {
                    return Err(EvalError::syntax("unexpected character '.'"));
                }
                tokens.push(Token::Number(number(&mut chars)?));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                    ident.push(ch);
                }
                tokens.push(Token::Ident(ident));
            }
            _ => return Err(EvalError::syntax(format!("unexpected character '{}'", c))),
        }
    }
    Ok(tokens)
}

/// Reads a run of `radix` digits, allowing single `_` separators between them.
fn digits(chars: &mut Peekable<Chars<'_>>, radix: u32, out: &mut String) -> Result<(), EvalError> {
    let mut last_was_digit = !out.is_empty();
    while let Some(&ch) = chars.peek() {
        if ch.is_digit(radix) {
            out.push(ch);
            last_was_digit = true;
        } else if ch == '_' {
            let mut ahead = chars.clone();
            ahead.next();
            let next_is_digit = matches!(ahead.peek(), Some(d) if d.is_digit(radix));
            if !last_was_digit || !next_is_digit {
                return Err(EvalError::syntax("invalid underscore in numeric literal"));
            }
            last_was_digit = false;
        } else {
            break;
        }
        chars.next();
    }
    Ok(())
}

fn number(chars: &mut Peekable<Chars<'_>>) -> Result<f64, EvalError> {
    let mut num_str = String::new();

    if chars.peek() == Some(&'0') {
        let mut ahead = chars.clone();
        ahead.next();
        let radix = match ahead.peek() {
            Some('x') | Some('X') => Some(16),
            Some('o') | Some('O') => Some(8),
            Some('b') | Some('B') => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            chars.next();
            chars.next();
            chars.next_if_eq(&'_');
            digits(chars, radix, &mut num_str)?;
            if num_str.is_empty() {
                return Err(EvalError::syntax("invalid integer literal"));
            }
            reject_trailing_letters(chars)?;
            return BigUint::parse_bytes(num_str.as_bytes(), radix)
                .and_then(|n| n.to_f64())
                .filter(|n| n.is_finite())
                .ok_or_else(|| EvalError::overflow("int too large to convert to float"));
        }
    }

    digits(chars, 10, &mut num_str)?;
    let integer_part = num_str.clone();
    let mut is_float = false;

    if chars.next_if_eq(&'.').is_some() {
        is_float = true;
        num_str.push('.');
        let mut fraction = String::new();
        if matches!(chars.peek(), Some(d) if d.is_ascii_digit()) {
            digits(chars, 10, &mut fraction)?;
        }
        num_str.push_str(&fraction);
    }

    if let Some(&e) = chars.peek() {
        if e == 'e' || e == 'E' {
            let mut ahead = chars.clone();
            ahead.next();
            ahead.next_if(|s| *s == '+' || *s == '-');
            if matches!(ahead.peek(), Some(d) if d.is_ascii_digit()) {
                is_float = true;
                chars.next();
                num_str.push('e');
                if let Some(sign) = chars.next_if(|s| *s == '+' || *s == '-') {
                    num_str.push(sign);
                }
                let mut exponent = String::new();
                digits(chars, 10, &mut exponent)?;
                num_str.push_str(&exponent);
            }
        }
    }

    reject_trailing_letters(chars)?;

    if !is_float
        && integer_part.len() > 1
        && integer_part.starts_with('0')
        && integer_part.chars().any(|d| d != '0')
    {
        return Err(EvalError::syntax(
            "leading zeros in decimal integer literals are not permitted",
        ));
    }

    let value = num_str
        .parse::<f64>()
        .map_err(|_| EvalError::syntax(format!("invalid number: '{}'", num_str)))?;
    // Float literals saturate to inf; integer literals have no float to fall back on.
    if value.is_infinite() && !is_float {
        return Err(EvalError::overflow("int too large to convert to float"));
    }
    Ok(value)
}

fn reject_trailing_letters(chars: &mut Peekable<Chars<'_>>) -> Result<(), EvalError> {
    match chars.peek() {
        Some(&ch) if ch.is_alphanumeric() || ch == '_' => {
            Err(EvalError::syntax(format!("invalid numeric literal near '{}'", ch)))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(input: &str) -> Vec<f64> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .filter_map(|t| match t {
                Token::Number(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn operators() {
        let tokens = tokenize("1 // 2 ** 3 << 4 >> 5 * 6 / 7").unwrap();
        let ops: Vec<Op> = tokens
            .into_iter()
            .filter_map(|t| match t {
                Token::Op(op) => Some(op),
                _ => None,
            })
            .collect();
        assert_eq!(
            ops,
            vec![Op::DoubleSlash, Op::DoubleStar, Op::Shl, Op::Shr, Op::Star, Op::Slash]
        );
    }

    #[test]
    fn literal_forms() {
        assert_eq!(numbers("1 1.5 .5 5. 1e3 2.5E-2 1_000"), vec![1.0, 1.5, 0.5, 5.0, 1000.0, 0.025, 1000.0]);
        assert_eq!(numbers("0xff 0o17 0b101 0x_10"), vec![255.0, 15.0, 5.0, 16.0]);
        assert_eq!(numbers("0 00 0.5 007.5"), vec![0.0, 0.0, 0.5, 7.5]);
    }

    #[test]
    fn huge_literals() {
        assert_eq!(numbers("0xffffffffffffffff"), vec![18446744073709551615.0]);
        assert_eq!(numbers("1e999"), vec![f64::INFINITY]);
        let googol_cubed = format!("1{}", "0".repeat(400));
        assert_eq!(tokenize(&googol_cubed).unwrap_err().kind(), "overflow");
    }

    #[test]
    fn malformed_literals() {
        for input in ["012", "1__0", "1_", "0x", "2pi", "1e", "0b102"] {
            assert_eq!(tokenize(input).map(|_| ()).unwrap_err().kind(), "syntax error", "{}", input);
        }
    }

    #[test]
    fn identifiers_and_punctuation() {
        assert_eq!(
            tokenize("atan2(y, x)[0]").unwrap(),
            vec![
                Token::Ident("atan2".into()),
                Token::LParen,
                Token::Ident("y".into()),
                Token::Comma,
                Token::Ident("x".into()),
                Token::RParen,
                Token::LBracket,
                Token::Number(0.0),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn rejects_foreign_characters() {
        for input in ["\"rm\"", "a.b", "x = 1", "1 < 2", "$", "#"] {
            assert!(tokenize(input).is_err(), "{}", input);
        }
    }
}
