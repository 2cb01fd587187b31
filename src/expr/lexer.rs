//! Tokenizer for the expression language.

use crate::expr::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Punct(&'static str),
}

/// A token with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

// Longest first so that `===` wins over `==` and `=`.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "(", ")", "[", "]", ".", ",", "?", ":", "!",
    "+", "-", "*", "/", "%", "<", ">",
];

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;

        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
        {
            let (number, end) = read_number(source, pos)?;
            tokens.push(Spanned { token: Token::Number(number), offset: start });
            pos = end;
            continue;
        }

        if c == b'\'' || c == b'"' {
            let (text, end) = read_string(source, pos)?;
            tokens.push(Spanned { token: Token::Str(text), offset: start });
            pos = end;
            continue;
        }

        if is_ident_start(c) {
            while pos < bytes.len() && is_ident_continue(bytes[pos]) {
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Ident(source[start..pos].to_string()),
                offset: start,
            });
            continue;
        }

        match PUNCTUATORS.iter().find(|p| source[pos..].starts_with(**p)) {
            Some(&p) => {
                tokens.push(Spanned { token: Token::Punct(p), offset: start });
                pos += p.len();
            }
            None => {
                let ch = source[pos..].chars().next().unwrap_or('?');
                return Err(ParseError::new(format!("unexpected character '{}'", ch), start));
            }
        }
    }

    Ok(tokens)
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_ident_continue(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn read_number(source: &str, start: usize) -> Result<(f64, usize), ParseError> {
    let bytes = source.as_bytes();
    let mut pos = start;
    let digits = |pos: &mut usize| {
        while *pos < bytes.len() && bytes[*pos].is_ascii_digit() {
            *pos += 1;
        }
    };

    digits(&mut pos);
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        digits(&mut pos);
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            pos = exp;
            digits(&mut pos);
        }
    }

    source[start..pos]
        .parse()
        .map(|n| (n, pos))
        .map_err(|_| ParseError::new("invalid number literal", start))
}

fn read_string(source: &str, start: usize) -> Result<(String, usize), ParseError> {
    let mut chars = source[start..].char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(ParseError::new("unterminated string", start)),
    };
    let mut out = String::new();

    while let Some((i, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((out, start + i + c.len_utf8())),
            '\\' => {
                let (_, escaped) = chars
                    .next()
                    .ok_or_else(|| ParseError::new("unterminated string", start))?;
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    'u' => {
                        let hex: String = (0..4).filter_map(|_| chars.next().map(|(_, c)| c)).collect();
                        let code = u32::from_str_radix(&hex, 16)
                            .ok()
                            .filter(|_| hex.len() == 4)
                            .and_then(char::from_u32)
                            .ok_or_else(|| ParseError::new("invalid unicode escape", start + i))?;
                        out.push(code);
                    }
                    other => out.push(other),
                }
            }
            '\n' => return Err(ParseError::new("unterminated string", start)),
            other => out.push(other),
        }
    }

    Err(ParseError::new("unterminated string", start))
}
