//! Tokenizer for script snippets.

use crate::error::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LParen,
    RParen,
    Comma,
    // Statement separator: newline or `;`.
    Separator,
}

pub fn tokenize(code: &str) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = Vec::new();
    let mut chars = code.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' | ';' => {
                chars.next();
                // Collapse runs of separators.
                if !matches!(tokens.last(), Some(Token::Separator) | None) {
                    tokens.push(Token::Separator);
                }
            }
            '#' => {
                // Comment to end of line.
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '+' => single(&mut chars, &mut tokens, Token::Plus),
            '-' => single(&mut chars, &mut tokens, Token::Minus),
            '*' => single(&mut chars, &mut tokens, Token::Star),
            '/' => single(&mut chars, &mut tokens, Token::Slash),
            '%' => single(&mut chars, &mut tokens, Token::Percent),
            '(' => single(&mut chars, &mut tokens, Token::LParen),
            ')' => single(&mut chars, &mut tokens, Token::RParen),
            ',' => single(&mut chars, &mut tokens, Token::Comma),
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Eq);
                } else {
                    tokens.push(Token::Assign);
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::NotEq);
                } else {
                    tokens.push(Token::Bang);
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::LtEq);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::GtEq);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '"' | '\'' => {
                tokens.push(read_string(&mut chars)?);
            }
            c if c.is_ascii_digit() => {
                tokens.push(read_number(&mut chars)?);
            }
            c if c.is_alphabetic() || c == '_' => {
                tokens.push(read_ident(&mut chars));
            }
            other => {
                return Err(ScriptError::Parse(format!("unexpected character '{other}'")));
            }
        }
    }

    // Trailing separators carry no meaning.
    while matches!(tokens.last(), Some(Token::Separator)) {
        tokens.pop();
    }
    Ok(tokens)
}

fn single(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    tokens: &mut Vec<Token>,
    token: Token,
) {
    chars.next();
    tokens.push(token);
}

fn read_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Token, ScriptError> {
    let quote = chars.next().expect("caller peeked a quote");
    let mut s = String::new();
    loop {
        match chars.next() {
            None => return Err(ScriptError::Parse("unterminated string literal".into())),
            Some(c) if c == quote => break,
            Some('\\') => match chars.next() {
                Some('n') => s.push('\n'),
                Some('t') => s.push('\t'),
                Some('\\') => s.push('\\'),
                Some(c) if c == quote => s.push(c),
                Some(c) => return Err(ScriptError::Parse(format!("unknown escape '\\{c}'"))),
                None => return Err(ScriptError::Parse("unterminated string literal".into())),
            },
            Some(c) => s.push(c),
        }
    }
    Ok(Token::Str(s))
}

fn read_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Token, ScriptError> {
    let mut raw = String::new();
    let mut is_float = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            raw.push(c);
            chars.next();
        } else if c == '.' && !is_float {
            is_float = true;
            raw.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if is_float {
        raw.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| ScriptError::Parse(format!("bad number literal '{raw}'")))
    } else {
        raw.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| ScriptError::Parse(format!("bad number literal '{raw}'")))
    }
}

fn read_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Token {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    match name.as_str() {
        "true" => Token::True,
        "false" => Token::False,
        _ => Token::Ident(name),
    }
}
