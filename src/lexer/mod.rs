//! Lexer for IFJ20 source text
//!
//! Tokens are produced on demand through [`Lexer::next_token`], so a
//! lexical error surfaces exactly when the parser reaches it. Newlines are
//! significant in IFJ20; runs of them (including lines holding only
//! comments) collapse into a single [`TokenKind::Eol`].

mod tokens;

pub use tokens::{Token, TokenKind, TokenValue};

use crate::common::Span;
use crate::diagnostics::{CompileError, Result};
use logos::Logos;

/// Pull-based token source with line tracking
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    /// Line of the last offset passed to `line_at`
    line: usize,
    scanned: usize,
    last: TokenKind,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
            line: 1,
            scanned: 0,
            last: TokenKind::Eof,
        }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        let offset = offset.min(self.source.len());
        if offset > self.scanned {
            self.line += self.source[self.scanned..offset]
                .bytes()
                .filter(|&b| b == b'\n')
                .count();
            self.scanned = offset;
        }
        self.line
    }

    /// Next significant token; yields `Eof` forever once the input is consumed
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            let Some(result) = self.inner.next() else {
                let end = self.source.len();
                let line = self.line_at(end);
                return Ok(Token::eof(end, line));
            };

            let span: Span = self.inner.span().into();
            let line = self.line_at(span.start);
            let text = self.inner.slice();

            let kind = match result {
                Ok(kind) => kind,
                Err(()) if text.starts_with("/*") => {
                    return Err(CompileError::lexical(
                        "unterminated block comment",
                        line,
                        span,
                    ));
                }
                Err(()) => {
                    return Err(CompileError::lexical(
                        format!("unexpected character `{}`", text.escape_debug()),
                        line,
                        span,
                    ));
                }
            };

            match kind {
                TokenKind::BlockComment => continue,
                TokenKind::Eol if self.last == TokenKind::Eol => continue,
                _ => {}
            }
            self.last = kind;

            let value = decode(kind, text).map_err(|msg| CompileError::lexical(msg, line, span))?;
            return Ok(Token {
                kind,
                span,
                line,
                text: text.to_string(),
                value,
            });
        }
    }
}

/// Lex a whole source into a token vector terminated by `Eof`
pub fn lex(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

fn decode(kind: TokenKind, text: &str) -> std::result::Result<TokenValue, String> {
    match kind {
        TokenKind::IntLit => parse_decimal_or_legacy_octal(text).map(TokenValue::Int),
        TokenKind::HexLit => parse_prefixed(text, 16).map(TokenValue::Int),
        TokenKind::BinLit => parse_prefixed(text, 2).map(TokenValue::Int),
        TokenKind::OctLit => parse_prefixed(text, 8).map(TokenValue::Int),
        TokenKind::FloatLit => parse_float(text).map(TokenValue::Float),
        TokenKind::StringLit => unescape(&text[1..text.len() - 1]).map(TokenValue::Str),
        _ => Ok(TokenValue::None),
    }
}

/// Every `_` must sit between two digits of the literal's base
fn separators_ok(digits: &str, radix: u32) -> bool {
    let chars: Vec<char> = digits.chars().collect();
    chars.iter().enumerate().all(|(i, &c)| {
        c != '_'
            || (i > 0
                && i + 1 < chars.len()
                && chars[i - 1].is_digit(radix)
                && chars[i + 1].is_digit(radix))
    })
}

fn parse_digits(digits: &str, radix: u32, text: &str) -> std::result::Result<i64, String> {
    if !separators_ok(digits, radix) {
        return Err(format!("misplaced `_` in integer literal `{text}`"));
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    i64::from_str_radix(&cleaned, radix)
        .map_err(|_| format!("invalid integer literal `{text}`"))
}

fn parse_decimal_or_legacy_octal(text: &str) -> std::result::Result<i64, String> {
    match text.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => {
            // `0_17` is allowed, so the separator may follow the leading zero
            let digits = rest.strip_prefix('_').unwrap_or(rest);
            parse_digits(digits, 8, text)
        }
        _ => parse_digits(text, 10, text),
    }
}

fn parse_prefixed(text: &str, radix: u32) -> std::result::Result<i64, String> {
    let body = &text[2..];
    let digits = body.strip_prefix('_').unwrap_or(body);
    parse_digits(digits, radix, text)
}

fn parse_float(text: &str) -> std::result::Result<f64, String> {
    let mantissa_end = text.find(['e', 'E']).unwrap_or(text.len());
    let mantissa = &text[..mantissa_end];
    let groups_ok = mantissa.split('.').all(|part| separators_ok(part, 10));
    if !groups_ok {
        return Err(format!("misplaced `_` in float literal `{text}`"));
    }
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("invalid float literal `{text}`")),
    }
}

fn unescape(body: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            if (c as u32) < 32 {
                return Err("control character in string literal".to_string());
            }
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('a') => '\x07',
            Some('b') => '\x08',
            Some('f') => '\x0C',
            Some('v') => '\x0B',
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) if hex.len() == 2 => char::from(byte),
                    _ => return Err(format!("invalid hex escape `\\x{hex}`")),
                }
            }
            Some(other) => return Err(format!("unknown escape sequence `\\{other}`")),
            None => return Err("dangling `\\` in string literal".to_string()),
        };
        out.push(escaped);
    }
    Ok(out)
}
