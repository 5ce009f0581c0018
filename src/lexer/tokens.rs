//! Token definitions for the IFJ20 lexer

use crate::common::Span;
use logos::Logos;
use serde::{Deserialize, Serialize};

/// A token with its kind, span, source line, text and decoded payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub line: usize,
    pub text: String,
    pub value: TokenValue,
}

impl Token {
    pub fn eof(offset: usize, line: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(offset, offset),
            line,
            text: String::new(),
            value: TokenValue::None,
        }
    }

    /// Human readable form used in syntax diagnostics
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eol => "end of line".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::StringLit => format!("\"{}\"", self.text.trim_matches('"')),
            _ if self.text.is_empty() => self.kind.as_str().to_string(),
            _ => self.text.clone(),
        }
    }
}

/// Decoded literal payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenValue {
    None,
    Int(i64),
    Float(f64),
    Str(String),
}

/// Token kinds recognized by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Serialize, Deserialize)]
#[logos(skip r"[ \t\r\f\x0B]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("package")]
    Package,
    #[token("func")]
    Func,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("nil")]
    Nil,
    #[token("_", priority = 2)]
    Underscore,

    // Type keywords
    #[token("int")]
    Int,
    #[token("float64")]
    Float64,
    #[token("string")]
    String,

    // Built-in functions
    #[token("print")]
    Print,
    #[token("inputs")]
    Inputs,
    #[token("inputi")]
    Inputi,
    #[token("inputf")]
    Inputf,
    #[token("int2float")]
    Int2Float,
    #[token("float2int")]
    Float2Int,
    #[token("len")]
    Len,
    #[token("substr")]
    Substr,
    #[token("ord")]
    Ord,
    #[token("chr")]
    Chr,

    // Literals
    #[regex(r"[0-9][0-9_]*", priority = 2)]
    IntLit,
    #[regex(r"0[xX]_?[0-9a-fA-F][0-9a-fA-F_]*")]
    HexLit,
    #[regex(r"0[bB]_?[01][01_]*")]
    BinLit,
    #[regex(r"0[oO]_?[0-7][0-7_]*")]
    OctLit,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+")]
    FloatLit,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,

    // Identifiers (priority 1 so keywords and _ take precedence)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", priority = 1)]
    Ident,

    // Operators
    #[token(":=")]
    Define,
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,

    // Layout
    #[token("\n")]
    Eol,
    #[token("/*", block_comment)]
    BlockComment,

    // Special
    Eof,
}

/// Consume a block comment body; an unterminated comment is a lexical error
fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

impl TokenKind {
    /// Check if this keyword names a built-in function
    pub fn is_builtin(&self) -> bool {
        matches!(
            self,
            TokenKind::Print
                | TokenKind::Inputs
                | TokenKind::Inputi
                | TokenKind::Inputf
                | TokenKind::Int2Float
                | TokenKind::Float2Int
                | TokenKind::Len
                | TokenKind::Substr
                | TokenKind::Ord
                | TokenKind::Chr
        )
    }

    /// Check if this is a type keyword
    pub fn is_type(&self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Float64 | TokenKind::String)
    }

    /// Get the string representation of the token
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Package => "package",
            TokenKind::Func => "func",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::Nil => "nil",
            TokenKind::Underscore => "_",
            TokenKind::Int => "int",
            TokenKind::Float64 => "float64",
            TokenKind::String => "string",
            TokenKind::Print => "print",
            TokenKind::Inputs => "inputs",
            TokenKind::Inputi => "inputi",
            TokenKind::Inputf => "inputf",
            TokenKind::Int2Float => "int2float",
            TokenKind::Float2Int => "float2int",
            TokenKind::Len => "len",
            TokenKind::Substr => "substr",
            TokenKind::Ord => "ord",
            TokenKind::Chr => "chr",
            TokenKind::IntLit => "<int>",
            TokenKind::HexLit => "<hex>",
            TokenKind::BinLit => "<bin>",
            TokenKind::OctLit => "<oct>",
            TokenKind::FloatLit => "<float>",
            TokenKind::StringLit => "<string>",
            TokenKind::Ident => "<ident>",
            TokenKind::Define => ":=",
            TokenKind::Assign => "=",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::Eol => "<eol>",
            TokenKind::BlockComment => "<comment>",
            TokenKind::Eof => "<eof>",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
