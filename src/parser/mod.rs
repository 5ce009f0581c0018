//! Parser for IFJ20
//!
//! A single-pass recursive descent parser. Semantic analysis and code
//! generation happen while the tokens are read: every statement is checked
//! against the symbol tables and lowered into the [`Emitter`] before the
//! next one is parsed. Calls are the only thing that cannot be checked on
//! the spot, since a function may be called before its definition; they
//! are recorded and validated once the whole program has been read.

mod expr;
mod stmt;

use crate::codegen::Emitter;
use crate::common::Span;
use crate::diagnostics::{CompileError, Result};
use crate::lexer::{Lexer, Token, TokenKind, TokenValue};
use crate::resolve::{FunctionSig, FunctionTable, SymbolTable};
use crate::types::DataType;
use tracing::{debug, info};

/// Parse and compile a whole program to IFJcode20 text
pub fn parse(source: &str) -> Result<String> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()?;
    parser.finish()
}

/// The function whose body is being parsed
#[derive(Debug)]
struct FunctionContext {
    name: String,
    returns: Vec<DataType>,
    used_return: bool,
}

/// Parser state
struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    previous: Token,
    peeked: Option<Token>,
    symbols: SymbolTable,
    functions: FunctionTable,
    emitter: Emitter,
    function: Option<FunctionContext>,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        let previous = Token {
            kind: TokenKind::Eol,
            span: Span::new(0, 0),
            line: 1,
            text: String::new(),
            value: TokenValue::None,
        };
        Ok(Self {
            lexer,
            current,
            previous,
            peeked: None,
            symbols: SymbolTable::new(),
            functions: FunctionTable::new(),
            emitter: Emitter::new(),
            function: None,
        })
    }

    fn finish(self) -> Result<String> {
        self.emitter.finish()
    }

    // ==================== TOKENS ====================

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Kind of the token after the current one
    fn peek(&mut self) -> Result<TokenKind> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token()?);
        }
        Ok(self.peeked.as_ref().map_or(TokenKind::Eof, |t| t.kind))
    }

    /// Consume the current token and return it
    fn advance(&mut self) -> Result<Token> {
        let next = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        self.previous = std::mem::replace(&mut self.current, next);
        Ok(self.previous.clone())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(kind) {
            self.advance()
        } else {
            Err(self.syntax_error(describe_kind(kind)))
        }
    }

    fn syntax_error(&self, expected: impl Into<String>) -> CompileError {
        CompileError::Syntax {
            expected: expected.into(),
            found: self.current.describe(),
            previous: self.previous.describe(),
            line: self.current.line,
            span: self.current.span.into(),
        }
    }

    fn context(&self) -> Result<&FunctionContext> {
        self.function
            .as_ref()
            .ok_or_else(|| CompileError::internal("statement outside of a function"))
    }

    // ==================== PROGRAM ====================

    fn parse_program(&mut self) -> Result<()> {
        info!("parsing program");
        self.skip_eols()?;

        self.expect(TokenKind::Package)?;
        let package = self.expect(TokenKind::Ident)?;
        if package.text != "main" {
            return Err(CompileError::semantic(
                format!("package must be `main`, found `{}`", package.text),
                package.line,
                package.span,
            ));
        }
        self.expect(TokenKind::Eol)?;

        loop {
            match self.current.kind {
                TokenKind::Eol => {
                    self.advance()?;
                }
                TokenKind::Func => {
                    self.parse_function()?;
                    if !self.at(TokenKind::Eof) {
                        self.expect(TokenKind::Eol)?;
                    }
                }
                TokenKind::Eof => break,
                _ => return Err(self.syntax_error("`func`")),
            }
        }

        if !self.functions.contains("main") {
            return Err(CompileError::undefined(
                "function `main` is not defined",
                self.current.line,
                self.current.span,
            ));
        }
        self.functions.validate_calls()?;

        info!(
            functions = self.functions.user_functions().count(),
            returning = self
                .functions
                .user_functions()
                .filter(|sig| sig.used_return)
                .count(),
            calls = self.functions.calls().len(),
            "program checked"
        );
        Ok(())
    }

    fn skip_eols(&mut self) -> Result<()> {
        while self.at(TokenKind::Eol) {
            self.advance()?;
        }
        Ok(())
    }

    // ==================== FUNCTIONS ====================

    fn parse_function(&mut self) -> Result<()> {
        self.expect(TokenKind::Func)?;
        let name = self.expect(TokenKind::Ident)?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let param = self.expect(TokenKind::Ident)?;
                let ty = self.parse_type()?;
                params.push((param, ty));
                if !self.at(TokenKind::Comma) {
                    break;
                }
                self.advance()?;
            }
        }
        self.expect(TokenKind::RParen)?;
        let returns = self.parse_return_spec()?;

        if name.text == "main" && (!params.is_empty() || !returns.is_empty()) {
            return Err(CompileError::params(
                "function `main` takes no parameters and returns nothing",
                name.line,
                name.span,
            ));
        }

        let mut sig = FunctionSig::user(&name.text, name.line, name.span);
        sig.params = params.iter().map(|(_, ty)| *ty).collect();
        sig.returns = returns.clone();
        self.functions.define(sig)?;
        debug!(function = %name.text, params = params.len(), returns = returns.len(), "function");

        self.symbols.reset();
        self.symbols.push_scope();
        self.emitter.begin_function(&name.text, &returns)?;
        for (index, (param, ty)) in params.iter().enumerate() {
            let declared = self
                .symbols
                .declare(&param.text, *ty)
                .map_err(|msg| CompileError::undefined(msg, param.line, param.span))?;
            let slot = self.symbols.get(declared.id).slot();
            self.emitter.parameter(&slot, index)?;
        }

        self.function = Some(FunctionContext {
            name: name.text.clone(),
            returns,
            used_return: false,
        });

        self.expect(TokenKind::LBrace)?;
        self.expect(TokenKind::Eol)?;
        self.parse_block()?;
        let close = self.expect(TokenKind::RBrace)?;

        let context = self
            .function
            .take()
            .ok_or_else(|| CompileError::internal("function context lost"))?;
        if !context.returns.is_empty() && !context.used_return {
            return Err(CompileError::semantic(
                format!("function `{}` is missing a return statement", context.name),
                close.line,
                close.span,
            ));
        }
        if context.used_return {
            self.functions.mark_returned(&context.name);
        }

        self.emitter.end_function()?;
        self.symbols.reset();
        Ok(())
    }

    fn parse_type(&mut self) -> Result<DataType> {
        match DataType::from_keyword(self.current.kind) {
            Some(ty) => {
                self.advance()?;
                Ok(ty)
            }
            None => Err(self.syntax_error("a type")),
        }
    }

    /// `(int, string)`, `()`, a single bare type, or nothing
    fn parse_return_spec(&mut self) -> Result<Vec<DataType>> {
        if self.current.kind.is_type() {
            return Ok(vec![self.parse_type()?]);
        }
        if !self.at(TokenKind::LParen) {
            return Ok(Vec::new());
        }
        self.advance()?;
        let mut returns = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                returns.push(self.parse_type()?);
                if !self.at(TokenKind::Comma) {
                    break;
                }
                self.advance()?;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(returns)
    }
}

/// How an expected token kind is named in diagnostics
fn describe_kind(kind: TokenKind) -> String {
    match kind {
        TokenKind::Eol => "end of line".to_string(),
        TokenKind::Eof => "end of file".to_string(),
        TokenKind::Ident => "an identifier".to_string(),
        other => format!("`{}`", other.as_str()),
    }
}
