//! Expression and call parsing
//!
//! Tokens are fed into an [`ExprBuilder`] until one cannot continue the
//! expression. Calls are parsed eagerly: their argument code is generated
//! into capture buffers and the finished call becomes a single operand.

use super::Parser;
use crate::codegen::CallConvention;
use crate::diagnostics::{CompileError, Result};
use crate::expr::{ExprBuilder, ExprError, Expression, Operator, Symbol, optimize};
use crate::lexer::{Token, TokenKind, TokenValue};
use crate::resolve::{BLANK, CallId, CallRecord, VarId};
use crate::types::{Constant, DataType};
use tracing::trace;

/// A parsed call whose code has not been placed yet
pub(super) struct CallSite {
    pub callee: String,
    pub convention: CallConvention,
    /// Lowered code of each argument, in source order
    pub args: Vec<String>,
    pub id: CallId,
}

/// An operand parsed ahead of its expression
pub(super) struct Operand {
    symbol: Symbol,
    ty: DataType,
    call: Option<CallId>,
    token: Token,
}

impl Parser<'_> {
    /// Is the current token the start of a call?
    pub(super) fn starts_call(&mut self) -> Result<bool> {
        Ok(match self.current.kind {
            TokenKind::Ident => self.peek()? == TokenKind::LParen,
            kind => kind.is_builtin(),
        })
    }

    /// Tokens that end the right-hand side of an assignment
    pub(super) fn ends_expression_list(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Eol | TokenKind::Semi | TokenKind::LBrace | TokenKind::Eof
        )
    }

    /// `name(args)`; records the call and captures the argument code
    pub(super) fn parse_call(&mut self) -> Result<CallSite> {
        let name = self.advance()?;
        self.expect(TokenKind::LParen)?;

        let mut args = Vec::new();
        let mut types = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let start = self.current.clone();
                self.emitter.begin_capture();
                let arg = self.parse_expression()?;
                if arg.relational.is_some() {
                    return Err(CompileError::type_compat(
                        "a comparison cannot be passed as an argument",
                        start.line,
                        start.span,
                    ));
                }
                self.emitter.expression(&arg, &self.symbols)?;
                args.push(self.emitter.end_capture()?);
                types.push(arg.ty);

                if !self.at(TokenKind::Comma) {
                    break;
                }
                self.advance()?;
            }
        }
        let close = self.expect(TokenKind::RParen)?;

        let convention = match self.functions.get(&name.text) {
            Some(sig) if sig.variadic => CallConvention::Variadic,
            _ => CallConvention::Framed,
        };
        let id = self.functions.record_call(CallRecord {
            callee: name.text.clone(),
            args: types,
            returns: Vec::new(),
            line: name.line,
            span: name.span.merge(close.span),
        });

        Ok(CallSite {
            callee: name.text,
            convention,
            args,
            id,
        })
    }

    /// Turn a call into an operand that leaves its first result on the stack
    pub(super) fn call_operand(&mut self, call: CallSite) -> Result<Operand> {
        let ty = match self.functions.get(&call.callee) {
            Some(sig) if sig.returns.len() == 1 => sig.returns[0],
            _ => DataType::Untyped,
        };
        self.emitter.begin_capture();
        self.emitter.call(&call.callee, call.convention, &call.args);
        self.emitter.line("PUSHS TF@%retval0");
        let code = self.emitter.end_capture()?;
        Ok(Operand {
            symbol: Symbol::Call(code),
            ty,
            call: Some(call.id),
            token: self.previous.clone(),
        })
    }

    /// Comma separated expressions
    pub(super) fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut values = vec![self.parse_expression()?];
        while self.at(TokenKind::Comma) {
            self.advance()?;
            values.push(self.parse_expression()?);
        }
        Ok(values)
    }

    pub(super) fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_expression_from(None)
    }

    /// Parse an expression, optionally continuing after an operand that
    /// was already consumed
    pub(super) fn parse_expression_from(&mut self, first: Option<Operand>) -> Result<Expression> {
        let mut builder = ExprBuilder::new();
        let mut calls = Vec::new();
        let start = match &first {
            Some(operand) => operand.token.clone(),
            None => self.current.clone(),
        };

        if let Some(operand) = first {
            calls.extend(operand.call);
            builder
                .operand(operand.symbol, operand.ty)
                .map_err(|e| self.expr_error(e, &operand.token))?;
        }

        loop {
            let token = self.current.clone();
            let step = match (token.kind, Operator::from_token(token.kind)) {
                (_, Some(op)) => builder.operator(op),
                (TokenKind::LParen, _) => builder.open(),
                (TokenKind::RParen, _) if builder.nesting() > 0 => builder.close(),
                _ => {
                    let Some(operand) = self.parse_operand()? else {
                        break;
                    };
                    calls.extend(operand.call);
                    builder
                        .operand(operand.symbol, operand.ty)
                        .map_err(|e| self.expr_error(e, &operand.token))?;
                    continue;
                }
            };
            step.map_err(|e| self.expr_error(e, &token))?;
            self.advance()?;
        }

        let expr = builder.finish().map_err(|e| {
            let token = self.current.clone();
            self.expr_error(e, &token)
        })?;

        for symbol in &expr.symbols {
            if let Symbol::Variable(id) = symbol {
                self.settle_type(*id, expr.ty);
            }
        }

        let straight = self.symbols.depth() == 1;
        let symbols = &self.symbols;
        let optimized = optimize(expr.symbols, |id| {
            straight
                && symbols
                    .get(id)
                    .constant
                    .as_ref()
                    .is_some_and(Constant::is_zero)
        })
        .map_err(|_| CompileError::ZeroDivision {
            line: start.line,
            span: start.span.into(),
        })?;

        for id in calls {
            self.functions.call_mut(id).returns = vec![expr.ty];
        }

        Ok(Expression {
            symbols: optimized,
            ty: expr.ty,
            relational: expr.relational,
        })
    }

    /// An untyped variable takes the first concrete type it is used with
    pub(super) fn settle_type(&mut self, id: VarId, ty: DataType) {
        let variable = self.symbols.get_mut(id);
        if variable.ty == DataType::Untyped && ty != DataType::Untyped {
            trace!(name = %variable.name, %ty, "variable type settled");
            variable.ty = ty;
        }
    }

    /// Consume one operand; `None` when the current token cannot start one
    fn parse_operand(&mut self) -> Result<Option<Operand>> {
        let token = self.current.clone();
        let (symbol, ty) = match (&token.kind, &token.value) {
            (TokenKind::Nil, _) => {
                return Err(CompileError::VariableType {
                    name: "nil".to_string(),
                    line: token.line,
                    span: token.span.into(),
                });
            }
            (TokenKind::Underscore, _) => {
                return Err(CompileError::semantic(
                    format!("cannot read the blank identifier `{BLANK}`"),
                    token.line,
                    token.span,
                ));
            }
            (kind, _) if kind.is_builtin() => {
                let call = self.parse_call()?;
                return self.call_operand(call).map(Some);
            }
            (TokenKind::Ident, _) => {
                if self.peek()? == TokenKind::LParen {
                    let call = self.parse_call()?;
                    return self.call_operand(call).map(Some);
                }
                let id = self.symbols.lookup(&token.text).ok_or_else(|| {
                    CompileError::undefined(
                        format!("undefined variable `{}`", token.text),
                        token.line,
                        token.span,
                    )
                })?;
                (Symbol::Variable(id), self.symbols.get(id).ty)
            }
            (_, TokenValue::Int(v)) => (Symbol::IntLiteral(*v), DataType::Int),
            (_, TokenValue::Float(v)) => (Symbol::FloatLiteral(*v), DataType::Float),
            (TokenKind::StringLit, TokenValue::Str(s)) => {
                (Symbol::StringLiteral(s.clone()), DataType::String)
            }
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(Operand {
            symbol,
            ty,
            call: None,
            token,
        }))
    }

    fn expr_error(&self, error: ExprError, at: &Token) -> CompileError {
        if error.is_syntax() {
            let expected = match error {
                ExprError::ExpectedOperator => "an operator".to_string(),
                ExprError::Unbalanced => "`)`".to_string(),
                _ => "an expression".to_string(),
            };
            CompileError::Syntax {
                expected,
                found: at.describe(),
                previous: self.previous.describe(),
                line: at.line,
                span: at.span.into(),
            }
        } else {
            CompileError::type_compat(error.to_string(), at.line, at.span)
        }
    }
}
