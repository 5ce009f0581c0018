//! Table-driven operator-precedence builder
//!
//! The parser feeds operands, operators and parentheses one by one; the
//! builder keeps a stack of pending terminals and emits postfix symbols as
//! the precedence table dictates. Operand types are unified as they arrive,
//! so a type clash is reported at the point of combination.

use super::table::{Action, SymbolClass, action};
use super::{Expression, Operator, Symbol};
use crate::types::{DataType, unify};
use thiserror::Error;

/// Why an expression was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("expected an operand")]
    ExpectedOperand,
    #[error("expected an operator")]
    ExpectedOperator,
    #[error("unbalanced parentheses")]
    Unbalanced,
    #[error("expected an expression")]
    Empty,
    #[error("cannot combine `{0}` with `{1}`")]
    Mismatch(DataType, DataType),
    #[error("operator `{0}` is not defined for strings")]
    StringOperator(Operator),
    #[error("only one relational operator is allowed")]
    SecondRelational,
    #[error("a comparison cannot be used as an operand")]
    RelationalOperand,
}

impl ExprError {
    /// Errors about the shape of the expression rather than its types
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            ExprError::ExpectedOperand
                | ExprError::ExpectedOperator
                | ExprError::Unbalanced
                | ExprError::Empty
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    End,
    Open,
    Op(Operator),
}

impl Terminal {
    fn class(self) -> SymbolClass {
        match self {
            Terminal::End => SymbolClass::End,
            Terminal::Open => SymbolClass::Open,
            Terminal::Op(op) => op.class(),
        }
    }
}

/// Incremental postfix builder for one expression
#[derive(Debug)]
pub struct ExprBuilder {
    stack: Vec<Terminal>,
    output: Vec<Symbol>,
    ty: DataType,
    expect_operand: bool,
    relational: Option<Operator>,
    /// `-`, `*` or `/` occurred, which rules out strings
    non_additive: Option<Operator>,
    nesting: usize,
}

impl Default for ExprBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprBuilder {
    pub fn new() -> Self {
        Self {
            stack: vec![Terminal::End],
            output: Vec::new(),
            ty: DataType::Untyped,
            expect_operand: true,
            relational: None,
            non_additive: None,
            nesting: 0,
        }
    }

    /// Type unified so far
    pub fn current_type(&self) -> DataType {
        self.ty
    }

    /// Open parentheses not yet closed
    pub fn nesting(&self) -> usize {
        self.nesting
    }

    /// True when the next symbol must be an operand or `(`
    pub fn expects_operand(&self) -> bool {
        self.expect_operand
    }

    fn top(&self) -> Terminal {
        self.stack.last().copied().unwrap_or(Terminal::End)
    }

    /// Reduce until the table says something other than `Reduce`
    fn drive(&mut self, incoming: SymbolClass) -> Action {
        loop {
            match action(self.top().class(), incoming) {
                Action::Reduce => {
                    if let Some(Terminal::Op(op)) = self.stack.pop() {
                        self.output.push(Symbol::Operator(op));
                    }
                }
                other => return other,
            }
        }
    }

    pub fn operand(&mut self, symbol: Symbol, ty: DataType) -> Result<(), ExprError> {
        if !self.expect_operand {
            return Err(ExprError::ExpectedOperator);
        }
        self.ty = unify(self.ty, ty).ok_or(ExprError::Mismatch(self.ty, ty))?;
        if self.ty == DataType::String {
            if let Some(op) = self.non_additive {
                return Err(ExprError::StringOperator(op));
            }
        }
        match self.drive(SymbolClass::Operand) {
            Action::Shift => {
                self.output.push(symbol);
                self.expect_operand = false;
                Ok(())
            }
            _ => Err(ExprError::ExpectedOperator),
        }
    }

    pub fn operator(&mut self, op: Operator) -> Result<(), ExprError> {
        if self.expect_operand {
            return Err(ExprError::ExpectedOperand);
        }
        if op.is_relational() && self.relational.is_some() {
            return Err(ExprError::SecondRelational);
        }
        if matches!(op, Operator::Sub | Operator::Mul | Operator::Div) {
            if self.ty == DataType::String {
                return Err(ExprError::StringOperator(op));
            }
            self.non_additive.get_or_insert(op);
        }

        match self.drive(op.class()) {
            Action::Shift => {
                self.stack.push(Terminal::Op(op));
                if op.is_relational() {
                    self.relational = Some(op);
                }
                self.expect_operand = true;
                Ok(())
            }
            _ => Err(ExprError::SecondRelational),
        }
    }

    pub fn open(&mut self) -> Result<(), ExprError> {
        if !self.expect_operand {
            return Err(ExprError::ExpectedOperator);
        }
        match self.drive(SymbolClass::Open) {
            Action::Shift => {
                self.stack.push(Terminal::Open);
                self.nesting += 1;
                Ok(())
            }
            _ => Err(ExprError::Unbalanced),
        }
    }

    pub fn close(&mut self) -> Result<(), ExprError> {
        if self.expect_operand {
            return Err(ExprError::ExpectedOperand);
        }
        match self.drive(SymbolClass::Close) {
            Action::BracketMatch => {
                self.stack.pop();
                self.nesting -= 1;
                Ok(())
            }
            _ => Err(ExprError::Unbalanced),
        }
    }

    /// Flush the stack and return the postfix expression
    pub fn finish(mut self) -> Result<Expression, ExprError> {
        if self.output.is_empty() {
            return Err(ExprError::Empty);
        }
        if self.expect_operand {
            return Err(ExprError::ExpectedOperand);
        }
        match self.drive(SymbolClass::End) {
            Action::Accept => {}
            _ => return Err(ExprError::Unbalanced),
        }

        if self.relational.is_some()
            && !matches!(self.output.last(), Some(Symbol::Operator(op)) if op.is_relational())
        {
            return Err(ExprError::RelationalOperand);
        }

        Ok(Expression {
            symbols: self.output,
            ty: self.ty,
            relational: self.relational,
        })
    }
}
