//! Expression evaluation
//!
//! An expression is turned into a postfix [`Symbol`] sequence by the
//! table-driven [`ExprBuilder`], simplified by [`optimize`] and finally
//! lowered by the code generator.

mod builder;
mod optimizer;
pub mod table;

pub use builder::{ExprBuilder, ExprError};
pub use optimizer::{ZeroDivision, optimize};
pub use table::{Action, SymbolClass};

use crate::lexer::TokenKind;
use crate::resolve::VarId;
use crate::types::{Constant, DataType};

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    pub fn from_token(kind: TokenKind) -> Option<Operator> {
        Some(match kind {
            TokenKind::Plus => Operator::Add,
            TokenKind::Minus => Operator::Sub,
            TokenKind::Star => Operator::Mul,
            TokenKind::Slash => Operator::Div,
            TokenKind::EqEq => Operator::Eq,
            TokenKind::Ne => Operator::Ne,
            TokenKind::Lt => Operator::Lt,
            TokenKind::Le => Operator::Le,
            TokenKind::Gt => Operator::Gt,
            TokenKind::Ge => Operator::Ge,
            _ => return None,
        })
    }

    pub fn class(self) -> SymbolClass {
        match self {
            Operator::Add | Operator::Sub => SymbolClass::Additive,
            Operator::Mul | Operator::Div => SymbolClass::Multiplicative,
            _ => SymbolClass::Relational,
        }
    }

    pub fn is_relational(self) -> bool {
        self.class() == SymbolClass::Relational
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a postfix expression
///
/// Literals own their payload. Variables are borrowed from the symbol
/// table by id and must never be dropped from it by the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Operator(Operator),
    Variable(VarId),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    /// Lowered call sequence that leaves the single result on the stack
    Call(String),
}

impl Symbol {
    pub fn is_operator(&self) -> bool {
        matches!(self, Symbol::Operator(_))
    }

    /// Literal value, if this is a literal
    pub fn constant(&self) -> Option<Constant> {
        match self {
            Symbol::IntLiteral(v) => Some(Constant::Int(*v)),
            Symbol::FloatLiteral(v) => Some(Constant::Float(*v)),
            Symbol::StringLiteral(s) => Some(Constant::Str(s.clone())),
            _ => None,
        }
    }
}

impl From<Constant> for Symbol {
    fn from(constant: Constant) -> Self {
        match constant {
            Constant::Int(v) => Symbol::IntLiteral(v),
            Constant::Float(v) => Symbol::FloatLiteral(v),
            Constant::Str(s) => Symbol::StringLiteral(s),
        }
    }
}

/// A fully parsed expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Postfix order
    pub symbols: Vec<Symbol>,
    /// Unified operand type (for a comparison, the type of both sides)
    pub ty: DataType,
    /// The comparison operator, when the expression is a condition
    pub relational: Option<Operator>,
}

impl Expression {
    /// Value of an expression that folded down to a single literal
    pub fn constant(&self) -> Option<Constant> {
        match self.symbols.as_slice() {
            [single] => single.constant(),
            _ => None,
        }
    }
}
