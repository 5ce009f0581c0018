//! Postfix simplification
//!
//! A single pass over the postfix sequence with an output stack. Operators
//! whose two operands are literals are evaluated at compile time, and
//! arithmetic identities drop neutral operands. Division by a divisor that
//! is known to be zero is rejected before anything is folded into it.
//!
//! Comparisons are never evaluated; a condition keeps its operator so the
//! code generator can still branch on it.

use super::{Operator, Symbol};
use crate::resolve::VarId;
use crate::types::Constant;
use thiserror::Error;

/// A divisor was zero at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("division by zero")]
pub struct ZeroDivision;

/// Simplify a postfix expression
///
/// `known_zero` reports variables whose current value is a zero constant.
pub fn optimize(
    symbols: Vec<Symbol>,
    known_zero: impl Fn(VarId) -> bool,
) -> Result<Vec<Symbol>, ZeroDivision> {
    let mut out: Vec<Symbol> = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let Symbol::Operator(op) = symbol else {
            out.push(symbol);
            continue;
        };

        if op == Operator::Div {
            let zero_divisor = match out.last() {
                Some(Symbol::Variable(id)) => known_zero(*id),
                Some(other) => other.constant().is_some_and(|c| c.is_zero()),
                None => false,
            };
            if zero_divisor {
                return Err(ZeroDivision);
            }
        }

        if op.is_relational() {
            out.push(Symbol::Operator(op));
            continue;
        }

        reduce(&mut out, op);
    }

    Ok(out)
}

/// Apply `op` to the top of `out`, folding where possible
fn reduce(out: &mut Vec<Symbol>, op: Operator) {
    let n = out.len();
    let leaves = n >= 2 && !out[n - 1].is_operator() && !out[n - 2].is_operator();

    if leaves {
        if let (Some(lhs), Some(rhs)) = (out[n - 2].constant(), out[n - 1].constant()) {
            if let Some(value) = fold(op, &lhs, &rhs) {
                out.truncate(n - 2);
                out.push(value.into());
                return;
            }
        }

        // left identities need to know exactly where the left operand starts
        if let Some(lhs) = out[n - 2].constant() {
            let drop_left = match op {
                Operator::Add => lhs.is_zero(),
                Operator::Mul => lhs.is_one(),
                _ => false,
            };
            if drop_left {
                out.remove(n - 2);
                return;
            }
            if op == Operator::Mul && lhs.is_zero() && matches!(out[n - 1], Symbol::Variable(_)) {
                out.pop();
                return;
            }
        }

        if let Some(rhs) = out[n - 1].constant() {
            if op == Operator::Mul && rhs.is_zero() && matches!(out[n - 2], Symbol::Variable(_)) {
                out.remove(n - 2);
                return;
            }
        }
    }

    // right identities hold for any left operand
    if let Some(rhs) = out.last().and_then(Symbol::constant) {
        let drop_right = match op {
            Operator::Add | Operator::Sub => rhs.is_zero(),
            Operator::Mul | Operator::Div => rhs.is_one(),
            _ => false,
        };
        if drop_right && n >= 2 {
            out.pop();
            return;
        }
    }

    out.push(Symbol::Operator(op));
}

fn fold(op: Operator, lhs: &Constant, rhs: &Constant) -> Option<Constant> {
    match (lhs, rhs) {
        (Constant::Int(a), Constant::Int(b)) => Some(Constant::Int(match op {
            Operator::Add => a.wrapping_add(*b),
            Operator::Sub => a.wrapping_sub(*b),
            Operator::Mul => a.wrapping_mul(*b),
            Operator::Div if *b != 0 => a.wrapping_div(*b),
            _ => return None,
        })),
        (Constant::Float(a), Constant::Float(b)) => {
            let value = match op {
                Operator::Add => a + b,
                Operator::Sub => a - b,
                Operator::Mul => a * b,
                Operator::Div => a / b,
                _ => return None,
            };
            value.is_finite().then_some(Constant::Float(value))
        }
        (Constant::Str(a), Constant::Str(b)) if op == Operator::Add => {
            Some(Constant::Str(format!("{a}{b}")))
        }
        _ => None,
    }
}
