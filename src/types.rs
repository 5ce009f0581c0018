//! Value types of IFJ20 and their unification

use crate::lexer::TokenKind;
use serde::Serialize;

/// Static type of a variable, literal, parameter or expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Int,
    Float,
    String,
    /// Not yet known; fixed by the first combination with a concrete type
    Untyped,
}

impl DataType {
    /// Type named by a type keyword
    pub fn from_keyword(kind: TokenKind) -> Option<DataType> {
        match kind {
            TokenKind::Int => Some(DataType::Int),
            TokenKind::Float64 => Some(DataType::Float),
            TokenKind::String => Some(DataType::String),
            _ => None,
        }
    }

    /// Zero value in IFJcode20 operand notation
    pub fn zero_operand(self) -> &'static str {
        match self {
            DataType::Int | DataType::Untyped => "int@0",
            DataType::Float => "float@0x0p+0",
            DataType::String => "string@",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Float => "float64",
            DataType::String => "string",
            DataType::Untyped => "untyped",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compile-time value of a literal or a folded expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Constant {
    pub fn is_zero(&self) -> bool {
        match self {
            Constant::Int(v) => *v == 0,
            Constant::Float(v) => *v == 0.0,
            Constant::Str(_) => false,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Constant::Int(v) => *v == 1,
            Constant::Float(v) => *v == 1.0,
            Constant::Str(_) => false,
        }
    }
}

/// Combine two types; `None` when they are incompatible
pub fn unify(a: DataType, b: DataType) -> Option<DataType> {
    match (a, b) {
        (DataType::Untyped, other) | (other, DataType::Untyped) => Some(other),
        (a, b) if a == b => Some(a),
        _ => None,
    }
}

/// Pairwise unification of two type lists of equal length
pub fn unify_lists(expected: &[DataType], found: &[DataType]) -> bool {
    expected.len() == found.len()
        && expected
            .iter()
            .zip(found)
            .all(|(&a, &b)| unify(a, b).is_some())
}

/// Render a type list the way signatures are written, e.g. `(int, string)`
pub fn format_list(types: &[DataType]) -> String {
    let names: Vec<&str> = types.iter().map(|t| t.name()).collect();
    format!("({})", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unify() {
        assert_eq!(unify(DataType::Untyped, DataType::Int), Some(DataType::Int));
        assert_eq!(unify(DataType::Float, DataType::Untyped), Some(DataType::Float));
        assert_eq!(unify(DataType::String, DataType::String), Some(DataType::String));
        assert_eq!(unify(DataType::Untyped, DataType::Untyped), Some(DataType::Untyped));
        assert_eq!(unify(DataType::Int, DataType::Float), None);
    }

    #[test]
    fn test_unify_lists() {
        use DataType::*;
        assert!(unify_lists(&[Int, String], &[Untyped, String]));
        assert!(!unify_lists(&[Int], &[Int, Int]));
        assert!(!unify_lists(&[Int, String], &[Int, Float]));
        assert_eq!(format_list(&[Int, Float]), "(int, float64)");
    }
}
