//! Operator-precedence table
//!
//! Rows are the class of the terminal on top of the evaluator stack,
//! columns the class of the incoming symbol.

/// Precedence class of an expression symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolClass {
    /// `+ -`
    Additive,
    /// `* /`
    Multiplicative,
    Open,
    Close,
    /// `== != < <= > >=`
    Relational,
    /// Variable, literal or call
    Operand,
    /// Bottom of stack / end of input
    End,
}

impl SymbolClass {
    fn index(self) -> usize {
        match self {
            SymbolClass::Additive => 0,
            SymbolClass::Multiplicative => 1,
            SymbolClass::Open => 2,
            SymbolClass::Close => 3,
            SymbolClass::Relational => 4,
            SymbolClass::Operand => 5,
            SymbolClass::End => 6,
        }
    }
}

/// What to do with the incoming symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Push the incoming terminal (operands go straight to the output)
    Shift,
    /// Pop the top operator into the output and look again
    Reduce,
    /// `)` met its `(`; both are dropped
    BracketMatch,
    /// End met the bottom marker; the expression is complete
    Accept,
    Error,
}

use self::Action::{Accept as A, BracketMatch as B, Error as E, Reduce as R, Shift as S};

#[rustfmt::skip]
const TABLE: [[Action; 7]; 7] = [
    //             +-  */  (   )   rel opd $
    /* +-   */    [R,  S,  S,  R,  R,  S,  R],
    /* * /  */    [R,  R,  S,  R,  R,  S,  R],
    /* (    */    [S,  S,  S,  B,  S,  S,  E],
    /* )    */    [E,  E,  E,  E,  E,  E,  E],
    /* rel  */    [S,  S,  S,  R,  E,  S,  R],
    /* opd  */    [E,  E,  E,  E,  E,  E,  E],
    /* $    */    [S,  S,  S,  E,  S,  S,  A],
];

/// Look up the action for `top` meeting `incoming`
pub fn action(top: SymbolClass, incoming: SymbolClass) -> Action {
    TABLE[top.index()][incoming.index()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::SymbolClass::*;

    #[test]
    fn test_precedence() {
        assert_eq!(action(Additive, Multiplicative), Action::Shift);
        assert_eq!(action(Multiplicative, Additive), Action::Reduce);
        assert_eq!(action(Additive, Additive), Action::Reduce);
        assert_eq!(action(Relational, Additive), Action::Shift);
        assert_eq!(action(Additive, Relational), Action::Reduce);
    }

    #[test]
    fn test_brackets_and_end() {
        assert_eq!(action(Open, Close), Action::BracketMatch);
        assert_eq!(action(End, End), Action::Accept);
        assert_eq!(action(End, Close), Action::Error);
        assert_eq!(action(Open, End), Action::Error);
        assert_eq!(action(Relational, Relational), Action::Error);
    }
}
