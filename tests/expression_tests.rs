//! Expression evaluator and optimizer tests

use ifjc::expr::{ExprBuilder, ExprError, Operator, Symbol, ZeroDivision, optimize};
use ifjc::types::DataType;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Fully parenthesized integer expression
#[derive(Debug, Clone)]
enum Tree {
    Leaf(i64),
    Node(Box<Tree>, Operator, Box<Tree>),
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = (-50i64..50).prop_map(Tree::Leaf);
    leaf.prop_recursive(4, 32, 2, |inner| {
        let op = prop_oneof![
            Just(Operator::Add),
            Just(Operator::Sub),
            Just(Operator::Mul),
            Just(Operator::Div),
        ];
        (inner.clone(), op, inner)
            .prop_map(|(lhs, op, rhs)| Tree::Node(Box::new(lhs), op, Box::new(rhs)))
    })
}

fn feed(tree: &Tree, builder: &mut ExprBuilder) {
    match tree {
        Tree::Leaf(v) => builder.operand(Symbol::IntLiteral(*v), DataType::Int).unwrap(),
        Tree::Node(lhs, op, rhs) => {
            builder.open().unwrap();
            feed(lhs, builder);
            builder.operator(*op).unwrap();
            feed(rhs, builder);
            builder.close().unwrap();
        }
    }
}

/// Reference evaluation; `None` when some divisor is zero
fn eval(tree: &Tree) -> Option<i64> {
    match tree {
        Tree::Leaf(v) => Some(*v),
        Tree::Node(lhs, op, rhs) => {
            let (a, b) = (eval(lhs)?, eval(rhs)?);
            match op {
                Operator::Add => Some(a.wrapping_add(b)),
                Operator::Sub => Some(a.wrapping_sub(b)),
                Operator::Mul => Some(a.wrapping_mul(b)),
                _ if b == 0 => None,
                _ => Some(a.wrapping_div(b)),
            }
        }
    }
}

fn build(tree: &Tree) -> Vec<Symbol> {
    let mut builder = ExprBuilder::new();
    feed(tree, &mut builder);
    builder.finish().unwrap().symbols
}

proptest! {
    #[test]
    fn prop_folding_is_sound(tree in tree()) {
        let folded = optimize(build(&tree), |_| false);
        match eval(&tree) {
            Some(value) => prop_assert_eq!(folded, Ok(vec![Symbol::IntLiteral(value)])),
            None => prop_assert_eq!(folded, Err(ZeroDivision)),
        }
    }

    #[test]
    fn prop_postfix_has_every_operand(tree in tree()) {
        fn leaves(tree: &Tree) -> usize {
            match tree {
                Tree::Leaf(_) => 1,
                Tree::Node(lhs, _, rhs) => leaves(lhs) + leaves(rhs),
            }
        }
        let symbols = build(&tree);
        let operands = symbols.iter().filter(|s| !s.is_operator()).count();
        prop_assert_eq!(operands, leaves(&tree));
        prop_assert_eq!(symbols.len(), 2 * operands - 1);
    }
}

#[test]
fn test_left_associativity() {
    // 8 - 4 - 2 = 2, not 6
    let mut builder = ExprBuilder::new();
    builder.operand(Symbol::IntLiteral(8), DataType::Int).unwrap();
    builder.operator(Operator::Sub).unwrap();
    builder.operand(Symbol::IntLiteral(4), DataType::Int).unwrap();
    builder.operator(Operator::Sub).unwrap();
    builder.operand(Symbol::IntLiteral(2), DataType::Int).unwrap();
    let expr = builder.finish().unwrap();
    assert_eq!(
        optimize(expr.symbols, |_| false).unwrap(),
        vec![Symbol::IntLiteral(2)]
    );
}

#[test]
fn test_comparison_of_sums() {
    // 1 + 2 <= 3 * 1
    let mut builder = ExprBuilder::new();
    builder.operand(Symbol::IntLiteral(1), DataType::Int).unwrap();
    builder.operator(Operator::Add).unwrap();
    builder.operand(Symbol::IntLiteral(2), DataType::Int).unwrap();
    builder.operator(Operator::Le).unwrap();
    builder.operand(Symbol::IntLiteral(3), DataType::Int).unwrap();
    builder.operator(Operator::Mul).unwrap();
    builder.operand(Symbol::IntLiteral(1), DataType::Int).unwrap();
    let expr = builder.finish().unwrap();
    assert_eq!(expr.relational, Some(Operator::Le));
    assert_eq!(
        optimize(expr.symbols, |_| false).unwrap(),
        vec![
            Symbol::IntLiteral(3),
            Symbol::IntLiteral(3),
            Symbol::Operator(Operator::Le)
        ]
    );
}

#[test]
fn test_untyped_operands_take_first_concrete_type() {
    let mut builder = ExprBuilder::new();
    builder.operand(Symbol::Call(String::new()), DataType::Untyped).unwrap();
    builder.operator(Operator::Add).unwrap();
    builder.operand(Symbol::FloatLiteral(1.0), DataType::Float).unwrap();
    builder.operator(Operator::Add).unwrap();
    assert_eq!(
        builder.operand(Symbol::IntLiteral(1), DataType::Int),
        Err(ExprError::Mismatch(DataType::Float, DataType::Int))
    );
}

#[test]
fn test_untyped_then_string_rejects_minus() {
    let mut builder = ExprBuilder::new();
    builder.operand(Symbol::Call(String::new()), DataType::Untyped).unwrap();
    builder.operator(Operator::Sub).unwrap();
    assert_eq!(
        builder.operand(Symbol::StringLiteral("s".into()), DataType::String),
        Err(ExprError::StringOperator(Operator::Sub))
    );
}

#[test]
fn test_float_folding() {
    let symbols = vec![
        Symbol::FloatLiteral(1.5),
        Symbol::FloatLiteral(0.25),
        Symbol::Operator(Operator::Mul),
    ];
    assert_eq!(
        optimize(symbols, |_| false).unwrap(),
        vec![Symbol::FloatLiteral(0.375)]
    );
}

#[test]
fn test_wrapping_overflow() {
    let symbols = vec![
        Symbol::IntLiteral(i64::MAX),
        Symbol::IntLiteral(1),
        Symbol::Operator(Operator::Add),
    ];
    assert_eq!(
        optimize(symbols, |_| false).unwrap(),
        vec![Symbol::IntLiteral(i64::MIN)]
    );
}

#[test]
fn test_error_classes() {
    assert!(ExprError::Unbalanced.is_syntax());
    assert!(ExprError::Empty.is_syntax());
    assert!(!ExprError::SecondRelational.is_syntax());
    assert!(!ExprError::StringOperator(Operator::Div).is_syntax());
}
