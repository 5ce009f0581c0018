//! Lowering of postfix expressions to stack instructions

use super::{Emitter, RESULT, operand};
use crate::diagnostics::Result;
use crate::expr::{Expression, Operator, Symbol};
use crate::resolve::SymbolTable;
use crate::types::DataType;

const TMP0: &str = "GF@%tmp0";
const TMP1: &str = "GF@%tmp1";
const TMP2: &str = "GF@%tmp2";

impl Emitter {
    /// Push the value of `expr` onto the data stack
    pub fn expression(&mut self, expr: &Expression, symbols: &SymbolTable) -> Result<()> {
        let mut previous: Option<&Symbol> = None;
        for symbol in &expr.symbols {
            match symbol {
                Symbol::Operator(op) => self.operator(*op, expr.ty, previous)?,
                Symbol::Variable(id) => {
                    let slot = symbols.get(*id).slot();
                    self.line(format!("PUSHS {}", operand::local(&slot)));
                }
                Symbol::Call(code) => self.raw(code),
                literal => {
                    if let Some(value) = literal.constant() {
                        self.line(format!("PUSHS {}", operand::constant(&value)));
                    }
                }
            }
            previous = Some(symbol);
        }
        Ok(())
    }

    /// Evaluate a comparison into the condition register
    pub fn condition(&mut self, expr: &Expression, symbols: &SymbolTable) -> Result<()> {
        self.expression(expr, symbols)?;
        self.line(format!("POPS {RESULT}"));
        Ok(())
    }

    fn operator(&mut self, op: Operator, ty: DataType, previous: Option<&Symbol>) -> Result<()> {
        match op {
            Operator::Add => match ty {
                DataType::String => self.concat(),
                DataType::Untyped => self.dynamic_add()?,
                _ => self.line("ADDS"),
            },
            Operator::Sub => self.line("SUBS"),
            Operator::Mul => self.line("MULS"),
            Operator::Div => {
                let safe = previous
                    .and_then(Symbol::constant)
                    .is_some_and(|c| !c.is_zero());
                match ty {
                    DataType::Untyped => self.dynamic_div()?,
                    DataType::Float => {
                        if !safe {
                            self.zero_guard("float@0x0p+0")?;
                        }
                        self.line("DIVS");
                    }
                    _ => {
                        if !safe {
                            self.zero_guard("int@0")?;
                        }
                        self.line("IDIVS");
                    }
                }
            }
            Operator::Eq => self.line("EQS"),
            Operator::Ne => {
                self.line("EQS");
                self.line("NOTS");
            }
            Operator::Lt => self.line("LTS"),
            Operator::Gt => self.line("GTS"),
            Operator::Le => self.or_equal("LTS"),
            Operator::Ge => self.or_equal("GTS"),
        }
        Ok(())
    }

    fn concat(&mut self) {
        self.line(format!("POPS {TMP2}"));
        self.line(format!("POPS {TMP1}"));
        self.line(format!("CONCAT {TMP1} {TMP1} {TMP2}"));
        self.line(format!("PUSHS {TMP1}"));
    }

    /// `+` on operands whose type is only known at run time
    fn dynamic_add(&mut self) -> Result<()> {
        let label = self.next_label()?;
        self.line(format!("POPS {TMP2}"));
        self.line(format!("POPS {TMP1}"));
        self.line(format!("TYPE {TMP0} {TMP1}"));
        self.line(format!("JUMPIFEQ {label}$concat {TMP0} string@string"));
        self.line(format!("PUSHS {TMP1}"));
        self.line(format!("PUSHS {TMP2}"));
        self.line("ADDS");
        self.line(format!("JUMP {label}$added"));
        self.line(format!("LABEL {label}$concat"));
        self.line(format!("CONCAT {TMP1} {TMP1} {TMP2}"));
        self.line(format!("PUSHS {TMP1}"));
        self.line(format!("LABEL {label}$added"));
        Ok(())
    }

    /// Exit with code 9 when the divisor on top of the stack is `zero`
    fn zero_guard(&mut self, zero: &str) -> Result<()> {
        let label = self.next_label()?;
        self.line(format!("POPS {TMP2}"));
        self.line(format!("JUMPIFNEQ {label}$div {TMP2} {zero}"));
        self.line("EXIT int@9");
        self.line(format!("LABEL {label}$div"));
        self.line(format!("PUSHS {TMP2}"));
        Ok(())
    }

    /// `/` dispatched on the divisor's run-time type
    fn dynamic_div(&mut self) -> Result<()> {
        let label = self.next_label()?;
        self.line(format!("POPS {TMP2}"));
        self.line(format!("TYPE {TMP0} {TMP2}"));
        self.line(format!("JUMPIFEQ {label}$fdiv {TMP0} string@float"));
        self.line(format!("JUMPIFNEQ {label}$idiv {TMP2} int@0"));
        self.line("EXIT int@9");
        self.line(format!("LABEL {label}$idiv"));
        self.line(format!("PUSHS {TMP2}"));
        self.line("IDIVS");
        self.line(format!("JUMP {label}$divided"));
        self.line(format!("LABEL {label}$fdiv"));
        self.line(format!("JUMPIFNEQ {label}$nonzero {TMP2} float@0x0p+0"));
        self.line("EXIT int@9");
        self.line(format!("LABEL {label}$nonzero"));
        self.line(format!("PUSHS {TMP2}"));
        self.line("DIVS");
        self.line(format!("LABEL {label}$divided"));
        Ok(())
    }

    /// `<=` and `>=`: strict comparison OR equality
    fn or_equal(&mut self, strict: &str) {
        self.line(format!("POPS {TMP2}"));
        self.line(format!("POPS {TMP1}"));
        self.line(format!("PUSHS {TMP1}"));
        self.line(format!("PUSHS {TMP2}"));
        self.line(strict);
        self.line(format!("PUSHS {TMP1}"));
        self.line(format!("PUSHS {TMP2}"));
        self.line("EQS");
        self.line("ORS");
    }
}
