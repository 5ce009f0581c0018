//! Function signatures and deferred call-site validation
//!
//! Functions may be called before they are defined, so calls are only
//! recorded while parsing. Once the whole program has been read,
//! [`FunctionTable::validate_calls`] checks every record against the final
//! signature table.

use crate::common::Span;
use crate::diagnostics::{CompileError, Result};
use crate::types::{DataType, format_list, unify_lists};
use indexmap::IndexMap;

use crate::types::DataType::{Float, Int, String as Str};

/// Signature of a user or built-in function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<DataType>,
    pub returns: Vec<DataType>,
    /// Accepts any number of arguments of any type (`print`)
    pub variadic: bool,
    pub builtin: bool,
    /// Set once the body contained a `return` statement
    pub used_return: bool,
    pub line: usize,
    pub span: Span,
}

impl FunctionSig {
    pub fn user(name: impl Into<String>, line: usize, span: Span) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: Vec::new(),
            variadic: false,
            builtin: false,
            used_return: false,
            line,
            span,
        }
    }
}

/// What a call site passed and what it expects back
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub callee: String,
    pub args: Vec<DataType>,
    pub returns: Vec<DataType>,
    pub line: usize,
    pub span: Span,
}

/// Handle to a recorded call, used to fill in its expected returns later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallId(usize);

/// Built-in functions: name, parameters, returns
const BUILTINS: &[(&str, &[DataType], &[DataType])] = &[
    ("inputs", &[], &[Str, Int]),
    ("inputi", &[], &[Int, Int]),
    ("inputf", &[], &[Float, Int]),
    ("print", &[], &[]),
    ("int2float", &[Int], &[Float]),
    ("float2int", &[Float], &[Int]),
    ("len", &[Str], &[Int]),
    ("substr", &[Str, Int, Int], &[Str, Int]),
    ("ord", &[Str, Int], &[Int, Int]),
    ("chr", &[Int], &[Str, Int]),
];

/// Global function namespace plus the pending call records
#[derive(Debug)]
pub struct FunctionTable {
    functions: IndexMap<String, FunctionSig>,
    calls: Vec<CallRecord>,
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionTable {
    pub fn new() -> Self {
        let mut table = Self {
            functions: IndexMap::new(),
            calls: Vec::new(),
        };
        table.register_builtins();
        table
    }

    fn register_builtins(&mut self) {
        for (name, params, returns) in BUILTINS {
            self.functions.insert(
                name.to_string(),
                FunctionSig {
                    name: name.to_string(),
                    params: params.to_vec(),
                    returns: returns.to_vec(),
                    variadic: *name == "print",
                    builtin: true,
                    used_return: true,
                    line: 0,
                    span: Span::default(),
                },
            );
        }
    }

    /// Add a user function; names are global and cannot be redefined
    pub fn define(&mut self, sig: FunctionSig) -> Result<()> {
        if let Some(existing) = self.functions.get(&sig.name) {
            let message = if existing.builtin {
                format!("`{}` is a built-in function", sig.name)
            } else {
                format!(
                    "function `{}` is already defined on line {}",
                    sig.name, existing.line
                )
            };
            return Err(CompileError::undefined(message, sig.line, sig.span));
        }
        self.functions.insert(sig.name.clone(), sig);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSig> {
        self.functions.get(name)
    }

    /// Record that the body of `name` returned a value
    pub fn mark_returned(&mut self, name: &str) {
        if let Some(sig) = self.functions.get_mut(name) {
            sig.used_return = true;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// User-defined functions in definition order
    pub fn user_functions(&self) -> impl Iterator<Item = &FunctionSig> {
        self.functions.values().filter(|f| !f.builtin)
    }

    pub fn record_call(&mut self, record: CallRecord) -> CallId {
        self.calls.push(record);
        CallId(self.calls.len() - 1)
    }

    pub fn call_mut(&mut self, id: CallId) -> &mut CallRecord {
        &mut self.calls[id.0]
    }

    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    /// Check every recorded call against the complete signature table
    pub fn validate_calls(&self) -> Result<()> {
        for call in &self.calls {
            let Some(sig) = self.functions.get(&call.callee) else {
                return Err(CompileError::undefined(
                    format!("call to undefined function `{}`", call.callee),
                    call.line,
                    call.span,
                ));
            };

            if sig.variadic {
                if !call.returns.is_empty() {
                    return Err(CompileError::params(
                        format!("`{}` does not return a value", sig.name),
                        call.line,
                        call.span,
                    ));
                }
                continue;
            }

            if !unify_lists(&sig.params, &call.args) {
                return Err(CompileError::params(
                    format!(
                        "`{}` takes {} but was called with {}",
                        sig.name,
                        format_list(&sig.params),
                        format_list(&call.args)
                    ),
                    call.line,
                    call.span,
                ));
            }

            if !unify_lists(&sig.returns, &call.returns) {
                return Err(CompileError::params(
                    format!(
                        "`{}` returns {} but the call site expects {}",
                        sig.name,
                        format_list(&sig.returns),
                        format_list(&call.returns)
                    ),
                    call.line,
                    call.span,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(callee: &str, args: &[DataType], returns: &[DataType]) -> CallRecord {
        CallRecord {
            callee: callee.to_string(),
            args: args.to_vec(),
            returns: returns.to_vec(),
            line: 1,
            span: Span::new(0, 1),
        }
    }

    #[test]
    fn test_builtins_registered() {
        let table = FunctionTable::new();
        for (name, _, _) in BUILTINS {
            assert!(table.get(name).is_some_and(|f| f.builtin));
        }
        assert!(table.get("print").unwrap().variadic);
        assert_eq!(table.get("substr").unwrap().params, vec![Str, Int, Int]);
        assert_eq!(table.user_functions().count(), 0);
    }

    #[test]
    fn test_redefinition() {
        let mut table = FunctionTable::new();
        table.define(FunctionSig::user("f", 2, Span::new(0, 1))).unwrap();
        let err = table.define(FunctionSig::user("f", 5, Span::new(9, 10)));
        assert_eq!(err.unwrap_err().exit_code(), 3);
    }

    #[test]
    fn test_mark_returned() {
        let mut table = FunctionTable::new();
        table.define(FunctionSig::user("f", 1, Span::new(0, 1))).unwrap();
        assert!(!table.get("f").unwrap().used_return);
        table.mark_returned("f");
        assert!(table.get("f").unwrap().used_return);
    }

    #[test]
    fn test_forward_reference_resolves() {
        let mut table = FunctionTable::new();
        table.record_call(call("later", &[Int], &[DataType::Untyped]));
        let mut sig = FunctionSig::user("later", 3, Span::new(0, 1));
        sig.params = vec![Int];
        sig.returns = vec![Str];
        table.define(sig).unwrap();
        assert!(table.validate_calls().is_ok());
    }

    #[test]
    fn test_undefined_callee() {
        let mut table = FunctionTable::new();
        table.record_call(call("g", &[Int, Int], &[]));
        assert_eq!(table.validate_calls().unwrap_err().exit_code(), 3);
    }

    #[test]
    fn test_mismatches() {
        let mut table = FunctionTable::new();
        table.record_call(call("len", &[Int], &[Int]));
        assert_eq!(table.validate_calls().unwrap_err().exit_code(), 6);

        let mut table = FunctionTable::new();
        let id = table.record_call(call("inputi", &[], &[]));
        assert_eq!(table.validate_calls().unwrap_err().exit_code(), 6);
        table.call_mut(id).returns = vec![Int, DataType::Untyped];
        assert!(table.validate_calls().is_ok());
    }

    #[test]
    fn test_print_takes_anything_returns_nothing() {
        let mut table = FunctionTable::new();
        table.record_call(call("print", &[Int, Str, Float], &[]));
        assert!(table.validate_calls().is_ok());
        table.record_call(call("print", &[], &[Int]));
        assert_eq!(table.validate_calls().unwrap_err().exit_code(), 6);
    }
}
