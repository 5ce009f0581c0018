//! Name resolution: variable scopes and the function signature table

pub mod functions;
pub mod symbols;

pub use functions::{CallId, CallRecord, FunctionSig, FunctionTable};
pub use symbols::{BLANK, Declared, Scope, SymbolTable, VarId, Variable};
