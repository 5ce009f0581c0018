//! IFJ20 compiler
//!
//! Compiles IFJ20, a small statically typed language with Go-like syntax,
//! into IFJcode20 stack-machine code in a single pass:
//! - Pull-based lexer with significant newlines
//! - Recursive descent parser with embedded type checking
//! - Operator-precedence expression evaluator with constant folding
//! - Direct emission of IFJcode20 text
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Parser ─┬─ Symbol tables
//!                          ├─ Expression builder → Optimizer
//!                          └─ Emitter → IFJcode20
//! ```
//!
//! Nothing is kept between statements except the symbol tables and the
//! emitter's buffers. Calls are validated after the last function.
//!
//! # Example
//!
//! ```
//! let program = "package main\nfunc main() {\n  print(2 + 3)\n}\n";
//! let code = ifjc::compile(program).unwrap();
//! assert!(code.contains("PUSHS int@5"));
//! ```

pub mod codegen;
pub mod common;
pub mod diagnostics;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod types;

// Re-export diagnostics for convenience
pub use diagnostics::{CompileError, SourceFile};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile IFJ20 source code to IFJcode20 text
pub fn compile(source: &str) -> Result<String, CompileError> {
    parser::parse(source)
}

/// Lex source code without compiling
pub fn tokens(source: &str) -> Result<Vec<lexer::Token>, CompileError> {
    lexer::lex(source)
}
