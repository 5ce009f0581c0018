//! Diagnostic reporting with source locations
//!
//! Every error the compiler can raise is a [`CompileError`]. Compilation
//! aborts on the first one, so there is no collection or recovery; the CLI
//! renders the single error with miette and exits with
//! [`CompileError::exit_code`].

use crate::common::Span;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Source file for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }

    /// Wrap an error into a report that renders against this file
    pub fn report(&self, error: CompileError) -> miette::Report {
        miette::Report::new(error).with_source_code(self.to_named_source())
    }
}

/// Convert our Span to miette's SourceSpan
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// Compiler diagnostic
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum CompileError {
    // === Lexical Errors ===
    #[error("line {line}: {message}")]
    #[diagnostic(code(lex::structure))]
    Lexical {
        message: String,
        line: usize,
        #[label("invalid lexeme")]
        span: SourceSpan,
    },

    // === Syntax Errors ===
    #[error("line {line}: unexpected `{found}` after `{previous}`, expected {expected}")]
    #[diagnostic(code(parse::unexpected_token))]
    Syntax {
        expected: String,
        found: String,
        previous: String,
        line: usize,
        #[label("unexpected token here")]
        span: SourceSpan,
    },

    // === Semantic Errors ===
    #[error("line {line}: {message}")]
    #[diagnostic(
        code(semantic::undefined_or_redefined),
        help("functions are global and unique; variables must be declared with `:=` before `=`")
    )]
    UndefinedOrRedefined {
        message: String,
        line: usize,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("line {line}: cannot infer the type of `{name}`")]
    #[diagnostic(code(semantic::variable_type))]
    VariableType {
        name: String,
        line: usize,
        #[label("type cannot be derived from this value")]
        span: SourceSpan,
    },

    #[error("line {line}: {message}")]
    #[diagnostic(code(semantic::type_compatibility))]
    TypeCompatibility {
        message: String,
        line: usize,
        #[label("incompatible types")]
        span: SourceSpan,
    },

    #[error("line {line}: {message}")]
    #[diagnostic(
        code(semantic::function_params),
        help("argument and return lists must match the function signature")
    )]
    FunctionParams {
        message: String,
        line: usize,
        #[label("signature mismatch")]
        span: SourceSpan,
    },

    #[error("line {line}: {message}")]
    #[diagnostic(code(semantic::other))]
    SemanticOther {
        message: String,
        line: usize,
        #[label("here")]
        span: SourceSpan,
    },

    // === Evaluation Errors ===
    #[error("line {line}: division by zero")]
    #[diagnostic(code(semantic::zero_division))]
    ZeroDivision {
        line: usize,
        #[label("divisor is zero")]
        span: SourceSpan,
    },

    // === Internal Errors ===
    #[error("internal compiler error: {message}")]
    #[diagnostic(code(internal))]
    Internal { message: String },
}

impl CompileError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Lexical { .. } => 1,
            CompileError::Syntax { .. } => 2,
            CompileError::UndefinedOrRedefined { .. } => 3,
            CompileError::VariableType { .. } => 4,
            CompileError::TypeCompatibility { .. } => 5,
            CompileError::FunctionParams { .. } => 6,
            CompileError::SemanticOther { .. } => 7,
            CompileError::ZeroDivision { .. } => 9,
            CompileError::Internal { .. } => 99,
        }
    }

    /// Source line the error points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::Lexical { line, .. }
            | CompileError::Syntax { line, .. }
            | CompileError::UndefinedOrRedefined { line, .. }
            | CompileError::VariableType { line, .. }
            | CompileError::TypeCompatibility { line, .. }
            | CompileError::FunctionParams { line, .. }
            | CompileError::SemanticOther { line, .. }
            | CompileError::ZeroDivision { line, .. } => Some(*line),
            CompileError::Internal { .. } => None,
        }
    }

    pub fn lexical(message: impl Into<String>, line: usize, span: Span) -> Self {
        CompileError::Lexical {
            message: message.into(),
            line,
            span: span.into(),
        }
    }

    pub fn undefined(message: impl Into<String>, line: usize, span: Span) -> Self {
        CompileError::UndefinedOrRedefined {
            message: message.into(),
            line,
            span: span.into(),
        }
    }

    pub fn type_compat(message: impl Into<String>, line: usize, span: Span) -> Self {
        CompileError::TypeCompatibility {
            message: message.into(),
            line,
            span: span.into(),
        }
    }

    pub fn params(message: impl Into<String>, line: usize, span: Span) -> Self {
        CompileError::FunctionParams {
            message: message.into(),
            line,
            span: span.into(),
        }
    }

    pub fn semantic(message: impl Into<String>, line: usize, span: Span) -> Self {
        CompileError::SemanticOther {
            message: message.into(),
            line,
            span: span.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal {
            message: message.into(),
        }
    }
}

/// Result alias used throughout the compiler
pub type Result<T, E = CompileError> = std::result::Result<T, E>;
