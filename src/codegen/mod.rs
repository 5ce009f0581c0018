//! IFJcode20 code generation
//!
//! The [`Emitter`] owns all output. Program-level text goes straight to the
//! output buffer; while a function is open its code is split into a header,
//! a declaration buffer and a body, because every `DEFVAR` has to execute
//! exactly once per call even when the variable is declared inside a loop.
//! The three parts are spliced into the output when the function ends.
//!
//! Capture buffers temporarily redirect emitted lines so that code can be
//! produced now and placed later: call arguments, calls used as operands
//! and the step statement of a `for` loop.

mod builtins;
mod expr;
pub mod operand;

pub use builtins::library;

use crate::diagnostics::{CompileError, Result};
use crate::types::DataType;
use tracing::{debug, trace};

/// Global registers every program starts with
const HEADER: &str = "\
.IFJcode20
DEFVAR GF@%res
MOVE GF@%res int@0
DEFVAR GF@%tmp0
MOVE GF@%tmp0 bool@false
DEFVAR GF@%tmp1
MOVE GF@%tmp1 int@0
DEFVAR GF@%tmp2
MOVE GF@%tmp2 int@0
DEFVAR GF@%void
MOVE GF@%void nil@nil
JUMP $main
";

const PROGRAM_END: &str = "LABEL $$EOF\n";

/// Condition result register
pub const RESULT: &str = "GF@%res";
/// Sink for discarded values
pub const VOID: &str = "GF@%void";

/// How arguments reach the callee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallConvention {
    /// Arguments are moved into `TF@%0..` before `CALL`
    Framed,
    /// Arguments and their count stay on the data stack (`print`)
    Variadic,
}

#[derive(Debug)]
struct FunctionBuffers {
    name: String,
    header: String,
    declarations: String,
    body: String,
    labels: usize,
}

/// Output state threaded through the parser
#[derive(Debug)]
pub struct Emitter {
    output: String,
    function: Option<FunctionBuffers>,
    captures: Vec<String>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    /// Start a program: header registers followed by the built-in library
    pub fn new() -> Self {
        let mut output = String::from(HEADER);
        output.push_str(&library());
        Self {
            output,
            function: None,
            captures: Vec::new(),
        }
    }

    // ==================== SINKS ====================

    /// Append one instruction line to the innermost active buffer
    pub fn line(&mut self, text: impl AsRef<str>) {
        let sink = self.sink();
        sink.push_str(text.as_ref());
        sink.push('\n');
    }

    /// Append already formatted lines to the innermost active buffer
    pub fn raw(&mut self, text: &str) {
        self.sink().push_str(text);
    }

    fn sink(&mut self) -> &mut String {
        if let Some(capture) = self.captures.last_mut() {
            capture
        } else if let Some(function) = self.function.as_mut() {
            &mut function.body
        } else {
            &mut self.output
        }
    }

    /// Redirect subsequent lines into a fresh capture buffer
    pub fn begin_capture(&mut self) {
        self.captures.push(String::new());
    }

    /// Stop the innermost capture and hand back its text
    pub fn end_capture(&mut self) -> Result<String> {
        self.captures
            .pop()
            .ok_or_else(|| CompileError::internal("capture buffer closed twice"))
    }

    fn current(&mut self) -> Result<&mut FunctionBuffers> {
        self.function
            .as_mut()
            .ok_or_else(|| CompileError::internal("code emitted outside of a function"))
    }

    /// Fresh label prefix `$function$n`
    pub fn next_label(&mut self) -> Result<String> {
        let function = self.current()?;
        function.labels += 1;
        Ok(format!("${}${}", function.name, function.labels))
    }

    // ==================== FUNCTIONS ====================

    /// Open a function and initialize its return slots
    pub fn begin_function(&mut self, name: &str, returns: &[DataType]) -> Result<()> {
        if let Some(open) = &self.function {
            return Err(CompileError::internal(format!(
                "function `{name}` started while `{}` is still open",
                open.name
            )));
        }

        let mut header = format!("\nLABEL ${name}\n");
        if name == "main" {
            header.push_str("CREATEFRAME\n");
        }
        header.push_str("PUSHFRAME\n");

        let mut declarations = String::new();
        for (i, ty) in returns.iter().enumerate() {
            declarations.push_str(&format!("DEFVAR LF@%retval{i}\n"));
            declarations.push_str(&format!("MOVE LF@%retval{i} {}\n", ty.zero_operand()));
        }

        self.function = Some(FunctionBuffers {
            name: name.to_string(),
            header,
            declarations,
            body: String::new(),
            labels: 0,
        });
        Ok(())
    }

    /// Copy the `index`-th argument into the parameter's slot
    pub fn parameter(&mut self, slot: &str, index: usize) -> Result<()> {
        let function = self.current()?;
        function.declarations.push_str(&format!("DEFVAR LF@{slot}\n"));
        function
            .body
            .push_str(&format!("MOVE LF@{slot} LF@%{index}\n"));
        Ok(())
    }

    /// Hoisted `DEFVAR` for a local slot
    pub fn declare(&mut self, slot: &str) -> Result<()> {
        let function = self.current()?;
        function.declarations.push_str(&format!("DEFVAR LF@{slot}\n"));
        Ok(())
    }

    /// Close the function: emit the epilogue and splice its parts
    pub fn end_function(&mut self) -> Result<()> {
        if !self.captures.is_empty() {
            return Err(CompileError::internal("capture left open at end of function"));
        }
        let function = self
            .function
            .take()
            .ok_or_else(|| CompileError::internal("no function to close"))?;

        debug!(
            function = %function.name,
            declarations = function.declarations.lines().count(),
            body = function.body.lines().count(),
            "function generated"
        );

        self.output.push_str(&function.header);
        self.output.push_str(&function.declarations);
        self.output.push_str(&function.body);
        self.output
            .push_str(&format!("LABEL ${}$return\n", function.name));
        if function.name == "main" {
            self.output.push_str("CLEARS\nJUMP $$EOF\n");
        } else {
            self.output.push_str("POPFRAME\nRETURN\n");
        }
        Ok(())
    }

    /// Finish the program and return the complete text
    pub fn finish(mut self) -> Result<String> {
        if let Some(open) = &self.function {
            return Err(CompileError::internal(format!(
                "function `{}` was never closed",
                open.name
            )));
        }
        if !self.captures.is_empty() {
            return Err(CompileError::internal("unbalanced capture buffers"));
        }
        self.output.push('\n');
        self.output.push_str(PROGRAM_END);
        Ok(self.output)
    }

    // ==================== STATEMENTS ====================

    /// Pop already pushed values into the targets, last target first.
    /// `None` is the blank identifier.
    pub fn store(&mut self, targets: &[Option<String>]) {
        for target in targets.iter().rev() {
            match target {
                Some(slot) => self.line(format!("POPS LF@{slot}")),
                None => self.line(format!("POPS {VOID}")),
            }
        }
    }

    /// Move the results of the call just made into the targets
    pub fn store_results(&mut self, targets: &[Option<String>]) {
        for (i, target) in targets.iter().enumerate() {
            if let Some(slot) = target {
                self.line(format!("MOVE LF@{slot} TF@%retval{i}"));
            }
        }
    }

    /// Pop `count` pushed values into the return slots and leave
    pub fn return_values(&mut self, count: usize) -> Result<()> {
        let name = self.current()?.name.clone();
        for i in (0..count).rev() {
            self.line(format!("POPS LF@%retval{i}"));
        }
        self.line(format!("JUMP ${name}$return"));
        Ok(())
    }

    pub fn if_start(&mut self, label: &str) {
        self.line(format!("JUMPIFNEQ {label}$else {RESULT} bool@true"));
    }

    pub fn if_else(&mut self, label: &str) {
        self.line(format!("JUMP {label}$endif"));
        self.line(format!("LABEL {label}$else"));
    }

    pub fn if_end(&mut self, label: &str) {
        self.line(format!("LABEL {label}$endif"));
    }

    pub fn for_start(&mut self, label: &str) {
        self.line(format!("LABEL {label}$for"));
    }

    pub fn for_check(&mut self, label: &str) {
        self.line(format!("JUMPIFNEQ {label}$endfor {RESULT} bool@true"));
    }

    /// Close a loop; `step` is the captured step statement
    pub fn for_end(&mut self, label: &str, step: &str) {
        self.raw(step);
        self.line(format!("JUMP {label}$for"));
        self.line(format!("LABEL {label}$endfor"));
    }

    /// Emit a call whose argument code was captured beforehand
    pub fn call(&mut self, name: &str, convention: CallConvention, args: &[String]) {
        trace!(callee = name, args = args.len(), ?convention, "call");
        match convention {
            CallConvention::Framed => {
                for arg in args {
                    self.raw(arg);
                }
                self.line("CREATEFRAME");
                for i in (0..args.len()).rev() {
                    self.line(format!("DEFVAR TF@%{i}"));
                    self.line(format!("POPS TF@%{i}"));
                }
            }
            CallConvention::Variadic => {
                for arg in args.iter().rev() {
                    self.raw(arg);
                }
                self.line(format!("PUSHS int@{}", args.len()));
                self.line("CREATEFRAME");
            }
        }
        self.line(format!("CALL ${name}"));
    }
}
