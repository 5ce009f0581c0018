//! Built-in function library
//!
//! Every built-in is a hand-written IFJcode20 routine placed right after
//! the program header. Callers pass arguments in `TF@%0..` like any other
//! framed call; `print` instead takes its values and their count on the
//! data stack. Results come back in `LF@%retval0`, and the fallible
//! built-ins report failure through `LF@%retval1`.

const SEPARATOR: &str = "# ----------------------------------------\n";

const LEN: &str = "\
LABEL $len
PUSHFRAME
DEFVAR LF@%retval0
STRLEN LF@%retval0 LF@%0
POPFRAME
RETURN
";

const INT2FLOAT: &str = "\
LABEL $int2float
PUSHFRAME
DEFVAR LF@%retval0
INT2FLOAT LF@%retval0 LF@%0
POPFRAME
RETURN
";

const FLOAT2INT: &str = "\
LABEL $float2int
PUSHFRAME
DEFVAR LF@%retval0
FLOAT2INT LF@%retval0 LF@%0
POPFRAME
RETURN
";

const INPUTS: &str = "\
LABEL $inputs
PUSHFRAME
DEFVAR LF@%retval0
DEFVAR LF@%retval1
DEFVAR LF@type
MOVE LF@%retval1 int@0
READ LF@%retval0 string
TYPE LF@type LF@%retval0
JUMPIFEQ $inputs$ok LF@type string@string
MOVE LF@%retval0 string@
MOVE LF@%retval1 int@1
LABEL $inputs$ok
POPFRAME
RETURN
";

const INPUTI: &str = "\
LABEL $inputi
PUSHFRAME
DEFVAR LF@%retval0
DEFVAR LF@%retval1
DEFVAR LF@type
MOVE LF@%retval1 int@0
READ LF@%retval0 int
TYPE LF@type LF@%retval0
JUMPIFEQ $inputi$ok LF@type string@int
MOVE LF@%retval0 int@0
MOVE LF@%retval1 int@1
LABEL $inputi$ok
POPFRAME
RETURN
";

const INPUTF: &str = "\
LABEL $inputf
PUSHFRAME
DEFVAR LF@%retval0
DEFVAR LF@%retval1
DEFVAR LF@type
MOVE LF@%retval1 int@0
READ LF@%retval0 float
TYPE LF@type LF@%retval0
JUMPIFEQ $inputf$ok LF@type string@float
MOVE LF@%retval0 float@0x0p+0
MOVE LF@%retval1 int@1
LABEL $inputf$ok
POPFRAME
RETURN
";

const PRINT: &str = "\
LABEL $print
PUSHFRAME
DEFVAR LF@count
DEFVAR LF@value
POPS LF@count
LABEL $print$loop
JUMPIFEQ $print$end LF@count int@0
POPS LF@value
WRITE LF@value
SUB LF@count LF@count int@1
JUMP $print$loop
LABEL $print$end
POPFRAME
RETURN
";

const SUBSTR: &str = "\
LABEL $substr
PUSHFRAME
DEFVAR LF@%retval0
DEFVAR LF@%retval1
DEFVAR LF@len
DEFVAR LF@cond
DEFVAR LF@end
DEFVAR LF@char
MOVE LF@%retval0 string@
MOVE LF@%retval1 int@0
STRLEN LF@len LF@%0
LT LF@cond LF@%1 int@0
JUMPIFEQ $substr$error LF@cond bool@true
GT LF@cond LF@%1 LF@len
JUMPIFEQ $substr$error LF@cond bool@true
LT LF@cond LF@%2 int@0
JUMPIFEQ $substr$error LF@cond bool@true
ADD LF@end LF@%1 LF@%2
GT LF@cond LF@end LF@len
JUMPIFEQ $substr$bounded LF@cond bool@false
MOVE LF@end LF@len
LABEL $substr$bounded
LABEL $substr$loop
LT LF@cond LF@%1 LF@end
JUMPIFEQ $substr$end LF@cond bool@false
GETCHAR LF@char LF@%0 LF@%1
CONCAT LF@%retval0 LF@%retval0 LF@char
ADD LF@%1 LF@%1 int@1
JUMP $substr$loop
LABEL $substr$end
POPFRAME
RETURN
LABEL $substr$error
MOVE LF@%retval1 int@1
POPFRAME
RETURN
";

const ORD: &str = "\
LABEL $ord
PUSHFRAME
DEFVAR LF@%retval0
DEFVAR LF@%retval1
DEFVAR LF@len
DEFVAR LF@cond
MOVE LF@%retval0 int@0
MOVE LF@%retval1 int@0
STRLEN LF@len LF@%0
LT LF@cond LF@%1 int@0
JUMPIFEQ $ord$error LF@cond bool@true
LT LF@cond LF@%1 LF@len
JUMPIFEQ $ord$error LF@cond bool@false
STRI2INT LF@%retval0 LF@%0 LF@%1
POPFRAME
RETURN
LABEL $ord$error
MOVE LF@%retval1 int@1
POPFRAME
RETURN
";

const CHR: &str = "\
LABEL $chr
PUSHFRAME
DEFVAR LF@%retval0
DEFVAR LF@%retval1
DEFVAR LF@cond
MOVE LF@%retval0 string@
MOVE LF@%retval1 int@0
LT LF@cond LF@%0 int@0
JUMPIFEQ $chr$error LF@cond bool@true
GT LF@cond LF@%0 int@255
JUMPIFEQ $chr$error LF@cond bool@true
INT2CHAR LF@%retval0 LF@%0
POPFRAME
RETURN
LABEL $chr$error
MOVE LF@%retval1 int@1
POPFRAME
RETURN
";

/// All routines in registration order
const LIBRARY: &[&str] = &[
    INPUTS, INPUTI, INPUTF, PRINT, INT2FLOAT, FLOAT2INT, LEN, SUBSTR, ORD, CHR,
];

/// The complete library text
pub fn library() -> String {
    let mut out = String::new();
    for routine in LIBRARY {
        out.push_str(SEPARATOR);
        out.push_str(routine);
    }
    out.push_str(SEPARATOR);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_has_a_label() {
        let text = library();
        for name in [
            "inputs", "inputi", "inputf", "print", "int2float", "float2int", "len", "substr",
            "ord", "chr",
        ] {
            assert_eq!(
                text.matches(&format!("LABEL ${name}\n")).count(),
                1,
                "{name}"
            );
        }
    }

    #[test]
    fn test_routines_return() {
        for routine in LIBRARY {
            assert!(routine.starts_with("LABEL $"));
            assert!(routine.ends_with("POPFRAME\nRETURN\n"));
        }
    }
}
