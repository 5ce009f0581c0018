//! Code generation tests

use ifjc::compile;
use pretty_assertions::assert_eq;

fn main_with(body: &str) -> String {
    format!("package main\nfunc main() {{\n{body}\n}}\n")
}

/// Text of one function, from its label through its epilogue
fn function(output: &str, name: &str) -> String {
    let start = output
        .find(&format!("\nLABEL ${name}\n"))
        .expect("function label")
        + 1;
    let epilogue = format!("LABEL ${name}$return\n");
    let end = output[start..].find(&epilogue).expect("function epilogue") + start;
    let tail = if name == "main" {
        "CLEARS\nJUMP $$EOF"
    } else {
        "POPFRAME\nRETURN"
    };
    format!("{}{}{}", &output[start..end], epilogue, tail)
}

fn main_code(body: &str) -> String {
    function(&compile(&main_with(body)).unwrap(), "main")
}

#[test]
fn test_program_frame() {
    let output = compile(&main_with("")).unwrap();
    assert!(output.starts_with(
        ".IFJcode20\n\
         DEFVAR GF@%res\nMOVE GF@%res int@0\n\
         DEFVAR GF@%tmp0\nMOVE GF@%tmp0 bool@false\n\
         DEFVAR GF@%tmp1\nMOVE GF@%tmp1 int@0\n\
         DEFVAR GF@%tmp2\nMOVE GF@%tmp2 int@0\n\
         DEFVAR GF@%void\nMOVE GF@%void nil@nil\n\
         JUMP $main\n"
    ));
    assert!(output.contains("LABEL $substr\n"));
    assert!(output.ends_with("\nLABEL $$EOF\n"));
}

#[test]
fn test_folded_declaration() {
    insta::assert_snapshot!(main_code("a := 2 + 3"), @r"
    LABEL $main
    CREATEFRAME
    PUSHFRAME
    DEFVAR LF@a%1
    PUSHS int@5
    POPS LF@a%1
    LABEL $main$return
    CLEARS
    JUMP $$EOF
    ");
}

#[test]
fn test_if_else() {
    insta::assert_snapshot!(main_code("a := 1\nif a < 2 {\nprint(a)\n} else {\n}"), @r"
    LABEL $main
    CREATEFRAME
    PUSHFRAME
    DEFVAR LF@a%1
    PUSHS int@1
    POPS LF@a%1
    PUSHS LF@a%1
    PUSHS int@2
    LTS
    POPS GF@%res
    JUMPIFNEQ $main$1$else GF@%res bool@true
    PUSHS LF@a%1
    PUSHS int@1
    CREATEFRAME
    CALL $print
    JUMP $main$1$endif
    LABEL $main$1$else
    LABEL $main$1$endif
    LABEL $main$return
    CLEARS
    JUMP $$EOF
    ");
}

#[test]
fn test_for_loop() {
    insta::assert_snapshot!(main_code("for i := 0; i < 2; i = i + 1 {\nj := i\n}"), @r"
    LABEL $main
    CREATEFRAME
    PUSHFRAME
    DEFVAR LF@i%2
    DEFVAR LF@j%3
    PUSHS int@0
    POPS LF@i%2
    LABEL $main$1$for
    PUSHS LF@i%2
    PUSHS int@2
    LTS
    POPS GF@%res
    JUMPIFNEQ $main$1$endfor GF@%res bool@true
    PUSHS LF@i%2
    POPS LF@j%3
    PUSHS LF@i%2
    PUSHS int@1
    ADDS
    POPS LF@i%2
    JUMP $main$1$for
    LABEL $main$1$endfor
    LABEL $main$return
    CLEARS
    JUMP $$EOF
    ");
}

#[test]
fn test_function_with_parameters() {
    let source = "package main\n\
        func add(a int, b int) int {\nreturn a + b\n}\n\
        func main() {\nx := add(1, 2)\nprint(x)\n}\n";
    let output = compile(source).unwrap();

    insta::assert_snapshot!(function(&output, "add"), @r"
    LABEL $add
    PUSHFRAME
    DEFVAR LF@%retval0
    MOVE LF@%retval0 int@0
    DEFVAR LF@a%1
    DEFVAR LF@b%1
    MOVE LF@a%1 LF@%0
    MOVE LF@b%1 LF@%1
    PUSHS LF@a%1
    PUSHS LF@b%1
    ADDS
    POPS LF@%retval0
    JUMP $add$return
    LABEL $add$return
    POPFRAME
    RETURN
    ");

    assert!(function(&output, "main").contains(
        "PUSHS int@1\nPUSHS int@2\nCREATEFRAME\n\
         DEFVAR TF@%1\nPOPS TF@%1\nDEFVAR TF@%0\nPOPS TF@%0\n\
         CALL $add\nMOVE LF@x%1 TF@%retval0\n"
    ));
}

#[test]
fn test_multiple_returns_pop_in_reverse() {
    let source = "package main\nfunc f() (int, string) {\nreturn 1, \"x\"\n}\nfunc main() {\n}\n";
    let code = function(&compile(source).unwrap(), "f");
    assert!(code.contains(
        "PUSHS int@1\nPUSHS string@x\nPOPS LF@%retval1\nPOPS LF@%retval0\nJUMP $f$return\n"
    ));
    assert!(code.contains("MOVE LF@%retval1 string@\n"));
}

#[test]
fn test_call_result_moves_skip_blank() {
    let code = main_code("_, err := inputi()\nprint(err)");
    assert!(code.contains("CALL $inputi\nMOVE LF@err%1 TF@%retval1\n"));
    assert!(!code.contains("TF@%retval0"));
}

#[test]
fn test_call_as_operand() {
    let source = "package main\nfunc one() int {\nreturn 1\n}\nfunc main() {\na := one() + 1\n}\n";
    let code = function(&compile(source).unwrap(), "main");
    assert!(code.contains(
        "CREATEFRAME\nCALL $one\nPUSHS TF@%retval0\nPUSHS int@1\nADDS\nPOPS LF@a%1\n"
    ));
}

#[test]
fn test_print_pushes_in_reverse() {
    let code = main_code("print(1, \"a b#\", 1.5)");
    assert!(code.contains(
        "PUSHS float@0x1.8p+0\nPUSHS string@a\\032b\\035\nPUSHS int@1\nPUSHS int@3\nCREATEFRAME\nCALL $print\n"
    ));
}

#[test]
fn test_blank_assignment_pops_to_void() {
    let code = main_code("_ = 1");
    assert!(code.contains("PUSHS int@1\nPOPS GF@%void\n"));
}

#[test]
fn test_sibling_blocks_share_defvar() {
    let code = main_code("if 1 < 2 {\nx := 1\n} else {\nx := 2\n}");
    assert_eq!(code.matches("DEFVAR LF@x%2\n").count(), 1);
    assert_eq!(code.matches("POPS LF@x%2\n").count(), 2);
}

#[test]
fn test_shadowed_names_use_depth() {
    let code = main_code("x := 1\nif x < 2 {\nx := \"s\"\nprint(x)\n} else {\n}\nprint(x)");
    assert!(code.contains("DEFVAR LF@x%1\n"));
    assert!(code.contains("DEFVAR LF@x%2\n"));
    assert!(code.contains("PUSHS LF@x%2\nPUSHS int@1\nCREATEFRAME\nCALL $print\n"));
}

#[test]
fn test_runtime_division_guard() {
    let code = main_code("a, _ := inputi()\nb := 10 / a");
    assert!(code.contains(
        "PUSHS int@10\nPUSHS LF@a%1\n\
         POPS GF@%tmp2\nJUMPIFNEQ $main$1$div GF@%tmp2 int@0\nEXIT int@9\n\
         LABEL $main$1$div\nPUSHS GF@%tmp2\nIDIVS\n"
    ));
}

#[test]
fn test_constant_divisor_has_no_guard() {
    let code = main_code("a, _ := inputi()\nb := a / 2");
    assert!(code.contains("PUSHS LF@a%1\nPUSHS int@2\nIDIVS\n"));
    assert!(!code.contains("EXIT int@9"));
}

#[test]
fn test_identities_drop_neutral_operands() {
    let code = main_code("a := 3\nb := a * 1 + 0\nc := a * 0");
    assert!(code.contains("PUSHS LF@a%1\nPOPS LF@b%1\n"));
    assert!(code.contains("PUSHS int@0\nPOPS LF@c%1\n"));
}

#[test]
fn test_float_identities() {
    let code = main_code(
        "x := 2.5\ny := x * 0.0\nz := 1.0 * x\nw := x / 1.0\nv := 0.0 + x - 0.0\nu := 0.0 * x",
    );
    assert!(code.contains("PUSHS float@0x1.4p+1\nPOPS LF@x%1\n"));
    assert!(code.contains("PUSHS float@0x0p+0\nPOPS LF@y%1\n"));
    assert!(code.contains("PUSHS LF@x%1\nPOPS LF@z%1\n"));
    assert!(code.contains("PUSHS LF@x%1\nPOPS LF@w%1\n"));
    assert!(code.contains("PUSHS LF@x%1\nPOPS LF@v%1\n"));
    assert!(code.contains("PUSHS float@0x0p+0\nPOPS LF@u%1\n"));
    assert!(!code.contains("MULS"));
    assert!(!code.contains("DIVS"));
}

#[test]
fn test_string_concatenation() {
    let code = main_code("s, _ := inputs()\nt := s + \"!\"");
    assert!(code.contains(
        "PUSHS LF@s%1\nPUSHS string@!\n\
         POPS GF@%tmp2\nPOPS GF@%tmp1\nCONCAT GF@%tmp1 GF@%tmp1 GF@%tmp2\nPUSHS GF@%tmp1\n"
    ));
}

#[test]
fn test_greater_or_equal() {
    let code = main_code("a := 1\nif a >= 1 {\n} else {\n}");
    assert!(code.contains(
        "POPS GF@%tmp2\nPOPS GF@%tmp1\nPUSHS GF@%tmp1\nPUSHS GF@%tmp2\nGTS\n\
         PUSHS GF@%tmp1\nPUSHS GF@%tmp2\nEQS\nORS\nPOPS GF@%res\n"
    ));
}

#[test]
fn test_untyped_variable_uses_runtime_dispatch() {
    let source = "package main\nfunc main() {\na := later()\nb := a + a\n}\nfunc later() int {\nreturn 1\n}\n";
    let code = function(&compile(source).unwrap(), "main");
    assert!(code.contains("TYPE GF@%tmp0 GF@%tmp1\n"));
    assert!(code.contains("JUMPIFEQ $main$1$concat GF@%tmp0 string@string\n"));
}

#[test]
fn test_output_is_deterministic() {
    let source = main_with("a := 1\nfor i := 0; i < 3; i = i + 1 {\na = a * 2\n}\nprint(a)");
    assert_eq!(compile(&source).unwrap(), compile(&source).unwrap());
}
