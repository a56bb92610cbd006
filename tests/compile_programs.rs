//! End-to-end pipeline tests, one per scenario in the testable-properties
//! section of the language reference. Each drives the library the way the
//! CLI does (`compile_to_c`/`check_source`) rather than spawning a real C
//! toolchain, since there is no guarantee one is on the machine running
//! the test suite.

use srcc::{check_source, compile_to_c, CompilerConfig, CompileError};

#[test]
fn arithmetic_precedence_folds_to_seven() {
    let c = compile_to_c(
        "program p is begin putInteger(1 + 2 * 3); return; end program",
        &CompilerConfig::new().with_optimization_level(1),
    )
    .unwrap();
    assert!(c.contains("= 7;"), "expected the constant-folded value 7 in:\n{c}");
    assert!(c.contains("putInteger(_t0)"));
}

#[test]
fn assigning_a_float_expression_to_an_int_variable_is_a_type_error() {
    let err =
        check_source("program p is int x; begin x := 3 + 4.5; putFloat(x); return; end program")
            .unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn array_scalar_broadcast_adds_one_to_every_element() {
    let c = compile_to_c(
        "program p is int a[4]; int b[4]; begin b := a + 1; putInteger(b[2]); return; end program",
        &CompilerConfig::default(),
    )
    .unwrap();
    assert!(c.contains("for (int64_t _i"));
    assert!(c.contains("u_b[_i"));
}

#[test]
fn unterminated_string_is_a_lexical_error_naming_its_line() {
    let err = check_source("program p is begin putString(\"hi); return; end program").unwrap_err();
    assert!(matches!(err, CompileError::Lexical { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(err.report(std::path::Path::new("t.src")).contains("t.src"));
}

#[test]
fn constant_if_condition_emits_no_branch_at_level_one() {
    let c = compile_to_c(
        "program p is begin if (1 == 1) then putInteger(1); else putInteger(2); end if; return; \
         end program",
        &CompilerConfig::new().with_optimization_level(1),
    )
    .unwrap();
    assert!(!c.contains("if ("));
    assert!(c.contains("putInteger(_t0)"));
}

#[test]
fn duplicate_local_declaration_is_rejected() {
    let err = check_source(
        "program p is procedure f() int x; int x; begin return; end procedure; begin return; \
         end program",
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }));
}
