//! End-to-end driver tests: source file in, stdout/stderr/exit code out.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

/// Writes `source` to a temp file and runs the interpreter on it.
fn run_script(source: &str) -> (assert_cmd::assert::Assert, NamedTempFile) {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(source.as_bytes()).expect("write source");

    let assert = Command::cargo_bin("quill")
        .expect("binary built")
        .arg(file.path())
        .assert();
    (assert, file)
}

#[test]
fn test_prints_arithmetic() {
    let (assert, _file) = run_script("print(40 + 2)");
    assert.success().stdout("42\n");
}

#[test]
fn test_global_assignment() {
    let (assert, _file) = run_script("var x = 1; x = x + 2; print(x)");
    assert.success().stdout("3\n");
}

#[test]
fn test_recursive_function() {
    let (assert, _file) =
        run_script("fun f(n) { if n < 2 { ret n } ret f(n-1) + f(n-2) } print(f(10))");
    assert.success().stdout("55\n");
}

#[test]
fn test_closure_capture() {
    let (assert, _file) =
        run_script("fun make(a) { fun g(b) { ret a + b } ret g } print(make(10)(32))");
    assert.success().stdout("42\n");
}

#[test]
fn test_while_loop() {
    let (assert, _file) = run_script("var i = 0; while i < 3 { print(i); i = i + 1 }");
    assert.success().stdout("0\n1\n2\n");
}

#[test]
fn test_type_error_fails_with_diagnostic() {
    let (assert, _file) = run_script("print(1 + true)");
    assert
        .failure()
        .stdout("")
        .stderr(predicate::str::contains(
            "operator '+' is not defined for values of type 'Int' and 'Bool'",
        ));
}

#[test]
fn test_empty_source_succeeds() {
    let (assert, _file) = run_script("");
    assert.success().stdout("");
}

#[test]
fn test_comment_only_source_succeeds() {
    let (assert, _file) = run_script("// nothing to do\n// at all\n");
    assert.success().stdout("");
}

#[test]
fn test_long_identifier() {
    let name = "x".repeat(1500);
    let source = format!("var {name} = 1 print({name})");
    let (assert, _file) = run_script(&source);
    assert.success().stdout("1\n");
}

#[test]
fn test_integer_overflow_saturates() {
    let (assert, _file) = run_script("print(99999999999999999999999999)");
    assert.success().stdout("9223372036854775807\n");
}

#[test]
fn test_parse_error_exits_nonzero() {
    let (assert, _file) = run_script("fun f( { }");
    assert
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_diagnostics_carry_offsets() {
    // The diagnostic line leads with the byte offset of the error.
    let (assert, _file) = run_script("print(nope)");
    assert
        .failure()
        .stderr(predicate::str::contains("6: error: undefined identifier 'nope'"));
}

#[test]
fn test_no_input_file() {
    Command::cargo_bin("quill")
        .expect("binary built")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input file"));
}

#[test]
fn test_missing_file() {
    Command::cargo_bin("quill")
        .expect("binary built")
        .arg("no/such/file.ql")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}
