//! CLI-level end-to-end tests (§8 end-to-end scenarios), grounded on
//! `faxc-drv`'s `tests/e2e/cli_tests.rs` pattern: drive the built binary
//! with `assert_cmd`, assert on its exit status and the files it writes
//! into a scratch output directory.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn cminus_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cminus"))
}

fn run(input: &str, output_dir: &std::path::Path) -> assert_cmd::assert::Assert {
    Command::new(cminus_bin())
        .arg("--input")
        .arg(fixtures_dir().join(input))
        .arg("--output-directory")
        .arg(output_dir)
        .assert()
}

#[test]
fn cli_help_mentions_usage() {
    let mut cmd = Command::new(cminus_bin());
    cmd.arg("--help");
    cmd.assert().success().stdout(predicate::str::contains("Usage"));
}

#[test]
fn cli_version_reports_package_version() {
    let mut cmd = Command::new(cminus_bin());
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn empty_main_is_semantically_correct_and_emits_program() {
    let dir = TempDir::new().unwrap();
    run("empty_main.txt", dir.path()).success();

    let semantic = fs::read_to_string(dir.path().join("semantic_errors.txt")).unwrap();
    assert_eq!(semantic, "The input program is semantically correct.\n");

    let output = fs::read_to_string(dir.path().join("output.txt")).unwrap();
    assert!(output.contains("JP"));
}

#[test]
fn void_declaration_reports_semantic_error_and_suppresses_output() {
    let dir = TempDir::new().unwrap();
    run("void_declaration.txt", dir.path()).success();

    let semantic = fs::read_to_string(dir.path().join("semantic_errors.txt")).unwrap();
    assert!(semantic.contains("Illegal type of void for 'x'."));
    assert!(!dir.path().join("output.txt").exists());
}

#[test]
fn assignment_emits_add_then_assign() {
    let dir = TempDir::new().unwrap();
    run("assignment.txt", dir.path()).success();

    let output = fs::read_to_string(dir.path().join("output.txt")).unwrap();
    assert!(output.contains("(ADD, #2, #3,"));
    assert!(output.contains("(ASSIGN,"));
}

#[test]
fn repeat_until_emits_conditional_backward_jump() {
    let dir = TempDir::new().unwrap();
    run("repeat_until.txt", dir.path()).success();

    let output = fs::read_to_string(dir.path().join("output.txt")).unwrap();
    assert!(output.contains("(JPF,"));
}

#[test]
fn undefined_call_reports_not_defined_and_still_parses() {
    let dir = TempDir::new().unwrap();
    run("undefined_call.txt", dir.path()).success();

    let semantic = fs::read_to_string(dir.path().join("semantic_errors.txt")).unwrap();
    assert!(semantic.contains("'f' is not defined."));

    let tree = fs::read_to_string(dir.path().join("parse_tree.txt")).unwrap();
    assert!(tree.contains("program"));
}

#[test]
fn array_index_read_and_write_round_trip_through_the_same_address_computation() {
    let dir = TempDir::new().unwrap();
    run("array_index.txt", dir.path()).success();

    let semantic = fs::read_to_string(dir.path().join("semantic_errors.txt")).unwrap();
    assert_eq!(semantic, "The input program is semantically correct.\n");

    let output = fs::read_to_string(dir.path().join("output.txt")).unwrap();
    // Both the write (`a[0] = 5`) and the read (`a[0] + 1`) go through
    // `parray`'s MULT-then-ADD address computation (§8: "Array index
    // expression reads through `@t`; writes to an array element use the
    // same address computation").
    assert!(output.contains("(MULT,"));
    assert!(output.matches("(MULT,").count() >= 2);
}

#[test]
fn array_argument_reports_type_mismatch_against_an_int_parameter() {
    let dir = TempDir::new().unwrap();
    run("arg_type_mismatch.txt", dir.path()).success();

    let semantic = fs::read_to_string(dir.path().join("semantic_errors.txt")).unwrap();
    assert!(semantic.contains(
        "Mismatch in type of argument 1 of 'takes_int'. Expected 'int' but got 'array' instead."
    ));
    assert!(!dir.path().join("output.txt").exists());
}

#[test]
fn mismatched_parens_reports_missing_close_paren() {
    let dir = TempDir::new().unwrap();
    run("mismatched_parens.txt", dir.path()).success();

    let syntax = fs::read_to_string(dir.path().join("syntax_errors.txt")).unwrap();
    assert!(syntax.contains("missing )"));
}

#[test]
fn compile_writes_all_seven_output_files() {
    let dir = TempDir::new().unwrap();
    run("empty_main.txt", dir.path()).success();

    for name in [
        "tokens.txt",
        "lexical_errors.txt",
        "symbol_table.txt",
        "syntax_errors.txt",
        "semantic_errors.txt",
        "parse_tree.txt",
        "output.txt",
    ] {
        assert!(dir.path().join(name).exists(), "missing {name}");
    }
}
