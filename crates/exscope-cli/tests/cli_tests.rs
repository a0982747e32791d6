//! End-to-end runs of the driver and the `exscope` binary.

use clap::Parser;
use exscope_cli::args::CliArgs;
use exscope_cli::driver::{self, EXIT_DIAGNOSTICS, EXIT_FAILURE, EXIT_SUCCESS};
use exscope_syntax::build::*;
use exscope_syntax::syntax::Procedure;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn write_procedures(dir: &Path, name: &str, procedures: &[Procedure]) -> PathBuf {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(procedures).expect("serialize procedures");
    std::fs::write(&path, json).expect("failed to write test file");
    path
}

/// `if (!(x is int i)) throw;  use(i);`
fn guard_clause() -> Procedure {
    procedure(
        "Guard",
        &["x"],
        block(vec![
            if_(not(paren(is_decl(name("x"), "int", "i"))), throw()),
            expr_stmt(call(name("use"), vec![name("i")])),
        ]),
    )
}

/// `f(out var a); { g(out var a); }`
fn enclosing_conflict() -> Procedure {
    procedure(
        "Conflict",
        &[],
        block(vec![
            expr_stmt(call(name("f"), vec![out_var("a")])),
            block(vec![expr_stmt(call(name("g"), vec![out_var("a")]))]),
        ]),
    )
}

/// `if (a) if (b) if (x is int i) { }`
fn nested_bleed() -> Procedure {
    procedure(
        "Bleed",
        &["x", "a", "b"],
        block(vec![if_(
            name("a"),
            if_(name("b"), if_(is_decl(name("x"), "int", "i"), block(vec![]))),
        )]),
    )
}

fn run_driver(dir: &Path, args: &[&str]) -> anyhow::Result<driver::AnalysisResult> {
    let args = CliArgs::try_parse_from(std::iter::once("exscope").chain(args.iter().copied()))
        .expect("should parse");
    driver::run(&args, dir)
}

fn run_binary(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_exscope"))
        .current_dir(dir)
        .args(args)
        .env_remove("EXSCOPE_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run exscope")
}

#[test]
fn clean_procedures_exit_successfully() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_procedures(dir.path(), "guard.json", &[guard_clause()]);

    let result = run_driver(dir.path(), &["--check-references", "--globals", "use", "guard.json"])
        .expect("analysis");
    assert_eq!(result.reports.len(), 1);
    assert_eq!(result.diagnostics().count(), 0);
    assert_eq!(result.exit_code(), EXIT_SUCCESS);
}

#[test]
fn reports_keep_input_order_across_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_procedures(dir.path(), "one.json", &[guard_clause(), enclosing_conflict()]);
    write_procedures(dir.path(), "two.json", &[nested_bleed()]);

    let result = run_driver(dir.path(), &["-j", "2", "one.json", "two.json"]).expect("analysis");
    let names: Vec<&str> = result.reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Guard", "Conflict", "Bleed"]);
    assert_eq!(result.files_read.len(), 2);
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.exit_code(), EXIT_DIAGNOSTICS);

    let conflict = &result.reports[1].diagnostics[0];
    assert_eq!(conflict.file, "one.json#Conflict");
    assert_eq!(conflict.code, 2002);
}

#[test]
fn warnings_alone_do_not_fail_the_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_procedures(dir.path(), "bleed.json", &[nested_bleed()]);
    std::fs::write(dir.path().join("exscope.json"), r#"{ "warnNestedBleed": 2 }"#)
        .expect("write config");

    let result = run_driver(dir.path(), &["bleed.json"]).expect("analysis");
    assert_eq!(result.warning_count(), 1);
    assert_eq!(result.exit_code(), EXIT_SUCCESS);
}

#[test]
fn single_procedure_object_is_accepted() {
    let dir = tempfile::tempdir().expect("temp dir");
    let json = serde_json::to_string(&guard_clause()).expect("serialize");
    std::fs::write(dir.path().join("single.json"), json).expect("write");

    let result = run_driver(dir.path(), &["single.json"]).expect("analysis");
    assert_eq!(result.reports[0].name, "Guard");
}

#[test]
fn malformed_input_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("bad.json"), r#"{ "name": "Broken" }"#).expect("write");

    let err = run_driver(dir.path(), &["bad.json"]).expect_err("missing body");
    assert!(format!("{err:#}").contains("failed to parse procedures in"));

    let missing = run_driver(dir.path(), &["absent.json"]).expect_err("missing file");
    assert!(format!("{missing:#}").contains("failed to read"));

    assert!(run_driver(dir.path(), &[]).is_err());
}

#[test]
fn too_deep_nesting_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_procedures(dir.path(), "bleed.json", &[nested_bleed()]);

    let err = run_driver(dir.path(), &["--max-nesting-depth", "2", "bleed.json"])
        .expect_err("nesting limit");
    assert!(format!("{err:#}").contains("failed to analyze bleed.json#Bleed"));
}

#[test]
fn binary_prints_text_diagnostics() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_procedures(dir.path(), "conflict.json", &[enclosing_conflict()]);

    let output = run_binary(dir.path(), &["--pretty", "false", "conflict.json"]);
    assert_eq!(output.status.code(), Some(i32::from(EXIT_DIAGNOSTICS)));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("conflict.json#Conflict@"), "{stdout}");
    assert!(stdout.contains("error EXS2002"), "{stdout}");
    assert!(stdout.contains("Found 1 error and 0 warnings in 1 procedure."), "{stdout}");
}

#[test]
fn binary_emits_json_with_scope_dump() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_procedures(dir.path(), "guard.json", &[guard_clause()]);

    let output = run_binary(dir.path(), &["--format", "json", "--dump-scopes", "guard.json"]);
    assert_eq!(output.status.code(), Some(i32::from(EXIT_SUCCESS)));
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(value["errorCount"], 0);
    let scopes = &value["procedures"][0]["scopes"];
    assert_eq!(scopes["procedure"], "Guard");
    assert_eq!(scopes["regions"][0]["kind"], "root");
}

#[test]
fn binary_reports_usage_errors_with_exit_code_two() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = run_binary(dir.path(), &["missing.json"]);
    assert_eq!(output.status.code(), Some(i32::from(EXIT_FAILURE)));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: "));
}

#[test]
fn binary_shows_resolved_config() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("exscope.json"), r#"{ "checkReferences": "true" }"#)
        .expect("write config");

    let output = run_binary(dir.path(), &["--show-config", "--globals", "Console"]);
    assert_eq!(output.status.code(), Some(i32::from(EXIT_SUCCESS)));
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(value["checkReferences"], true);
    assert_eq!(value["globals"][0], "Console");
}
