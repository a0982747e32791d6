use crate::driver::{AnalysisResult, ProcedureReport, analyze_one};
use crate::config::ResolvedOptions;
use crate::reporter::{Reporter, render_json, render_scope_tree};
use exscope_binder::BinderOptions;
use exscope_common::Diagnostic;
use exscope_syntax::build::*;
use std::path::{Path, PathBuf};

fn conflict_report(keep_tree: bool) -> ProcedureReport {
    let procedure = procedure(
        "Check",
        &["o"],
        block(vec![
            expr_stmt(call(name("f"), vec![out_var("a")])),
            block(vec![expr_stmt(call(name("g"), vec![out_var("a")]))]),
        ]),
    );
    analyze_one(Path::new("body.json"), &procedure, &BinderOptions::default(), keep_tree)
        .expect("analysis")
}

fn result_of(reports: Vec<ProcedureReport>) -> AnalysisResult {
    AnalysisResult {
        options: ResolvedOptions::default(),
        reports,
        files_read: vec![PathBuf::from("body.json")],
    }
}

#[test]
fn formats_diagnostic_with_code_and_location() {
    let diag = Diagnostic::error(
        "body.json#Check".to_string(),
        10,
        3,
        "Cannot find name 'abc'.".to_string(),
        2004,
    );
    let text = Reporter::new(false).format_diagnostic(&diag);
    assert_eq!(
        text,
        "body.json#Check@10..13 - error EXS2004: Cannot find name 'abc'."
    );
}

#[test]
fn renders_related_information_on_following_line() {
    let report = conflict_report(false);
    assert_eq!(report.diagnostics.len(), 1);

    let text = Reporter::new(false).render(&report.diagnostics);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("body.json#Check@"));
    assert!(lines[0].contains("error EXS2002"));
    assert!(lines[1].starts_with("  Related: body.json#Check@"));
    assert!(lines[1].ends_with("'a' was also declared here."));
}

#[test]
fn summary_pluralizes_counts() {
    let reporter = Reporter::new(false);
    assert_eq!(
        reporter.format_summary(1, 0, 2),
        "Found 1 error and 0 warnings in 2 procedures."
    );
    assert_eq!(
        reporter.format_summary(0, 1, 1),
        "Found 0 errors and 1 warning in 1 procedure."
    );
}

#[test]
fn scope_tree_outline_is_indented_by_depth() {
    let report = conflict_report(true);
    let tree = report.tree.as_ref().expect("tree kept");
    let outline = render_scope_tree(tree);
    let lines: Vec<&str> = outline.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("s0 root "));
    assert!(lines[0].ends_with(": o, a"));
    assert!(lines[1].starts_with("  s1 block "));
    assert!(lines[1].ends_with(": a"));
}

#[test]
fn text_result_includes_dump_and_summary() {
    let result = result_of(vec![conflict_report(true)]);
    let text = Reporter::new(false).render_result(&result);

    assert!(text.contains("Scopes of body.json#Check:"));
    assert!(text.ends_with("Found 1 error and 0 warnings in 1 procedure.\n"));
}

#[test]
fn json_output_lists_procedures_and_counts() {
    let result = result_of(vec![conflict_report(false)]);
    let json = render_json(&result).expect("serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(value["errorCount"], 1);
    assert_eq!(value["warningCount"], 0);
    assert_eq!(value["procedures"][0]["name"], "Check");
    assert_eq!(value["procedures"][0]["file"], "body.json");
    assert_eq!(value["procedures"][0]["diagnostics"][0]["code"], 2002);
    assert!(value["procedures"][0].get("scopes").is_none());
}
