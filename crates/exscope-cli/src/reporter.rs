use anyhow::{Context, Result};
use colored::Colorize;
use exscope_binder::ScopeTree;
use exscope_common::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};
use serde::Serialize;

use crate::driver::{AnalysisResult, ProcedureReport};

/// Renders diagnostics as text lines.
///
/// Input trees carry offsets only, so locations are printed as
/// `path#Procedure@start..end`.
pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    /// Full text report: diagnostics, optional scope dumps and a summary line.
    pub fn render_result(&self, result: &AnalysisResult) -> String {
        let mut out = String::new();
        for report in &result.reports {
            out.push_str(&self.render(&report.diagnostics));
            if let Some(tree) = &report.tree {
                out.push_str(&self.format_header(&report.label()));
                out.push('\n');
                out.push_str(&render_scope_tree(tree));
            }
        }
        out.push_str(&self.format_summary(
            result.error_count(),
            result.warning_count(),
            result.reports.len(),
        ));
        out.push('\n');
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = self.format_location(&diagnostic.file, diagnostic.start, diagnostic.length);
        output.push_str(" - ");
        output.push_str(&self.format_category(diagnostic.category));
        let code = self.format_code(diagnostic.code);
        if !code.is_empty() {
            output.push(' ');
            output.push_str(&code);
        }
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
        }
        output
    }

    pub fn format_summary(&self, errors: usize, warnings: usize, procedures: usize) -> String {
        let plural = |count: usize, word: &str| {
            if count == 1 {
                format!("{count} {word}")
            } else {
                format!("{count} {word}s")
            }
        };
        let line = format!(
            "Found {} and {} in {}.",
            plural(errors, "error"),
            plural(warnings, "warning"),
            plural(procedures, "procedure")
        );
        if !self.color {
            return line;
        }
        if errors > 0 {
            line.red().bold().to_string()
        } else if warnings > 0 {
            line.yellow().to_string()
        } else {
            line.green().to_string()
        }
    }

    fn format_related(&self, related: &DiagnosticRelatedInformation) -> String {
        let location = self.format_location(&related.file, related.start, related.length);
        let prefix = if self.color {
            "  Related".dimmed().to_string()
        } else {
            "  Related".to_string()
        };
        format!("{prefix}: {location} - {}", related.message_text)
    }

    fn format_location(&self, file: &str, start: u32, length: u32) -> String {
        let file = if file.is_empty() { "<unknown>" } else { file };
        let location = format!("{file}@{start}..{}", start + length);
        if self.color {
            location.cyan().to_string()
        } else {
            location
        }
    }

    fn format_header(&self, label: &str) -> String {
        let header = format!("Scopes of {label}:");
        if self.color {
            header.bold().to_string()
        } else {
            header
        }
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };

        if !self.color {
            return label.to_string();
        }

        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        if code == 0 {
            return String::new();
        }

        let label = format!("EXS{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}

/// Indented outline of a scope tree, one region per line:
///
/// ```text
/// s0 root 0..40: x
///   s1 branch 2..20 (alt 0 of #1): i
/// ```
pub fn render_scope_tree(tree: &ScopeTree) -> String {
    let mut out = String::new();
    let mut pending = vec![tree.root()];
    while let Some(id) = pending.pop() {
        let Some(region) = tree.region(id) else {
            continue;
        };
        for _ in 0..region.depth {
            out.push_str("  ");
        }
        out.push_str(&format!(
            "{} {} {}..{}",
            region.id, region.kind, region.span.start, region.span.end
        ));
        if let Some(tag) = region.branch {
            let exits = if tag.exits { ", exits" } else { "" };
            out.push_str(&format!(" (alt {} of {}{exits})", tag.index, tag.conditional));
        }
        if !region.table.is_empty() {
            let names: Vec<&str> = region.table.keys().map(String::as_str).collect();
            out.push_str(": ");
            out.push_str(&names.join(", "));
        }
        out.push('\n');
        pending.extend(region.children.iter().rev().copied());
    }
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    procedures: Vec<JsonProcedure<'a>>,
    error_count: usize,
    warning_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonProcedure<'a> {
    file: String,
    name: &'a str,
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    scopes: Option<&'a ScopeTree>,
}

impl<'a> JsonProcedure<'a> {
    fn new(report: &'a ProcedureReport) -> Self {
        JsonProcedure {
            file: report.file.display().to_string(),
            name: &report.name,
            diagnostics: &report.diagnostics,
            scopes: report.tree.as_ref(),
        }
    }
}

/// Whole run as one pretty-printed JSON document.
pub fn render_json(result: &AnalysisResult) -> Result<String> {
    let report = JsonReport {
        procedures: result.reports.iter().map(JsonProcedure::new).collect(),
        error_count: result.error_count(),
        warning_count: result.warning_count(),
    };
    serde_json::to_string_pretty(&report).context("failed to serialize diagnostics")
}
