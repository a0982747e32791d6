use anyhow::{Context, Result, bail};
use exscope_binder::{BinderOptions, ScopeTree, analyze_procedure};
use exscope_common::{Diagnostic, DiagnosticCategory};
use exscope_syntax::{Procedure, parse_procedures};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info_span};

use crate::args::CliArgs;
use crate::config::{ResolvedOptions, resolve_options};

/// No error diagnostics.
pub const EXIT_SUCCESS: u8 = 0;
/// At least one error diagnostic was reported.
pub const EXIT_DIAGNOSTICS: u8 = 1;
/// Usage, configuration or I/O failure, or a malformed input tree.
pub const EXIT_FAILURE: u8 = 2;

/// Diagnostics (and optionally the scope tree) of one procedure.
#[derive(Debug, Clone)]
pub struct ProcedureReport {
    pub file: PathBuf,
    pub name: String,
    pub diagnostics: Vec<Diagnostic>,
    pub tree: Option<ScopeTree>,
}

impl ProcedureReport {
    /// Label used as the `file` of every diagnostic: `path#Procedure`.
    pub fn label(&self) -> String {
        procedure_label(&self.file, &self.name)
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub options: ResolvedOptions,
    pub reports: Vec<ProcedureReport>,
    pub files_read: Vec<PathBuf>,
}

impl AnalysisResult {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports.iter().flat_map(|report| report.diagnostics.iter())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics().filter(|diag| diag.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics()
            .filter(|diag| diag.category == DiagnosticCategory::Warning)
            .count()
    }

    pub fn exit_code(&self) -> u8 {
        if self.error_count() > 0 {
            EXIT_DIAGNOSTICS
        } else {
            EXIT_SUCCESS
        }
    }
}

pub fn procedure_label(file: &Path, procedure: &str) -> String {
    format!("{}#{}", file.display(), procedure)
}

/// Load every input file, then analyze all procedures in parallel.
///
/// Reports come back in input order: files as given, procedures in file order.
pub fn run(args: &CliArgs, cwd: &Path) -> Result<AnalysisResult> {
    if args.files.is_empty() {
        bail!("no input files; pass one or more procedure JSON files");
    }
    let options = resolve_options(args, cwd)?;
    debug!(
        config = ?options.config_path,
        check_references = options.check_references,
        "resolved options"
    );

    let mut procedures = Vec::new();
    let mut files_read = Vec::with_capacity(args.files.len());
    for file in &args.files {
        let path = cwd.join(file);
        for procedure in read_procedures(&path)? {
            procedures.push((file.clone(), procedure));
        }
        files_read.push(file.clone());
    }

    let binder_options = options.binder_options();
    let keep_tree = options.dump_scopes;
    let analyze_all = || {
        procedures
            .par_iter()
            .map(|(file, procedure)| analyze_one(file, procedure, &binder_options, keep_tree))
            .collect::<Result<Vec<_>>>()
    };
    let reports = match args.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("failed to start worker threads")?
            .install(analyze_all)?,
        None => analyze_all()?,
    };

    Ok(AnalysisResult {
        options,
        reports,
        files_read,
    })
}

pub fn read_procedures(path: &Path) -> Result<Vec<Procedure>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_procedures(&source)
        .with_context(|| format!("failed to parse procedures in {}", path.display()))
}

pub fn analyze_one(
    file: &Path,
    procedure: &Procedure,
    options: &BinderOptions,
    keep_tree: bool,
) -> Result<ProcedureReport> {
    let label = procedure_label(file, &procedure.name);
    let _span = info_span!("analyze", procedure = %label).entered();

    let (_, analysis) = analyze_procedure(procedure, options)
        .with_context(|| format!("failed to analyze {label}"))?;
    let diagnostics = analysis
        .diagnostics
        .iter()
        .map(|diag| diag.to_diagnostic(&label))
        .collect::<Vec<_>>();
    debug!(count = diagnostics.len(), "procedure analyzed");

    Ok(ProcedureReport {
        file: file.to_path_buf(),
        name: procedure.name.clone(),
        diagnostics,
        tree: keep_tree.then_some(analysis.tree),
    })
}
