//! One-call analysis of a procedure body.

use crate::diagnostics::ScopeDiagnostic;
use crate::resolver::check_references;
use crate::state::{BinderOptions, BinderState, ScopeError};
use crate::tree::ScopeTree;
use exscope_syntax::{NodeArena, Procedure, lower_procedure};
use tracing::debug;

/// A scope tree together with everything reported about it.
#[derive(Clone, Debug)]
pub struct ScopeAnalysis {
    pub tree: ScopeTree,
    /// Conflicts in declaration order, then nested-bleed warnings, then
    /// unresolved references.
    pub diagnostics: Vec<ScopeDiagnostic>,
}

impl ScopeAnalysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(ScopeDiagnostic::is_error)
    }
}

/// Build, validate and optionally lint one lowered procedure body.
pub fn analyze(arena: &NodeArena, options: &BinderOptions) -> Result<ScopeAnalysis, ScopeError> {
    let mut binder = BinderState::with_options(options.clone());
    let tree = binder.bind_procedure(arena)?;

    let mut diagnostics = tree.validate();
    if let Some(threshold) = options.warn_nested_bleed {
        diagnostics.extend(tree.nested_bleed(threshold));
    }
    if options.check_references {
        diagnostics.extend(check_references(&tree, arena, options));
    }
    debug!(
        procedure = %arena.name,
        diagnostics = diagnostics.len(),
        "analysis complete"
    );
    Ok(ScopeAnalysis { tree, diagnostics })
}

/// Lower a procedure and analyze it, returning the arena alongside so that
/// callers can map expression indexes back to syntax.
pub fn analyze_procedure(
    procedure: &Procedure,
    options: &BinderOptions,
) -> Result<(NodeArena, ScopeAnalysis), ScopeError> {
    let arena = lower_procedure(procedure)?;
    let analysis = analyze(&arena, options)?;
    Ok((arena, analysis))
}
