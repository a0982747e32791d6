//! Scope resolution for variables introduced inside expressions.
//!
//! Pattern designations (`x is int i`) and output-argument declarations
//! (`F(out var n)`) introduce names mid-expression. This crate decides which
//! lexical region owns each such name, resolves references against the
//! resulting region tree, and reports conflicting declarations.
//!
//! The pipeline, leaves first:
//! - [`collector`] scans one expression for introduction sites
//! - [`classifier`] decides whether a statement opens a region
//! - [`state::BinderState`] walks the statement tree and builds a [`ScopeTree`]
//! - [`resolver`] and [`validate`] answer queries over the finished tree

pub mod analysis;
pub mod classifier;
pub mod collector;
pub mod declarations;
pub mod diagnostics;
pub mod resolver;
pub mod scopes;
pub mod state;
pub mod tree;
pub mod validate;

pub use analysis::{ScopeAnalysis, analyze, analyze_procedure};
pub use classifier::{
    Classification, ScopeClass, ScopeRule, classify, classify_node, is_two_way_if, scope_rule,
};
pub use collector::{IntroductionSite, collect_introductions};
pub use declarations::{DeclId, Declaration, DeclarationKind};
pub use diagnostics::{ConflictReason, ScopeDiagnostic};
pub use resolver::{UnresolvedName, check_references};
pub use scopes::{BranchTag, RegionKind, ScopeId, ScopeRegion};
pub use state::{BinderOptions, BinderState, ScopeError};
pub use tree::ScopeTree;

#[cfg(test)]
#[path = "tests/collector_tests.rs"]
mod collector_tests;

#[cfg(test)]
#[path = "tests/classifier_tests.rs"]
mod classifier_tests;
