//! Conflict checking and the nested-bleed lint.

use crate::declarations::{DeclId, Declaration};
use crate::diagnostics::{ConflictReason, ScopeDiagnostic};
use crate::scopes::{BranchTag, ScopeId};
use crate::tree::ScopeTree;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{Level, debug, span};

impl ScopeTree {
    /// Report every declaration whose name is already taken by an earlier
    /// declaration in an overlapping scope.
    ///
    /// Each later declaration is reported once, against the earliest
    /// declaration it conflicts with. Output follows declaration order.
    pub fn validate(&self) -> Vec<ScopeDiagnostic> {
        let _span = span!(Level::DEBUG, "validate", procedure = self.procedure()).entered();

        let mut by_name: FxHashMap<&str, SmallVec<[DeclId; 4]>> = FxHashMap::default();
        let mut diagnostics = Vec::new();

        for decl in self.declarations() {
            let earlier = by_name.entry(decl.name.as_str()).or_default();
            let conflict = earlier.iter().find_map(|&prev| {
                let first = self.declaration(prev)?;
                self.conflict_between(first, decl).map(|reason| (first, reason))
            });
            if let Some((first, reason)) = conflict {
                debug!(
                    name = %decl.name,
                    first = %first.id,
                    duplicate = %decl.id,
                    ?reason,
                    "conflicting declaration"
                );
                diagnostics.push(ScopeDiagnostic::ConflictingDeclaration {
                    name: decl.name.clone(),
                    first: first.id,
                    duplicate: decl.id,
                    first_span: first.span,
                    span: decl.span,
                    reason,
                });
            }
            earlier.push(decl.id);
        }
        diagnostics
    }

    /// Why `a` and `b` conflict, or `None` when both may coexist.
    pub fn conflict_between(&self, a: &Declaration, b: &Declaration) -> Option<ConflictReason> {
        if a.name != b.name {
            return None;
        }
        if a.region == b.region {
            return Some(ConflictReason::SameRegion);
        }
        if self.is_ancestor_or_self(a.region, b.region) || self.is_ancestor_or_self(b.region, a.region) {
            return Some(ConflictReason::EnclosingRegion);
        }
        if self.regions_exclusive(a.region, b.region) {
            None
        } else {
            Some(ConflictReason::SequentialRegions)
        }
    }

    /// Whether no execution passes through both regions.
    ///
    /// Only regions outside each other's ancestor chain can be exclusive.
    /// With `A` and `B` the children of their lowest common ancestor on each
    /// side, they are exclusive when they are different branches of one
    /// conditional, or when one is a branch that always exits and the other
    /// starts after that branch's conditional ends.
    pub fn regions_exclusive(&self, a: ScopeId, b: ScopeId) -> bool {
        let Some((_, child_a, child_b)) = self.lowest_common_ancestor(a, b) else {
            return false;
        };
        let (Some(region_a), Some(region_b)) = (self.region(child_a), self.region(child_b)) else {
            return false;
        };

        if let (Some(tag_a), Some(tag_b)) = (region_a.branch, region_b.branch) {
            if tag_a.conditional == tag_b.conditional && tag_a.index != tag_b.index {
                return true;
            }
        }
        let exits_before = |branch: Option<BranchTag>, other_start: u32| {
            branch.is_some_and(|tag| tag.exits && other_start >= tag.conditional_span.end)
        };
        exits_before(region_a.branch, region_b.span.start)
            || exits_before(region_b.branch, region_a.span.start)
    }

    /// Declarations introduced at least `threshold` unbraced nested bodies
    /// below the boundary of the region that owns them.
    pub fn nested_bleed(&self, threshold: u32) -> Vec<ScopeDiagnostic> {
        self.declarations()
            .iter()
            .filter(|decl| decl.kind.is_expression_variable() && decl.bleed_depth >= threshold)
            .map(|decl| ScopeDiagnostic::NestedBleed {
                name: decl.name.clone(),
                declaration: decl.id,
                span: decl.span,
                depth: decl.bleed_depth,
            })
            .collect()
    }
}
