//! Name resolution over a finished [`ScopeTree`].

use crate::declarations::Declaration;
use crate::diagnostics::ScopeDiagnostic;
use crate::scopes::ScopeId;
use crate::state::BinderOptions;
use crate::tree::ScopeTree;
use exscope_common::limits::MAX_SCOPE_WALK_ITERATIONS;
use exscope_syntax::{ExprIndex, Expression, NodeArena, NodeIndex};
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{Level, debug, span};

/// No declaration of `name` is visible from `scope`.
///
/// `scope` is `NONE` when the query position lies outside every region.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot find name `{name}` from region {scope}")]
pub struct UnresolvedName {
    pub name: String,
    pub scope: ScopeId,
}

impl ScopeTree {
    /// Resolve `name` as seen from a source offset.
    ///
    /// Starts at the deepest region containing `position` and walks up the
    /// parent chain; the first declaration of the name in the nearest region
    /// wins.
    pub fn resolve(&self, name: &str, position: u32) -> Result<&Declaration, UnresolvedName> {
        let _span = span!(Level::DEBUG, "resolve", name, position).entered();
        let scope = self.scope_at(position).unwrap_or(ScopeId::NONE);
        self.resolve_from(name, scope)
    }

    /// Resolve `name` as seen from a statement.
    pub fn resolve_at(&self, name: &str, node: NodeIndex) -> Result<&Declaration, UnresolvedName> {
        let _span = span!(Level::DEBUG, "resolve_at", name, node = node.0).entered();
        let scope = self.scope_of_statement(node).unwrap_or(ScopeId::NONE);
        self.resolve_from(name, scope)
    }

    /// Resolve `name` as seen from an expression.
    pub fn resolve_expression(&self, name: &str, expr: ExprIndex) -> Result<&Declaration, UnresolvedName> {
        let _span = span!(Level::DEBUG, "resolve_expression", name, expr = expr.0).entered();
        let scope = self.scope_of_expression(expr).unwrap_or(ScopeId::NONE);
        self.resolve_from(name, scope)
    }

    fn resolve_from(&self, name: &str, scope: ScopeId) -> Result<&Declaration, UnresolvedName> {
        self.resolve_in_scope(name, scope).ok_or_else(|| UnresolvedName {
            name: name.to_string(),
            scope,
        })
    }

    /// Walk from `scope` to the root looking for `name`.
    pub fn resolve_in_scope(&self, name: &str, scope: ScopeId) -> Option<&Declaration> {
        let mut scope_id = scope;
        let mut iterations = 0;
        while scope_id.is_some() {
            iterations += 1;
            if iterations > MAX_SCOPE_WALK_ITERATIONS {
                break;
            }
            let region = self.region(scope_id)?;
            if let Some(decl_id) = region.lookup(name) {
                debug!(
                    "[RESOLVE] '{}' FOUND in region {} at depth {} ({})",
                    name,
                    scope_id,
                    iterations - 1,
                    decl_id
                );
                return self.declaration(decl_id);
            }
            scope_id = region.parent;
        }
        debug!("[RESOLVE] '{}' NOT FOUND from region {}", name, scope);
        None
    }

    /// Declarations visible from `scope`, innermost first. A name shadowed
    /// by a nearer region is listed once.
    pub fn visible_declarations(&self, scope: ScopeId) -> Vec<&Declaration> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut out = Vec::new();
        for id in self.ancestors(scope) {
            let Some(region) = self.region(id) else {
                break;
            };
            for (name, &decl_id) in &region.table {
                if seen.insert(name.as_str()) {
                    if let Some(decl) = self.declaration(decl_id) {
                        out.push(decl);
                    }
                }
            }
        }
        out
    }
}

/// Resolve every variable reference in the body and report the ones that
/// find no declaration.
///
/// `Name` and `Out` expressions are references, except a bare name in callee
/// position, which names a method. Names in `options.globals` are always
/// treated as resolved.
pub fn check_references(
    tree: &ScopeTree,
    arena: &NodeArena,
    options: &BinderOptions,
) -> Vec<ScopeDiagnostic> {
    let _span = span!(Level::DEBUG, "check_references", procedure = %arena.name).entered();
    let globals: FxHashSet<&str> = options.globals.iter().map(String::as_str).collect();
    let mut diagnostics = Vec::new();

    for (i, node) in arena.expressions.iter().enumerate() {
        let idx = ExprIndex(i as u32);
        let name = match &node.expr {
            Expression::Name { name } | Expression::Out { name } => name,
            _ => continue,
        };
        if globals.contains(name.as_str()) || is_callee(arena, idx) {
            continue;
        }
        let Some(scope) = tree.scope_of_expression(idx) else {
            continue;
        };
        if tree.resolve_in_scope(name, scope).is_none() {
            diagnostics.push(ScopeDiagnostic::UnresolvedName {
                name: name.clone(),
                span: node.span,
                expression: idx,
            });
        }
    }
    diagnostics
}

fn is_callee(arena: &NodeArena, expr: ExprIndex) -> bool {
    let Some(node) = arena.get_expr(expr) else {
        return false;
    };
    matches!(
        arena.get_expr(node.parent).map(|parent| &parent.expr),
        Some(Expression::Call { callee, .. }) if *callee == expr
    )
}
