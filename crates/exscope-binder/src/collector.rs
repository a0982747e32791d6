//! Introduction-site collection.
//!
//! Scans one expression subtree and lists every name it introduces, in
//! left-to-right evaluation order. The collector never reports errors:
//! duplicate names inside one expression are passed through and left to
//! the conflict checker.

use crate::declarations::DeclarationKind;
use exscope_common::Span;
use exscope_common::limits::MAX_EXPRESSION_DEPTH;
use exscope_syntax::{Binding, ExprIndex, Expression, NodeArena, NodeIndex, PatternNode};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::trace;

/// One place where an expression introduces a name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntroductionSite {
    pub name: String,
    pub kind: DeclarationKind,
    pub span: Span,
    /// `is` or `out var` expression that introduced the name, `NONE` for a
    /// switch label pattern.
    pub expression: ExprIndex,
    /// Statement that owns the introducing expression or label.
    pub statement: NodeIndex,
}

/// Collect the introduction sites of the expression tree rooted at `expr`.
pub fn collect_introductions(arena: &NodeArena, expr: ExprIndex) -> Vec<IntroductionSite> {
    let mut sites = Vec::new();
    collect_into(arena, expr, &mut sites);
    sites
}

/// Append the introduction sites of `expr` to `sites`.
pub fn collect_into(arena: &NodeArena, expr: ExprIndex, sites: &mut Vec<IntroductionSite>) {
    let Some(node) = arena.get_expr(expr) else {
        return;
    };
    let mut collector = Collector {
        arena,
        statement: node.statement,
        sites,
    };
    collector.visit(expr, 0);
}

/// Append the sites of a switch label pattern, owned by `section`.
pub fn collect_label_pattern(
    arena: &NodeArena,
    pattern: &PatternNode,
    section: NodeIndex,
    sites: &mut Vec<IntroductionSite>,
) {
    let mut collector = Collector {
        arena,
        statement: section,
        sites,
    };
    collector.visit_pattern(pattern, ExprIndex::NONE, 0);
}

struct Collector<'a, 'b> {
    arena: &'a NodeArena,
    statement: NodeIndex,
    sites: &'b mut Vec<IntroductionSite>,
}

impl Collector<'_, '_> {
    fn push(&mut self, binding: &Binding, kind: DeclarationKind, expression: ExprIndex) {
        if binding.is_discard() {
            return;
        }
        trace!(name = %binding.name, ?kind, %expression, "introduction site");
        self.sites.push(IntroductionSite {
            name: binding.name.clone(),
            kind,
            span: binding.span,
            expression,
            statement: self.statement,
        });
    }

    fn visit(&mut self, expr: ExprIndex, depth: u32) {
        if depth > MAX_EXPRESSION_DEPTH {
            return;
        }
        let Some(node) = self.arena.get_expr(expr) else {
            return;
        };
        match &node.expr {
            Expression::Is { operand, pattern } => {
                self.visit(*operand, depth + 1);
                self.visit_pattern(pattern, expr, depth + 1);
            }
            Expression::OutVar { binding, .. } => {
                self.push(binding, DeclarationKind::OutputArgument, expr);
            }
            _ => {
                let children: SmallVec<[ExprIndex; 4]> = self.arena.expression_children(expr);
                for child in children {
                    self.visit(child, depth + 1);
                }
            }
        }
    }

    fn visit_pattern(&mut self, pattern: &PatternNode, owner: ExprIndex, depth: u32) {
        if depth > MAX_EXPRESSION_DEPTH {
            return;
        }
        match pattern {
            PatternNode::Declaration { binding, .. } | PatternNode::Var { binding } => {
                self.push(binding, DeclarationKind::PatternVariable, owner);
            }
            PatternNode::Recursive {
                subpatterns,
                binding,
                ..
            } => {
                for sub in subpatterns {
                    self.visit_pattern(sub, owner, depth + 1);
                }
                if let Some(binding) = binding {
                    self.push(binding, DeclarationKind::PatternVariable, owner);
                }
            }
            PatternNode::Not { pattern } => self.visit_pattern(pattern, owner, depth + 1),
            PatternNode::Constant { value } => self.visit(*value, depth + 1),
            PatternNode::Type { .. } | PatternNode::Discard => {}
        }
    }
}
