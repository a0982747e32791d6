//! Node arena for statement/expression storage.
//!
//! One arena holds one procedure body. Nodes are stored contiguously and
//! referenced by index; the arena is immutable once lowering finishes.

use crate::base::{ExprIndex, NodeIndex};
use crate::node::{
    BodySlot, Binding, Declarator, Expression, ExpressionNode, PatternNode, Statement,
    StatementKind, StatementNode, StatementPosition,
};
use exscope_common::Span;
use exscope_common::limits::MAX_TREE_WALK_ITERATIONS;
use smallvec::SmallVec;
use thiserror::Error;

/// Structural defects found by [`NodeArena::check_links`] or while lowering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("procedure `{0}` has no root statement")]
    MissingRoot(String),
    #[error("statement {parent} refers to missing statement {child}")]
    DanglingStatement { parent: NodeIndex, child: NodeIndex },
    #[error("statement {statement} refers to missing expression {expr}")]
    DanglingExpression { statement: NodeIndex, expr: ExprIndex },
    #[error("statement {child} lists parent {found} but is owned by {expected}")]
    ParentMismatch {
        child: NodeIndex,
        expected: NodeIndex,
        found: NodeIndex,
    },
    #[error("expression {expr} lists owning statement {found} but is owned by {expected}")]
    ExpressionOwnerMismatch {
        expr: ExprIndex,
        expected: NodeIndex,
        found: NodeIndex,
    },
    #[error("switch {switch} contains non-section statement {child}")]
    MisplacedSection { switch: NodeIndex, child: NodeIndex },
    #[error("statements in `{procedure}` are nested more than {limit} levels deep")]
    StatementsTooDeep { procedure: String, limit: u32 },
    #[error("expressions in `{procedure}` are nested more than {limit} levels deep")]
    ExpressionsTooDeep { procedure: String, limit: u32 },
}

/// Arena-based storage for one procedure body.
#[derive(Debug, Default, Clone)]
pub struct NodeArena {
    /// Procedure name, used for diagnostics and logging.
    pub name: String,
    pub statements: Vec<StatementNode>,
    pub expressions: Vec<ExpressionNode>,
    /// Procedure parameters, declared in the root region.
    pub parameters: Vec<Binding>,
    pub root: NodeIndex,
}

impl NodeArena {
    pub fn new(name: impl Into<String>) -> NodeArena {
        NodeArena {
            name: name.into(),
            root: NodeIndex::NONE,
            ..NodeArena::default()
        }
    }

    pub fn with_capacity(name: impl Into<String>, statements: usize, expressions: usize) -> Self {
        NodeArena {
            name: name.into(),
            statements: Vec::with_capacity(statements),
            expressions: Vec::with_capacity(expressions),
            parameters: Vec::new(),
            root: NodeIndex::NONE,
        }
    }

    // =========================================================================
    // Node creation
    // =========================================================================

    /// Add a statement to the arena and return its index.
    pub fn add_statement(&mut self, stmt: Statement, span: Span, parent: NodeIndex) -> NodeIndex {
        let index = self.statements.len() as u32;
        self.statements.push(StatementNode { stmt, span, parent });
        NodeIndex(index)
    }

    /// Add an expression to the arena and return its index.
    pub fn add_expression(
        &mut self,
        expr: Expression,
        span: Span,
        statement: NodeIndex,
        parent: ExprIndex,
    ) -> ExprIndex {
        let index = self.expressions.len() as u32;
        self.expressions.push(ExpressionNode {
            expr,
            span,
            statement,
            parent,
        });
        ExprIndex(index)
    }

    /// Replace the payload of a statement reserved earlier.
    /// Returns the old payload if successful.
    pub fn replace_statement(&mut self, index: NodeIndex, stmt: Statement) -> Option<Statement> {
        if index.is_none() {
            return None;
        }
        self.statements
            .get_mut(index.0 as usize)
            .map(|old| std::mem::replace(&mut old.stmt, stmt))
    }

    /// Replace the payload of an expression reserved earlier.
    pub fn replace_expression(&mut self, index: ExprIndex, expr: Expression) -> Option<Expression> {
        if index.is_none() {
            return None;
        }
        self.expressions
            .get_mut(index.0 as usize)
            .map(|old| std::mem::replace(&mut old.expr, expr))
    }

    /// Fix up the span of a node once its children have been lowered.
    pub fn set_statement_span(&mut self, index: NodeIndex, span: Span) {
        if let Some(node) = self.statements.get_mut(index.0 as usize) {
            node.span = span;
        }
    }

    pub fn set_expression_span(&mut self, index: ExprIndex, span: Span) {
        if let Some(node) = self.expressions.get_mut(index.0 as usize) {
            node.span = span;
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&StatementNode> {
        if index.is_none() {
            None
        } else {
            self.statements.get(index.0 as usize)
        }
    }

    #[inline]
    pub fn get_expr(&self, index: ExprIndex) -> Option<&ExpressionNode> {
        if index.is_none() {
            None
        } else {
            self.expressions.get(index.0 as usize)
        }
    }

    #[inline]
    pub fn kind(&self, index: NodeIndex) -> Option<StatementKind> {
        self.get(index).map(StatementNode::kind)
    }

    #[inline]
    pub fn span(&self, index: NodeIndex) -> Span {
        self.get(index).map_or(Span::DUMMY, |node| node.span)
    }

    #[inline]
    pub fn expr_span(&self, index: ExprIndex) -> Span {
        self.get_expr(index).map_or(Span::DUMMY, |node| node.span)
    }

    #[inline]
    pub fn parent(&self, index: NodeIndex) -> NodeIndex {
        self.get(index).map_or(NodeIndex::NONE, |node| node.parent)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Statements of a block or switch section; empty for other kinds.
    pub fn statement_list(&self, index: NodeIndex) -> &[NodeIndex] {
        match self.get(index).map(|node| &node.stmt) {
            Some(Statement::Block { statements })
            | Some(Statement::SwitchSection { statements, .. }) => statements,
            _ => &[],
        }
    }

    /// Indexes of every statement of the given kind, in arena order.
    pub fn statements_of_kind(&self, kind: StatementKind) -> impl Iterator<Item = NodeIndex> + '_ {
        self.statements
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.kind() == kind)
            .map(|(i, _)| NodeIndex(i as u32))
    }

    /// Child statements together with the position each occupies, in source order.
    pub fn child_statements(&self, index: NodeIndex) -> SmallVec<[(NodeIndex, StatementPosition); 4]> {
        let mut out = SmallVec::new();
        let Some(node) = self.get(index) else {
            return out;
        };
        let nested = |slot| StatementPosition::NestedBody(slot);
        match &node.stmt {
            Statement::Block { statements } | Statement::SwitchSection { statements, .. } => {
                out.extend(statements.iter().map(|&s| (s, StatementPosition::Member)));
            }
            Statement::Switch { sections, .. } => {
                out.extend(sections.iter().map(|&s| (s, StatementPosition::Member)));
            }
            Statement::If {
                then_statement,
                else_statement,
                ..
            } => {
                out.push((*then_statement, nested(BodySlot::Then)));
                if else_statement.is_some() {
                    out.push((*else_statement, nested(BodySlot::Else)));
                }
            }
            Statement::While { body, .. }
            | Statement::DoWhile { body, .. }
            | Statement::For { body, .. }
            | Statement::ForEach { body, .. } => out.push((*body, nested(BodySlot::LoopBody))),
            Statement::Using { body, .. } => out.push((*body, nested(BodySlot::ResourceBody))),
            Statement::Labeled { body, .. } => out.push((*body, nested(BodySlot::LabeledBody))),
            Statement::LocalDeclaration { .. }
            | Statement::Expression { .. }
            | Statement::Return { .. }
            | Statement::Throw { .. }
            | Statement::Break
            | Statement::Continue
            | Statement::Empty => {}
        }
        out
    }

    /// Header expressions owned directly by a statement, in evaluation order.
    ///
    /// Declarator initializers and switch label guards are included; pattern
    /// constants of switch labels are reached through [`Self::pattern_expressions`].
    pub fn statement_expressions(&self, index: NodeIndex) -> SmallVec<[ExprIndex; 4]> {
        let mut out = SmallVec::new();
        let Some(node) = self.get(index) else {
            return out;
        };
        let initializers =
            |decls: &[Declarator], out: &mut SmallVec<[ExprIndex; 4]>| {
                out.extend(decls.iter().map(|d| d.initializer).filter(|e| e.is_some()));
            };
        match &node.stmt {
            Statement::If { condition, .. }
            | Statement::While { condition, .. }
            | Statement::DoWhile { condition, .. } => out.push(*condition),
            Statement::For {
                declarators,
                initializers: inits,
                condition,
                incrementors,
                ..
            } => {
                initializers(declarators, &mut out);
                out.extend(inits.iter().copied());
                out.push(*condition);
                out.extend(incrementors.iter().copied());
            }
            Statement::ForEach { collection, .. } => out.push(*collection),
            Statement::Using {
                declarators,
                resource,
                ..
            } => {
                initializers(declarators, &mut out);
                out.push(*resource);
            }
            Statement::Switch { subject, .. } => out.push(*subject),
            Statement::SwitchSection { labels, .. } => {
                for label in labels {
                    if let Some(pattern) = &label.pattern {
                        Self::pattern_expressions(pattern, &mut out);
                    }
                    out.push(label.guard);
                }
            }
            Statement::LocalDeclaration { declarators } => initializers(declarators, &mut out),
            Statement::Expression { expression } => out.push(*expression),
            Statement::Return { value } | Statement::Throw { value } => out.push(*value),
            Statement::Block { .. }
            | Statement::Break
            | Statement::Continue
            | Statement::Labeled { .. }
            | Statement::Empty => {}
        }
        out.retain(|e| e.is_some());
        out
    }

    /// Direct sub-expressions of an expression, in evaluation order.
    pub fn expression_children(&self, index: ExprIndex) -> SmallVec<[ExprIndex; 4]> {
        let mut out = SmallVec::new();
        let Some(node) = self.get_expr(index) else {
            return out;
        };
        match &node.expr {
            Expression::Unary { operand, .. } => out.push(*operand),
            Expression::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            Expression::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                out.push(*condition);
                out.push(*when_true);
                out.push(*when_false);
            }
            Expression::Paren { inner } => out.push(*inner),
            Expression::Call { callee, arguments } => {
                out.push(*callee);
                out.extend(arguments.iter().copied());
            }
            Expression::Member { target, .. } => out.push(*target),
            Expression::Assign { target, value } => {
                out.push(*target);
                out.push(*value);
            }
            Expression::Is { operand, pattern } => {
                out.push(*operand);
                Self::pattern_expressions(pattern, &mut out);
            }
            Expression::Name { .. }
            | Expression::Literal { .. }
            | Expression::OutVar { .. }
            | Expression::Out { .. } => {}
        }
        out.retain(|e| e.is_some());
        out
    }

    /// Constant sub-expressions embedded in a pattern, in source order.
    pub fn pattern_expressions<A: smallvec::Array<Item = ExprIndex>>(
        pattern: &PatternNode,
        out: &mut SmallVec<A>,
    ) {
        match pattern {
            PatternNode::Constant { value } => out.push(*value),
            PatternNode::Recursive { subpatterns, .. } => {
                for sub in subpatterns {
                    Self::pattern_expressions(sub, out);
                }
            }
            PatternNode::Not { pattern } => Self::pattern_expressions(pattern, out),
            PatternNode::Type { .. }
            | PatternNode::Declaration { .. }
            | PatternNode::Var { .. }
            | PatternNode::Discard => {}
        }
    }

    /// Position of a statement in its parent, derived from the parent's child lists.
    pub fn position_of(&self, index: NodeIndex) -> Option<StatementPosition> {
        let node = self.get(index)?;
        if node.parent.is_none() {
            return Some(StatementPosition::Root);
        }
        self.child_statements(node.parent)
            .into_iter()
            .find(|(child, _)| *child == index)
            .map(|(_, position)| position)
    }

    /// Walk from a statement to the root, yielding each ancestor (exclusive).
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut current = self.parent(index);
        let mut iterations = 0;
        std::iter::from_fn(move || {
            if current.is_none() || iterations > MAX_TREE_WALK_ITERATIONS {
                return None;
            }
            iterations += 1;
            let out = current;
            current = self.parent(current);
            Some(out)
        })
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Verify that child lists and back-references agree.
    ///
    /// The lowering in this crate always produces consistent arenas; arenas
    /// assembled by hand or by another front end may not.
    pub fn check_links(&self) -> Result<(), TreeError> {
        if self.get(self.root).is_none() {
            return Err(TreeError::MissingRoot(self.name.clone()));
        }
        for (i, node) in self.statements.iter().enumerate() {
            let idx = NodeIndex(i as u32);
            for (child, _) in self.child_statements(idx) {
                let Some(child_node) = self.get(child) else {
                    return Err(TreeError::DanglingStatement { parent: idx, child });
                };
                if child_node.parent != idx {
                    return Err(TreeError::ParentMismatch {
                        child,
                        expected: idx,
                        found: child_node.parent,
                    });
                }
                if node.kind() == StatementKind::Switch
                    && child_node.kind() != StatementKind::SwitchSection
                {
                    return Err(TreeError::MisplacedSection { switch: idx, child });
                }
            }
            for expr in self.statement_expressions(idx) {
                self.check_expression(idx, expr)?;
            }
        }
        Ok(())
    }

    fn check_expression(&self, statement: NodeIndex, expr: ExprIndex) -> Result<(), TreeError> {
        let mut stack: SmallVec<[ExprIndex; 16]> = SmallVec::new();
        stack.push(expr);
        while let Some(current) = stack.pop() {
            let Some(node) = self.get_expr(current) else {
                return Err(TreeError::DanglingExpression {
                    statement,
                    expr: current,
                });
            };
            if node.statement != statement {
                return Err(TreeError::ExpressionOwnerMismatch {
                    expr: current,
                    expected: statement,
                    found: node.statement,
                });
            }
            stack.extend(self.expression_children(current));
        }
        Ok(())
    }
}
