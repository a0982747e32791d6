//! Lowering from the nested tree form into a [`NodeArena`].
//!
//! Parents are reserved before their children so that every child can carry
//! its parent's index; the parent payload is filled in once all children have
//! been lowered. Nesting beyond the limits in [`exscope_common::limits`] is
//! rejected before it can exhaust the stack.

use crate::arena::{NodeArena, TreeError};
use crate::base::{ExprIndex, NodeIndex};
use crate::node::{Binding, Declarator, Expression, PatternNode, Statement, SwitchLabel};
use crate::syntax::{Decl, Expr, ExprKind, Ident, Label, Pattern, Procedure, Section, Stmt, StmtKind};
use exscope_common::Span;
use exscope_common::limits::{MAX_EXPRESSION_DEPTH, MAX_STATEMENT_NESTING_DEPTH};
use tracing::debug;

/// Lower one procedure into a fresh arena.
pub fn lower_procedure(procedure: &Procedure) -> Result<NodeArena, TreeError> {
    let mut lowerer = Lowerer::new(&procedure.name);
    lowerer.arena.parameters = procedure
        .parameters
        .iter()
        .map(|p| lowerer.binding(p))
        .collect();
    let root = lowerer.lower_stmt(&procedure.body, NodeIndex::NONE)?;
    lowerer.arena.root = root;
    debug!(
        procedure = %procedure.name,
        statements = lowerer.arena.statements.len(),
        expressions = lowerer.arena.expressions.len(),
        "lowered procedure"
    );
    Ok(lowerer.arena)
}

impl NodeArena {
    /// Lower a nested procedure into an arena.
    pub fn from_procedure(procedure: &Procedure) -> Result<NodeArena, TreeError> {
        lower_procedure(procedure)
    }
}

struct Lowerer {
    arena: NodeArena,
    /// Next synthetic offset for nodes without a source span.
    next_offset: u32,
    statement_depth: u32,
    expression_depth: u32,
}

impl Lowerer {
    fn new(name: &str) -> Self {
        Lowerer {
            arena: NodeArena::new(name),
            next_offset: 0,
            statement_depth: 0,
            expression_depth: 0,
        }
    }

    fn open(&mut self, given: Option<Span>) -> u32 {
        match given {
            Some(span) => {
                self.next_offset = self.next_offset.max(span.start);
                span.start
            }
            None => {
                let start = self.next_offset;
                self.next_offset += 1;
                start
            }
        }
    }

    fn close(&mut self, start: u32, given: Option<Span>) -> Span {
        match given {
            Some(span) => {
                self.next_offset = self.next_offset.max(span.end);
                span
            }
            None => {
                let end = self.next_offset.max(start + 1);
                self.next_offset = end + 1;
                Span::new(start, end)
            }
        }
    }

    fn binding(&mut self, ident: &Ident) -> Binding {
        let start = self.open(ident.span);
        let span = self.close(start, ident.span);
        Binding::new(ident.name.clone(), span)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn lower_stmt(&mut self, stmt: &Stmt, parent: NodeIndex) -> Result<NodeIndex, TreeError> {
        if self.statement_depth >= MAX_STATEMENT_NESTING_DEPTH {
            return Err(TreeError::StatementsTooDeep {
                procedure: self.arena.name.clone(),
                limit: MAX_STATEMENT_NESTING_DEPTH,
            });
        }
        self.statement_depth += 1;
        let lowered = self.lower_stmt_node(stmt, parent);
        self.statement_depth -= 1;
        lowered
    }

    fn lower_stmt_node(&mut self, stmt: &Stmt, parent: NodeIndex) -> Result<NodeIndex, TreeError> {
        let start = self.open(stmt.span);
        let idx = self.arena.add_statement(Statement::Empty, Span::DUMMY, parent);

        let lowered = match &stmt.kind {
            StmtKind::Block { statements } => Statement::Block {
                statements: self.lower_list(statements, idx)?,
            },
            StmtKind::If {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.lower_expr(condition, idx, ExprIndex::NONE)?;
                let then_statement = self.lower_stmt(then, idx)?;
                let else_statement = match otherwise {
                    Some(stmt) => self.lower_stmt(stmt, idx)?,
                    None => NodeIndex::NONE,
                };
                Statement::If {
                    condition,
                    then_statement,
                    else_statement,
                }
            }
            StmtKind::While { condition, body } => {
                let condition = self.lower_expr(condition, idx, ExprIndex::NONE)?;
                let body = self.lower_stmt(body, idx)?;
                Statement::While { condition, body }
            }
            StmtKind::DoWhile { body, condition } => {
                let body = self.lower_stmt(body, idx)?;
                let condition = self.lower_expr(condition, idx, ExprIndex::NONE)?;
                Statement::DoWhile { body, condition }
            }
            StmtKind::For {
                declarators,
                initializers,
                condition,
                incrementors,
                body,
            } => {
                let declarators = self.lower_declarators(declarators, idx)?;
                let initializers = self.lower_exprs(initializers, idx)?;
                let condition = self.lower_opt_expr(condition.as_ref(), idx)?;
                let incrementors = self.lower_exprs(incrementors, idx)?;
                let body = self.lower_stmt(body, idx)?;
                Statement::For {
                    declarators,
                    initializers,
                    condition,
                    incrementors,
                    body,
                }
            }
            StmtKind::ForEach {
                variable,
                collection,
                body,
            } => {
                let variable = self.binding(variable);
                let collection = self.lower_expr(collection, idx, ExprIndex::NONE)?;
                let body = self.lower_stmt(body, idx)?;
                Statement::ForEach {
                    variable,
                    collection,
                    body,
                }
            }
            StmtKind::Using {
                declarators,
                resource,
                body,
            } => {
                let declarators = self.lower_declarators(declarators, idx)?;
                let resource = self.lower_opt_expr(resource.as_ref(), idx)?;
                let body = self.lower_stmt(body, idx)?;
                Statement::Using {
                    declarators,
                    resource,
                    body,
                }
            }
            StmtKind::Switch { subject, sections } => {
                let subject = self.lower_expr(subject, idx, ExprIndex::NONE)?;
                let sections = sections
                    .iter()
                    .map(|section| self.lower_section(section, idx))
                    .collect::<Result<_, _>>()?;
                Statement::Switch { subject, sections }
            }
            StmtKind::Local { declarators } => Statement::LocalDeclaration {
                declarators: self.lower_declarators(declarators, idx)?,
            },
            StmtKind::Expression { expression } => Statement::Expression {
                expression: self.lower_expr(expression, idx, ExprIndex::NONE)?,
            },
            StmtKind::Return { value } => Statement::Return {
                value: self.lower_opt_expr(value.as_ref(), idx)?,
            },
            StmtKind::Throw { value } => Statement::Throw {
                value: self.lower_opt_expr(value.as_ref(), idx)?,
            },
            StmtKind::Break => Statement::Break,
            StmtKind::Continue => Statement::Continue,
            StmtKind::Labeled { label, body } => Statement::Labeled {
                label: label.clone(),
                body: self.lower_stmt(body, idx)?,
            },
            StmtKind::Empty => Statement::Empty,
        };

        self.arena.replace_statement(idx, lowered);
        let span = self.close(start, stmt.span);
        self.arena.set_statement_span(idx, span);
        Ok(idx)
    }

    fn lower_list(&mut self, statements: &[Stmt], parent: NodeIndex) -> Result<Vec<NodeIndex>, TreeError> {
        statements
            .iter()
            .map(|stmt| self.lower_stmt(stmt, parent))
            .collect()
    }

    fn lower_section(&mut self, section: &Section, parent: NodeIndex) -> Result<NodeIndex, TreeError> {
        let start = self.open(section.span);
        let idx = self.arena.add_statement(Statement::Empty, Span::DUMMY, parent);
        let labels = section
            .labels
            .iter()
            .map(|label| self.lower_label(label, idx))
            .collect::<Result<_, _>>()?;
        let statements = self.lower_list(&section.statements, idx)?;
        self.arena
            .replace_statement(idx, Statement::SwitchSection { labels, statements });
        let span = self.close(start, section.span);
        self.arena.set_statement_span(idx, span);
        Ok(idx)
    }

    fn lower_label(&mut self, label: &Label, statement: NodeIndex) -> Result<SwitchLabel, TreeError> {
        let start = self.open(None);
        let (pattern, guard) = match label {
            Label::Case { pattern, when } => {
                let pattern = self.lower_pattern(pattern, statement, ExprIndex::NONE)?;
                let guard = self.lower_opt_expr(when.as_ref(), statement)?;
                (Some(pattern), guard)
            }
            Label::Default => (None, ExprIndex::NONE),
        };
        let span = self.close(start, None);
        Ok(SwitchLabel {
            pattern,
            guard,
            span,
        })
    }

    fn lower_declarators(
        &mut self,
        declarators: &[Decl],
        statement: NodeIndex,
    ) -> Result<Vec<Declarator>, TreeError> {
        declarators
            .iter()
            .map(|decl| -> Result<Declarator, TreeError> {
                let binding = self.binding(&decl.name);
                let initializer = self.lower_opt_expr(decl.initializer.as_ref(), statement)?;
                Ok(Declarator {
                    binding,
                    initializer,
                })
            })
            .collect()
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn lower_exprs(&mut self, exprs: &[Expr], statement: NodeIndex) -> Result<Vec<ExprIndex>, TreeError> {
        exprs
            .iter()
            .map(|expr| self.lower_expr(expr, statement, ExprIndex::NONE))
            .collect()
    }

    fn lower_opt_expr(&mut self, expr: Option<&Expr>, statement: NodeIndex) -> Result<ExprIndex, TreeError> {
        match expr {
            Some(expr) => self.lower_expr(expr, statement, ExprIndex::NONE),
            None => Ok(ExprIndex::NONE),
        }
    }

    fn lower_expr(
        &mut self,
        expr: &Expr,
        statement: NodeIndex,
        parent: ExprIndex,
    ) -> Result<ExprIndex, TreeError> {
        self.enter_expression()?;
        let lowered = self.lower_expr_node(expr, statement, parent);
        self.expression_depth -= 1;
        lowered
    }

    fn enter_expression(&mut self) -> Result<(), TreeError> {
        if self.expression_depth >= MAX_EXPRESSION_DEPTH {
            return Err(TreeError::ExpressionsTooDeep {
                procedure: self.arena.name.clone(),
                limit: MAX_EXPRESSION_DEPTH,
            });
        }
        self.expression_depth += 1;
        Ok(())
    }

    fn lower_expr_node(
        &mut self,
        expr: &Expr,
        statement: NodeIndex,
        parent: ExprIndex,
    ) -> Result<ExprIndex, TreeError> {
        let start = self.open(expr.span);
        let idx = self.arena.add_expression(
            Expression::Literal {
                value: String::new(),
            },
            Span::DUMMY,
            statement,
            parent,
        );
        let sub = |this: &mut Self, child: &Expr| this.lower_expr(child, statement, idx);

        let lowered = match &expr.kind {
            ExprKind::Name { name } => Expression::Name { name: name.clone() },
            ExprKind::Literal { value } => Expression::Literal {
                value: value.clone(),
            },
            ExprKind::Unary { op, operand } => Expression::Unary {
                op: op.clone(),
                operand: sub(self, operand)?,
            },
            ExprKind::Binary { op, left, right } => {
                let left = sub(self, left)?;
                let right = sub(self, right)?;
                Expression::Binary {
                    op: op.clone(),
                    left,
                    right,
                }
            }
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                let condition = sub(self, condition)?;
                let when_true = sub(self, when_true)?;
                let when_false = sub(self, when_false)?;
                Expression::Conditional {
                    condition,
                    when_true,
                    when_false,
                }
            }
            ExprKind::Paren { inner } => Expression::Paren {
                inner: sub(self, inner)?,
            },
            ExprKind::Call { callee, arguments } => {
                let callee = sub(self, callee)?;
                let arguments = arguments
                    .iter()
                    .map(|arg| sub(self, arg))
                    .collect::<Result<_, _>>()?;
                Expression::Call { callee, arguments }
            }
            ExprKind::Member { target, member } => Expression::Member {
                target: sub(self, target)?,
                member: member.clone(),
            },
            ExprKind::Assign { target, value } => {
                let target = sub(self, target)?;
                let value = sub(self, value)?;
                Expression::Assign { target, value }
            }
            ExprKind::Is { operand, pattern } => {
                let operand = sub(self, operand)?;
                let pattern = self.lower_pattern(pattern, statement, idx)?;
                Expression::Is { operand, pattern }
            }
            ExprKind::OutVar { ty, name } => Expression::OutVar {
                ty: ty.clone(),
                binding: self.binding(name),
            },
            ExprKind::Out { name } => Expression::Out { name: name.clone() },
        };

        self.arena.replace_expression(idx, lowered);
        let span = self.close(start, expr.span);
        self.arena.set_expression_span(idx, span);
        Ok(idx)
    }

    /// Sub-patterns count against the expression depth limit.
    fn lower_pattern(
        &mut self,
        pattern: &Pattern,
        statement: NodeIndex,
        parent: ExprIndex,
    ) -> Result<PatternNode, TreeError> {
        self.enter_expression()?;
        let lowered = self.lower_pattern_node(pattern, statement, parent);
        self.expression_depth -= 1;
        lowered
    }

    fn lower_pattern_node(
        &mut self,
        pattern: &Pattern,
        statement: NodeIndex,
        parent: ExprIndex,
    ) -> Result<PatternNode, TreeError> {
        let node = match pattern {
            Pattern::Type { ty } => PatternNode::Type { ty: ty.clone() },
            Pattern::Declaration { ty, name } => PatternNode::Declaration {
                ty: ty.clone(),
                binding: self.binding(name),
            },
            Pattern::Var { name } => PatternNode::Var {
                binding: self.binding(name),
            },
            Pattern::Constant { value } => PatternNode::Constant {
                value: self.lower_expr(value, statement, parent)?,
            },
            Pattern::Discard => PatternNode::Discard,
            Pattern::Recursive {
                ty,
                subpatterns,
                name,
            } => {
                let subpatterns = subpatterns
                    .iter()
                    .map(|sub| self.lower_pattern(sub, statement, parent))
                    .collect::<Result<_, _>>()?;
                let binding = name.as_ref().map(|n| self.binding(n));
                PatternNode::Recursive {
                    ty: ty.clone(),
                    subpatterns,
                    binding,
                }
            }
            Pattern::Not { pattern } => PatternNode::Not {
                pattern: Box::new(self.lower_pattern(pattern, statement, parent)?),
            },
        };
        Ok(node)
    }
}
