//! Scope tree construction.
//!
//! [`BinderState`] walks one procedure body once, keeping a stack of open
//! regions. Boundary statements push a region; embedded statements add their
//! declarations to whatever region is on top of the stack. An `if` with a
//! plain `else` keeps its condition in the enclosing region and opens one
//! tagged region per branch. An `else if` chain is flattened into one sibling
//! link region per branch so that a condition's declarations stay inside the
//! branch it guards.

use crate::classifier;
use crate::collector::{self, IntroductionSite};
use crate::declarations::{DeclId, Declaration, DeclarationKind};
use crate::scopes::{BranchTag, RegionKind, ScopeId, ScopeRegion};
use crate::tree::ScopeTree;
use exscope_common::Span;
use exscope_common::limits::MAX_STATEMENT_NESTING_DEPTH;
use exscope_syntax::{
    BodySlot, Declarator, ExprIndex, NodeArena, NodeIndex, Statement, StatementKind,
    StatementNode, StatementPosition, SwitchLabel, TreeError,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, trace};

/// Configuration options for the binder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinderOptions {
    /// Warn about declarations sitting at least this many unbraced nested
    /// bodies below their owning region's boundary. `None` disables the lint.
    pub warn_nested_bleed: Option<u32>,
    /// Report `Name` and `Out` references that resolve to nothing.
    pub check_references: bool,
    /// Names that are always in scope (fields, methods, imported types).
    pub globals: Vec<String>,
    /// Deepest statement nesting accepted before the builder gives up.
    pub max_nesting_depth: u32,
}

impl Default for BinderOptions {
    fn default() -> Self {
        BinderOptions {
            warn_nested_bleed: None,
            check_references: false,
            globals: Vec::new(),
            max_nesting_depth: MAX_STATEMENT_NESTING_DEPTH,
        }
    }
}

/// Internal-consistency failures while building a scope tree.
///
/// These describe a broken input tree, not a user error in the analyzed code;
/// user-facing problems are [`crate::ScopeDiagnostic`] records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("malformed statement tree: {0}")]
    MalformedTree(#[from] TreeError),
    #[error("statement {statement} is nested more than {limit} levels deep")]
    NestingTooDeep { statement: NodeIndex, limit: u32 },
}

/// Builder state for one procedure body.
pub struct BinderState {
    pub options: BinderOptions,
    regions: Vec<ScopeRegion>,
    declarations: Vec<Declaration>,
    /// Enclosing regions and their bleed depth, innermost last.
    scope_stack: Vec<(ScopeId, u32)>,
    current_scope_id: ScopeId,
    /// Unbraced nested-body levels since the current region's boundary.
    bleed_depth: u32,
    statement_scopes: FxHashMap<NodeIndex, ScopeId>,
    expression_scopes: FxHashMap<ExprIndex, ScopeId>,
    boundary_scopes: FxHashMap<NodeIndex, ScopeId>,
    /// Scratch buffer for the collector.
    sites: Vec<IntroductionSite>,
}

impl Default for BinderState {
    fn default() -> Self {
        Self::new()
    }
}

impl BinderState {
    pub fn new() -> Self {
        Self::with_options(BinderOptions::default())
    }

    pub fn with_options(options: BinderOptions) -> Self {
        BinderState {
            options,
            regions: Vec::new(),
            declarations: Vec::new(),
            scope_stack: Vec::new(),
            current_scope_id: ScopeId::NONE,
            bleed_depth: 0,
            statement_scopes: FxHashMap::default(),
            expression_scopes: FxHashMap::default(),
            boundary_scopes: FxHashMap::default(),
            sites: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.regions.clear();
        self.declarations.clear();
        self.scope_stack.clear();
        self.current_scope_id = ScopeId::NONE;
        self.bleed_depth = 0;
        self.statement_scopes.clear();
        self.expression_scopes.clear();
        self.boundary_scopes.clear();
        self.sites.clear();
    }

    /// Build the scope tree of one procedure body.
    ///
    /// The arena's links are verified first; a tree whose child lists and
    /// parent references disagree is rejected before any region is created.
    #[tracing::instrument(level = "debug", skip_all, fields(procedure = %arena.name))]
    pub fn bind_procedure(&mut self, arena: &NodeArena) -> Result<ScopeTree, ScopeError> {
        self.reset();
        arena.check_links()?;

        let root = arena.root;
        let root_node = Self::node(arena, root)?;
        self.enter_scope(RegionKind::Root, root, root_node.span, None);
        self.statement_scopes.insert(root, self.current_scope_id);

        for param in &arena.parameters {
            self.declare(
                &param.name,
                DeclarationKind::Parameter,
                param.span,
                root,
                ExprIndex::NONE,
            );
        }

        let result = match &root_node.stmt {
            Statement::Block { statements } => statements.iter().try_for_each(|&stmt| {
                self.bind_statement(arena, stmt, StatementPosition::Member, None, 1)
            }),
            _ => self.bind_statement(arena, root, StatementPosition::Root, None, 0),
        };
        self.exit_scope();
        result?;

        debug!(
            regions = self.regions.len(),
            declarations = self.declarations.len(),
            "bound procedure"
        );

        Ok(ScopeTree::new(
            arena.name.clone(),
            std::mem::take(&mut self.regions),
            std::mem::take(&mut self.declarations),
            std::mem::take(&mut self.statement_scopes),
            std::mem::take(&mut self.expression_scopes),
            std::mem::take(&mut self.boundary_scopes),
        ))
    }

    fn node(arena: &NodeArena, index: NodeIndex) -> Result<&StatementNode, ScopeError> {
        arena.get(index).ok_or_else(|| {
            if index == arena.root {
                ScopeError::MalformedTree(TreeError::MissingRoot(arena.name.clone()))
            } else {
                ScopeError::MalformedTree(TreeError::DanglingStatement {
                    parent: arena.parent(index),
                    child: index,
                })
            }
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Bind one statement. `branch` tags the region the statement opens, if
    /// it opens one.
    fn bind_statement(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        position: StatementPosition,
        branch: Option<BranchTag>,
        depth: u32,
    ) -> Result<(), ScopeError> {
        if depth > self.options.max_nesting_depth {
            return Err(ScopeError::NestingTooDeep {
                statement: idx,
                limit: self.options.max_nesting_depth,
            });
        }
        let node = Self::node(arena, idx)?;
        self.statement_scopes.insert(idx, self.current_scope_id);

        let class = classifier::classify(arena, idx, position);
        trace!(
            statement = %idx,
            kind = %node.kind(),
            ?class,
            region = %self.current_scope_id,
            "bind statement"
        );

        let saved_bleed = self.bleed_depth;
        if class.adds_bleed_level() {
            self.bleed_depth += 1;
        }
        let span = node.span;
        let nested = |slot| StatementPosition::NestedBody(slot);

        let result = match &node.stmt {
            Statement::Block { statements } => {
                self.in_region(RegionKind::Block, idx, span, branch, |this| {
                    this.bind_members(arena, statements, depth)
                })
            }
            Statement::If {
                condition,
                then_statement,
                else_statement,
            } if else_statement.is_none() => {
                // No alternative: the condition belongs to the enclosing region.
                self.bind_expression(arena, *condition);
                let tag = self.branch_tag(arena, idx, 0, *then_statement, span, true);
                self.bind_statement(arena, *then_statement, nested(BodySlot::Then), Some(tag), depth + 1)
            }
            Statement::If {
                condition,
                then_statement,
                else_statement,
            } if classifier::is_two_way_if(arena, idx) => {
                // Plain else: the condition is visible in both branches and
                // after the statement.
                self.bind_expression(arena, *condition);
                let then_tag = self.branch_tag(arena, idx, 0, *then_statement, span, true);
                self.bind_branch_body(arena, *then_statement, BodySlot::Then, then_tag, depth + 1)
                    .and_then(|()| {
                        let else_tag = self.branch_tag(arena, idx, 1, *else_statement, span, true);
                        self.bind_branch_body(arena, *else_statement, BodySlot::Else, else_tag, depth + 1)
                    })
            }
            Statement::If { .. } => self.bind_if_chain(arena, idx, depth),
            Statement::While { condition, body } => {
                self.in_region(RegionKind::Loop, idx, span, branch, |this| {
                    this.bind_expression(arena, *condition);
                    this.bind_statement(arena, *body, nested(BodySlot::LoopBody), None, depth + 1)
                })
            }
            Statement::DoWhile { body, condition } => {
                self.in_region(RegionKind::Loop, idx, span, branch, |this| {
                    this.bind_statement(arena, *body, nested(BodySlot::LoopBody), None, depth + 1)?;
                    this.bind_expression(arena, *condition);
                    Ok(())
                })
            }
            Statement::For {
                declarators,
                initializers,
                condition,
                incrementors,
                body,
            } => self.in_region(RegionKind::Loop, idx, span, branch, |this| {
                this.bind_declarators(arena, idx, declarators);
                for &init in initializers {
                    this.bind_expression(arena, init);
                }
                this.bind_expression(arena, *condition);
                for &step in incrementors {
                    this.bind_expression(arena, step);
                }
                this.bind_statement(arena, *body, nested(BodySlot::LoopBody), None, depth + 1)
            }),
            Statement::ForEach {
                variable,
                collection,
                body,
            } => self.in_region(RegionKind::Loop, idx, span, branch, |this| {
                this.declare(
                    &variable.name,
                    DeclarationKind::Iteration,
                    variable.span,
                    idx,
                    ExprIndex::NONE,
                );
                this.bind_expression(arena, *collection);
                this.bind_statement(arena, *body, nested(BodySlot::LoopBody), None, depth + 1)
            }),
            Statement::Using {
                declarators,
                resource,
                body,
            } => self.in_region(RegionKind::Resource, idx, span, branch, |this| {
                this.bind_declarators(arena, idx, declarators);
                this.bind_expression(arena, *resource);
                this.bind_statement(arena, *body, nested(BodySlot::ResourceBody), None, depth + 1)
            }),
            Statement::Switch { subject, sections } => {
                self.bind_expression(arena, *subject);
                self.in_region(RegionKind::Switch, idx, span, branch, |this| {
                    for (k, &section) in sections.iter().enumerate() {
                        let tag = this.branch_tag(arena, idx, k as u32, section, span, false);
                        this.bind_statement(
                            arena,
                            section,
                            StatementPosition::Member,
                            Some(tag),
                            depth + 1,
                        )?;
                    }
                    Ok(())
                })
            }
            Statement::SwitchSection { labels, statements } => {
                self.in_region(RegionKind::Section, idx, span, branch, |this| {
                    for label in labels {
                        this.bind_label(arena, idx, label);
                    }
                    this.bind_members(arena, statements, depth)
                })
            }
            Statement::LocalDeclaration { declarators } => {
                self.bind_declarators(arena, idx, declarators);
                Ok(())
            }
            Statement::Expression { expression: value }
            | Statement::Return { value }
            | Statement::Throw { value } => {
                self.bind_expression(arena, *value);
                Ok(())
            }
            Statement::Labeled { body, .. } => {
                self.bind_statement(arena, *body, nested(BodySlot::LabeledBody), branch, depth + 1)
            }
            Statement::Break | Statement::Continue | Statement::Empty => Ok(()),
        };

        self.bleed_depth = saved_bleed;
        result
    }

    fn bind_members(
        &mut self,
        arena: &NodeArena,
        statements: &[NodeIndex],
        depth: u32,
    ) -> Result<(), ScopeError> {
        for &stmt in statements {
            self.bind_statement(arena, stmt, StatementPosition::Member, None, depth + 1)?;
        }
        Ok(())
    }

    /// Flatten `if (c0) s0 else if (c1) s1 ... else sn` into sibling link
    /// regions tagged with the chain root. Only called for an `if` whose
    /// `else` is another `if`.
    ///
    /// Link `k` holds condition `k` and then-statement `k`; a trailing `else`
    /// is the last link. Nothing declared in a link is visible after the
    /// chain.
    fn bind_if_chain(
        &mut self,
        arena: &NodeArena,
        root: NodeIndex,
        depth: u32,
    ) -> Result<(), ScopeError> {
        let chain_span = arena.span(root);
        let mut link = root;
        let mut index = 0u32;
        let mut depth = depth;

        loop {
            let node = Self::node(arena, link)?;
            let Statement::If {
                condition,
                then_statement,
                else_statement,
            } = &node.stmt
            else {
                return Ok(());
            };
            if link != root {
                if depth > self.options.max_nesting_depth {
                    return Err(ScopeError::NestingTooDeep {
                        statement: link,
                        limit: self.options.max_nesting_depth,
                    });
                }
                self.statement_scopes.insert(link, self.current_scope_id);
            }

            let tag = self.branch_tag(arena, root, index, *then_statement, chain_span, true);
            let then_end = arena.span(*then_statement).end.max(node.span.start);
            let link_span = Span::new(node.span.start, then_end);
            self.in_region(RegionKind::Branch, link, link_span, Some(tag), |this| {
                this.bind_expression(arena, *condition);
                this.bind_statement(
                    arena,
                    *then_statement,
                    StatementPosition::NestedBody(BodySlot::Then),
                    None,
                    depth + 1,
                )
            })?;
            index += 1;

            if else_statement.is_none() {
                return Ok(());
            }
            let else_idx = *else_statement;
            let else_node = Self::node(arena, else_idx)?;
            if else_node.kind() == StatementKind::If {
                link = else_idx;
                depth += 1;
                continue;
            }

            let tag = self.branch_tag(arena, root, index, else_idx, chain_span, true);
            return self.bind_branch_body(arena, else_idx, BodySlot::Else, tag, depth + 1);
        }
    }

    /// Bind one branch of a conditional. A block is tagged directly; any other
    /// statement gets a branch region of its own. The branch statement itself
    /// is recorded in the enclosing region either way.
    fn bind_branch_body(
        &mut self,
        arena: &NodeArena,
        body: NodeIndex,
        slot: BodySlot,
        tag: BranchTag,
        depth: u32,
    ) -> Result<(), ScopeError> {
        let node = Self::node(arena, body)?;
        let position = StatementPosition::NestedBody(slot);
        if node.kind() == StatementKind::Block {
            return self.bind_statement(arena, body, position, Some(tag), depth);
        }
        let enclosing = self.current_scope_id;
        let result = self.in_region(RegionKind::Branch, body, node.span, Some(tag), |this| {
            this.bind_statement(arena, body, position, None, depth)
        });
        self.statement_scopes.insert(body, enclosing);
        result
    }

    fn bind_declarators(&mut self, arena: &NodeArena, statement: NodeIndex, declarators: &[Declarator]) {
        for declarator in declarators {
            let initialized = declarator.initializer.is_some();
            self.declare(
                &declarator.binding.name,
                DeclarationKind::Local { initialized },
                declarator.binding.span,
                statement,
                ExprIndex::NONE,
            );
            self.bind_expression(arena, declarator.initializer);
        }
    }

    fn bind_label(&mut self, arena: &NodeArena, section: NodeIndex, label: &SwitchLabel) {
        if let Some(pattern) = &label.pattern {
            let mut sites = std::mem::take(&mut self.sites);
            sites.clear();
            collector::collect_label_pattern(arena, pattern, section, &mut sites);
            self.declare_sites(&mut sites);
            self.sites = sites;

            let mut constants: SmallVec<[ExprIndex; 4]> = SmallVec::new();
            NodeArena::pattern_expressions(pattern, &mut constants);
            for constant in constants {
                self.record_expression_tree(arena, constant);
            }
        }
        self.bind_expression(arena, label.guard);
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Record the region of every node in the expression tree and declare
    /// the names it introduces.
    fn bind_expression(&mut self, arena: &NodeArena, expr: ExprIndex) {
        if expr.is_none() {
            return;
        }
        self.record_expression_tree(arena, expr);

        let mut sites = std::mem::take(&mut self.sites);
        sites.clear();
        collector::collect_into(arena, expr, &mut sites);
        self.declare_sites(&mut sites);
        self.sites = sites;
    }

    fn declare_sites(&mut self, sites: &mut Vec<IntroductionSite>) {
        for site in sites.drain(..) {
            self.declare(&site.name, site.kind, site.span, site.statement, site.expression);
        }
    }

    fn record_expression_tree(&mut self, arena: &NodeArena, expr: ExprIndex) {
        let mut stack: SmallVec<[ExprIndex; 16]> = SmallVec::new();
        stack.push(expr);
        while let Some(current) = stack.pop() {
            self.expression_scopes.insert(current, self.current_scope_id);
            stack.extend(arena.expression_children(current));
        }
    }

    // =========================================================================
    // Regions and declarations
    // =========================================================================

    fn in_region<F>(
        &mut self,
        kind: RegionKind,
        boundary: NodeIndex,
        span: Span,
        branch: Option<BranchTag>,
        f: F,
    ) -> Result<(), ScopeError>
    where
        F: FnOnce(&mut Self) -> Result<(), ScopeError>,
    {
        self.enter_scope(kind, boundary, span, branch);
        let result = f(self);
        self.exit_scope();
        result
    }

    pub(crate) fn enter_scope(
        &mut self,
        kind: RegionKind,
        boundary: NodeIndex,
        span: Span,
        branch: Option<BranchTag>,
    ) {
        let id = ScopeId(self.regions.len() as u32);
        let parent = self.current_scope_id;
        let depth = self
            .regions
            .get(parent.index())
            .map_or(0, |region| region.depth + 1);
        self.regions
            .push(ScopeRegion::new(id, kind, boundary, span, parent, depth, branch));
        if let Some(parent_region) = self.regions.get_mut(parent.index()) {
            parent_region.children.push(id);
        }
        self.boundary_scopes.entry(boundary).or_insert(id);

        self.scope_stack.push((parent, self.bleed_depth));
        self.current_scope_id = id;
        self.bleed_depth = 0;
        trace!(region = %id, %kind, %boundary, %parent, "enter scope");
    }

    pub(crate) fn exit_scope(&mut self) {
        trace!(region = %self.current_scope_id, "exit scope");
        match self.scope_stack.pop() {
            Some((parent, bleed_depth)) => {
                self.current_scope_id = parent;
                self.bleed_depth = bleed_depth;
            }
            None => {
                self.current_scope_id = ScopeId::NONE;
                self.bleed_depth = 0;
            }
        }
    }

    /// Add a declaration to the region on top of the stack.
    ///
    /// The region's name table keeps the first declaration of each name;
    /// later ones are still recorded in its declaration list for the
    /// conflict checker.
    fn declare(
        &mut self,
        name: &str,
        kind: DeclarationKind,
        span: Span,
        statement: NodeIndex,
        expression: ExprIndex,
    ) -> DeclId {
        let id = DeclId(self.declarations.len() as u32);
        let region = self.current_scope_id;
        self.declarations.push(Declaration {
            id,
            name: name.to_string(),
            kind,
            span,
            region,
            statement,
            expression,
            sequence: id.0,
            bleed_depth: self.bleed_depth,
        });
        if let Some(scope) = self.regions.get_mut(region.index()) {
            scope.table.entry(name.to_string()).or_insert(id);
            scope.declarations.push(id);
        }
        debug!(
            name,
            kind = kind.describe(),
            %region,
            bleed_depth = self.bleed_depth,
            "declare"
        );
        id
    }

    fn branch_tag(
        &self,
        arena: &NodeArena,
        conditional: NodeIndex,
        index: u32,
        body: NodeIndex,
        conditional_span: Span,
        break_exits: bool,
    ) -> BranchTag {
        BranchTag {
            conditional,
            index,
            exits: always_exits(arena, body, break_exits, self.options.max_nesting_depth),
            conditional_span,
        }
    }
}

/// Whether every path through `idx` leaves the enclosing conditional early.
///
/// `break` counts as an exit for `if` branches, where it skips the rest of
/// the enclosing loop or section, but not for switch sections, where it
/// continues after the switch.
fn always_exits(arena: &NodeArena, idx: NodeIndex, break_exits: bool, limit: u32) -> bool {
    if limit == 0 {
        return false;
    }
    let Some(node) = arena.get(idx) else {
        return false;
    };
    match &node.stmt {
        Statement::Return { .. } | Statement::Throw { .. } | Statement::Continue => true,
        Statement::Break => break_exits,
        Statement::Block { statements } | Statement::SwitchSection { statements, .. } => statements
            .iter()
            .any(|&s| always_exits(arena, s, break_exits, limit - 1)),
        Statement::If {
            then_statement,
            else_statement,
            ..
        } => {
            else_statement.is_some()
                && always_exits(arena, *then_statement, break_exits, limit - 1)
                && always_exits(arena, *else_statement, break_exits, limit - 1)
        }
        Statement::Labeled { body, .. } => always_exits(arena, *body, break_exits, limit - 1),
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
