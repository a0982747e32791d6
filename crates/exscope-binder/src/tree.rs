//! The finished, immutable scope tree of one procedure.

use crate::declarations::{DeclId, Declaration};
use crate::scopes::{ScopeId, ScopeRegion};
use exscope_common::limits::MAX_SCOPE_WALK_ITERATIONS;
use exscope_syntax::{ExprIndex, NodeIndex};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Regions and declarations of one procedure body.
///
/// Built once by [`crate::BinderState::bind_procedure`]; every query takes
/// `&self`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeTree {
    procedure: String,
    regions: Vec<ScopeRegion>,
    declarations: Vec<Declaration>,
    /// Region active when each statement was visited.
    #[serde(skip)]
    statement_scopes: FxHashMap<NodeIndex, ScopeId>,
    /// Region active when each expression was visited.
    #[serde(skip)]
    expression_scopes: FxHashMap<ExprIndex, ScopeId>,
    /// First region opened by each boundary statement.
    #[serde(skip)]
    boundary_scopes: FxHashMap<NodeIndex, ScopeId>,
}

impl ScopeTree {
    pub(crate) fn new(
        procedure: String,
        regions: Vec<ScopeRegion>,
        declarations: Vec<Declaration>,
        statement_scopes: FxHashMap<NodeIndex, ScopeId>,
        expression_scopes: FxHashMap<ExprIndex, ScopeId>,
        boundary_scopes: FxHashMap<NodeIndex, ScopeId>,
    ) -> Self {
        ScopeTree {
            procedure,
            regions,
            declarations,
            statement_scopes,
            expression_scopes,
            boundary_scopes,
        }
    }

    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    /// The root region, `NONE` only for an empty tree.
    pub fn root(&self) -> ScopeId {
        if self.regions.is_empty() {
            ScopeId::NONE
        } else {
            ScopeId(0)
        }
    }

    pub fn regions(&self) -> &[ScopeRegion] {
        &self.regions
    }

    #[inline]
    pub fn region(&self, id: ScopeId) -> Option<&ScopeRegion> {
        self.regions.get(id.index())
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    #[inline]
    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.index())
    }

    /// Every declaration of `name`, in declaration order.
    pub fn declarations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Declaration> + 'a {
        self.declarations.iter().filter(move |decl| decl.name == name)
    }

    /// Declarations owned by one region, duplicates included.
    pub fn declarations_in(&self, scope: ScopeId) -> impl Iterator<Item = &Declaration> + '_ {
        self.region(scope)
            .into_iter()
            .flat_map(|region| region.declarations.iter())
            .filter_map(|&id| self.declaration(id))
    }

    #[inline]
    pub fn parent(&self, scope: ScopeId) -> ScopeId {
        self.region(scope).map_or(ScopeId::NONE, |region| region.parent)
    }

    /// `scope` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        let mut current = scope;
        let mut iterations = 0;
        std::iter::from_fn(move || {
            if current.is_none() || iterations >= MAX_SCOPE_WALK_ITERATIONS {
                return None;
            }
            iterations += 1;
            let out = current;
            current = self.parent(current);
            Some(out)
        })
    }

    pub fn is_ancestor_or_self(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        self.ancestors(scope).any(|id| id == ancestor)
    }

    /// Lowest common ancestor of two regions, together with the child of
    /// the ancestor on the path to each of them.
    ///
    /// A child is `NONE` when the corresponding region is the ancestor itself.
    pub fn lowest_common_ancestor(&self, a: ScopeId, b: ScopeId) -> Option<(ScopeId, ScopeId, ScopeId)> {
        let depth = |id: ScopeId| self.region(id).map(|region| region.depth);
        let (mut x, mut y) = (a, b);
        let (mut child_x, mut child_y) = (ScopeId::NONE, ScopeId::NONE);
        let mut iterations = 0;

        while depth(x)? > depth(y)? {
            child_x = x;
            x = self.parent(x);
            iterations += 1;
            if iterations > MAX_SCOPE_WALK_ITERATIONS {
                return None;
            }
        }
        while depth(y)? > depth(x)? {
            child_y = y;
            y = self.parent(y);
            iterations += 1;
            if iterations > MAX_SCOPE_WALK_ITERATIONS {
                return None;
            }
        }
        while x != y {
            child_x = x;
            child_y = y;
            x = self.parent(x);
            y = self.parent(y);
            if x.is_none() || y.is_none() {
                return None;
            }
            iterations += 1;
            if iterations > MAX_SCOPE_WALK_ITERATIONS {
                return None;
            }
        }
        Some((x, child_x, child_y))
    }

    /// Region that was active when the statement was visited.
    ///
    /// For a boundary statement this is the region around it, not the one it
    /// opens; see [`Self::boundary_scope`].
    pub fn scope_of_statement(&self, statement: NodeIndex) -> Option<ScopeId> {
        self.statement_scopes.get(&statement).copied()
    }

    /// Region that was active when the expression was visited.
    pub fn scope_of_expression(&self, expr: ExprIndex) -> Option<ScopeId> {
        self.expression_scopes.get(&expr).copied()
    }

    /// Region opened by a boundary statement. For an `else if` chain root
    /// this is the first link.
    pub fn boundary_scope(&self, statement: NodeIndex) -> Option<ScopeId> {
        self.boundary_scopes.get(&statement).copied()
    }

    /// Deepest region whose span contains `position`.
    pub fn scope_at(&self, position: u32) -> Option<ScopeId> {
        let root = self.region(self.root())?;
        if !root.span.contains(position) {
            return None;
        }
        let mut current = root;
        let mut iterations = 0;
        while let Some(child) = current
            .children
            .iter()
            .filter_map(|&id| self.region(id))
            .find(|region| region.span.contains(position))
        {
            current = child;
            iterations += 1;
            if iterations > MAX_SCOPE_WALK_ITERATIONS {
                break;
            }
        }
        Some(current.id)
    }
}
