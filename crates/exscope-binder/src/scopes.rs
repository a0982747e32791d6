//! Scope regions.

use crate::declarations::DeclId;
use exscope_common::Span;
use exscope_syntax::NodeIndex;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Index of a [`ScopeRegion`] in [`crate::ScopeTree::regions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("s<none>")
        } else {
            write!(f, "s{}", self.0)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionKind {
    /// Procedure body; owns the parameters.
    Root,
    Block,
    /// `for`, `foreach`, `while` and `do` statements, header included.
    Loop,
    /// `using` statement, header included.
    Resource,
    /// The section list of a `switch`.
    Switch,
    /// One section of a `switch`.
    Section,
    /// One link of an `else if` chain, or an unbraced branch of an `if`.
    Branch,
}

impl RegionKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Block => "block",
            Self::Loop => "loop",
            Self::Resource => "resource",
            Self::Switch => "switch",
            Self::Section => "section",
            Self::Branch => "branch",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Marks a region as one alternative of a conditional statement.
///
/// Two regions tagged with the same `conditional` and different `index`
/// values never both execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchTag {
    /// The `if` statement (the chain root for `else if`) or the `switch`.
    pub conditional: NodeIndex,
    pub index: u32,
    /// The branch body always leaves the conditional early.
    pub exits: bool,
    /// Span of the whole conditional statement.
    pub conditional_span: Span,
}

/// A lexical region opened by a boundary statement.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRegion {
    pub id: ScopeId,
    pub kind: RegionKind,
    /// Statement that opened the region.
    pub boundary: NodeIndex,
    pub span: Span,
    pub parent: ScopeId,
    /// Distance from the root region.
    pub depth: u32,
    pub children: Vec<ScopeId>,
    /// Name to first declaration, in insertion order.
    pub table: IndexMap<String, DeclId>,
    /// Every declaration owned by the region, duplicates included.
    pub declarations: Vec<DeclId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchTag>,
}

impl ScopeRegion {
    pub(crate) fn new(
        id: ScopeId,
        kind: RegionKind,
        boundary: NodeIndex,
        span: Span,
        parent: ScopeId,
        depth: u32,
        branch: Option<BranchTag>,
    ) -> Self {
        ScopeRegion {
            id,
            kind,
            boundary,
            span,
            parent,
            depth,
            children: Vec::new(),
            table: IndexMap::new(),
            declarations: Vec::new(),
            branch,
        }
    }

    /// First declaration of `name` in this region.
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.table.get(name).copied()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
