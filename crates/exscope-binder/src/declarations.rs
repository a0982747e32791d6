//! Declarations owned by scope regions.

use crate::scopes::ScopeId;
use exscope_common::Span;
use exscope_syntax::{ExprIndex, NodeIndex};
use serde::Serialize;
use std::fmt;

/// Index of a [`Declaration`] in [`crate::ScopeTree::declarations`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

impl DeclId {
    pub const NONE: DeclId = DeclId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// How a name came into existence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DeclarationKind {
    /// Designation inside a pattern (`is T x`, `var x`, `{ } x`).
    PatternVariable,
    /// `out var x` / `out T x` argument.
    OutputArgument,
    /// Procedure parameter, owned by the root region.
    Parameter,
    /// Declarator of a declaration statement, `for` header or `using` header.
    Local { initialized: bool },
    /// `foreach` iteration variable.
    Iteration,
}

impl DeclarationKind {
    /// True for names introduced in the middle of an expression.
    pub fn is_expression_variable(self) -> bool {
        matches!(self, Self::PatternVariable | Self::OutputArgument)
    }

    /// Whether the declaration carries a value at the point it comes into
    /// existence.
    ///
    /// Pattern variables are assigned when the pattern matches and iteration
    /// variables on every iteration. Output arguments are only assigned once
    /// the call returns, so definite assignment has to track them separately.
    pub fn is_assigned_at_binding(self) -> bool {
        match self {
            Self::PatternVariable | Self::Iteration | Self::Parameter => true,
            Self::Local { initialized } => initialized,
            Self::OutputArgument => false,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::PatternVariable => "pattern variable",
            Self::OutputArgument => "output argument",
            Self::Parameter => "parameter",
            Self::Local { .. } => "local",
            Self::Iteration => "iteration variable",
        }
    }
}

/// A named declaration with the region that owns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub id: DeclId,
    pub name: String,
    pub kind: DeclarationKind,
    pub span: Span,
    /// Owning region, fixed when the declaration is created.
    pub region: ScopeId,
    /// Statement whose header or expression introduced the name.
    pub statement: NodeIndex,
    /// Introducing expression, `NONE` for statement-level declarations.
    pub expression: ExprIndex,
    /// Monotonic insertion number across the whole procedure.
    pub sequence: u32,
    /// Unbraced nested-body levels between the declaring statement and the
    /// boundary of its owning region.
    pub bleed_depth: u32,
}

impl Declaration {
    pub fn is_assigned_at_binding(&self) -> bool {
        self.kind.is_assigned_at_binding()
    }
}
