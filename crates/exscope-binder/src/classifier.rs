//! Boundary/embedded classification of statements.
//!
//! A boundary statement opens its own scope region; an embedded statement
//! contributes its declarations to the nearest enclosing region. The answer
//! depends on the statement kind and, for `if` statements, on where the
//! statement sits in its parent.

use exscope_syntax::{BodySlot, NodeArena, NodeIndex, Statement, StatementKind, StatementPosition};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeClass {
    Boundary,
    Embedded,
}

/// Per-kind scoping rule, before position is taken into account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeRule {
    /// Always opens a region.
    Boundary,
    /// `if`: opens link regions only when it heads an `else if` chain.
    Branching,
    /// Never opens a region of its own.
    Transparent,
}

/// The scoping rule of each statement kind.
pub const fn scope_rule(kind: StatementKind) -> ScopeRule {
    match kind {
        StatementKind::Block => ScopeRule::Boundary,
        StatementKind::For => ScopeRule::Boundary,
        StatementKind::ForEach => ScopeRule::Boundary,
        StatementKind::Using => ScopeRule::Boundary,
        StatementKind::While => ScopeRule::Boundary,
        StatementKind::DoWhile => ScopeRule::Boundary,
        StatementKind::Switch => ScopeRule::Boundary,
        StatementKind::SwitchSection => ScopeRule::Boundary,
        StatementKind::If => ScopeRule::Branching,
        StatementKind::LocalDeclaration => ScopeRule::Transparent,
        StatementKind::Expression => ScopeRule::Transparent,
        StatementKind::Return => ScopeRule::Transparent,
        StatementKind::Throw => ScopeRule::Transparent,
        StatementKind::Break => ScopeRule::Transparent,
        StatementKind::Continue => ScopeRule::Transparent,
        StatementKind::Labeled => ScopeRule::Transparent,
        StatementKind::Empty => ScopeRule::Transparent,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub class: ScopeClass,
    pub rule: ScopeRule,
    pub position: StatementPosition,
}

impl Classification {
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.class == ScopeClass::Boundary
    }

    /// Unbraced nested bodies push declarations one level further from the
    /// region boundary. Labels do not count.
    pub fn adds_bleed_level(&self) -> bool {
        self.class == ScopeClass::Embedded
            && matches!(
                self.position,
                StatementPosition::NestedBody(
                    BodySlot::Then | BodySlot::Else | BodySlot::LoopBody | BodySlot::ResourceBody
                )
            )
    }
}

/// Whether `index` is an `if` with a plain `else`.
///
/// Its condition stays in the enclosing region and each branch opens a
/// region of its own. An `if` whose `else` is another `if`, or that is
/// itself the `else` of an `if`, is a link of a flattened chain instead.
pub fn is_two_way_if(arena: &NodeArena, index: NodeIndex) -> bool {
    let Some(Statement::If { else_statement, .. }) = arena.get(index).map(|node| &node.stmt) else {
        return false;
    };
    let Some(alternative) = arena.get(*else_statement) else {
        return false;
    };
    alternative.kind() != StatementKind::If
        && arena.position_of(index) != Some(StatementPosition::NestedBody(BodySlot::Else))
}

/// Classify a statement given its position in the parent.
///
/// The `else` statement of an `if` is always a boundary, and so is the then
/// statement of a two-way `if`: each is a branch region even when it is a
/// single unbraced statement.
pub fn classify(arena: &NodeArena, index: NodeIndex, position: StatementPosition) -> Classification {
    let Some(node) = arena.get(index) else {
        return Classification {
            class: ScopeClass::Embedded,
            rule: ScopeRule::Transparent,
            position,
        };
    };
    let rule = scope_rule(node.kind());
    let class = match position {
        StatementPosition::NestedBody(BodySlot::Else) => ScopeClass::Boundary,
        StatementPosition::NestedBody(BodySlot::Then) if is_two_way_if(arena, node.parent) => {
            ScopeClass::Boundary
        }
        _ => match rule {
            ScopeRule::Boundary => ScopeClass::Boundary,
            ScopeRule::Branching => match &node.stmt {
                Statement::If { else_statement, .. }
                    if else_statement.is_some() && !is_two_way_if(arena, index) =>
                {
                    ScopeClass::Boundary
                }
                _ => ScopeClass::Embedded,
            },
            ScopeRule::Transparent => ScopeClass::Embedded,
        },
    };
    Classification {
        class,
        rule,
        position,
    }
}

/// Classify a statement, deriving its position from the arena.
pub fn classify_node(arena: &NodeArena, index: NodeIndex) -> Option<Classification> {
    let position = arena.position_of(index)?;
    Some(classify(arena, index, position))
}
