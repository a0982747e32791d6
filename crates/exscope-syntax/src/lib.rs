//! Statement/expression tree model for the exscope scope engine.
//!
//! The engine consumes procedure bodies produced by an upstream parser. This
//! crate provides:
//! - The owned nested interchange form (`syntax`), serializable with serde
//! - Constructors for that form (`build`)
//! - The flat arena the engine actually walks (`arena`, `node`), with
//!   parent back-references by index
//! - Lowering from the nested form into the arena (`lower`)

pub mod base;
pub use base::{ExprIndex, NodeIndex};

pub mod node;
pub use node::{
    Binding, BodySlot, Declarator, Expression, ExpressionNode, PatternNode, Statement,
    StatementKind, StatementNode, StatementPosition, SwitchLabel,
};

pub mod arena;
pub use arena::{NodeArena, TreeError};

pub mod syntax;
pub use syntax::{Procedure, parse_procedures};

pub mod build;

pub mod lower;
pub use lower::lower_procedure;

#[cfg(test)]
#[path = "tests/arena_tests.rs"]
mod arena_tests;
