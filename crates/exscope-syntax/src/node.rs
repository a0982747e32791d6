//! Arena node types.
//!
//! Statements and expressions are stored flat in a [`NodeArena`](crate::NodeArena)
//! and refer to each other by index. Parents own their children through
//! these index lists; the `parent` fields are non-owning back-references used
//! for upward traversal only.

use crate::base::{ExprIndex, NodeIndex};
use exscope_common::Span;
use serde::Serialize;
use std::fmt;

/// Closed set of statement kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum StatementKind {
    Block,
    If,
    While,
    DoWhile,
    For,
    ForEach,
    Using,
    Switch,
    SwitchSection,
    LocalDeclaration,
    Expression,
    Return,
    Throw,
    Break,
    Continue,
    Labeled,
    Empty,
}

impl StatementKind {
    pub const fn name(self) -> &'static str {
        match self {
            StatementKind::Block => "block",
            StatementKind::If => "if",
            StatementKind::While => "while",
            StatementKind::DoWhile => "do",
            StatementKind::For => "for",
            StatementKind::ForEach => "foreach",
            StatementKind::Using => "using",
            StatementKind::Switch => "switch",
            StatementKind::SwitchSection => "switch section",
            StatementKind::LocalDeclaration => "local declaration",
            StatementKind::Expression => "expression statement",
            StatementKind::Return => "return",
            StatementKind::Throw => "throw",
            StatementKind::Break => "break",
            StatementKind::Continue => "continue",
            StatementKind::Labeled => "labeled statement",
            StatementKind::Empty => "empty statement",
        }
    }

    /// Jump statements transfer control unconditionally.
    pub const fn is_jump(self) -> bool {
        matches!(
            self,
            StatementKind::Return
                | StatementKind::Throw
                | StatementKind::Break
                | StatementKind::Continue
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which single-statement body slot of its parent a statement occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BodySlot {
    Then,
    Else,
    LoopBody,
    ResourceBody,
    LabeledBody,
}

/// Where a statement sits relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum StatementPosition {
    /// The procedure body itself.
    Root,
    /// An element of a block or switch-section statement list.
    Member,
    /// The single nested body of another statement.
    NestedBody(BodySlot),
}

/// A name introduced at a specific source location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub name: String,
    pub span: Span,
}

impl Binding {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Binding {
            name: name.into(),
            span,
        }
    }

    /// `_` designates a discard and introduces nothing.
    pub fn is_discard(&self) -> bool {
        self.name == "_"
    }
}

/// One declarator of a local declaration, `for` header or `using` header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Declarator {
    pub binding: Binding,
    pub initializer: ExprIndex,
}

/// A `case` or `default` label of a switch section.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SwitchLabel {
    /// `None` for `default`.
    pub pattern: Option<PatternNode>,
    pub guard: ExprIndex,
    pub span: Span,
}

/// Statement payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Statement {
    Block {
        statements: Vec<NodeIndex>,
    },
    If {
        condition: ExprIndex,
        then_statement: NodeIndex,
        else_statement: NodeIndex,
    },
    While {
        condition: ExprIndex,
        body: NodeIndex,
    },
    DoWhile {
        body: NodeIndex,
        condition: ExprIndex,
    },
    For {
        declarators: Vec<Declarator>,
        initializers: Vec<ExprIndex>,
        condition: ExprIndex,
        incrementors: Vec<ExprIndex>,
        body: NodeIndex,
    },
    ForEach {
        variable: Binding,
        collection: ExprIndex,
        body: NodeIndex,
    },
    Using {
        declarators: Vec<Declarator>,
        resource: ExprIndex,
        body: NodeIndex,
    },
    Switch {
        subject: ExprIndex,
        sections: Vec<NodeIndex>,
    },
    SwitchSection {
        labels: Vec<SwitchLabel>,
        statements: Vec<NodeIndex>,
    },
    LocalDeclaration {
        declarators: Vec<Declarator>,
    },
    Expression {
        expression: ExprIndex,
    },
    Return {
        value: ExprIndex,
    },
    Throw {
        value: ExprIndex,
    },
    Break,
    Continue,
    Labeled {
        label: String,
        body: NodeIndex,
    },
    Empty,
}

impl Statement {
    pub const fn kind(&self) -> StatementKind {
        match self {
            Statement::Block { .. } => StatementKind::Block,
            Statement::If { .. } => StatementKind::If,
            Statement::While { .. } => StatementKind::While,
            Statement::DoWhile { .. } => StatementKind::DoWhile,
            Statement::For { .. } => StatementKind::For,
            Statement::ForEach { .. } => StatementKind::ForEach,
            Statement::Using { .. } => StatementKind::Using,
            Statement::Switch { .. } => StatementKind::Switch,
            Statement::SwitchSection { .. } => StatementKind::SwitchSection,
            Statement::LocalDeclaration { .. } => StatementKind::LocalDeclaration,
            Statement::Expression { .. } => StatementKind::Expression,
            Statement::Return { .. } => StatementKind::Return,
            Statement::Throw { .. } => StatementKind::Throw,
            Statement::Break => StatementKind::Break,
            Statement::Continue => StatementKind::Continue,
            Statement::Labeled { .. } => StatementKind::Labeled,
            Statement::Empty => StatementKind::Empty,
        }
    }
}

/// A statement stored in the arena.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatementNode {
    pub stmt: Statement,
    pub span: Span,
    pub parent: NodeIndex,
}

impl StatementNode {
    #[inline]
    pub const fn kind(&self) -> StatementKind {
        self.stmt.kind()
    }
}

/// Pattern payload of an `is` expression or a `case` label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum PatternNode {
    /// `x is T`
    Type { ty: String },
    /// `x is T name`
    Declaration { ty: String, binding: Binding },
    /// `x is var name`
    Var { binding: Binding },
    /// `x is 42`
    Constant { value: ExprIndex },
    /// `x is _`
    Discard,
    /// `x is T { P: p, ... } name`
    Recursive {
        ty: Option<String>,
        subpatterns: Vec<PatternNode>,
        binding: Option<Binding>,
    },
    /// `x is not p`
    Not { pattern: Box<PatternNode> },
}

/// Expression payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Expression {
    Name {
        name: String,
    },
    Literal {
        value: String,
    },
    Unary {
        op: String,
        operand: ExprIndex,
    },
    Binary {
        op: String,
        left: ExprIndex,
        right: ExprIndex,
    },
    Conditional {
        condition: ExprIndex,
        when_true: ExprIndex,
        when_false: ExprIndex,
    },
    Paren {
        inner: ExprIndex,
    },
    Call {
        callee: ExprIndex,
        arguments: Vec<ExprIndex>,
    },
    Member {
        target: ExprIndex,
        member: String,
    },
    Assign {
        target: ExprIndex,
        value: ExprIndex,
    },
    Is {
        operand: ExprIndex,
        pattern: PatternNode,
    },
    /// `out var name` / `out T name` at a call site.
    OutVar {
        ty: Option<String>,
        binding: Binding,
    },
    /// `out name` passing an existing variable.
    Out {
        name: String,
    },
}

/// An expression stored in the arena.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExpressionNode {
    pub expr: Expression,
    pub span: Span,
    /// The statement whose header or body directly contains this expression.
    pub statement: NodeIndex,
    /// Enclosing expression, `ExprIndex::NONE` for a statement's top-level expression.
    pub parent: ExprIndex,
}
