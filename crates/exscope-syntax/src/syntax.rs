//! Owned nested tree form.
//!
//! This is the interchange format produced by an upstream parser (or written
//! by hand as JSON) before it is lowered into a [`NodeArena`](crate::NodeArena).
//! Spans are optional; nodes without one receive synthetic, strictly
//! increasing offsets in source order during lowering.
//!
//! ```json
//! {
//!   "name": "Check",
//!   "parameters": ["x"],
//!   "body": { "kind": "block", "statements": [
//!     { "kind": "if",
//!       "condition": { "kind": "is", "operand": { "kind": "name", "name": "x" },
//!                      "pattern": { "kind": "declaration", "ty": "int", "name": "i" } },
//!       "then": { "kind": "block", "statements": [] } }
//!   ] }
//! }
//! ```

use exscope_common::Span;
use serde::{Deserialize, Serialize};

/// One procedure body: the unit of analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Ident>,
    pub body: Stmt,
}

/// A name at a binding site. Deserializes from a bare string or `{ name, span }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IdentRepr")]
pub struct Ident {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdentRepr {
    Bare(String),
    Full {
        name: String,
        #[serde(default)]
        span: Option<Span>,
    },
}

impl From<IdentRepr> for Ident {
    fn from(repr: IdentRepr) -> Self {
        match repr {
            IdentRepr::Bare(name) => Ident { name, span: None },
            IdentRepr::Full { name, span } => Ident { name, span },
        }
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Ident {
            name: name.to_string(),
            span: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(flatten)]
    pub kind: StmtKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StmtKind {
    Block {
        #[serde(default)]
        statements: Vec<Stmt>,
    },
    If {
        condition: Expr,
        then: Box<Stmt>,
        #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        declarators: Vec<Decl>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        initializers: Vec<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<Expr>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        incrementors: Vec<Expr>,
        body: Box<Stmt>,
    },
    ForEach {
        variable: Ident,
        collection: Expr,
        body: Box<Stmt>,
    },
    Using {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        declarators: Vec<Decl>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        subject: Expr,
        #[serde(default)]
        sections: Vec<Section>,
    },
    Local {
        declarators: Vec<Decl>,
    },
    Expression {
        expression: Expr,
    },
    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
    },
    Throw {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
    },
    Break,
    Continue,
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    Empty,
}

/// A declarator: `name = initializer`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub name: Ident,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initializer: Option<Expr>,
}

/// A switch section: labels followed by a statement list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    pub labels: Vec<Label>,
    #[serde(default)]
    pub statements: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Label {
    Case {
        pattern: Pattern,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        when: Option<Expr>,
    },
    Default,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(flatten)]
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ExprKind {
    Name {
        name: String,
    },
    Literal {
        value: String,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    Paren {
        inner: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        #[serde(default)]
        arguments: Vec<Expr>,
    },
    Member {
        target: Box<Expr>,
        member: String,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Is {
        operand: Box<Expr>,
        pattern: Pattern,
    },
    OutVar {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
        name: Ident,
    },
    Out {
        name: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Pattern {
    Type {
        ty: String,
    },
    Declaration {
        ty: String,
        name: Ident,
    },
    Var {
        name: Ident,
    },
    Constant {
        value: Box<Expr>,
    },
    Discard,
    Recursive {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
        #[serde(default)]
        subpatterns: Vec<Pattern>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<Ident>,
    },
    Not {
        pattern: Box<Pattern>,
    },
}

impl From<StmtKind> for Stmt {
    fn from(kind: StmtKind) -> Self {
        Stmt { span: None, kind }
    }
}

impl From<ExprKind> for Expr {
    fn from(kind: ExprKind) -> Self {
        Expr { span: None, kind }
    }
}

impl Stmt {
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl Expr {
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// Input accepted by [`parse_procedures`]: a single procedure or a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProcedureInput {
    Many(Vec<Procedure>),
    One(Box<Procedure>),
}

/// Parse one procedure or an array of procedures from JSON text.
pub fn parse_procedures(json: &str) -> Result<Vec<Procedure>, serde_json::Error> {
    let input: ProcedureInput = serde_json::from_str(json)?;
    Ok(match input {
        ProcedureInput::Many(list) => list,
        ProcedureInput::One(single) => vec![*single],
    })
}
