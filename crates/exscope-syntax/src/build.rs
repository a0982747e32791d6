//! Constructors for the nested tree form.
//!
//! Front ends that already have a syntax tree map it onto these directly;
//! tests and benchmarks use them to spell trees compactly:
//!
//! ```
//! use exscope_syntax::build::*;
//!
//! // if (!(x is int i)) throw; use(i);
//! let body = block(vec![
//!     if_(not(paren(is_decl(name("x"), "int", "i"))), throw()),
//!     expr_stmt(call(name("use"), vec![name("i")])),
//! ]);
//! let procedure = procedure("Guard", &["x"], body);
//! assert_eq!(procedure.parameters.len(), 1);
//! ```

use crate::syntax::{Decl, Expr, ExprKind, Ident, Label, Pattern, Procedure, Section, Stmt, StmtKind};

pub fn procedure(name: &str, parameters: &[&str], body: Stmt) -> Procedure {
    Procedure {
        name: name.to_string(),
        parameters: parameters.iter().map(|&p| Ident::from(p)).collect(),
        body,
    }
}

// =============================================================================
// Statements
// =============================================================================

pub fn block(statements: Vec<Stmt>) -> Stmt {
    StmtKind::Block { statements }.into()
}

pub fn if_(condition: Expr, then: Stmt) -> Stmt {
    StmtKind::If {
        condition,
        then: Box::new(then),
        otherwise: None,
    }
    .into()
}

pub fn if_else(condition: Expr, then: Stmt, otherwise: Stmt) -> Stmt {
    StmtKind::If {
        condition,
        then: Box::new(then),
        otherwise: Some(Box::new(otherwise)),
    }
    .into()
}

pub fn while_(condition: Expr, body: Stmt) -> Stmt {
    StmtKind::While {
        condition,
        body: Box::new(body),
    }
    .into()
}

pub fn do_while(body: Stmt, condition: Expr) -> Stmt {
    StmtKind::DoWhile {
        body: Box::new(body),
        condition,
    }
    .into()
}

pub fn for_(
    declarators: Vec<Decl>,
    condition: Option<Expr>,
    incrementors: Vec<Expr>,
    body: Stmt,
) -> Stmt {
    StmtKind::For {
        declarators,
        initializers: Vec::new(),
        condition,
        incrementors,
        body: Box::new(body),
    }
    .into()
}

pub fn foreach(variable: &str, collection: Expr, body: Stmt) -> Stmt {
    StmtKind::ForEach {
        variable: Ident::from(variable),
        collection,
        body: Box::new(body),
    }
    .into()
}

pub fn using(resource: Expr, body: Stmt) -> Stmt {
    StmtKind::Using {
        declarators: Vec::new(),
        resource: Some(resource),
        body: Box::new(body),
    }
    .into()
}

pub fn using_decl(declarators: Vec<Decl>, body: Stmt) -> Stmt {
    StmtKind::Using {
        declarators,
        resource: None,
        body: Box::new(body),
    }
    .into()
}

pub fn switch(subject: Expr, sections: Vec<Section>) -> Stmt {
    StmtKind::Switch { subject, sections }.into()
}

pub fn section(labels: Vec<Label>, statements: Vec<Stmt>) -> Section {
    Section {
        span: None,
        labels,
        statements,
    }
}

pub fn case(pattern: Pattern) -> Label {
    Label::Case {
        pattern,
        when: None,
    }
}

pub fn case_when(pattern: Pattern, when: Expr) -> Label {
    Label::Case {
        pattern,
        when: Some(when),
    }
}

pub fn default_label() -> Label {
    Label::Default
}

pub fn local(name: &str, initializer: Option<Expr>) -> Stmt {
    StmtKind::Local {
        declarators: vec![decl(name, initializer)],
    }
    .into()
}

pub fn decl(name: &str, initializer: Option<Expr>) -> Decl {
    Decl {
        name: Ident::from(name),
        initializer,
    }
}

pub fn expr_stmt(expression: Expr) -> Stmt {
    StmtKind::Expression { expression }.into()
}

pub fn ret(value: Option<Expr>) -> Stmt {
    StmtKind::Return { value }.into()
}

pub fn throw() -> Stmt {
    StmtKind::Throw { value: None }.into()
}

pub fn throw_value(value: Expr) -> Stmt {
    StmtKind::Throw { value: Some(value) }.into()
}

pub fn brk() -> Stmt {
    StmtKind::Break.into()
}

pub fn cont() -> Stmt {
    StmtKind::Continue.into()
}

pub fn labeled(label: &str, body: Stmt) -> Stmt {
    StmtKind::Labeled {
        label: label.to_string(),
        body: Box::new(body),
    }
    .into()
}

pub fn empty() -> Stmt {
    StmtKind::Empty.into()
}

// =============================================================================
// Expressions
// =============================================================================

pub fn name(name: &str) -> Expr {
    ExprKind::Name {
        name: name.to_string(),
    }
    .into()
}

pub fn lit(value: &str) -> Expr {
    ExprKind::Literal {
        value: value.to_string(),
    }
    .into()
}

pub fn unary(op: &str, operand: Expr) -> Expr {
    ExprKind::Unary {
        op: op.to_string(),
        operand: Box::new(operand),
    }
    .into()
}

pub fn not(operand: Expr) -> Expr {
    unary("!", operand)
}

pub fn binary(op: &str, left: Expr, right: Expr) -> Expr {
    ExprKind::Binary {
        op: op.to_string(),
        left: Box::new(left),
        right: Box::new(right),
    }
    .into()
}

pub fn and(left: Expr, right: Expr) -> Expr {
    binary("&&", left, right)
}

pub fn or(left: Expr, right: Expr) -> Expr {
    binary("||", left, right)
}

pub fn conditional(condition: Expr, when_true: Expr, when_false: Expr) -> Expr {
    ExprKind::Conditional {
        condition: Box::new(condition),
        when_true: Box::new(when_true),
        when_false: Box::new(when_false),
    }
    .into()
}

pub fn paren(inner: Expr) -> Expr {
    ExprKind::Paren {
        inner: Box::new(inner),
    }
    .into()
}

pub fn call(callee: Expr, arguments: Vec<Expr>) -> Expr {
    ExprKind::Call {
        callee: Box::new(callee),
        arguments,
    }
    .into()
}

pub fn member(target: Expr, member: &str) -> Expr {
    ExprKind::Member {
        target: Box::new(target),
        member: member.to_string(),
    }
    .into()
}

pub fn assign(target: Expr, value: Expr) -> Expr {
    ExprKind::Assign {
        target: Box::new(target),
        value: Box::new(value),
    }
    .into()
}

/// `out var name`
pub fn out_var(name: &str) -> Expr {
    ExprKind::OutVar {
        ty: None,
        name: Ident::from(name),
    }
    .into()
}

/// `out T name`
pub fn out_typed(ty: &str, name: &str) -> Expr {
    ExprKind::OutVar {
        ty: Some(ty.to_string()),
        name: Ident::from(name),
    }
    .into()
}

/// `out name` for an existing variable.
pub fn out(name: &str) -> Expr {
    ExprKind::Out {
        name: name.to_string(),
    }
    .into()
}

pub fn is(operand: Expr, pattern: Pattern) -> Expr {
    ExprKind::Is {
        operand: Box::new(operand),
        pattern,
    }
    .into()
}

/// `operand is T name`
pub fn is_decl(operand: Expr, ty: &str, name: &str) -> Expr {
    is(operand, pat_decl(ty, name))
}

// =============================================================================
// Patterns
// =============================================================================

pub fn pat_type(ty: &str) -> Pattern {
    Pattern::Type { ty: ty.to_string() }
}

pub fn pat_decl(ty: &str, name: &str) -> Pattern {
    Pattern::Declaration {
        ty: ty.to_string(),
        name: Ident::from(name),
    }
}

pub fn pat_var(name: &str) -> Pattern {
    Pattern::Var {
        name: Ident::from(name),
    }
}

pub fn pat_const(value: Expr) -> Pattern {
    Pattern::Constant {
        value: Box::new(value),
    }
}

pub fn pat_discard() -> Pattern {
    Pattern::Discard
}

pub fn pat_recursive(ty: Option<&str>, subpatterns: Vec<Pattern>, name: Option<&str>) -> Pattern {
    Pattern::Recursive {
        ty: ty.map(str::to_string),
        subpatterns,
        name: name.map(Ident::from),
    }
}

pub fn pat_not(pattern: Pattern) -> Pattern {
    Pattern::Not {
        pattern: Box::new(pattern),
    }
}
