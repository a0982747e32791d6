use crate::build::*;
use crate::{
    BodySlot, ExprIndex, Expression, NodeArena, NodeIndex, Statement, StatementKind,
    StatementPosition, TreeError,
};
use exscope_common::Span;

fn lowered(body: crate::syntax::Stmt) -> NodeArena {
    NodeArena::from_procedure(&procedure("test", &[], body)).expect("lowered")
}

#[test]
fn test_position_of_members_and_nested_bodies() {
    let arena = lowered(block(vec![
        if_else(name("a"), expr_stmt(name("b")), block(vec![])),
        while_(name("c"), empty()),
    ]));

    assert_eq!(arena.position_of(arena.root), Some(StatementPosition::Root));

    let root_list = arena.statement_list(arena.root).to_vec();
    assert_eq!(root_list.len(), 2);
    assert_eq!(
        arena.position_of(root_list[0]),
        Some(StatementPosition::Member)
    );

    let children = arena.child_statements(root_list[0]);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].1, StatementPosition::NestedBody(BodySlot::Then));
    assert_eq!(children[1].1, StatementPosition::NestedBody(BodySlot::Else));

    let loop_children = arena.child_statements(root_list[1]);
    assert_eq!(
        loop_children[0].1,
        StatementPosition::NestedBody(BodySlot::LoopBody)
    );
    assert_eq!(arena.kind(loop_children[0].0), Some(StatementKind::Empty));
}

#[test]
fn test_statement_expressions_follow_evaluation_order() {
    let arena = lowered(block(vec![for_(
        vec![decl("i", Some(lit("0")))],
        Some(name("cond")),
        vec![name("step")],
        empty(),
    )]));
    let for_idx = arena.statement_list(arena.root)[0];
    let exprs = arena.statement_expressions(for_idx);
    let texts: Vec<String> = exprs
        .iter()
        .map(|&e| match arena.get_expr(e).map(|n| &n.expr) {
            Some(Expression::Literal { value }) => value.clone(),
            Some(Expression::Name { name }) => name.clone(),
            _ => String::new(),
        })
        .collect();
    assert_eq!(texts, vec!["0", "cond", "step"]);
}

#[test]
fn test_expression_children_include_pattern_constants() {
    let arena = lowered(block(vec![expr_stmt(is(
        name("x"),
        pat_not(pat_const(lit("null"))),
    ))]));
    let stmt = arena.statement_list(arena.root)[0];
    let top = arena.statement_expressions(stmt)[0];
    let children = arena.expression_children(top);
    assert_eq!(children.len(), 2);
    assert!(matches!(
        arena.get_expr(children[1]).map(|n| &n.expr),
        Some(Expression::Literal { value }) if value == "null"
    ));
    assert_eq!(arena.get_expr(children[1]).map(|n| n.parent), Some(top));
}

#[test]
fn test_check_links_accepts_lowered_tree() {
    let arena = lowered(block(vec![switch(
        name("x"),
        vec![section(vec![case(pat_decl("int", "n"))], vec![brk()])],
    )]));
    assert_eq!(arena.check_links(), Ok(()));
}

#[test]
fn test_check_links_reports_parent_mismatch() {
    let mut arena = NodeArena::new("broken");
    let root = arena.add_statement(Statement::Empty, Span::new(0, 10), NodeIndex::NONE);
    let child = arena.add_statement(Statement::Break, Span::new(1, 2), NodeIndex::NONE);
    arena.replace_statement(
        root,
        Statement::Block {
            statements: vec![child],
        },
    );
    arena.root = root;

    assert_eq!(
        arena.check_links(),
        Err(TreeError::ParentMismatch {
            child,
            expected: root,
            found: NodeIndex::NONE,
        })
    );
}

#[test]
fn test_check_links_reports_dangling_expression() {
    let mut arena = NodeArena::new("broken");
    let root = arena.add_statement(
        Statement::Expression {
            expression: ExprIndex(7),
        },
        Span::new(0, 4),
        NodeIndex::NONE,
    );
    arena.root = root;

    assert!(matches!(
        arena.check_links(),
        Err(TreeError::DanglingExpression { expr: ExprIndex(7), .. })
    ));
}

#[test]
fn test_check_links_requires_root() {
    let arena = NodeArena::new("empty");
    assert_eq!(
        arena.check_links(),
        Err(TreeError::MissingRoot("empty".to_string()))
    );
}

#[test]
fn test_ancestors_walk_to_root() {
    let arena = lowered(block(vec![if_(name("a"), if_(name("b"), brk()))]));
    let brk_idx = arena
        .statements_of_kind(StatementKind::Break)
        .next()
        .expect("break statement");
    let kinds: Vec<_> = arena
        .ancestors(brk_idx)
        .filter_map(|idx| arena.kind(idx))
        .collect();
    assert_eq!(
        kinds,
        vec![StatementKind::If, StatementKind::If, StatementKind::Block]
    );
}

#[test]
fn test_empty_arena_has_no_root() {
    let arena = NodeArena::default();
    assert!(arena.root.is_none());
    assert!(arena.is_empty());
    assert_eq!(NodeArena::new("p").root, NodeIndex::default());
    assert_eq!(ExprIndex::default(), ExprIndex::NONE);
}
