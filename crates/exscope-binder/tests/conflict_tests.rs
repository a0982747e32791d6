//! Conflict detection and mutual exclusion.

use exscope_binder::{BinderState, ConflictReason, ScopeDiagnostic, ScopeTree};
use exscope_common::DiagnosticCategory;
use exscope_common::diagnostics::diagnostic_codes;
use exscope_syntax::build::*;
use exscope_syntax::syntax::{Expr, Stmt};
use exscope_syntax::NodeArena;

fn bind(parameters: &[&str], statements: Vec<Stmt>) -> ScopeTree {
    let arena = NodeArena::from_procedure(&procedure("conflicts", parameters, block(statements)))
        .expect("lowered");
    BinderState::new()
        .bind_procedure(&arena)
        .expect("well-formed tree")
}

fn out(callee: &str, var: &str) -> Stmt {
    expr_stmt(call(name(callee), vec![out_var(var)]))
}

fn int_pattern(var: &str) -> Expr {
    is_decl(name("o"), "int", var)
}

fn reasons(tree: &ScopeTree) -> Vec<ConflictReason> {
    tree.validate()
        .into_iter()
        .filter_map(|diag| match diag {
            ScopeDiagnostic::ConflictingDeclaration { reason, .. } => Some(reason),
            _ => None,
        })
        .collect()
}

#[test]
fn test_same_region_conflict() {
    let tree = bind(&[], vec![out("f", "a"), out("g", "a")]);
    assert_eq!(reasons(&tree), vec![ConflictReason::SameRegion]);
}

#[test]
fn test_duplicate_inside_one_expression() {
    let tree = bind(
        &["o"],
        vec![expr_stmt(or(int_pattern("i"), int_pattern("i")))],
    );
    assert_eq!(reasons(&tree), vec![ConflictReason::SameRegion]);
}

#[test]
fn test_parameter_conflict() {
    let tree = bind(&["o"], vec![expr_stmt(int_pattern("o"))]);
    assert_eq!(reasons(&tree), vec![ConflictReason::SameRegion]);
}

#[test]
fn test_enclosing_region_conflict_in_either_order() {
    let nested_later = bind(&[], vec![out("f", "a"), block(vec![out("g", "a")])]);
    assert_eq!(reasons(&nested_later), vec![ConflictReason::EnclosingRegion]);

    let nested_first = bind(&[], vec![block(vec![out("g", "a")]), out("f", "a")]);
    assert_eq!(reasons(&nested_first), vec![ConflictReason::EnclosingRegion]);
}

#[test]
fn test_loop_condition_and_body_conflict() {
    let tree = bind(
        &["o"],
        vec![while_(int_pattern("i"), block(vec![out("f", "i")]))],
    );
    assert_eq!(reasons(&tree), vec![ConflictReason::EnclosingRegion]);

    let header = bind(
        &[],
        vec![for_(
            vec![decl("i", Some(lit("0")))],
            None,
            vec![],
            block(vec![out("f", "i")]),
        )],
    );
    assert_eq!(reasons(&header), vec![ConflictReason::EnclosingRegion]);
}

#[test]
fn test_sequential_sibling_regions_conflict() {
    let tree = bind(
        &[],
        vec![block(vec![out("f", "a")]), block(vec![out("g", "a")])],
    );
    assert_eq!(reasons(&tree), vec![ConflictReason::SequentialRegions]);

    let loops = bind(
        &[],
        vec![
            for_(vec![decl("i", None)], None, vec![], empty()),
            for_(vec![decl("i", None)], None, vec![], empty()),
        ],
    );
    assert_eq!(reasons(&loops), vec![ConflictReason::SequentialRegions]);
}

#[test]
fn test_if_else_branches_are_exclusive() {
    let tree = bind(
        &["c"],
        vec![if_else(
            name("c"),
            block(vec![out("f", "a")]),
            block(vec![out("g", "a")]),
        )],
    );
    assert!(tree.validate().is_empty());

    // Unbraced branches behave the same.
    let unbraced = bind(&["c"], vec![if_else(name("c"), out("f", "a"), out("g", "a"))]);
    assert!(unbraced.validate().is_empty());
}

#[test]
fn test_long_else_if_chain_is_pairwise_exclusive() {
    let tree = bind(
        &["o"],
        vec![if_else(
            int_pattern("v"),
            block(vec![out("f", "w")]),
            if_else(
                int_pattern("v"),
                block(vec![out("f", "w")]),
                if_else(int_pattern("v"), out("f", "w"), block(vec![out("f", "w")])),
            ),
        )],
    );
    assert_eq!(tree.declarations_named("v").count(), 3);
    assert_eq!(tree.declarations_named("w").count(), 4);
    assert!(tree.validate().is_empty());
}

#[test]
fn test_exiting_branch_is_exclusive_with_later_region() {
    let tree = bind(
        &["c"],
        vec![
            if_(name("c"), block(vec![out("f", "a"), ret(None)])),
            block(vec![out("g", "a")]),
        ],
    );
    assert!(tree.validate().is_empty());

    let falls_through = bind(
        &["c"],
        vec![
            if_(name("c"), block(vec![out("f", "a")])),
            block(vec![out("g", "a")]),
        ],
    );
    assert_eq!(
        reasons(&falls_through),
        vec![ConflictReason::SequentialRegions]
    );
}

#[test]
fn test_exiting_branch_does_not_hide_enclosing_conflict() {
    // The later declaration lives in the region that encloses the branch.
    let tree = bind(
        &["c"],
        vec![
            if_(name("c"), block(vec![out("f", "a"), throw()])),
            out("g", "a"),
        ],
    );
    assert_eq!(reasons(&tree), vec![ConflictReason::EnclosingRegion]);
}

#[test]
fn test_switch_sections_are_exclusive() {
    let tree = bind(
        &["o"],
        vec![switch(
            name("o"),
            vec![
                section(vec![case(pat_decl("int", "n"))], vec![brk()]),
                section(vec![case(pat_decl("long", "n"))], vec![brk()]),
                section(
                    vec![case_when(pat_var("n"), int_pattern("m"))],
                    vec![out("f", "m"), brk()],
                ),
            ],
        )],
    );
    let diagnostics = tree.validate();
    // `m` from the guard and `m` from the body share the third section.
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].name(), "m");
}

#[test]
fn test_each_duplicate_reported_once_against_first() {
    let tree = bind(&[], vec![out("f", "a"), out("g", "a"), out("h", "a")]);
    let first = tree.declarations_named("a").next().map(|d| d.id);
    let diagnostics = tree.validate();
    assert_eq!(diagnostics.len(), 2);
    for diag in &diagnostics {
        match diag {
            ScopeDiagnostic::ConflictingDeclaration { first: f, .. } => assert_eq!(Some(*f), first),
            other => panic!("unexpected diagnostic {other:?}"),
        }
    }
}

#[test]
fn test_validation_reports_every_name() {
    let tree = bind(
        &["o"],
        vec![
            out("f", "a"),
            out("f", "a"),
            expr_stmt(int_pattern("b")),
            block(vec![expr_stmt(int_pattern("b"))]),
        ],
    );
    let names: Vec<_> = tree.validate().iter().map(|d| d.name().to_string()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_conflict_converts_to_diagnostic_with_related_span() {
    let tree = bind(&[], vec![out("f", "a"), block(vec![out("g", "a")])]);
    let diagnostics = tree.validate();
    let diag = diagnostics[0].to_diagnostic("Program.cs");

    assert_eq!(diag.code, diagnostic_codes::DECLARATION_CONFLICTS_WITH_ENCLOSING);
    assert_eq!(diag.category, DiagnosticCategory::Error);
    assert_eq!(diag.file, "Program.cs");
    assert!(diag.message_text.contains("'a'"));
    assert_eq!(diag.related_information.len(), 1);

    let first = tree.declarations_named("a").next().expect("first a");
    assert_eq!(diag.related_information[0].start, first.span.start);
    assert_eq!(diag.related_information[0].message_text, "'a' was also declared here.");
}
