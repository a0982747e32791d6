//! Shape of the region tree built for each boundary kind.

use exscope_binder::{
    BinderState, DeclarationKind, RegionKind, ScopeId, ScopeRegion, ScopeTree, analyze_procedure,
};
use exscope_syntax::build::*;
use exscope_syntax::syntax::Stmt;
use exscope_syntax::{NodeArena, NodeIndex, StatementKind};

fn lower(statements: Vec<Stmt>) -> NodeArena {
    NodeArena::from_procedure(&procedure("shape", &["o"], block(statements))).expect("lowered")
}

fn bind(arena: &NodeArena) -> ScopeTree {
    BinderState::new()
        .bind_procedure(arena)
        .expect("well-formed tree")
}

fn children<'a>(tree: &'a ScopeTree, id: ScopeId) -> Vec<&'a ScopeRegion> {
    tree.region(id)
        .map(|region| {
            region
                .children
                .iter()
                .filter_map(|&child| tree.region(child))
                .collect()
        })
        .unwrap_or_default()
}

fn kinds(regions: &[&ScopeRegion]) -> Vec<RegionKind> {
    regions.iter().map(|region| region.kind).collect()
}

#[test]
fn test_root_region_owns_parameters() {
    let arena = lower(vec![]);
    let tree = bind(&arena);
    let root = tree.region(tree.root()).expect("root");
    assert_eq!(root.kind, RegionKind::Root);
    assert_eq!(root.boundary, arena.root);
    assert!(root.is_root());
    assert_eq!(root.depth, 0);

    let param = tree.declaration(root.lookup("o").expect("o")).expect("decl");
    assert_eq!(param.kind, DeclarationKind::Parameter);
    assert_eq!(tree.procedure(), "shape");
}

#[test]
fn test_boundary_statements_open_regions() {
    let arena = lower(vec![
        block(vec![]),
        while_(name("c"), block(vec![])),
        do_while(empty(), name("c")),
        for_(vec![], None, vec![], empty()),
        foreach("x", name("xs"), empty()),
        using(name("r"), empty()),
        switch(name("o"), vec![section(vec![default_label()], vec![brk()])]),
        expr_stmt(name("plain")),
        if_(name("c"), expr_stmt(name("embedded"))),
    ]);
    let tree = bind(&arena);
    let top = children(&tree, tree.root());
    assert_eq!(
        kinds(&top),
        vec![
            RegionKind::Block,
            RegionKind::Loop,
            RegionKind::Loop,
            RegionKind::Loop,
            RegionKind::Loop,
            RegionKind::Resource,
            RegionKind::Switch,
        ]
    );

    // A braced loop body is a block inside the loop region.
    assert_eq!(kinds(&children(&tree, top[1].id)), vec![RegionKind::Block]);
    assert!(children(&tree, top[2].id).is_empty());

    let sections = children(&tree, top[6].id);
    assert_eq!(kinds(&sections), vec![RegionKind::Section]);
    assert_eq!(sections[0].depth, 2);

    for region in &top {
        assert_eq!(tree.parent(region.id), tree.root());
        assert_eq!(tree.boundary_scope(region.boundary), Some(region.id));
        assert!(tree.region(tree.root()).is_some_and(|root| root.span.contains_span(region.span)));
    }
}

#[test]
fn test_if_else_chain_regions_are_tagged_siblings() {
    let arena = lower(vec![if_else(
        name("a"),
        block(vec![]),
        if_else(name("b"), expr_stmt(name("x")), block(vec![])),
    )]);
    let tree = bind(&arena);
    let chain = arena.statement_list(arena.root)[0];
    let top = children(&tree, tree.root());

    assert_eq!(
        kinds(&top),
        vec![RegionKind::Branch, RegionKind::Branch, RegionKind::Block]
    );
    let tags: Vec<_> = top
        .iter()
        .map(|region| region.branch.map(|tag| (tag.conditional, tag.index)))
        .collect();
    assert_eq!(tags, vec![Some((chain, 0)), Some((chain, 1)), Some((chain, 2))]);
    for region in &top {
        let tag = region.branch.expect("tagged");
        assert_eq!(tag.conditional_span, arena.span(chain));
        assert!(!tag.exits);
    }

    // Braced then statement nests inside its link; unbraced does not.
    assert_eq!(kinds(&children(&tree, top[0].id)), vec![RegionKind::Block]);
    assert!(children(&tree, top[1].id).is_empty());

    // Sibling link spans do not overlap.
    assert!(top[0].span.end <= top[1].span.start);
    assert!(top[1].span.end <= top[2].span.start);
}

#[test]
fn test_if_without_else_tags_braced_then() {
    let arena = lower(vec![if_(name("c"), block(vec![ret(None)]))]);
    let tree = bind(&arena);
    let if_idx = arena.statement_list(arena.root)[0];
    let top = children(&tree, tree.root());
    assert_eq!(kinds(&top), vec![RegionKind::Block]);
    let tag = top[0].branch.expect("branch tag");
    assert_eq!(tag.conditional, if_idx);
    assert_eq!(tag.index, 0);
    assert!(tag.exits);
}

#[test]
fn test_switch_section_tags_track_exits() {
    let arena = lower(vec![switch(
        name("o"),
        vec![
            section(vec![case(pat_type("int"))], vec![brk()]),
            section(vec![case(pat_type("long"))], vec![ret(None)]),
        ],
    )]);
    let tree = bind(&arena);
    let switch_idx = arena.statement_list(arena.root)[0];
    let switch_region = tree.boundary_scope(switch_idx).expect("switch region");
    let sections = children(&tree, switch_region);
    let tags: Vec<_> = sections
        .iter()
        .map(|section| section.branch.map(|tag| (tag.conditional, tag.index, tag.exits)))
        .collect();
    assert_eq!(
        tags,
        vec![Some((switch_idx, 0, false)), Some((switch_idx, 1, true))]
    );
}

#[test]
fn test_switch_subject_belongs_to_enclosing_region() {
    let arena = lower(vec![switch(
        call(name("Classify"), vec![out_var("kind")]),
        vec![section(vec![default_label()], vec![brk()])],
    )]);
    let tree = bind(&arena);
    let kind = tree.declarations_named("kind").next().expect("kind");
    assert_eq!(kind.region, tree.root());
}

#[test]
fn test_labeled_statement_is_transparent() {
    let arena = lower(vec![labeled(
        "retry",
        expr_stmt(call(name("f"), vec![out_var("a")])),
    )]);
    let tree = bind(&arena);
    assert!(children(&tree, tree.root()).is_empty());
    let decl = tree.declarations_named("a").next().expect("a");
    assert_eq!(decl.region, tree.root());
    assert_eq!(arena.kind(decl.statement), Some(StatementKind::Expression));
}

#[test]
fn test_declaration_order_and_kinds() {
    let arena = lower(vec![
        local("n", None),
        local("m", Some(lit("1"))),
        expr_stmt(call(name("f"), vec![out_typed("int", "p"), is(name("o"), pat_var("q"))])),
    ]);
    let tree = bind(&arena);
    let summary: Vec<_> = tree
        .declarations()
        .iter()
        .map(|decl| (decl.name.as_str(), decl.kind, decl.is_assigned_at_binding()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("o", DeclarationKind::Parameter, true),
            ("n", DeclarationKind::Local { initialized: false }, false),
            ("m", DeclarationKind::Local { initialized: true }, true),
            ("p", DeclarationKind::OutputArgument, false),
            ("q", DeclarationKind::PatternVariable, true),
        ]
    );
    let sequences: Vec<_> = tree.declarations().iter().map(|decl| decl.sequence).collect();
    assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));

    let root = tree.region(tree.root()).expect("root");
    let order: Vec<_> = root.table.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["o", "n", "m", "p", "q"]);
    assert_eq!(tree.declarations_in(tree.root()).count(), 5);
}

#[test]
fn test_lowest_common_ancestor() {
    let arena = lower(vec![
        block(vec![block(vec![])]),
        block(vec![]),
    ]);
    let tree = bind(&arena);
    let top = children(&tree, tree.root());
    let nested = children(&tree, top[0].id)[0].id;

    assert_eq!(
        tree.lowest_common_ancestor(nested, top[1].id),
        Some((tree.root(), top[0].id, top[1].id))
    );
    assert_eq!(
        tree.lowest_common_ancestor(nested, top[0].id),
        Some((top[0].id, nested, ScopeId::NONE))
    );
    assert!(tree.is_ancestor_or_self(tree.root(), nested));
    assert!(!tree.is_ancestor_or_self(top[1].id, nested));
    assert_eq!(tree.ancestors(nested).count(), 3);
}

#[test]
fn test_tree_is_send_sync_and_serializable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ScopeTree>();
    assert_send_sync::<NodeArena>();

    let procedure = procedure(
        "dump",
        &["o"],
        block(vec![if_(is_decl(name("o"), "int", "i"), block(vec![]))]),
    );
    let (_, analysis) =
        analyze_procedure(&procedure, &Default::default()).expect("analysis");
    let value = serde_json::to_value(&analysis.tree).expect("serialize");
    assert_eq!(value["procedure"], "dump");
    assert_eq!(value["regions"][0]["kind"], "root");
    assert_eq!(value["regions"][0]["table"]["i"], 1);
    assert_eq!(value["declarations"][1]["kind"]["kind"], "patternVariable");
    assert!(value.get("statementScopes").is_none());
}

#[test]
fn test_unused_boundary_is_unknown() {
    let arena = lower(vec![expr_stmt(name("x"))]);
    let tree = bind(&arena);
    let stmt = arena.statement_list(arena.root)[0];
    assert_eq!(tree.boundary_scope(stmt), None);
    assert_eq!(tree.scope_of_statement(stmt), Some(tree.root()));
    assert_eq!(tree.scope_of_statement(NodeIndex(999)), None);
}
