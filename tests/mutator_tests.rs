use visual_sql::query_builder::ast::{
    ColumnRef, Combinator, Condition, FilterOperator, JoinKind, Literal, Operand, SelectItem,
    SelectQuery, SortDirection, TableRef,
};
use visual_sql::query_builder::flatten::{flatten_conditions, flatten_from, FromKind};
use visual_sql::query_builder::mutate::{self, FilterDraft, JoinDraft};
use visual_sql::query_builder::schema::{filter_operations_for, FilterColumn};

fn varchar_column(name: &str) -> FilterColumn {
    FilterColumn {
        name: name.to_string(),
        data_type: "VARCHAR(255)".to_string(),
        table: name.split('.').next().unwrap_or(name).to_string(),
    }
}

fn int_column(name: &str) -> FilterColumn {
    FilterColumn {
        name: name.to_string(),
        data_type: "INT".to_string(),
        table: name.split('.').next().unwrap_or(name).to_string(),
    }
}

fn orders_join() -> JoinDraft {
    JoinDraft {
        join_table: "orders".to_string(),
        kind: JoinKind::Left,
        main_table: "users".to_string(),
        left_column: "user_id".to_string(),
        right_column: "users.id".to_string(),
        ..Default::default()
    }
}

#[test]
fn fresh_main_table_selects_wildcard() {
    let ast = mutate::set_main_table(None, "users");
    assert_eq!(ast.columns, vec![SelectItem::Wildcard]);
    assert_eq!(ast.from.len(), 1);
    assert_eq!(ast.from[0].table, "users");
    assert_eq!(ast.from[0].alias.as_deref(), Some("users"));
    assert!(ast.where_.is_none());
    assert!(ast.limit.is_none());
}

#[test]
fn switching_main_table_keeps_joins_intact() {
    let base = mutate::set_main_table(None, "users");
    let joined = mutate::add_or_edit_join(&base, &orders_join(), None);
    let switched = mutate::set_main_table(Some(&joined), "customers");
    assert_eq!(switched.from[0].table, "customers");
    assert_eq!(switched.from[1].table, "orders");
}

#[test]
fn adding_columns_replaces_the_wildcard() {
    let base = mutate::set_main_table(None, "users");
    let ast = mutate::add_columns(&base, &["users.id".to_string(), "users.name".to_string()]);
    assert_eq!(ast.columns.len(), 2);
    assert!(!ast.columns.contains(&SelectItem::Wildcard));
    assert_eq!(
        ast.columns[0],
        SelectItem::Column { column: ColumnRef::qualified("users", "id"), alias: None }
    );
}

#[test]
fn removing_the_last_named_column_leaves_an_empty_projection() {
    let base = mutate::set_main_table(None, "users");
    let ast = mutate::add_columns(&base, &["users.id".to_string()]);
    let ast = mutate::remove_column(&ast, "id");
    assert!(ast.columns.is_empty());
}

#[test]
fn join_on_columns_are_fully_qualified() {
    let base = mutate::set_main_table(None, "users");
    let ast = mutate::add_or_edit_join(&base, &orders_join(), None);
    assert_eq!(ast.from.len(), 2);
    let join = &ast.from[1];
    assert_eq!(join.join, Some(JoinKind::Left));
    let on = join.on.as_ref().expect("join carries ON");
    assert_eq!(on.left, ColumnRef::qualified("orders", "user_id"));
    assert_eq!(on.right, ColumnRef::qualified("users", "id"));
}

#[test]
fn editing_a_join_replaces_in_place() {
    let base = mutate::set_main_table(None, "users");
    let ast = mutate::add_or_edit_join(&base, &orders_join(), None);
    let edited = JoinDraft { kind: JoinKind::Inner, ..orders_join() };
    let ast = mutate::add_or_edit_join(&ast, &edited, Some(1));
    assert_eq!(ast.from.len(), 2);
    assert_eq!(ast.from[1].join, Some(JoinKind::Inner));
}

#[test]
fn join_index_zero_never_clobbers_the_main_table() {
    let base = mutate::set_main_table(None, "users");
    let ast = mutate::add_or_edit_join(&base, &orders_join(), Some(0));
    assert_eq!(ast.from.len(), 2);
    assert_eq!(ast.from[0].table, "users");
    assert!(ast.from[0].join.is_none());
}

#[test]
fn remove_join_drops_one_entry() {
    let base = mutate::set_main_table(None, "users");
    let ast = mutate::add_or_edit_join(&base, &orders_join(), None);
    let ast = mutate::remove_join(&ast, 1);
    assert_eq!(ast.from.len(), 1);
    assert_eq!(ast.from[0].table, "users");
}

#[test]
fn flatten_drops_half_formed_joins() {
    let mut from = mutate::set_main_table(None, "users").from;
    from.push(TableRef {
        db: None,
        table: "orders".to_string(),
        alias: None,
        join: Some(JoinKind::Inner),
        on: None,
    });
    from.push(TableRef {
        db: None,
        table: "payments".to_string(),
        alias: None,
        join: None,
        on: None,
    });
    let items = flatten_from(&from);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, FromKind::Main);
}

fn add_three_filters(base: &SelectQuery) -> SelectQuery {
    let drafts = [
        FilterDraft {
            column: int_column("users.id"),
            operator: FilterOperator::Gt,
            value: "10".to_string(),
        },
        FilterDraft {
            column: varchar_column("users.name"),
            operator: FilterOperator::Eq,
            value: "ana".to_string(),
        },
        FilterDraft {
            column: int_column("users.id"),
            operator: FilterOperator::Lt,
            value: "90".to_string(),
        },
    ];
    let mut ast = base.clone();
    for draft in &drafts {
        let (next, _) = mutate::add_filter(&ast, draft, &[]);
        ast = next;
    }
    ast
}

#[test]
fn filters_build_a_left_leaning_chain() {
    let base = mutate::set_main_table(None, "users");
    let ast = add_three_filters(&base);

    let Some(Condition::Branch { op, left, right }) = &ast.where_ else {
        panic!("expected a branch root");
    };
    assert_eq!(*op, Combinator::And);
    assert!(matches!(**right, Condition::Leaf(_)));
    assert!(matches!(**left, Condition::Branch { .. }));

    let flat = flatten_conditions(ast.where_.as_ref().unwrap());
    assert_eq!(flat.len(), 3);
    assert_eq!(flat[0].operator, FilterOperator::Gt);
    assert_eq!(flat[1].operator, FilterOperator::Eq);
    assert_eq!(flat[2].operator, FilterOperator::Lt);
}

#[test]
fn removing_a_middle_leaf_collapses_the_branch() {
    let base = mutate::set_main_table(None, "users");
    let ast = add_three_filters(&base);
    let flat = flatten_conditions(ast.where_.as_ref().unwrap());

    let ast = mutate::remove_filter(&ast, &flat[1]);
    let remaining = flatten_conditions(ast.where_.as_ref().unwrap());
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].operator, FilterOperator::Gt);
    assert_eq!(remaining[1].operator, FilterOperator::Lt);

    // The one-armed branch collapsed, leaving a single branch of two leaves.
    let Some(Condition::Branch { left, right, .. }) = &ast.where_ else {
        panic!("expected a branch root");
    };
    assert!(matches!(**left, Condition::Leaf(_)));
    assert!(matches!(**right, Condition::Leaf(_)));
}

#[test]
fn removing_the_only_leaf_clears_where() {
    let base = mutate::set_main_table(None, "users");
    let draft = FilterDraft {
        column: int_column("users.id"),
        operator: FilterOperator::Eq,
        value: "1".to_string(),
    };
    let (ast, _) = mutate::add_filter(&base, &draft, &[]);
    let flat = flatten_conditions(ast.where_.as_ref().unwrap());
    let ast = mutate::remove_filter(&ast, &flat[0]);
    assert!(ast.where_.is_none());
}

#[test]
fn removing_an_unknown_leaf_is_a_no_op() {
    let base = mutate::set_main_table(None, "users");
    let ast = add_three_filters(&base);
    let ghost = visual_sql::query_builder::flatten::FlatCondition {
        operator: FilterOperator::Eq,
        left: ColumnRef::qualified("users", "ghost"),
        right: Operand::Literal(Literal::Number("0".to_string())),
    };
    let after = mutate::remove_filter(&ast, &ghost);
    assert_eq!(after, ast);
}

#[test]
fn duplicate_leaves_remove_one_at_a_time() {
    let base = mutate::set_main_table(None, "users");
    let draft = FilterDraft {
        column: int_column("users.id"),
        operator: FilterOperator::Eq,
        value: "7".to_string(),
    };
    let (ast, _) = mutate::add_filter(&base, &draft, &[]);
    let (ast, _) = mutate::add_filter(&ast, &draft, &[]);

    // Identical adjacent leaves are suppressed on display but both exist.
    let flat = flatten_conditions(ast.where_.as_ref().unwrap());
    assert_eq!(flat.len(), 1);

    let ast = mutate::remove_filter(&ast, &flat[0]);
    let remaining = flatten_conditions(ast.where_.as_ref().unwrap());
    assert_eq!(remaining.len(), 1);
}

#[test]
fn like_values_are_wrapped_in_wildcards() {
    let base = mutate::set_main_table(None, "users");
    let draft = FilterDraft {
        column: varchar_column("users.name"),
        operator: FilterOperator::Like,
        value: "smith".to_string(),
    };
    let (ast, _) = mutate::add_filter(&base, &draft, &[]);
    let Some(Condition::Leaf(leaf)) = &ast.where_ else {
        panic!("expected a leaf root");
    };
    assert_eq!(
        leaf.right,
        Operand::Literal(Literal::Text("%smith%".to_string()))
    );
}

#[test]
fn variable_values_mint_bindings_once() {
    let base = mutate::set_main_table(None, "users");
    let draft = FilterDraft {
        column: int_column("users.id"),
        operator: FilterOperator::Eq,
        value: "{{login}}".to_string(),
    };
    let (ast, bindings) = mutate::add_filter(&base, &draft, &[]);
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].ordinal, 0);
    assert_eq!(bindings[0].name, "login");
    let Some(Condition::Leaf(leaf)) = &ast.where_ else {
        panic!("expected a leaf root");
    };
    // Variables always sit in a quoted sentinel, whatever the column type.
    assert_eq!(
        leaf.right,
        Operand::Literal(Literal::Text("__VAR_0__".to_string()))
    );

    let (_, bindings) = mutate::add_filter(&ast, &draft, &bindings);
    assert_eq!(bindings.len(), 1);
}

#[test]
fn toggling_sets_every_combinator_globally() {
    let base = mutate::set_main_table(None, "users");
    let ast = add_three_filters(&base);
    let ast = mutate::toggle_combinator(&ast, Combinator::And);

    fn assert_all(node: &Condition, expected: Combinator) {
        if let Condition::Branch { op, left, right } = node {
            assert_eq!(*op, expected);
            assert_all(left, expected);
            assert_all(right, expected);
        }
    }
    assert_all(ast.where_.as_ref().unwrap(), Combinator::Or);

    let back = mutate::toggle_combinator(&ast, Combinator::Or);
    assert_all(back.where_.as_ref().unwrap(), Combinator::And);
}

#[test]
fn new_filters_follow_an_or_root() {
    let base = mutate::set_main_table(None, "users");
    let ast = add_three_filters(&base);
    let ast = mutate::toggle_combinator(&ast, Combinator::And);
    let draft = FilterDraft {
        column: int_column("users.id"),
        operator: FilterOperator::Eq,
        value: "5".to_string(),
    };
    let (ast, _) = mutate::add_filter(&ast, &draft, &[]);
    let Some(Condition::Branch { op, .. }) = &ast.where_ else {
        panic!("expected a branch root");
    };
    assert_eq!(*op, Combinator::Or);
}

#[test]
fn group_by_removal_matches_on_column_when_unqualified() {
    let base = mutate::set_main_table(None, "users");
    let ast = mutate::add_group_by(&base, &varchar_column("users.name"));
    assert_eq!(ast.group_by, vec![ColumnRef::qualified("users", "name")]);

    let ast = mutate::remove_group_by(&ast, &ColumnRef::bare("name"));
    assert!(ast.group_by.is_empty());
}

#[test]
fn order_by_removal_compares_tables_when_both_are_qualified() {
    let base = mutate::set_main_table(None, "users");
    let ast = mutate::add_order_by(&base, &int_column("users.id"), SortDirection::Desc);
    assert_eq!(ast.order_by[0].direction, SortDirection::Desc);

    let untouched = mutate::remove_order_by(&ast, &ColumnRef::qualified("orders", "id"));
    assert_eq!(untouched.order_by.len(), 1);

    let cleared = mutate::remove_order_by(&ast, &ColumnRef::qualified("users", "id"));
    assert!(cleared.order_by.is_empty());
}

#[test]
fn limit_set_and_clear() {
    let base = mutate::set_main_table(None, "users");
    let ast = mutate::set_limit(&base, 100);
    assert_eq!(ast.limit, Some(100));
    let ast = mutate::clear_limit(&ast);
    assert_eq!(ast.limit, None);
}

#[test]
fn operators_are_gated_by_column_type() {
    let text_ops = filter_operations_for(Some("VARCHAR(255)"));
    assert!(text_ops.iter().any(|o| o.operator == FilterOperator::Like));
    assert!(text_ops.iter().all(|o| !matches!(
        o.operator,
        FilterOperator::Gt | FilterOperator::Lt | FilterOperator::GtEq | FilterOperator::LtEq
    )));

    let int_ops = filter_operations_for(Some("INT"));
    assert!(int_ops.iter().any(|o| o.operator == FilterOperator::Gt));
    assert!(int_ops
        .iter()
        .all(|o| !matches!(o.operator, FilterOperator::Like | FilterOperator::NotLike)));

    let unknown = filter_operations_for(None);
    assert_eq!(unknown.len(), 8);
}
