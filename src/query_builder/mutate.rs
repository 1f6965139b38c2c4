//! Pure AST transformations, one per visual-builder action. Every function
//! clones what it changes and returns a new query; callers resolve schema
//! lookups before constructing the parameter structs, so nothing here fails.

use super::ast::{
    ColumnRef, Combinator, Condition, FilterLeaf, FilterOperator, JoinCondition, JoinKind,
    Literal, Operand, OrderByItem, SelectItem, SelectQuery, SortDirection, TableRef,
};
use super::flatten::FlatCondition;
use super::schema::{FilterColumn, ValueKind, value_kind};
use super::variables::{self, VariableBinding};

/// Parameters of an add-or-edit join action.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDraft {
    pub db: Option<String>,
    pub join_table: String,
    pub join_table_alias: Option<String>,
    pub kind: JoinKind,
    pub main_table: String,
    pub main_table_alias: Option<String>,
    pub operator: FilterOperator,
    /// Column on the joined table, bare or qualified.
    pub left_column: String,
    /// Column on an earlier table, as `table.column`.
    pub right_column: String,
}

impl Default for JoinDraft {
    fn default() -> Self {
        Self {
            db: None,
            join_table: String::new(),
            join_table_alias: None,
            kind: JoinKind::Inner,
            main_table: String::new(),
            main_table_alias: None,
            operator: FilterOperator::Eq,
            left_column: String::new(),
            right_column: String::new(),
        }
    }
}

/// Parameters of an add-filter action. The value is a literal or a whole
/// `{{variable}}` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDraft {
    pub column: FilterColumn,
    pub operator: FilterOperator,
    pub value: String,
}

/// Creates a fresh single-table query (wildcard projection, empty clauses),
/// or renames every non-join entry of an existing FROM chain.
pub fn set_main_table(ast: Option<&SelectQuery>, table: &str) -> SelectQuery {
    match ast {
        Some(existing) if !existing.from.is_empty() => {
            let mut out = existing.clone();
            for item in &mut out.from {
                if item.on.is_none() {
                    item.table = table.to_string();
                }
            }
            out
        }
        _ => SelectQuery {
            from: vec![TableRef {
                db: None,
                table: table.to_string(),
                alias: Some(table.to_string()),
                join: None,
                on: None,
            }],
            columns: vec![SelectItem::Wildcard],
            ..Default::default()
        },
    }
}

/// Replaces the FROM entry at `index`, or appends when `index` is `None`.
/// The right side of the ON condition picks up the main table's alias when
/// the draft does not name one.
pub fn add_or_edit_join(ast: &SelectQuery, draft: &JoinDraft, index: Option<usize>) -> SelectQuery {
    let join_name = draft
        .join_table_alias
        .clone()
        .unwrap_or_else(|| draft.join_table.clone());

    let right = ColumnRef::parse(&draft.right_column);
    let right_qualifier = match &draft.main_table_alias {
        Some(alias) => alias.clone(),
        None => {
            let table = right.table.clone().unwrap_or_else(|| draft.main_table.clone());
            ast.from
                .iter()
                .find(|f| f.table == table)
                .and_then(|f| f.alias.clone())
                .unwrap_or(table)
        }
    };

    let entry = TableRef {
        db: draft.db.clone(),
        table: draft.join_table.clone(),
        alias: Some(join_name.clone()),
        join: Some(draft.kind),
        on: Some(JoinCondition {
            operator: draft.operator,
            left: ColumnRef::qualified(join_name, bare_name(&draft.left_column)),
            right: ColumnRef::qualified(right_qualifier, right.column),
        }),
    };

    let mut out = ast.clone();
    match index {
        // Entry 0 is the main table; a join can never live there.
        Some(i) if i > 0 && i < out.from.len() => out.from[i] = entry,
        _ => out.from.push(entry),
    }
    out
}

/// Removes one FROM entry. Columns and filters referencing the removed table
/// are left alone.
pub fn remove_join(ast: &SelectQuery, index: usize) -> SelectQuery {
    let mut out = ast.clone();
    if index < out.from.len() {
        out.from.remove(index);
    }
    out
}

/// Appends the selected `table.column` names; an initial wildcard entry is
/// dropped once real columns exist.
pub fn add_columns(ast: &SelectQuery, selection: &[String]) -> SelectQuery {
    let mut out = ast.clone();
    for name in selection {
        out.columns.push(SelectItem::Column {
            column: ColumnRef::parse(name),
            alias: None,
        });
    }
    if out.columns.len() > 1 && out.columns.first() == Some(&SelectItem::Wildcard) {
        out.columns.remove(0);
    }
    out
}

pub fn remove_column(ast: &SelectQuery, column: &str) -> SelectQuery {
    let mut out = ast.clone();
    out.columns.retain(|item| match item {
        SelectItem::Wildcard => column != "*",
        SelectItem::Column { column: c, .. } => c.column != column,
    });
    out
}

/// Builds the new leaf from the draft and appends it to the WHERE tree as
/// `existing AND|OR leaf`. The outer combinator stays OR when the existing
/// root is already an OR branch, and defaults to AND otherwise. A whole
/// `{{variable}}` value resolves to an existing binding's sentinel or mints a
/// new binding at the next unused ordinal; LIKE values are wrapped in `%`.
pub fn add_filter(
    ast: &SelectQuery,
    draft: &FilterDraft,
    bindings: &[VariableBinding],
) -> (SelectQuery, Vec<VariableBinding>) {
    let mut new_bindings = bindings.to_vec();
    let mut kind = value_kind(Some(&draft.column.data_type));
    let mut value = draft.value.clone();

    if variables::is_variable(&value) {
        let ordinal = match variables::find_by_placeholder(bindings, &value) {
            Some(existing) => existing.ordinal,
            None => {
                let ordinal = variables::next_ordinal(bindings);
                new_bindings.push(VariableBinding {
                    placeholder: draft.value.clone(),
                    name: variables::placeholder_name(&draft.value).unwrap_or_default(),
                    ordinal,
                });
                ordinal
            }
        };
        value = variables::sentinel(ordinal);
        kind = ValueKind::Text;
    } else if matches!(draft.operator, FilterOperator::Like | FilterOperator::NotLike) {
        value = format!("%{}%", value);
    }

    // Date values take the quoted-text rendering, so an external text round
    // trip yields the identical node.
    let literal = match kind {
        ValueKind::Text | ValueKind::Date => Literal::Text(value),
        ValueKind::Number => Literal::Number(value),
    };
    let leaf = Condition::Leaf(FilterLeaf {
        operator: draft.operator,
        left: ColumnRef::qualified(draft.column.table.clone(), bare_name(&draft.column.name)),
        right: Operand::Literal(literal),
    });

    let op = match &ast.where_ {
        Some(Condition::Branch { op: Combinator::Or, .. }) => Combinator::Or,
        _ => Combinator::And,
    };

    let mut out = ast.clone();
    out.where_ = Some(match out.where_.take() {
        Some(existing) => Condition::Branch {
            op,
            left: Box::new(existing),
            right: Box::new(leaf),
        },
        None => leaf,
    });
    (out, new_bindings)
}

/// Removes the first leaf structurally matching the descriptor, collapsing a
/// one-armed branch to its surviving child. No match means no-op; removing
/// the last leaf clears WHERE entirely.
pub fn remove_filter(ast: &SelectQuery, target: &FlatCondition) -> SelectQuery {
    let mut out = ast.clone();
    if let Some(existing) = out.where_.take() {
        let mut removed = false;
        out.where_ = remove_leaf(existing, target, &mut removed);
    }
    out
}

fn remove_leaf(node: Condition, target: &FlatCondition, removed: &mut bool) -> Option<Condition> {
    match node {
        Condition::Leaf(leaf) => {
            if !*removed && leaf_matches(&leaf, target) {
                *removed = true;
                None
            } else {
                Some(Condition::Leaf(leaf))
            }
        }
        Condition::Branch { op, left, right } => {
            match (
                remove_leaf(*left, target, removed),
                remove_leaf(*right, target, removed),
            ) {
                (None, None) => None,
                (Some(survivor), None) | (None, Some(survivor)) => Some(survivor),
                (Some(l), Some(r)) => Some(Condition::Branch {
                    op,
                    left: Box::new(l),
                    right: Box::new(r),
                }),
            }
        }
    }
}

fn leaf_matches(leaf: &FilterLeaf, target: &FlatCondition) -> bool {
    leaf.operator == target.operator && leaf.left == target.left && leaf.right == target.right
}

/// Sets every combinator in the WHERE tree to the opposite of the one that
/// was clicked. A global set, not a per-node flip.
pub fn toggle_combinator(ast: &SelectQuery, current: Combinator) -> SelectQuery {
    let mut out = ast.clone();
    if let Some(root) = &mut out.where_ {
        set_combinators(root, current.opposite());
    }
    out
}

fn set_combinators(node: &mut Condition, to: Combinator) {
    if let Condition::Branch { op, left, right } = node {
        *op = to;
        set_combinators(left, to);
        set_combinators(right, to);
    }
}

pub fn add_group_by(ast: &SelectQuery, column: &FilterColumn) -> SelectQuery {
    let mut out = ast.clone();
    out.group_by
        .push(ColumnRef::qualified(column.table.clone(), bare_name(&column.name)));
    out
}

pub fn remove_group_by(ast: &SelectQuery, target: &ColumnRef) -> SelectQuery {
    let mut out = ast.clone();
    out.group_by.retain(|g| !column_matches(g, target));
    out
}

pub fn add_order_by(
    ast: &SelectQuery,
    column: &FilterColumn,
    direction: SortDirection,
) -> SelectQuery {
    let mut out = ast.clone();
    out.order_by.push(OrderByItem {
        column: ColumnRef::qualified(column.table.clone(), bare_name(&column.name)),
        direction,
    });
    out
}

pub fn remove_order_by(ast: &SelectQuery, target: &ColumnRef) -> SelectQuery {
    let mut out = ast.clone();
    out.order_by.retain(|o| !column_matches(&o.column, target));
    out
}

pub fn set_limit(ast: &SelectQuery, limit: u64) -> SelectQuery {
    let mut out = ast.clone();
    out.limit = Some(limit);
    out
}

pub fn clear_limit(ast: &SelectQuery) -> SelectQuery {
    let mut out = ast.clone();
    out.limit = None;
    out
}

// Removal equality: table-qualified on both sides compares table and column,
// otherwise column only.
fn column_matches(a: &ColumnRef, b: &ColumnRef) -> bool {
    match (&a.table, &b.table) {
        (Some(at), Some(bt)) => at == bt && a.column == b.column,
        _ => a.column == b.column,
    }
}

fn bare_name(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_string()
}
