//! Projections of the AST into the linear lists the host UI iterates:
//! the FROM/join chain and the WHERE condition tree.

use super::ast::{ColumnRef, Condition, FilterOperator, JoinKind, Operand, TableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FromKind {
    Main,
    Join,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromItem {
    pub kind: FromKind,
    pub db: Option<String>,
    pub table: String,
    pub alias: Option<String>,
    pub join: Option<JoinKind>,
    pub on: Option<FlatJoinOn>,
}

impl FromItem {
    /// Name joined columns resolve against: the alias when one is set.
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// Join condition with both column names fully qualified.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatJoinOn {
    pub operator: FilterOperator,
    pub left: String,
    pub right: String,
}

/// One leaf of the WHERE tree in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatCondition {
    pub operator: FilterOperator,
    pub left: ColumnRef,
    pub right: Operand,
}

/// Projects the FROM chain. The first entry is always the main table; later
/// entries missing either a join kind or an ON condition are dropped, not
/// errored.
pub fn flatten_from(from: &[TableRef]) -> Vec<FromItem> {
    let mut result = Vec::new();
    let mut main_name: Option<String> = None;

    for (index, item) in from.iter().enumerate() {
        if index == 0 {
            main_name = Some(item.alias.clone().unwrap_or_else(|| item.table.clone()));
            result.push(FromItem {
                kind: FromKind::Main,
                db: item.db.clone(),
                table: item.table.clone(),
                alias: item.alias.clone(),
                join: None,
                on: None,
            });
            continue;
        }
        let (Some(kind), Some(on)) = (&item.join, &item.on) else {
            continue;
        };
        let own_name = item.alias.clone().unwrap_or_else(|| item.table.clone());
        let fallback_right = main_name.clone().unwrap_or_default();
        result.push(FromItem {
            kind: FromKind::Join,
            db: item.db.clone(),
            table: item.table.clone(),
            alias: item.alias.clone(),
            join: Some(*kind),
            on: Some(FlatJoinOn {
                operator: on.operator,
                left: qualify(&on.left, &own_name),
                right: qualify(&on.right, &fallback_right),
            }),
        });
    }

    result
}

fn qualify(column: &ColumnRef, fallback_table: &str) -> String {
    match &column.table {
        Some(t) => format!("{}.{}", t, column.column),
        None => format!("{}.{}", fallback_table, column.column),
    }
}

/// In-order traversal of the WHERE tree, left arm before right arm, so a
/// left-leaning chain comes out in original insertion order. A leaf arriving
/// from the right arm of a branch is compared structurally against the most
/// recently pushed entry and skipped when identical.
pub fn flatten_conditions(root: &Condition) -> Vec<FlatCondition> {
    let mut result = Vec::new();
    visit(root, &mut result, false);
    result
}

fn visit(node: &Condition, out: &mut Vec<FlatCondition>, from_right: bool) {
    match node {
        Condition::Leaf(leaf) => {
            let flat = FlatCondition {
                operator: leaf.operator,
                left: leaf.left.clone(),
                right: leaf.right.clone(),
            };
            if from_right && out.last() == Some(&flat) {
                return;
            }
            out.push(flat);
        }
        Condition::Branch { left, right, .. } => {
            visit(left, out, false);
            visit(right, out, true);
        }
    }
}
