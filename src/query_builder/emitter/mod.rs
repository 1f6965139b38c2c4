//! Renders the closed AST back into SQL text, clause by clause.

use super::ast::{
    ColumnRef, Combinator, Condition, Literal, Operand, SelectItem, SelectQuery, TableRef,
};
use super::errors::QueryBuilderError;
use crate::models::enums::DatabaseType;

pub mod dialect;
use dialect::{SqlDialect, get_dialect};

pub fn emit_select(ast: &SelectQuery, db_type: &DatabaseType) -> Result<String, QueryBuilderError> {
    let emitter = SelectEmitter { dialect: get_dialect(db_type) };
    emitter.emit(ast)
}

struct SelectEmitter {
    dialect: Box<dyn SqlDialect>,
}

impl SelectEmitter {
    fn emit(&self, ast: &SelectQuery) -> Result<String, QueryBuilderError> {
        if ast.from.is_empty() {
            return Err(QueryBuilderError::Emit("no source table".into()));
        }

        let columns = if ast.columns.is_empty() {
            "*".to_string()
        } else {
            ast.columns
                .iter()
                .map(|item| self.emit_select_item(item))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", columns, self.emit_table(&ast.from[0]));

        for item in &ast.from[1..] {
            // Half-formed joins are unrenderable; skipped, same as the flattener.
            let (Some(kind), Some(on)) = (&item.join, &item.on) else {
                continue;
            };
            sql.push_str(&format!(
                " {} {} ON {} {} {}",
                self.dialect.emit_join_kind(kind),
                self.emit_table(item),
                self.emit_column(&on.left),
                on.operator.as_sql(),
                self.emit_column(&on.right),
            ));
        }

        if let Some(condition) = &ast.where_ {
            sql.push_str(&format!(" WHERE {}", self.emit_condition(condition)));
        }

        if !ast.group_by.is_empty() {
            let group = ast
                .group_by
                .iter()
                .map(|c| self.emit_column(c))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" GROUP BY {}", group));
        }

        if !ast.order_by.is_empty() {
            let order = ast
                .order_by
                .iter()
                .map(|o| format!("{} {}", self.emit_column(&o.column), o.direction.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {}", order));
        }

        if let Some(limit) = ast.limit {
            sql.push_str(&self.dialect.emit_limit(limit));
        }

        Ok(sql)
    }

    fn emit_select_item(&self, item: &SelectItem) -> String {
        match item {
            SelectItem::Wildcard => "*".to_string(),
            SelectItem::Column { column, alias } => match alias {
                Some(a) => format!("{} AS {}", self.emit_column(column), self.dialect.quote_ident(a)),
                None => self.emit_column(column),
            },
        }
    }

    fn emit_table(&self, table: &TableRef) -> String {
        let mut name = match &table.db {
            Some(db) => format!(
                "{}.{}",
                self.dialect.quote_ident(db),
                self.dialect.quote_ident(&table.table)
            ),
            None => self.dialect.quote_ident(&table.table),
        };
        if let Some(alias) = &table.alias {
            name.push_str(&format!(" AS {}", self.dialect.quote_ident(alias)));
        }
        name
    }

    fn emit_column(&self, column: &ColumnRef) -> String {
        match &column.table {
            Some(t) => format!(
                "{}.{}",
                self.dialect.quote_ident(t),
                self.dialect.quote_ident(&column.column)
            ),
            None => self.dialect.quote_ident(&column.column),
        }
    }

    fn emit_condition(&self, condition: &Condition) -> String {
        match condition {
            Condition::Leaf(leaf) => format!(
                "{} {} {}",
                self.emit_column(&leaf.left),
                leaf.operator.as_sql(),
                self.emit_operand(&leaf.right),
            ),
            Condition::Branch { op, left, right } => format!(
                "{} {} {}",
                self.emit_condition_arm(left, *op),
                op.as_sql(),
                self.emit_condition_arm(right, *op),
            ),
        }
    }

    // AND binds tighter than OR, so an arm whose combinator differs from the
    // parent's needs parentheses to re-parse with the same grouping. Same-op
    // chains stay flat.
    fn emit_condition_arm(&self, arm: &Condition, parent: Combinator) -> String {
        match arm {
            Condition::Branch { op, .. } if *op != parent => {
                format!("({})", self.emit_condition(arm))
            }
            _ => self.emit_condition(arm),
        }
    }

    fn emit_operand(&self, operand: &Operand) -> String {
        match operand {
            Operand::Column(column) => self.emit_column(column),
            Operand::Literal(Literal::Text(s)) => self.dialect.quote_string(s),
            Operand::Literal(Literal::Number(n)) => n.clone(),
            Operand::Literal(Literal::Bool(b)) => self.dialect.emit_boolean(*b),
        }
    }
}
