//! sqlparser boundary: converts one SELECT statement into the closed AST.
//! Constructs the builder cannot represent surface as `Unsupported` and are
//! handled at the controller boundary like any parse failure.

use sqlparser::ast as sq;
use sqlparser::parser::Parser;

use super::ast::{
    ColumnRef, Condition, FilterLeaf, FilterOperator, JoinCondition, JoinKind, Literal, Operand,
    OrderByItem, SelectItem, SelectQuery, SortDirection, TableRef,
};
use super::errors::QueryBuilderError;
use crate::models::enums::DatabaseType;

pub fn parse_select(sql: &str, db_type: &DatabaseType) -> Result<SelectQuery, QueryBuilderError> {
    let statements = match db_type {
        DatabaseType::MySQL => Parser::parse_sql(&sqlparser::dialect::MySqlDialect {}, sql),
        DatabaseType::PostgreSQL => {
            Parser::parse_sql(&sqlparser::dialect::PostgreSqlDialect {}, sql)
        }
    }
    .map_err(|e| QueryBuilderError::Parse(e.to_string()))?;

    if statements.len() != 1 {
        return Err(QueryBuilderError::Unsupported("multi-statement"));
    }
    match &statements[0] {
        sq::Statement::Query(q) => convert_query(q),
        _ => Err(QueryBuilderError::Unsupported("not a SELECT")),
    }
}

fn convert_query(q: &sq::Query) -> Result<SelectQuery, QueryBuilderError> {
    if q.with.is_some() {
        return Err(QueryBuilderError::Unsupported("WITH"));
    }
    let sel = match q.body.as_ref() {
        sq::SetExpr::Select(sel) => sel,
        _ => return Err(QueryBuilderError::Unsupported("set operations")),
    };
    if sel.distinct.is_some() {
        return Err(QueryBuilderError::Unsupported("DISTINCT"));
    }
    if sel.having.is_some() {
        return Err(QueryBuilderError::Unsupported("HAVING"));
    }
    if sel.from.is_empty() {
        return Err(QueryBuilderError::Unsupported("missing FROM"));
    }

    let mut ast = SelectQuery::default();

    for twj in &sel.from {
        // A bare relation after the first (`FROM a, b`) carries no join info;
        // the flattener drops it downstream.
        ast.from.push(convert_relation(&twj.relation)?);
        for join in &twj.joins {
            ast.from.push(convert_join(join)?);
        }
    }

    for item in &sel.projection {
        ast.columns.push(convert_projection(item)?);
    }

    if let Some(selection) = &sel.selection {
        ast.where_ = Some(convert_condition(selection)?);
    }

    if let sq::GroupByExpr::Expressions(exprs, _) = &sel.group_by {
        for expr in exprs {
            // Builder-generated GROUP BY entries are plain column refs;
            // anything else is skipped.
            if let Some(column) = column_ref(expr) {
                ast.group_by.push(column);
            }
        }
    }

    if let Some(order_by) = &q.order_by {
        for obe in &order_by.exprs {
            if let Some(column) = column_ref(&obe.expr) {
                ast.order_by.push(OrderByItem {
                    column,
                    direction: if obe.asc.unwrap_or(true) {
                        SortDirection::Asc
                    } else {
                        SortDirection::Desc
                    },
                });
            }
        }
    }

    if let Some(sq::Expr::Value(sq::Value::Number(n, _))) = &q.limit {
        ast.limit = n.parse().ok();
    }

    Ok(ast)
}

fn convert_relation(relation: &sq::TableFactor) -> Result<TableRef, QueryBuilderError> {
    match relation {
        sq::TableFactor::Table { name, alias, .. } => {
            let mut parts: Vec<String> = name.0.iter().map(|i| i.value.clone()).collect();
            let table = parts.pop().unwrap_or_default();
            let db = parts.pop();
            Ok(TableRef {
                db,
                table,
                alias: alias.as_ref().map(|a| a.name.value.clone()),
                join: None,
                on: None,
            })
        }
        _ => Err(QueryBuilderError::Unsupported("complex table reference")),
    }
}

fn convert_join(join: &sq::Join) -> Result<TableRef, QueryBuilderError> {
    let mut table = convert_relation(&join.relation)?;
    let (kind, constraint) = match &join.join_operator {
        sq::JoinOperator::Inner(c) => (JoinKind::Inner, Some(c)),
        sq::JoinOperator::LeftOuter(c) => (JoinKind::Left, Some(c)),
        sq::JoinOperator::RightOuter(c) => (JoinKind::Right, Some(c)),
        sq::JoinOperator::FullOuter(c) => (JoinKind::Full, Some(c)),
        _ => (JoinKind::Inner, None),
    };
    table.join = Some(kind);
    // A join whose constraint is not a plain `col op col` comparison keeps
    // `on: None` and gets skipped by the flattener instead of erroring.
    table.on = match constraint {
        Some(sq::JoinConstraint::On(expr)) => convert_join_on(expr),
        _ => None,
    };
    Ok(table)
}

fn convert_join_on(expr: &sq::Expr) -> Option<JoinCondition> {
    let sq::Expr::BinaryOp { left, op, right } = expr else {
        return None;
    };
    Some(JoinCondition {
        operator: comparison_operator(op)?,
        left: column_ref(left)?,
        right: column_ref(right)?,
    })
}

fn convert_projection(item: &sq::SelectItem) -> Result<SelectItem, QueryBuilderError> {
    match item {
        sq::SelectItem::Wildcard(_) | sq::SelectItem::QualifiedWildcard(_, _) => {
            Ok(SelectItem::Wildcard)
        }
        sq::SelectItem::UnnamedExpr(expr) => match column_ref(expr) {
            Some(column) => Ok(SelectItem::Column { column, alias: None }),
            None => Err(QueryBuilderError::Unsupported("complex projection")),
        },
        sq::SelectItem::ExprWithAlias { expr, alias } => match column_ref(expr) {
            Some(column) => Ok(SelectItem::Column {
                column,
                alias: Some(alias.value.clone()),
            }),
            None => Err(QueryBuilderError::Unsupported("complex projection")),
        },
    }
}

fn convert_condition(expr: &sq::Expr) -> Result<Condition, QueryBuilderError> {
    match expr {
        sq::Expr::BinaryOp { left, op, right } => match op {
            sq::BinaryOperator::And | sq::BinaryOperator::Or => {
                let combinator = match op {
                    sq::BinaryOperator::And => super::ast::Combinator::And,
                    _ => super::ast::Combinator::Or,
                };
                Ok(Condition::Branch {
                    op: combinator,
                    left: Box::new(convert_condition(left)?),
                    right: Box::new(convert_condition(right)?),
                })
            }
            _ => {
                let operator = comparison_operator(op)
                    .ok_or(QueryBuilderError::Unsupported("comparison operator"))?;
                Ok(Condition::Leaf(FilterLeaf {
                    operator,
                    left: column_ref(left)
                        .ok_or(QueryBuilderError::Unsupported("filter left operand"))?,
                    right: convert_operand(right)?,
                }))
            }
        },
        sq::Expr::Like { negated, expr, pattern, .. } => Ok(Condition::Leaf(FilterLeaf {
            operator: if *negated {
                FilterOperator::NotLike
            } else {
                FilterOperator::Like
            },
            left: column_ref(expr).ok_or(QueryBuilderError::Unsupported("filter left operand"))?,
            right: convert_operand(pattern)?,
        })),
        sq::Expr::Nested(inner) => convert_condition(inner),
        _ => Err(QueryBuilderError::Unsupported("complex WHERE expression")),
    }
}

fn convert_operand(expr: &sq::Expr) -> Result<Operand, QueryBuilderError> {
    if let Some(column) = column_ref(expr) {
        return Ok(Operand::Column(column));
    }
    match expr {
        sq::Expr::Value(sq::Value::Number(n, _)) => Ok(Operand::Literal(Literal::Number(n.clone()))),
        sq::Expr::Value(sq::Value::SingleQuotedString(s))
        | sq::Expr::Value(sq::Value::DoubleQuotedString(s)) => {
            Ok(Operand::Literal(Literal::Text(s.clone())))
        }
        sq::Expr::Value(sq::Value::Boolean(b)) => Ok(Operand::Literal(Literal::Bool(*b))),
        _ => Err(QueryBuilderError::Unsupported("filter value")),
    }
}

fn comparison_operator(op: &sq::BinaryOperator) -> Option<FilterOperator> {
    match op {
        sq::BinaryOperator::Eq => Some(FilterOperator::Eq),
        sq::BinaryOperator::NotEq => Some(FilterOperator::NotEq),
        sq::BinaryOperator::Gt => Some(FilterOperator::Gt),
        sq::BinaryOperator::Lt => Some(FilterOperator::Lt),
        sq::BinaryOperator::GtEq => Some(FilterOperator::GtEq),
        sq::BinaryOperator::LtEq => Some(FilterOperator::LtEq),
        _ => None,
    }
}

fn column_ref(expr: &sq::Expr) -> Option<ColumnRef> {
    match expr {
        sq::Expr::Identifier(id) => Some(ColumnRef::bare(id.value.clone())),
        sq::Expr::CompoundIdentifier(parts) if parts.len() >= 2 => {
            let column = parts.last()?.value.clone();
            let table = parts[parts.len() - 2].value.clone();
            Some(ColumnRef::qualified(table, column))
        }
        _ => None,
    }
}
