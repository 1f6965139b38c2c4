//! Dialect trait for SQL emission.
//!
//! Quoting is where the two dialects genuinely diverge: MySQL backticks
//! identifiers and accepts double-quoted strings, PostgreSQL double-quotes
//! identifiers so string literals must stay single-quoted.

use super::super::ast::JoinKind;
use crate::models::enums::DatabaseType;

pub trait SqlDialect {
    /// Quote a table/column identifier.
    fn quote_ident(&self, ident: &str) -> String;

    /// Quote a string literal.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    fn emit_boolean(&self, value: bool) -> String {
        if value { "TRUE" } else { "FALSE" }.to_string()
    }

    fn emit_limit(&self, limit: u64) -> String {
        format!(" LIMIT {}", limit)
    }

    fn emit_join_kind(&self, kind: &JoinKind) -> &'static str {
        match kind {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn quote_string(&self, s: &str) -> String {
        format!("\"{}\"", s.replace('"', "\"\""))
    }
}

pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

pub fn get_dialect(db_type: &DatabaseType) -> Box<dyn SqlDialect> {
    match db_type {
        DatabaseType::MySQL => Box::new(MySqlDialect),
        DatabaseType::PostgreSQL => Box::new(PostgresDialect),
    }
}
