//! Schema descriptor supplied by the external schema provider, plus the fixed
//! operator/type tables and column enumeration helpers built on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ast::{FilterOperator, SelectItem, SelectQuery};
use super::flatten::flatten_from;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Table/column metadata as delivered by the host, read-only to the core.
/// `BTreeMap` keeps column enumeration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub tables: Vec<String>,
    pub description: BTreeMap<String, BTreeMap<String, ColumnDescriptor>>,
}

impl SchemaDescriptor {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.description.contains_key(table) || self.tables.iter().any(|t| t == table)
    }

    pub fn column_type(&self, table: &str, column: &str) -> Option<&str> {
        self.description
            .get(table)?
            .get(column)
            .map(|c| c.data_type.as_str())
    }
}

/// A filter-candidate column: qualified display name, declared type, and the
/// table (or alias) the qualifier resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterColumn {
    pub name: String,
    pub data_type: String,
    pub table: String,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterOperation {
    pub name: &'static str,
    pub operator: FilterOperator,
    pub types: &'static [&'static str],
}

const ALL_SCALAR: &[&str] = &[
    "TINYINT", "SMALLINT", "INT", "BIGINT", "DECIMAL", "NUMERIC", "FLOAT", "DOUBLE", "REAL",
    "BOOLEAN", "CHAR", "VARCHAR", "TEXT", "DATE", "TIME", "DATETIME", "TIMESTAMP",
];

const ORDERED: &[&str] = &[
    "TINYINT", "SMALLINT", "INT", "BIGINT", "DECIMAL", "NUMERIC", "FLOAT", "DOUBLE", "REAL",
    "DATE", "TIME", "DATETIME", "TIMESTAMP",
];

const CHARACTER: &[&str] = &["CHAR", "VARCHAR", "TEXT"];

/// Operator applicability table. Equality applies to every scalar type,
/// ordering comparators to numeric/date/time types, LIKE to character types.
pub const OPERATIONS: &[FilterOperation] = &[
    FilterOperation { name: "equals", operator: FilterOperator::Eq, types: ALL_SCALAR },
    FilterOperation { name: "not equals", operator: FilterOperator::NotEq, types: ALL_SCALAR },
    FilterOperation { name: "greater than", operator: FilterOperator::Gt, types: ORDERED },
    FilterOperation { name: "less than", operator: FilterOperator::Lt, types: ORDERED },
    FilterOperation { name: "greater than or equal to", operator: FilterOperator::GtEq, types: ORDERED },
    FilterOperation { name: "less than or equal to", operator: FilterOperator::LtEq, types: ORDERED },
    FilterOperation { name: "contains", operator: FilterOperator::Like, types: CHARACTER },
    FilterOperation { name: "not contains", operator: FilterOperator::NotLike, types: CHARACTER },
];

/// Operators applicable to a declared column type. Matching is by substring,
/// so `VARCHAR(255)` matches `VARCHAR` (and `CHAR`). An unknown type offers
/// the full set.
pub fn filter_operations_for(column_type: Option<&str>) -> Vec<FilterOperation> {
    let Some(ct) = column_type else {
        return OPERATIONS.to_vec();
    };
    OPERATIONS
        .iter()
        .copied()
        .filter(|op| op.types.iter().any(|t| ct.contains(t)))
        .collect()
}

/// Classification of a declared column type into the literal kind the filter
/// value takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    Date,
}

pub fn value_kind(column_type: Option<&str>) -> ValueKind {
    let Some(ct) = column_type else {
        return ValueKind::Text;
    };
    if ct.contains("CHAR") || ct.contains("VARCHAR") || ct.contains("TEXT") || ct.contains("LONGTEXT")
    {
        ValueKind::Text
    } else if ct.contains("INT") || ct.contains("TINYINT") {
        ValueKind::Number
    } else if ct.contains("DATETIME") || ct.contains("DATE") || ct.contains("TIMESTAMP") {
        ValueKind::Date
    } else {
        ValueKind::Text
    }
}

/// Columns not yet selected, drawn from every table currently in `from`,
/// written as `alias_or_table.column`.
pub fn available_columns(ast: &SelectQuery, schema: &SchemaDescriptor) -> Vec<String> {
    let selected: Vec<String> = ast
        .columns
        .iter()
        .filter_map(|item| match item {
            SelectItem::Column { column, .. } => Some(column.qualified_name()),
            SelectItem::Wildcard => None,
        })
        .collect();

    let mut available = Vec::new();
    let mut processed: Vec<String> = Vec::new();
    for item in flatten_from(&ast.from) {
        if processed.contains(&item.table) {
            continue;
        }
        let Some(columns) = schema.description.get(&item.table) else {
            continue;
        };
        processed.push(item.table.clone());
        let prefix = item.effective_name().to_string();
        for column in columns.keys() {
            let full = format!("{}.{}", prefix, column);
            if !selected.contains(&full) {
                available.push(full);
            }
        }
    }
    available
}

/// Every schema-known column of every table in `from`, with declared types,
/// for the filter/group/order pickers.
pub fn filter_columns(ast: &SelectQuery, schema: &SchemaDescriptor) -> Vec<FilterColumn> {
    let mut all = Vec::new();
    for item in flatten_from(&ast.from) {
        let Some(columns) = schema.description.get(&item.table) else {
            continue;
        };
        let prefix = item.effective_name().to_string();
        for (column, descriptor) in columns {
            all.push(FilterColumn {
                name: format!("{}.{}", prefix, column),
                data_type: descriptor.data_type.clone(),
                table: prefix.clone(),
            });
        }
    }
    all
}

/// Join candidates: columns of every table already in `from` except the table
/// being joined.
pub fn join_columns(ast: &SelectQuery, schema: &SchemaDescriptor, with_table: &str) -> Vec<(String, String)> {
    let mut candidates = Vec::new();
    let mut processed: Vec<String> = Vec::new();
    for item in flatten_from(&ast.from) {
        if item.table == with_table || processed.contains(&item.table) {
            continue;
        }
        let Some(columns) = schema.description.get(&item.table) else {
            continue;
        };
        processed.push(item.table.clone());
        for column in columns.keys() {
            candidates.push((item.table.clone(), column.clone()));
        }
    }
    candidates
}
