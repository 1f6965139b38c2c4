//! Closed node set for one SELECT statement.
//!
//! Every clause has a fixed field layout; absence is an explicit `Option`,
//! never a missing field. The builder mutates copies of these nodes and the
//! emitter renders them back to SQL text.

/// One parsed SELECT. Invariant: when `from` is empty no other clause
/// may be populated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuery {
    pub from: Vec<TableRef>,
    pub columns: Vec<SelectItem>,
    pub where_: Option<Condition>,
    pub group_by: Vec<ColumnRef>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
}

/// An entry of the FROM chain. The first entry is the main table
/// (`join == None`); every later well-formed entry carries both a join kind
/// and an ON condition referencing tables that appear earlier in the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub db: Option<String>,
    pub table: String,
    pub alias: Option<String>,
    pub join: Option<JoinKind>,
    pub on: Option<JoinCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub operator: FilterOperator,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Wildcard,
    Column {
        column: ColumnRef,
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn bare(column: impl Into<String>) -> Self {
        Self { table: None, column: column.into() }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self { table: Some(table.into()), column: column.into() }
    }

    /// Splits `"table.column"` into its parts; a bare name stays unqualified.
    pub fn parse(name: &str) -> Self {
        match name.split_once('.') {
            Some((table, column)) => Self::qualified(table, column),
            None => Self::bare(name),
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.table {
            Some(t) => format!("{}.{}", t, self.column),
            None => self.column.clone(),
        }
    }
}

/// WHERE tree. Left-leaning chain by construction: new filters are appended
/// as `existing AND|OR leaf`, never rebalanced.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf(FilterLeaf),
    Branch {
        op: Combinator,
        left: Box<Condition>,
        right: Box<Condition>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterLeaf {
    pub operator: FilterOperator,
    pub left: ColumnRef,
    pub right: Operand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Literal(Literal),
}

/// Literal value kinds the builder can place on the right side of a filter.
/// The kind is decided from the schema's declared column type; date values
/// render as quoted text, so a re-parse reproduces the same node.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn opposite(self) -> Self {
        match self {
            Combinator::And => Combinator::Or,
            Combinator::Or => Combinator::And,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    Like,
    NotLike,
}

impl FilterOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::NotEq => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::GtEq => ">=",
            FilterOperator::LtEq => "<=",
            FilterOperator::Like => "LIKE",
            FilterOperator::NotLike => "NOT LIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}
