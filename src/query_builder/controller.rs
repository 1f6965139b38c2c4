//! Session controller: owns the AST/bindings pair for one editing session and
//! keeps text and AST from ever diverging. On text change it decodes
//! variables, parses and flattens for display; on every builder action it
//! mutates the AST, re-emits, re-encodes variables and re-formats, so the
//! emitted text is always the product of the full round trip.

use serde::{Deserialize, Serialize};

use super::ast::{Combinator, ColumnRef, SelectQuery, SortDirection};
use super::flatten::{FlatCondition, FromItem, flatten_conditions, flatten_from};
use super::mutate::{self, FilterDraft, JoinDraft};
use super::schema::{
    FilterColumn, FilterOperation, SchemaDescriptor, available_columns, filter_columns,
    filter_operations_for, join_columns,
};
use super::variables::{self, VariableBinding};
use crate::models::enums::DatabaseType;
use crate::query_tools::break_clauses;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderOptions {
    pub dialect: DatabaseType,
    pub clause_breaks: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self { dialect: DatabaseType::MySQL, clause_breaks: true }
    }
}

/// Which sub-editor the host currently has open. One tagged union instead of
/// a bag of booleans.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorMode {
    #[default]
    Idle,
    EditingJoin(JoinDraft),
    AddingColumns(Vec<String>),
    EditingFilter(FilterDraft),
    EditingGroupBy,
    EditingOrderBy,
    EditingLimit,
}

type VariableCallback = Box<dyn FnMut(&VariableBinding)>;

pub struct QueryBuilder {
    options: BuilderOptions,
    schema: SchemaDescriptor,
    text: String,
    ast: Option<SelectQuery>,
    bindings: Vec<VariableBinding>,
    parse_failed: bool,
    mode: EditorMode,
    on_variable_click: Option<VariableCallback>,
}

impl QueryBuilder {
    pub fn new(schema: SchemaDescriptor, options: BuilderOptions) -> Self {
        Self {
            options,
            schema,
            text: String::new(),
            ast: None,
            bindings: Vec::new(),
            parse_failed: false,
            mode: EditorMode::Idle,
            on_variable_click: None,
        }
    }

    /// Host notification hook for variable-focused editing.
    pub fn set_on_variable_click(&mut self, callback: VariableCallback) {
        self.on_variable_click = Some(callback);
    }

    /// Accepts externally edited query text. Bindings are rebuilt from
    /// scratch; a parse failure flips the session into the unparseable state
    /// instead of propagating.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        if text.is_empty() {
            self.ast = None;
            self.bindings = Vec::new();
            self.parse_failed = false;
            return;
        }
        let (safe, bindings) = variables::decode(text);
        match super::parser::parse_select(&safe, &self.options.dialect) {
            Ok(ast) => {
                self.ast = Some(ast);
                self.bindings = bindings;
                self.parse_failed = false;
            }
            Err(e) => {
                log::warn!("failed to parse query text: {}", e);
                // A stale AST must not survive a failed parse, or builder
                // actions would rewrite text the user no longer sees.
                self.ast = None;
                self.bindings = Vec::new();
                self.parse_failed = true;
            }
        }
    }

    /// Clears back to the empty, parseable state. The only recovery action
    /// besides a manual edit once parsing has failed.
    pub fn reset_query(&mut self) {
        self.text.clear();
        self.ast = None;
        self.bindings = Vec::new();
        self.parse_failed = false;
        self.mode = EditorMode::Idle;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ast(&self) -> Option<&SelectQuery> {
        self.ast.as_ref()
    }

    pub fn bindings(&self) -> &[VariableBinding] {
        &self.bindings
    }

    pub fn is_unparseable(&self) -> bool {
        self.parse_failed
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
    }

    /// Flattened FROM chain for display.
    pub fn from_items(&self) -> Vec<FromItem> {
        self.ast
            .as_ref()
            .map(|ast| flatten_from(&ast.from))
            .unwrap_or_default()
    }

    /// Flattened WHERE leaves in insertion order.
    pub fn conditions(&self) -> Vec<FlatCondition> {
        self.ast
            .as_ref()
            .and_then(|ast| ast.where_.as_ref())
            .map(flatten_conditions)
            .unwrap_or_default()
    }

    pub fn available_columns(&self) -> Vec<String> {
        self.ast
            .as_ref()
            .map(|ast| available_columns(ast, &self.schema))
            .unwrap_or_default()
    }

    pub fn filter_columns(&self) -> Vec<FilterColumn> {
        self.ast
            .as_ref()
            .map(|ast| filter_columns(ast, &self.schema))
            .unwrap_or_default()
    }

    pub fn join_columns(&self, with_table: &str) -> Vec<(String, String)> {
        self.ast
            .as_ref()
            .map(|ast| join_columns(ast, &self.schema, with_table))
            .unwrap_or_default()
    }

    /// Operators offered for a column, gated by its declared type.
    pub fn filter_operations(&self, column: Option<&FilterColumn>) -> Vec<FilterOperation> {
        filter_operations_for(column.map(|c| c.data_type.as_str()))
    }

    pub fn variable_clicked(&mut self, ordinal: usize) {
        let Some(binding) = self.bindings.iter().find(|b| b.ordinal == ordinal).cloned() else {
            return;
        };
        if let Some(callback) = &mut self.on_variable_click {
            callback(&binding);
        }
    }

    // ---- builder actions ----

    pub fn set_main_table(&mut self, table: &str) {
        if !self.schema.has_table(table) {
            log::warn!("unknown table selected: {}", table);
            return;
        }
        let new_ast = mutate::set_main_table(self.ast.as_ref(), table);
        self.commit(new_ast, None);
    }

    pub fn add_or_edit_join(&mut self, draft: &JoinDraft, index: Option<usize>) {
        let Some(ast) = &self.ast else { return };
        if !self.schema.has_table(&draft.join_table) {
            log::warn!("unknown join table: {}", draft.join_table);
            return;
        }
        let new_ast = mutate::add_or_edit_join(ast, draft, index);
        self.commit(new_ast, None);
    }

    pub fn remove_join(&mut self, index: usize) {
        let Some(ast) = &self.ast else { return };
        // Entry 0 is the main table, never a join row.
        if index == 0 {
            return;
        }
        let new_ast = mutate::remove_join(ast, index);
        self.commit(new_ast, None);
    }

    pub fn add_columns(&mut self, selection: &[String]) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::add_columns(ast, selection);
        self.commit(new_ast, None);
    }

    pub fn remove_column(&mut self, column: &str) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::remove_column(ast, column);
        self.commit(new_ast, None);
    }

    pub fn add_filter(&mut self, draft: &FilterDraft) {
        let Some(ast) = &self.ast else { return };
        let (new_ast, new_bindings) = mutate::add_filter(ast, draft, &self.bindings);
        self.commit(new_ast, Some(new_bindings));
    }

    pub fn remove_filter(&mut self, target: &FlatCondition) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::remove_filter(ast, target);
        self.commit(new_ast, None);
    }

    pub fn toggle_combinator(&mut self, current: Combinator) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::toggle_combinator(ast, current);
        self.commit(new_ast, None);
    }

    pub fn add_group_by(&mut self, column: &FilterColumn) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::add_group_by(ast, column);
        self.commit(new_ast, None);
    }

    pub fn remove_group_by(&mut self, target: &ColumnRef) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::remove_group_by(ast, target);
        self.commit(new_ast, None);
    }

    pub fn add_order_by(&mut self, column: &FilterColumn, direction: SortDirection) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::add_order_by(ast, column, direction);
        self.commit(new_ast, None);
    }

    pub fn remove_order_by(&mut self, target: &ColumnRef) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::remove_order_by(ast, target);
        self.commit(new_ast, None);
    }

    pub fn set_limit(&mut self, limit: u64) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::set_limit(ast, limit);
        self.commit(new_ast, None);
    }

    pub fn clear_limit(&mut self) {
        let Some(ast) = &self.ast else { return };
        let new_ast = mutate::clear_limit(ast);
        self.commit(new_ast, None);
    }

    /// Re-derives the text from the mutated AST: emit, re-encode variables,
    /// apply clause breaks. An emission failure leaves the session untouched.
    fn commit(&mut self, new_ast: SelectQuery, new_bindings: Option<Vec<VariableBinding>>) {
        let bindings = new_bindings.unwrap_or_else(|| self.bindings.clone());
        let emitted = match super::emitter::emit_select(&new_ast, &self.options.dialect) {
            Ok(sql) => sql,
            Err(e) => {
                log::warn!("failed to emit mutated query: {}", e);
                return;
            }
        };
        let restored = variables::encode(&emitted, &bindings);
        self.text = if self.options.clause_breaks {
            break_clauses(&restored)
        } else {
            restored
        };
        log::debug!("query round trip produced: {}", self.text);
        self.ast = Some(new_ast);
        self.bindings = bindings;
        self.parse_failed = false;
        self.mode = EditorMode::Idle;
    }
}
