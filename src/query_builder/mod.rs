//! Visual query builder core.
//!
//! Pipeline: raw text -> variable decode -> parse -> closed AST ->
//! flatten (read path) / mutate (write path) -> emit -> variable re-encode ->
//! clause-break format -> new text. The controller owns one AST/bindings pair
//! per editing session.

pub mod ast;
pub mod controller;
pub mod emitter;
pub mod errors;
pub mod flatten;
pub mod mutate;
pub mod parser;
pub mod schema;
pub mod variables;

pub use ast::*;
pub use controller::{BuilderOptions, EditorMode, QueryBuilder};
pub use errors::QueryBuilderError;
pub use flatten::{FlatCondition, FlatJoinOn, FromItem, FromKind};
pub use mutate::{FilterDraft, JoinDraft};
pub use schema::{ColumnDescriptor, FilterColumn, SchemaDescriptor};
pub use variables::VariableBinding;
