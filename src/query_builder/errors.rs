#[derive(thiserror::Error, Debug)]
pub enum QueryBuilderError {
    #[error("parse error: {0}")] Parse(String),
    #[error("unsupported construct: {0}")] Unsupported(&'static str),
    #[error("emit error: {0}")] Emit(String),
}
