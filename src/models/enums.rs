use serde::{Deserialize, Serialize};

/// SQL dialects the builder can parse and emit.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum DatabaseType {
    MySQL,
    PostgreSQL,
}
