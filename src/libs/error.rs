//! Error types for schema registration and row insertion.

use thiserror::Error;

use crate::libs::schema::ColumnKind;

#[derive(Error, Debug)]
pub enum Error {
    /// A type tag outside the supported set.
    #[error("unsupported column type: {0}")]
    UnsupportedType(String),

    /// Operation attempted before a connection was established.
    #[error("database is not connected")]
    NotConnected,

    #[error("table {0} does not exist in the data model")]
    UnknownTable(String),

    #[error("column {column} does not exist in table {table}")]
    UnknownColumn { table: String, column: String },

    /// Value kind differs from the column's declared kind. No widening is performed.
    #[error("tried to insert {found} value into {expected} column {column}")]
    TypeMismatch {
        column: String,
        expected: ColumnKind,
        found: String,
    },

    /// A value with no SQL rendering (null, arrays, nested objects).
    #[error("value of type {found} for column {column} cannot be inserted")]
    UnsupportedValueType { column: String, found: String },

    /// A record that does not serialize to a JSON object.
    #[error("record for table {table} must be an object, got {found}")]
    InvalidRecord { table: String, found: String },

    #[error("nothing to insert into table {0}")]
    EmptyInsert(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to connect: {0}")]
    Connect(#[source] sqlx::Error),

    /// Whatever the connection reported while executing a statement.
    #[error("execution failed: {0}")]
    Execution(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn type_mismatch(
        column: impl Into<String>,
        expected: ColumnKind,
        found: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            column: column.into(),
            expected,
            found: found.into(),
        }
    }

    pub fn unsupported_value(column: impl Into<String>, found: impl Into<String>) -> Self {
        Error::UnsupportedValueType {
            column: column.into(),
            found: found.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
