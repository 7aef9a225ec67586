use thiserror::Error;

/// Errors returned by the table accessor.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unknown table `{0}`")]
    UnknownTable(String),

    #[error("Unknown column `{column}` on table `{table}`")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("Invalid default for column `{column}`: {reason}")]
    InvalidDefault { column: String, reason: String },

    #[error("Filter on `{0}` has no conditions; use delete_all/select_all for the whole table")]
    EmptyFilter(String),

    #[error("Update of `{0}` assigns no columns")]
    EmptyUpdate(String),

    #[error("Table `{table}` expects {expected} values, got {actual}")]
    ArityMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
