//! Generic CRUD access to a file-backed SQLite database.
//!
//! # Intention
//!
//! - Provide table-agnostic create/insert/select/update/delete helpers over a
//!   single open connection.
//! - Keep SQLite-specific types, statement building and error handling here.
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - Table and column names are never trusted: they are checked against the
//!   live schema before being placed in statement text. Values are always
//!   bound as parameters.

pub mod demo;
pub mod error;
pub mod query;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use error::{Error, Result};
pub use query::{Params, Query};
pub use schema::{
    ColumnConstraint, ColumnDefinition, DataType, DefaultValue, ForeignKey, ForeignKeyAction,
    IndexDefinition, Schema, TableDefinition,
};
pub use sqlite::{SqliteConfig, SqliteStore};
pub use value::{Row, Value};
