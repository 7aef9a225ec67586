use std::path::Path;

use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::query::{self, Params, Query};
use crate::schema::{Schema, TableDefinition};
use crate::value::{Row, Value};

/// SQLite store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file; `:memory:` for an in-memory database
    pub db_path: String,
    /// Tables created (if absent) when the store opens
    #[serde(default)]
    pub schema: Schema,
    /// Turn on `PRAGMA foreign_keys`. Off by default, as in SQLite itself.
    #[serde(default)]
    pub foreign_keys: bool,
}

impl SqliteConfig {
    /// Create a new SQLite config with path and schema
    pub fn new(db_path: impl Into<String>, schema: Schema) -> Self {
        Self {
            db_path: db_path.into(),
            schema,
            foreign_keys: false,
        }
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Column metadata as reported by `pragma_table_info`. Names match
/// case-insensitively, as SQLite resolves them.
#[derive(Debug, Clone)]
struct ColumnInfo {
    name: String,
    decl_type: String,
    /// 1-based position within the primary key, 0 when not part of it.
    pk: i64,
}

/// Generic table accessor over one open SQLite connection.
///
/// Every operation is a synchronous round-trip in autocommit mode, so each
/// write is committed by the time the call returns. Table and column names are
/// checked against the live schema before any statement text is built.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `config.db_path` and create every
    /// table in `config.schema` that does not exist yet.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        info!(path = %config.db_path, "opening sqlite database");
        let conn = Connection::open(&config.db_path).map_err(|e| {
            warn!(path = %config.db_path, error = %e, "failed to open database");
            e
        })?;
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        let store = Self { conn };
        store.initialize_schema(&config.schema)?;
        Ok(store)
    }

    /// Open with no schema; tables are expected to exist or be created later.
    pub fn open_path(path: impl Into<String>) -> Result<Self> {
        Self::open(&SqliteConfig::new(path, Schema::new()))
    }

    /// Close the connection, surfacing any error SQLite reports.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| {
            warn!(error = %e, "failed to close database");
            Error::from(e)
        })?;
        info!("closed sqlite database");
        Ok(())
    }

    fn initialize_schema(&self, schema: &Schema) -> Result<()> {
        for table in &schema.tables {
            self.create_table(table)?;
        }
        Ok(())
    }

    /// Create `table` and its indexes unless they already exist.
    pub fn create_table(&self, table: &TableDefinition) -> Result<()> {
        self.execute(&table.create_sql()?)?;
        for sql in table.index_sql()? {
            self.execute(&sql)?;
        }
        info!(table = %table.name, "table ready");
        Ok(())
    }

    /// Run one free-form statement with no parameters, returning the number
    /// of rows it changed.
    pub fn execute(&self, statement: &str) -> Result<usize> {
        self.run(statement, std::iter::empty::<&Value>())
    }

    /// Insert one row. `values` bind positionally to the table's columns in
    /// declaration order, skipping an `INTEGER PRIMARY KEY` rowid alias.
    /// Returns the row identifier SQLite assigned.
    pub fn insert(&self, table: &str, values: &[Value]) -> Result<i64> {
        let columns = self.table_info(table)?;
        let rowid_alias = rowid_alias(&columns);
        let insertable: Vec<&str> = columns
            .iter()
            .filter(|c| Some(c.name.as_str()) != rowid_alias)
            .map(|c| c.name.as_str())
            .collect();
        if insertable.len() != values.len() {
            return Err(Error::ArityMismatch {
                table: table.to_string(),
                expected: insertable.len(),
                actual: values.len(),
            });
        }
        let sql = query::insert_sql(table, insertable.into_iter());
        self.run(&sql, values.iter())?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert one row binding values to the named columns.
    pub fn insert_named(&self, table: &str, params: &Params) -> Result<i64> {
        let columns = self.table_info(table)?;
        check_columns(table, &columns, params.columns())?;
        let sql = query::insert_sql(table, params.columns());
        self.run(&sql, params.values.iter().map(|(_, v)| v))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Every row of `table`, in storage order.
    pub fn select_all(&self, table: &str) -> Result<Vec<Row>> {
        self.table_info(table)?;
        self.fetch(&query::select_all_sql(table), std::iter::empty::<&Value>())
    }

    /// Rows of `table` matching every condition in `filter`.
    pub fn select_where(&self, table: &str, filter: &Query) -> Result<Vec<Row>> {
        self.check_filter(table, filter)?;
        self.fetch(
            &query::select_where_sql(table, filter),
            filter.conditions.iter().map(|(_, v)| v),
        )
    }

    /// Assign `params` on the row whose primary key is `id`. Returns the
    /// number of rows changed; an unknown `id` changes none.
    pub fn update(&self, table: &str, id: i64, params: &Params) -> Result<usize> {
        if params.is_empty() {
            return Err(Error::EmptyUpdate(table.to_string()));
        }
        let columns = self.table_info(table)?;
        check_columns(table, &columns, params.columns())?;
        let key = key_column(&columns);
        let sql = query::update_sql(table, key, params);
        let id = Value::Integer(id);
        self.run(
            &sql,
            params
                .values
                .iter()
                .map(|(_, v)| v)
                .chain(std::iter::once(&id)),
        )
    }

    /// Delete rows of `table` matching every condition in `filter`.
    pub fn delete_where(&self, table: &str, filter: &Query) -> Result<usize> {
        self.check_filter(table, filter)?;
        self.run(
            &query::delete_where_sql(table, filter),
            filter.conditions.iter().map(|(_, v)| v),
        )
    }

    /// Delete every row of `table`.
    pub fn delete_all(&self, table: &str) -> Result<usize> {
        self.table_info(table)?;
        self.run(&query::delete_all_sql(table), std::iter::empty::<&Value>())
    }

    /// Column names of `table` in declaration order.
    pub fn columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .table_info(table)?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    fn table_info(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type, pk FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    decl_type: row.get(1)?,
                    pk: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if columns.is_empty() {
            return Err(Error::UnknownTable(table.to_string()));
        }
        Ok(columns)
    }

    fn check_filter(&self, table: &str, filter: &Query) -> Result<()> {
        if filter.is_empty() {
            return Err(Error::EmptyFilter(table.to_string()));
        }
        let columns = self.table_info(table)?;
        check_columns(table, &columns, filter.columns())
    }

    fn run<'a>(&self, sql: &str, values: impl Iterator<Item = &'a Value>) -> Result<usize> {
        debug!(sql, "execute");
        self.conn
            .execute(sql, params_from_iter(values))
            .map_err(|e| log_failure(sql, e))
    }

    fn fetch<'a>(&self, sql: &str, values: impl Iterator<Item = &'a Value>) -> Result<Vec<Row>> {
        debug!(sql, "query");
        let rows = self.fetch_inner(sql, params_from_iter(values));
        rows.map_err(|e| log_failure(sql, e))
    }

    fn fetch_inner<P: rusqlite::Params>(&self, sql: &str, params: P) -> rusqlite::Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let width = stmt.column_count();
        let rows = stmt.query_map(params, |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Row>>()
        })?;
        rows.collect()
    }
}

fn log_failure(sql: &str, e: rusqlite::Error) -> Error {
    warn!(sql, error = %e, "statement failed");
    Error::from(e)
}

fn check_columns<'a>(
    table: &str,
    columns: &[ColumnInfo],
    requested: impl Iterator<Item = &'a str>,
) -> Result<()> {
    for name in requested {
        if !columns.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            return Err(Error::UnknownColumn {
                table: table.to_string(),
                column: name.to_string(),
            });
        }
    }
    Ok(())
}

/// The single `INTEGER PRIMARY KEY` column SQLite fills from the rowid.
fn rowid_alias(columns: &[ColumnInfo]) -> Option<&str> {
    let mut pk = columns.iter().filter(|c| c.pk > 0);
    match (pk.next(), pk.next()) {
        (Some(c), None) if c.decl_type.eq_ignore_ascii_case("INTEGER") => Some(c.name.as_str()),
        _ => None,
    }
}

/// Column `update` matches ids against: the single primary key, else `rowid`.
fn key_column(columns: &[ColumnInfo]) -> &str {
    let mut pk = columns.iter().filter(|c| c.pk > 0);
    match (pk.next(), pk.next()) {
        (Some(c), None) => c.name.as_str(),
        _ => "rowid",
    }
}

