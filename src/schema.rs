//! Schema definition types and their rendering to create-or-ignore DDL.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::query::{quote_ident, quote_literal, validate_identifier};

/// Schema definition for the SQLite database
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }
    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    /// Table-level primary key, for keys the columns don't declare inline.
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Render `CREATE TABLE IF NOT EXISTS`. Every identifier is validated.
    pub fn create_sql(&self) -> Result<String> {
        validate_identifier(&self.name)?;
        let mut parts = Vec::with_capacity(self.columns.len() + self.foreign_keys.len() + 1);
        for column in &self.columns {
            parts.push(column.render()?);
        }
        if !self.primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", ident_list(&self.primary_key)?));
        }
        for fk in &self.foreign_keys {
            parts.push(fk.render()?);
        }
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.name),
            parts.join(", ")
        ))
    }

    /// Render one `CREATE INDEX IF NOT EXISTS` per index.
    pub fn index_sql(&self) -> Result<Vec<String>> {
        self.indexes
            .iter()
            .map(|index| {
                validate_identifier(&index.name)?;
                Ok(format!(
                    "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                    if index.unique { "UNIQUE " } else { "" },
                    quote_ident(&index.name),
                    quote_ident(&self.name),
                    ident_list(&index.columns)?
                ))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub constraints: Vec<ColumnConstraint>,
    #[serde(default)]
    pub default_value: Option<DefaultValue>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            constraints: Vec::new(),
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.constraints.push(ColumnConstraint::PrimaryKey);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.constraints.push(ColumnConstraint::NotNull);
        self
    }

    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    fn render(&self) -> Result<String> {
        validate_identifier(&self.name)?;
        let mut out = format!("{} {}", quote_ident(&self.name), self.data_type.sql());
        for constraint in &self.constraints {
            out.push(' ');
            out.push_str(constraint.sql());
        }
        if let Some(default) = &self.default_value {
            out.push_str(" DEFAULT ");
            out.push_str(&default.sql(&self.name)?);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Text,
    Real,
    Blob,
}

impl DataType {
    fn sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Real => "REAL",
            DataType::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
    Unique,
}

impl ColumnConstraint {
    fn sql(self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::NotNull => "NOT NULL",
            ColumnConstraint::Unique => "UNIQUE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    Integer(i64),
    Text(String),
    Real(f64),
    Null,
    CurrentTimestamp,
}

impl DefaultValue {
    fn sql(&self, column: &str) -> Result<String> {
        Ok(match self {
            DefaultValue::Integer(v) => v.to_string(),
            DefaultValue::Real(v) if !v.is_finite() => {
                return Err(Error::InvalidDefault {
                    column: column.to_string(),
                    reason: format!("{v} has no SQL literal"),
                })
            }
            // parenthesized so negative and exponent forms stay one expression
            DefaultValue::Real(v) => format!("({v:?})"),
            DefaultValue::Text(s) => quote_literal(s),
            DefaultValue::Null => "NULL".to_string(),
            DefaultValue::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
    #[serde(default)]
    pub on_delete: ForeignKeyAction,
    #[serde(default)]
    pub on_update: ForeignKeyAction,
}

impl ForeignKey {
    pub fn new(
        column: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            foreign_table: foreign_table.into(),
            foreign_column: foreign_column.into(),
            on_delete: ForeignKeyAction::NoAction,
            on_update: ForeignKeyAction::NoAction,
        }
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }

    fn render(&self) -> Result<String> {
        validate_identifier(&self.column)?;
        validate_identifier(&self.foreign_table)?;
        validate_identifier(&self.foreign_column)?;
        let mut out = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_ident(&self.column),
            quote_ident(&self.foreign_table),
            quote_ident(&self.foreign_column)
        );
        if self.on_delete != ForeignKeyAction::NoAction {
            out.push_str(" ON DELETE ");
            out.push_str(self.on_delete.sql());
        }
        if self.on_update != ForeignKeyAction::NoAction {
            out.push_str(" ON UPDATE ");
            out.push_str(self.on_update.sql());
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl ForeignKeyAction {
    fn sql(self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::Restrict => "RESTRICT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

fn ident_list(names: &[String]) -> Result<String> {
    names
        .iter()
        .map(|n| {
            validate_identifier(n)?;
            Ok(quote_ident(n))
        })
        .collect::<Result<Vec<_>>>()
        .map(|v| v.join(", "))
}
