//! Parameter and filter types plus the statement builders that turn them into
//! positional SQL.
//!
//! Builders here only ever see identifiers that were validated upstream, and
//! they still quote every identifier they emit.

use crate::error::{Error, Result};
use crate::value::Value;

/// Ordered column assignments for inserts and updates.
///
/// Assignment order is insertion order; setting a column twice replaces the
/// earlier value in place.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    pub values: Vec<(String, Value)>,
}

impl Params {
    /// Create a new Params object
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((name.to_string(), value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }
}

/// Conjunctive equality filter: every condition must hold.
///
/// Conditions compile to `IS`, SQLite's null-safe equality.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    pub conditions: Vec<(String, Value)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to hold `value`; `Value::Null` matches NULL. A repeated
    /// field replaces its earlier value.
    pub fn with_condition(mut self, field: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.conditions.iter_mut().find(|(f, _)| f == field) {
            Some((_, existing)) => *existing = value,
            None => self.conditions.push((field.to_string(), value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|(f, _)| f.as_str())
    }
}

/// Check that `name` is a plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `"a" <op> ?1 <sep> "b" <op> ?2`, numbering placeholders from `first`.
fn comparison_list<'a>(
    columns: impl Iterator<Item = &'a str>,
    operator: &str,
    first: usize,
    separator: &str,
) -> String {
    columns
        .enumerate()
        .map(|(i, c)| format!("{} {} ?{}", quote_ident(c), operator, first + i))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Filters compare with `IS` so a `Null` condition matches NULL columns.
fn filter_list(query: &Query) -> String {
    comparison_list(query.columns(), "IS", 1, " AND ")
}

pub(crate) fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {}", quote_ident(table))
}

pub(crate) fn select_where_sql(table: &str, query: &Query) -> String {
    format!(
        "SELECT * FROM {} WHERE {}",
        quote_ident(table),
        filter_list(query)
    )
}

pub(crate) fn insert_sql<'a>(table: &str, columns: impl Iterator<Item = &'a str>) -> String {
    let columns: Vec<&str> = columns.collect();
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table));
    }
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", "),
        placeholders
    )
}

/// Field values bind first (`?1..?n`), the key last (`?n+1`).
pub(crate) fn update_sql(table: &str, key_column: &str, params: &Params) -> String {
    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_ident(table),
        comparison_list(params.columns(), "=", 1, ", "),
        quote_ident(key_column),
        params.len() + 1
    )
}

pub(crate) fn delete_where_sql(table: &str, query: &Query) -> String {
    format!(
        "DELETE FROM {} WHERE {}",
        quote_ident(table),
        filter_list(query)
    )
}

pub(crate) fn delete_all_sql(table: &str) -> String {
    format!("DELETE FROM {}", quote_ident(table))
}
