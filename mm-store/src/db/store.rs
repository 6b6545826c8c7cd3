//! Store capability consumed by repositories
//!
//! Repositories never see a concrete client. They talk to `dyn Store`
//! through four calls (execute, query, query_row, close) and read results
//! through the small `Value`/`Row` model below, which lets tests swap in
//! [`ScriptedStore`](super::scripted::ScriptedStore) without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::{ScanError, StoreError};

/// A single argument or column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Column whose database type has no mapping, or whose bytes failed to decode
    Undecodable { type_name: String },
}

impl Value {
    /// Short name used in scan error messages
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Undecodable { type_name } => type_name.as_str(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

/// Saturates at `i64::MAX`; Postgres has no unsigned 64-bit integer.
impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Conversion from a column value into a Rust field.
///
/// Returns `None` when the value has the wrong shape; `Row::get` turns that
/// into the matching [`ScanError`].
pub trait FromValue: Sized {
    /// Expected type, for error messages
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    const EXPECTED: &'static str = "timestamp";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// One result row: column names plus values, in select order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new<C, S>(columns: C, values: Vec<Value>) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Decode the column at `index` into `T`.
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, ScanError> {
        let value = self.values.get(index).ok_or(ScanError::MissingColumn {
            index,
            len: self.values.len(),
        })?;

        if let Some(decoded) = T::from_value(value) {
            return Ok(decoded);
        }

        let column = self.column_name(index);
        Err(match value {
            Value::Null => ScanError::UnexpectedNull { column },
            Value::Undecodable { type_name } => ScanError::Undecodable {
                column,
                type_name: type_name.clone(),
            },
            other => ScanError::TypeMismatch {
                column,
                expected: T::EXPECTED,
                found: other.type_name().to_owned(),
            },
        })
    }

    fn column_name(&self, index: usize) -> String {
        self.columns
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{}", index))
    }
}

/// Row cursor returned by [`Store::query`].
///
/// An `Err` item is an iteration failure reported by the store after the
/// statement started; the cursor yields nothing after it.
#[derive(Debug, Default)]
pub struct Rows {
    inner: std::vec::IntoIter<Result<Row, StoreError>>,
}

impl Rows {
    pub fn new(items: Vec<Result<Row, StoreError>>) -> Self {
        Self {
            inner: items.into_iter(),
        }
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new(rows.into_iter().map(Ok).collect())
    }
}

impl Iterator for Rows {
    type Item = Result<Row, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Narrow capability over a relational store (testable)
#[async_trait]
pub trait Store: Send + Sync {
    /// Run a statement that returns no rows; yields the affected row count.
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, StoreError>;

    /// Run a statement returning zero or more rows.
    async fn query(&self, sql: &str, args: &[Value]) -> Result<Rows, StoreError>;

    /// Run a statement expected to return at most one row.
    ///
    /// Zero rows is `StoreError::NoRows`; interpreting it is up to the caller.
    async fn query_row(&self, sql: &str, args: &[Value]) -> Result<Row, StoreError>;

    /// Release all connections. Safe to call more than once.
    async fn close(&self);
}
