//! Error taxonomy shared by every repository
//!
//! Two layers:
//! - `StoreError`: what the store capability reports (no rows, uniqueness
//!   violation, timeout, closed pool, anything else from the driver).
//! - `RepoError`: what repositories return. Each variant names the
//!   operation and keeps the originating error as its `source()`, and
//!   `kind()` gives the closed classification callers branch on.

use std::time::Duration;

use thiserror::Error;

/// Failure reported by a [`Store`](super::store::Store)
#[derive(Debug, Error)]
pub enum StoreError {
    /// Statement returned zero rows where one was expected
    #[error("no rows in result set")]
    NoRows,

    /// Insert or update rejected by a unique constraint
    #[error("unique constraint {} violated: {message}", .constraint.as_deref().unwrap_or("<unknown>"))]
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },

    /// No connection became available in time
    #[error("timed out waiting for a database connection")]
    Timeout,

    /// Pool was closed before or during the call
    #[error("connection pool is closed")]
    Closed,

    /// Argument has no database representation
    #[error("argument ${position} cannot be bound: {reason}")]
    InvalidArgument { position: usize, reason: String },

    /// Any other driver failure (connectivity, syntax, permissions, ...)
    #[error("database driver error: {0}")]
    Driver(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NoRows,
            sqlx::Error::PoolTimedOut => Self::Timeout,
            sqlx::Error::PoolClosed => Self::Closed,
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::UniqueViolation {
                constraint: db.constraint().map(str::to_owned),
                message: db.message().to_owned(),
            },
            other => Self::Driver(other),
        }
    }
}

/// Column decoding failure while mapping a row onto an entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("column {index} missing (row has {len} columns)")]
    MissingColumn { index: usize, len: usize },

    #[error("column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("column '{column}': unexpected null")]
    UnexpectedNull { column: String },

    #[error("column '{column}': cannot decode {type_name} value")]
    Undecodable { column: String, type_name: String },
}

/// Semantic outcome of a failed repository call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Write rejected by a uniqueness constraint
    Conflict,
    /// Zero rows for the requested id
    NotFound,
    /// Row fetched but could not be decoded (corruption or schema drift)
    Scan,
    /// Statement could not run, cursor failed, or the deadline passed
    Database,
    /// Aggregate legitimately returned zero
    EmptyAggregate,
}

/// Repository error type
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} already exists ({field})")]
    AlreadyExists { entity: &'static str, field: String },

    #[error("{entity} with id {id} not found")]
    NotFound {
        entity: &'static str,
        id: i64,
        source: Option<StoreError>,
    },

    #[error("scan {op} row: {source}")]
    Scan {
        op: &'static str,
        source: ScanError,
    },

    #[error("failed {op} query: {source}")]
    Query {
        op: &'static str,
        source: StoreError,
    },

    #[error("failed {op} statement: {source}")]
    Exec {
        op: &'static str,
        source: StoreError,
    },

    #[error("rows iteration {op}: {source}")]
    Cursor {
        op: &'static str,
        source: StoreError,
    },

    #[error("deadline of {after:?} exceeded")]
    DeadlineExceeded { after: Duration },

    #[error("no {entity} records found")]
    NoRecords { entity: &'static str },
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Scan { .. } => ErrorKind::Scan,
            Self::Query { .. }
            | Self::Exec { .. }
            | Self::Cursor { .. }
            | Self::DeadlineExceeded { .. } => ErrorKind::Database,
            Self::NoRecords { .. } => ErrorKind::EmptyAggregate,
        }
    }

    /// Store-level cause, when there is one
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::NotFound { source, .. } => source.as_ref(),
            Self::Query { source, .. } | Self::Exec { source, .. } | Self::Cursor { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}
