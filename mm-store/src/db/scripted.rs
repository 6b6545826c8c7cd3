//! Scripted store for testing repositories without a database
//!
//! Expectations are consumed in order. Each names the call, a SQL fragment
//! that must appear in the statement (case-insensitive) and, optionally, the
//! exact arguments. A call that does not match the next expectation gets a
//! driver error and leaves the expectation queued.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::error::StoreError;
use super::store::{Row, Rows, Store, Value};

/// Which store call an expectation answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Execute,
    Query,
    QueryRow,
}

#[derive(Debug)]
enum Reply {
    Affected(Result<u64, StoreError>),
    Rows(Result<Rows, StoreError>),
    Row(Result<Row, StoreError>),
}

impl Reply {
    fn method(&self) -> Method {
        match self {
            Self::Affected(_) => Method::Execute,
            Self::Rows(_) => Method::Query,
            Self::Row(_) => Method::QueryRow,
        }
    }
}

/// One scripted call and its reply
#[derive(Debug)]
pub struct Expectation {
    fragment: String,
    args: Option<Vec<Value>>,
    reply: Reply,
}

impl Expectation {
    /// Expect `execute` and reply with an affected-row count or an error.
    pub fn execute(fragment: &str, reply: Result<u64, StoreError>) -> Self {
        Self::new(fragment, Reply::Affected(reply))
    }

    /// Expect `query` and reply with a cursor or an error.
    pub fn query(fragment: &str, reply: Result<Rows, StoreError>) -> Self {
        Self::new(fragment, Reply::Rows(reply))
    }

    /// Expect `query_row` and reply with a row or an error.
    pub fn query_row(fragment: &str, reply: Result<Row, StoreError>) -> Self {
        Self::new(fragment, Reply::Row(reply))
    }

    /// Require these exact arguments.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    fn new(fragment: &str, reply: Reply) -> Self {
        Self {
            fragment: fragment.to_lowercase(),
            args: None,
            reply,
        }
    }

    fn mismatch(&self, method: Method, sql: &str, args: &[Value]) -> Option<String> {
        if self.reply.method() != method {
            return Some(format!(
                "expected {:?} matching '{}', got {:?}",
                self.reply.method(),
                self.fragment,
                method
            ));
        }
        if !sql.to_lowercase().contains(&self.fragment) {
            return Some(format!(
                "statement does not contain '{}': {}",
                self.fragment,
                sql.trim()
            ));
        }
        match &self.args {
            Some(expected) if expected.as_slice() != args => Some(format!(
                "arguments differ: expected {:?}, got {:?}",
                expected, args
            )),
            _ => None,
        }
    }
}

/// Store double driven by a queue of [`Expectation`]s
#[derive(Debug, Default)]
pub struct ScriptedStore {
    expectations: Mutex<VecDeque<Expectation>>,
    closed: AtomicBool,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an expectation; returns `self` for chaining.
    pub fn expect(&self, expectation: Expectation) -> &Self {
        self.queue().push_back(expectation);
        self
    }

    /// Error listing the expectations nobody consumed.
    pub fn expectations_met(&self) -> Result<(), String> {
        let queue = self.queue();
        if queue.is_empty() {
            return Ok(());
        }
        let pending: Vec<String> = queue
            .iter()
            .map(|e| format!("{:?} '{}'", e.reply.method(), e.fragment))
            .collect();
        Err(format!("unmet expectations: {}", pending.join(", ")))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Expectation>> {
        self.expectations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self, method: Method, sql: &str, args: &[Value]) -> Result<Reply, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let mut queue = self.queue();
        let Some(next) = queue.front() else {
            return Err(unexpected(format!(
                "unexpected {:?} call: {}",
                method,
                sql.trim()
            )));
        };
        if let Some(reason) = next.mismatch(method, sql, args) {
            return Err(unexpected(reason));
        }

        queue
            .pop_front()
            .map(|e| e.reply)
            .ok_or_else(|| unexpected("expectation queue drained concurrently".to_string()))
    }
}

fn unexpected(reason: String) -> StoreError {
    StoreError::Driver(sqlx::Error::Protocol(reason))
}

#[async_trait]
impl Store for ScriptedStore {
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, StoreError> {
        match self.take(Method::Execute, sql, args)? {
            Reply::Affected(reply) => reply,
            other => Err(unexpected(format!("reply mismatch: {:?}", other.method()))),
        }
    }

    async fn query(&self, sql: &str, args: &[Value]) -> Result<Rows, StoreError> {
        match self.take(Method::Query, sql, args)? {
            Reply::Rows(reply) => reply,
            other => Err(unexpected(format!("reply mismatch: {:?}", other.method()))),
        }
    }

    async fn query_row(&self, sql: &str, args: &[Value]) -> Result<Row, StoreError> {
        match self.take(Method::QueryRow, sql, args)? {
            Reply::Row(reply) => reply,
            other => Err(unexpected(format!("reply mismatch: {:?}", other.method()))),
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
