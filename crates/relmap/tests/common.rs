//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::anyhow;
use relmap::{Context, DriverError, Executor, IdSource, Querier, Rows, Value, record};

// Common record fixtures used across multiple test files

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct User {
        pub id: i64 => "primary_key;newid",
        pub user_name: String => "column:name",
        pub age: i64,
        pub created_at: i64,
        pub updated_at: i64 => "on_update",
        pub secret: String => "-",
        pub seq: i64 => "auto_increment",
    }
}

record! {
    table = "audit_log",
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct AuditEntry {
        pub id: i64 => "primary_key",
        pub action: String,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct APIKey {
        pub id: i64 => "primary_key;newid",
        pub token: String,
    }
}

pub fn sample_user(id: i64, name: &str, age: i64) -> User {
    User {
        id,
        user_name: name.to_string(),
        age,
        created_at: 1_700_000_000,
        updated_at: 1_700_000_000,
        ..User::default()
    }
}

/// Row values for a `User` in the sorted column order
/// (age, created_at, id, name, seq, updated_at).
pub fn user_row(user: &User) -> Vec<Value> {
    vec![
        Value::from(user.age),
        Value::from(user.created_at),
        Value::from(user.id),
        Value::from(user.user_name.clone()),
        Value::from(user.seq),
        Value::from(user.updated_at),
    ]
}

/// Deterministic identifier source: 1, 2, 3, ...
#[derive(Default)]
pub struct SeqIds(AtomicI64);

impl IdSource for SeqIds {
    fn next_id(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Scripted outcome of one query call.
pub enum QueryScript {
    Rows(Vec<Vec<Value>>),
    NoRows,
    Fail(String),
}

/// In-memory driver double. Records every statement it receives and replays
/// scripted outcomes in FIFO order; unscripted calls succeed with one
/// affected row or an empty result set.
#[derive(Default)]
pub struct FakeDriver {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    affected: Mutex<VecDeque<Result<u64, String>>>,
    queries: Mutex<VecDeque<QueryScript>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_affected(&self, affected: u64) {
        self.affected.lock().unwrap().push_back(Ok(affected));
    }

    pub fn script_execute_failure(&self, message: &str) {
        self.affected.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub fn script_rows(&self, rows: Vec<Vec<Value>>) {
        self.queries.lock().unwrap().push_back(QueryScript::Rows(rows));
    }

    pub fn script_no_rows(&self) {
        self.queries.lock().unwrap().push_back(QueryScript::NoRows);
    }

    pub fn script_query_failure(&self, message: &str) {
        self.queries.lock().unwrap().push_back(QueryScript::Fail(message.to_string()));
    }

    /// Every `(sql, args)` pair received so far, in call order.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Executor for FakeDriver {
    fn execute(&self, _cx: &Context, sql: &str, args: &[Value]) -> Result<u64, DriverError> {
        self.calls.lock().unwrap().push((sql.to_string(), args.to_vec()));
        match self.affected.lock().unwrap().pop_front() {
            Some(Ok(affected)) => Ok(affected),
            Some(Err(message)) => Err(DriverError::Other(anyhow!(message))),
            None => Ok(1),
        }
    }
}

impl Querier for FakeDriver {
    fn query<'a>(
        &'a self, _cx: &Context, sql: &str, args: &[Value],
    ) -> Result<Box<dyn Rows + 'a>, DriverError> {
        self.calls.lock().unwrap().push((sql.to_string(), args.to_vec()));
        let script = self.queries.lock().unwrap().pop_front();
        match script {
            Some(QueryScript::Rows(rows)) => Ok(Box::new(FakeRows { rows: rows.into_iter() })),
            Some(QueryScript::NoRows) => Err(DriverError::NoRows),
            Some(QueryScript::Fail(message)) => Err(DriverError::Other(anyhow!(message))),
            None => Ok(Box::new(FakeRows { rows: Vec::new().into_iter() })),
        }
    }
}

struct FakeRows {
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl Rows for FakeRows {
    fn next_row(&mut self) -> Option<Result<Vec<Value>, DriverError>> {
        self.rows.next().map(Ok)
    }
}
