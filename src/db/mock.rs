//! Mock store clients for testing.
//!
//! Provides in-memory store implementations so the pipeline can be exercised
//! without a database file.

use super::{ColumnInfo, DatabaseClient, QueryResult, Schema, Value};
use crate::error::{ErrorKind, QueryGateError, Result};
use crate::safety::{leading_verb_token, LeadingVerb};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock store client that returns predefined results and records every
/// statement it is asked to execute.
#[derive(Debug, Clone, Default)]
pub struct MockDatabaseClient {
    schema: Schema,
    executed: Arc<Mutex<Vec<String>>>,
}

impl MockDatabaseClient {
    /// Creates a new mock client with an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Returns the statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        match self.executed.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, sql: &str) {
        let mut guard = match self.executed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(sql.to_string());
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.record(sql);

        if LeadingVerb::from_token(leading_verb_token(sql)).returns_rows() {
            let columns = vec![ColumnInfo::new("result", "TEXT")];
            let rows = vec![vec![Value::Text(format!("Mock result for: {}", sql))]];

            Ok(QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
        } else {
            Ok(QueryResult::affected(1).with_execution_time(Duration::from_millis(1)))
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A mock store client whose statements always fail with the given kind.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    kind: ErrorKind,
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client that fails every statement with `kind` and `message`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(Schema::default())
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(QueryGateError::of_kind(self.kind, self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
