//! Store abstraction layer for QueryGate.
//!
//! Provides a trait-based interface for store operations so the pipeline can
//! run against the SQLite client or an in-memory mock.

mod mock;
mod schema;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use schema::{Column, ForeignKey, Schema, Table};
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::StoreConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Opens the store described by the configuration.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn DatabaseClient>> {
    let client = SqliteClient::connect(config).await?;
    Ok(Arc::new(client))
}

/// Trait defining the interface for store clients.
///
/// All operations are async and return Results with QueryGateError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the store schema, returning table and relationship information.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes one SQL statement and returns its results.
    ///
    /// Statements that produce no row set report `rows_affected` instead.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the store connection.
    async fn close(&self) -> Result<()>;
}
