//! Statement execution.
//!
//! Runs approved statements against the store and captures either the
//! result set or the failure, isolated from the orchestrator so it can be
//! tested on its own.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::db::{DatabaseClient, QueryResult};
use crate::error::QueryGateError;
use crate::query::gate::ApprovedStatement;

/// Executes approved statements against the store.
#[derive(Clone)]
pub struct QueryExecutor {
    db: Arc<dyn DatabaseClient>,
}

impl QueryExecutor {
    /// Creates a new executor over the given store.
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    /// Runs one statement.
    ///
    /// Takes an [`ApprovedStatement`], so nothing still awaiting confirmation
    /// can reach the store. Failures are captured, never retried.
    pub async fn execute(&self, statement: &ApprovedStatement) -> ExecutionResult {
        let start = Instant::now();
        let result = self.db.execute_query(statement.sql()).await;
        let elapsed = start.elapsed();

        match result {
            Ok(query_result) => {
                info!(
                    sql = %statement.sql(),
                    gate = %statement.state(),
                    rows = query_result.row_count,
                    rows_affected = ?query_result.rows_affected,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Statement executed"
                );
                ExecutionResult::Success(query_result)
            }
            Err(e) => {
                warn!(
                    sql = %statement.sql(),
                    category = e.category(),
                    "Statement failed: {}",
                    e
                );
                ExecutionResult::Failure(e)
            }
        }
    }
}

/// Result of executing a statement.
#[derive(Debug)]
pub enum ExecutionResult {
    /// Ordered columns and rows (possibly empty), or a rows-affected count.
    Success(QueryResult),
    /// The store rejected or failed the statement; no partial rows.
    Failure(QueryGateError),
}

impl ExecutionResult {
    /// Returns true if the statement succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts into a standard result.
    pub fn into_result(self) -> crate::error::Result<QueryResult> {
        match self {
            Self::Success(result) => Ok(result),
            Self::Failure(e) => Err(e),
        }
    }
}
