//! Confirmation, execution and result formatting for QueryGate.
//!
//! This module isolates everything that happens to a statement after it has
//! been extracted and classified, away from the orchestrator.

pub mod executor;
pub mod format;
pub mod gate;

pub use executor::{ExecutionResult, QueryExecutor};
pub use format::{format_result, FormattedResult};
pub use gate::{
    ApprovedStatement, ConfirmationGate, GateDecision, GateState, GeneratedSql, PendingDecision,
    Resolution,
};
