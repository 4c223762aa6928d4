//! Error types for QueryGate.
//!
//! Defines the error enum shared by every pipeline stage. A rejected
//! confirmation is deliberately absent: it is a normal outcome, not a failure.

use thiserror::Error;

/// Main error type for QueryGate operations.
#[derive(Error, Debug)]
pub enum QueryGateError {
    /// The question was blank or whitespace-only.
    #[error("Please enter a question.")]
    EmptyQuery,

    /// The inference backend refused the connection or is not running.
    #[error("Model backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The inference backend did not answer within the configured bound.
    #[error("Model request timed out: {0}")]
    Timeout(String),

    /// The inference backend answered with nothing usable.
    #[error("Model returned an empty response: {0}")]
    EmptyResponse(String),

    /// The model output contained no recognizable SQL statement.
    #[error("No SQL statement found in the model response.")]
    NoStatementFound,

    /// The store rejected the statement as malformed.
    #[error("SQL syntax error: {0}")]
    Syntax(String),

    /// The statement was well-formed but failed to run (missing table, constraint, ...).
    #[error("Execution error: {0}")]
    Execution(String),

    /// The store could not be opened or reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Configuration errors (invalid config file, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Discriminant of [`QueryGateError`], for callers that only need the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyQuery,
    BackendUnavailable,
    Timeout,
    EmptyResponse,
    NoStatementFound,
    Syntax,
    Execution,
    StoreUnavailable,
    Config,
    Internal,
}

impl QueryGateError {
    /// Creates a backend-unavailable error with the given message.
    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Creates a timeout error with the given message.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates an empty-response error with the given message.
    pub fn empty_response(msg: impl Into<String>) -> Self {
        Self::EmptyResponse(msg.into())
    }

    /// Creates a syntax error with the given message.
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a store-unavailable error with the given message.
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Creates an error of the given kind.
    ///
    /// The message is dropped for kinds that carry none.
    pub fn of_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match kind {
            ErrorKind::EmptyQuery => Self::EmptyQuery,
            ErrorKind::BackendUnavailable => Self::BackendUnavailable(msg),
            ErrorKind::Timeout => Self::Timeout(msg),
            ErrorKind::EmptyResponse => Self::EmptyResponse(msg),
            ErrorKind::NoStatementFound => Self::NoStatementFound,
            ErrorKind::Syntax => Self::Syntax(msg),
            ErrorKind::Execution => Self::Execution(msg),
            ErrorKind::StoreUnavailable => Self::StoreUnavailable(msg),
            ErrorKind::Config => Self::Config(msg),
            ErrorKind::Internal => Self::Internal(msg),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyQuery => ErrorKind::EmptyQuery,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::EmptyResponse(_) => ErrorKind::EmptyResponse,
            Self::NoStatementFound => ErrorKind::NoStatementFound,
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::Execution(_) => ErrorKind::Execution,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "Empty Question",
            Self::BackendUnavailable(_) => "Backend Unavailable",
            Self::Timeout(_) => "Timeout",
            Self::EmptyResponse(_) => "Empty Response",
            Self::NoStatementFound => "No Statement Found",
            Self::Syntax(_) => "Syntax Error",
            Self::Execution(_) => "Execution Error",
            Self::StoreUnavailable(_) => "Store Unavailable",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the error came from the model side of the pipeline.
    pub fn is_model_error(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::Timeout(_) | Self::EmptyResponse(_)
        )
    }

    /// Returns true if the error came from running a statement against the store.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::Syntax(_) | Self::Execution(_) | Self::StoreUnavailable(_)
        )
    }
}

/// Result type alias using QueryGateError.
pub type Result<T> = std::result::Result<T, QueryGateError>;
