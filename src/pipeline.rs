//! Core orchestrator for QueryGate.
//!
//! Drives one question through prompt, model, extraction, classification,
//! the confirmation gate, execution and formatting. Every failure is caught
//! here and turned into a [`PipelineOutcome`]; nothing propagates further.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::{self, DatabaseClient, Schema};
use crate::error::{ErrorKind, QueryGateError, Result};
use crate::llm::{
    create_client, extract_statement, LlmClient, MockLlmClient, NlQuery, PromptBuilder,
};
use crate::llm::ollama::DEFAULT_TIMEOUT_SECS;
use crate::query::{
    format_result, ApprovedStatement, ConfirmationGate, FormattedResult, GateDecision, GateState,
    GeneratedSql, QueryExecutor, Resolution,
};
use crate::safety::{KeywordClassifier, StatementClassifier};

/// Outcome of one pipeline step, ready for the display collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The statement ran; `result` holds rows, a rows-affected message or the store error.
    Completed { sql: String, result: FormattedResult },
    /// The statement is unsafe and waits for [`Orchestrator::resolve_pending`].
    AwaitingConfirmation { sql: String, warning: String },
    /// The user declined the statement; nothing was executed.
    Rejected { sql: String },
    /// The pipeline stopped before execution.
    Failed { kind: ErrorKind, message: String },
}

impl PipelineOutcome {
    /// Returns the statement this outcome is about, if one was generated.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Completed { sql, .. }
            | Self::AwaitingConfirmation { sql, .. }
            | Self::Rejected { sql } => Some(sql),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the error kind for failed outcomes.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    fn failed(error: QueryGateError) -> Self {
        warn!(category = error.category(), "Request failed: {}", error);
        Self::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// The main orchestrator that coordinates all components.
pub struct Orchestrator {
    /// Store the approved statements run against.
    db: Arc<dyn DatabaseClient>,
    /// Model client that turns prompts into SQL-shaped text.
    llm: Box<dyn LlmClient>,
    /// Prompt builder carrying the schema context.
    prompt_builder: PromptBuilder,
    /// Safety classifier; swappable for a grammar-aware one.
    classifier: Box<dyn StatementClassifier>,
    /// Executor over `db`.
    executor: QueryExecutor,
    /// Holds the single pending-confirmation slot.
    gate: ConfirmationGate,
    /// Upper bound on one model call.
    model_timeout: Duration,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given components.
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        llm: Box<dyn LlmClient>,
        schema: &Schema,
        model_timeout: Duration,
    ) -> Self {
        Self {
            executor: QueryExecutor::new(Arc::clone(&db)),
            db,
            llm,
            prompt_builder: PromptBuilder::new(schema),
            classifier: Box::new(KeywordClassifier::new()),
            gate: ConfirmationGate::new(),
            model_timeout,
        }
    }

    /// Opens the store, reads its schema and creates the configured model client.
    pub async fn connect(config: &Config) -> Result<Self> {
        let db = db::connect(&config.store).await?;
        let schema = db.introspect_schema().await?;
        info!("Loaded schema with {} tables", schema.tables.len());

        let llm = create_client(&config.llm)?;

        Ok(Self::new(db, llm, &schema, config.llm.timeout()))
    }

    /// Creates an orchestrator with a mock model client for testing.
    pub fn with_mock_llm(db: Arc<dyn DatabaseClient>, schema: &Schema) -> Self {
        Self::new(
            db,
            Box::new(MockLlmClient::new()),
            schema,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Replaces the safety classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn StatementClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Handles one question.
    ///
    /// A statement still awaiting confirmation from an earlier question is
    /// abandoned first and never executed.
    pub async fn handle_question(&mut self, question: &str) -> PipelineOutcome {
        if let Some(abandoned) = self.gate.abandon() {
            info!(sql = %abandoned.sql, "Superseded by a new question");
        }

        let generated = match self.generate(question).await {
            Ok(generated) => generated,
            Err(e) => return PipelineOutcome::failed(e),
        };

        match self.gate.evaluate(generated) {
            GateDecision::Proceed(approved) => self.run(approved).await,
            GateDecision::Held { sql, warning } => {
                PipelineOutcome::AwaitingConfirmation { sql, warning }
            }
        }
    }

    /// Applies the user's yes/no answer to the pending statement.
    pub async fn resolve_pending(&mut self, confirmed: bool) -> PipelineOutcome {
        match self.gate.resolve(confirmed) {
            Some(Resolution::Confirmed(approved)) => self.run(approved).await,
            Some(Resolution::Rejected(statement)) => {
                PipelineOutcome::Rejected { sql: statement.sql }
            }
            None => PipelineOutcome::failed(QueryGateError::internal(
                "no statement is awaiting confirmation",
            )),
        }
    }

    /// Returns true if a statement is waiting for confirmation.
    pub fn has_pending(&self) -> bool {
        self.gate.has_pending()
    }

    /// Returns the statement waiting for confirmation, if any.
    pub fn pending_sql(&self) -> Option<&str> {
        self.gate.pending().map(|p| p.statement().sql.as_str())
    }

    /// Returns the gate state reached by the most recent statement.
    pub fn gate_state(&self) -> Option<GateState> {
        self.gate.state()
    }

    /// Closes the store.
    pub async fn close(&self) -> Result<()> {
        self.db.close().await
    }

    /// Question to classified statement: prompt, bounded model call, extraction, classification.
    async fn generate(&self, question: &str) -> Result<GeneratedSql> {
        let query = NlQuery::new(question)?;
        let prompt = self.prompt_builder.build(&query);
        debug!(question = query.as_str(), "Sending prompt to model");

        let response = tokio::time::timeout(
            self.model_timeout,
            self.llm.complete(&prompt.to_messages()),
        )
        .await
        .map_err(|_| {
            QueryGateError::timeout(format!(
                "no response within {} seconds",
                self.model_timeout.as_secs_f64()
            ))
        })??;

        if response.trim().is_empty() {
            return Err(QueryGateError::empty_response("the model returned no text"));
        }
        debug!("Model response: {}", response);

        let sql = extract_statement(&response)?;
        let classification = self.classifier.classify(&sql);
        info!(sql = %sql, label = %classification.label, "Generated SQL");

        Ok(GeneratedSql::new(sql, classification))
    }

    async fn run(&self, approved: ApprovedStatement) -> PipelineOutcome {
        let result = self.executor.execute(&approved).await;
        let formatted = format_result(&result);
        PipelineOutcome::Completed {
            sql: approved.sql().to_string(),
            result: formatted,
        }
    }
}
