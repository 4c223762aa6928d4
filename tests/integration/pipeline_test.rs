//! End-to-end pipeline tests.
//!
//! Drives questions through the orchestrator against a real SQLite file with
//! a mock model client standing in for Ollama.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use querygate::config::{Config, LlmConfig};
use querygate::db::{DatabaseClient, SqliteClient};
use querygate::error::{ErrorKind, Result};
use querygate::llm::{LlmClient, Message, MockLlmClient, Role};
use querygate::pipeline::{Orchestrator, PipelineOutcome};
use querygate::query::{FormattedResult, GateState};
use tempfile::TempDir;

use super::seeded_store;

async fn open(dir: &TempDir) -> (Arc<SqliteClient>, querygate::db::Schema) {
    let client = SqliteClient::connect(&seeded_store(dir).await).await.unwrap();
    let schema = client.introspect_schema().await.unwrap();
    (Arc::new(client), schema)
}

async fn employee_count(store: &SqliteClient) -> String {
    let result = store
        .execute_query("SELECT COUNT(*) FROM Employees")
        .await
        .unwrap();
    result.rows[0][0].to_display_string()
}

/// Model client that records the messages it was sent.
#[derive(Clone, Default)]
struct RecordingClient {
    seen: Arc<Mutex<Vec<Message>>>,
}

#[async_trait]
impl LlmClient for RecordingClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.seen.lock().unwrap().extend_from_slice(messages);
        Ok("Here is the SQL:\n```sql\nSELECT Name FROM Employees ORDER BY Name;\n```".to_string())
    }
}

#[tokio::test]
async fn test_safe_question_returns_rows_without_confirmation() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let mut orchestrator = Orchestrator::with_mock_llm(store, &schema);

    let outcome = orchestrator
        .handle_question("List employees with name starting with 's'")
        .await;

    match outcome {
        PipelineOutcome::Completed { sql, result } => {
            assert_eq!(sql, "SELECT * FROM employees WHERE name LIKE 's%';");
            match result {
                FormattedResult::Table { headers, rows, notes } => {
                    assert_eq!(
                        headers,
                        vec!["ID", "Name", "Department_ID", "Salary", "Hire_Date"]
                    );
                    let names: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
                    assert_eq!(names, vec!["Sam", "Sara"]);
                    assert!(notes.is_empty());
                }
                other => panic!("Expected Table, got {:?}", other),
            }
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
    assert_eq!(orchestrator.gate_state(), Some(GateState::NotRequired));
}

#[tokio::test]
async fn test_unsafe_question_rejected_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let mut orchestrator = Orchestrator::with_mock_llm(store.clone(), &schema);

    let outcome = orchestrator.handle_question("Delete Sam from the employees").await;

    match &outcome {
        PipelineOutcome::AwaitingConfirmation { sql, warning } => {
            assert_eq!(sql, "DELETE FROM employees WHERE name = 'Sam';");
            assert!(warning.contains("DELETE"));
        }
        other => panic!("Expected AwaitingConfirmation, got {:?}", other),
    }
    assert_eq!(orchestrator.gate_state(), Some(GateState::PendingConfirmation));
    assert_eq!(employee_count(&store).await, "4");

    let outcome = orchestrator.resolve_pending(false).await;

    assert_eq!(
        outcome,
        PipelineOutcome::Rejected {
            sql: "DELETE FROM employees WHERE name = 'Sam';".to_string()
        }
    );
    assert_eq!(orchestrator.gate_state(), Some(GateState::Rejected));
    assert_eq!(employee_count(&store).await, "4");
}

#[tokio::test]
async fn test_unsafe_question_confirmed_executes() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let mut orchestrator = Orchestrator::with_mock_llm(store.clone(), &schema);

    orchestrator.handle_question("Delete Sam from the employees").await;
    let outcome = orchestrator.resolve_pending(true).await;

    match outcome {
        PipelineOutcome::Completed { result, .. } => {
            assert_eq!(result, FormattedResult::Message("1 row(s) affected.".to_string()));
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
    assert_eq!(orchestrator.gate_state(), Some(GateState::Confirmed));
    assert_eq!(employee_count(&store).await, "3");
}

#[tokio::test]
async fn test_abandoned_confirmation_never_executes() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let mut orchestrator = Orchestrator::with_mock_llm(store.clone(), &schema);

    orchestrator.handle_question("Delete Sam from the employees").await;
    let outcome = orchestrator.handle_question("Count employees").await;

    match outcome {
        PipelineOutcome::Completed { result, .. } => {
            assert!(result.render().contains("employee_count"));
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
    assert!(!orchestrator.has_pending());
    assert_eq!(employee_count(&store).await, "4");
}

#[tokio::test]
async fn test_model_timeout_fails_without_execution() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let llm = MockLlmClient::new().with_delay(Duration::from_millis(500));
    let mut orchestrator = Orchestrator::new(
        store.clone(),
        Box::new(llm),
        &schema,
        Duration::from_millis(25),
    );

    let outcome = orchestrator.handle_question("Delete Sam from the employees").await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Timeout));
    assert!(outcome.sql().is_none());
    assert!(!orchestrator.has_pending());
    assert_eq!(employee_count(&store).await, "4");
}

#[tokio::test]
async fn test_prose_only_response_is_no_statement_found() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let mut orchestrator = Orchestrator::with_mock_llm(store, &schema);

    let outcome = orchestrator.handle_question("Tell me a joke").await;

    match outcome {
        PipelineOutcome::Failed { kind, message } => {
            assert_eq!(kind, ErrorKind::NoStatementFound);
            assert_eq!(message, "No SQL statement found in the model response.");
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert!(orchestrator.gate_state().is_none());
}

#[tokio::test]
async fn test_malformed_statement_is_syntax_error() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let llm = MockLlmClient::new().with_response("typo", "```sql\nSELEC * FROM employees;\n```");
    let mut orchestrator = Orchestrator::new(store, Box::new(llm), &schema, Duration::from_secs(5));

    let outcome = orchestrator.handle_question("make a typo").await;

    match outcome {
        PipelineOutcome::Completed { sql, result } => {
            assert_eq!(sql, "SELEC * FROM employees;");
            match result {
                FormattedResult::Error { category, .. } => assert_eq!(category, "Syntax Error"),
                other => panic!("Expected Error, got {:?}", other),
            }
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_table_is_execution_error() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let llm = MockLlmClient::new().with_response("salaries", "SELECT * FROM Salaries;");
    let mut orchestrator = Orchestrator::new(store, Box::new(llm), &schema, Duration::from_secs(5));

    let outcome = orchestrator.handle_question("show salaries").await;

    match outcome {
        PipelineOutcome::Completed { result, .. } => match result {
            FormattedResult::Error { category, message } => {
                assert_eq!(category, "Execution Error");
                assert!(message.contains("no such table"));
            }
            other => panic!("Expected Error, got {:?}", other),
        },
        other => panic!("Expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_result_keeps_headers() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let llm = MockLlmClient::new().with_response(
        "nobody",
        "```sql\nSELECT Name, Salary FROM Employees WHERE Salary > 100000;\n```",
    );
    let mut orchestrator = Orchestrator::new(store, Box::new(llm), &schema, Duration::from_secs(5));

    let outcome = orchestrator.handle_question("who earns more than nobody").await;

    match outcome {
        PipelineOutcome::Completed {
            result: FormattedResult::Table { headers, rows, notes },
            ..
        } => {
            assert_eq!(headers, vec!["Name", "Salary"]);
            assert!(rows.is_empty());
            assert_eq!(notes, vec!["No rows returned.".to_string()]);
        }
        other => panic!("Expected an empty table, got {:?}", other),
    }
}

#[tokio::test]
async fn test_prompt_carries_schema_and_question() {
    let dir = TempDir::new().unwrap();
    let (store, schema) = open(&dir).await;
    let llm = RecordingClient::default();
    let mut orchestrator = Orchestrator::new(
        store,
        Box::new(llm.clone()),
        &schema,
        Duration::from_secs(5),
    );

    orchestrator.handle_question("  Who works here?  ").await;

    let seen = llm.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].role, Role::System);
    assert!(seen[0].content.contains("Table: Employees"));
    assert!(seen[0].content.contains("Employees.Department_ID -> Departments.ID"));
    assert_eq!(seen[1].role, Role::User);
    assert!(seen[1].content.contains("\"Who works here?\""));
}

#[tokio::test]
async fn test_connect_from_config_with_mock_provider() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        llm: LlmConfig {
            provider: "mock".to_string(),
            ..LlmConfig::default()
        },
        store: seeded_store(&dir).await,
    };

    let mut orchestrator = Orchestrator::connect(&config).await.unwrap();
    let outcome = orchestrator.handle_question("Count departments").await;

    match outcome {
        PipelineOutcome::Completed {
            result: FormattedResult::Table { rows, .. },
            ..
        } => assert_eq!(rows, vec![vec!["2".to_string()]]),
        other => panic!("Expected Completed, got {:?}", other),
    }
    orchestrator.close().await.unwrap();
}
