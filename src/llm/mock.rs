//! Mock model client for testing.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ErrorKind, QueryGateError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock model client that returns canned responses based on input patterns.
///
/// Used for unit testing without a running inference service.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// Artificial latency before answering.
    delay: Option<Duration>,
    /// Error to return instead of a response.
    failure: Option<ErrorKind>,
    /// Number of completed calls, shared between clones.
    calls: Arc<AtomicUsize>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the input contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses.push((pattern.into(), response.into()));
        self
    }

    /// Sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes every call fail with an error of the given kind.
    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    /// Returns how many times `complete` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Generates a mock response based on the input.
    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        // Check custom responses first
        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains("starting with 's'") {
            return "```sql\nSELECT * FROM employees WHERE name LIKE 's%';\n```".to_string();
        }

        if input_lower.contains("all employees") || input_lower.contains("list employees") {
            return "```sql\nSELECT * FROM employees;\n```".to_string();
        }

        if input_lower.contains("count") && input_lower.contains("departments") {
            return "```sql\nSELECT COUNT(*) AS department_count FROM departments;\n```"
                .to_string();
        }

        if input_lower.contains("count") && input_lower.contains("employees") {
            return "```sql\nSELECT COUNT(*) AS employee_count FROM employees;\n```".to_string();
        }

        if (input_lower.contains("delete") || input_lower.contains("remove"))
            && input_lower.contains("sam")
        {
            return "```sql\nDELETE FROM employees WHERE name = 'Sam';\n```".to_string();
        }

        if input_lower.contains("raise") || input_lower.contains("update") {
            return "```sql\nUPDATE employees SET salary = salary * 1.1;\n```".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(kind) = self.failure {
            return Err(QueryGateError::of_kind(kind, "mock backend failure"));
        }

        let input = Self::extract_user_input(messages);
        Ok(self.mock_response(&input))
    }
}
