//! Prompt construction for model requests.
//!
//! Builds the instruction text sent to the model from the user's question
//! and the store's schema.

use std::sync::Arc;

use crate::db::Schema;
use crate::error::{QueryGateError, Result};
use crate::llm::types::Message;

/// System prompt template for the SQL generator.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a precise SQL query generator that converts natural language to SQLite SQL.

DATABASE SCHEMA:
{schema}

RULES:
1. Produce exactly one SQLite statement.
2. Use exact table and column names from the schema.
3. Include JOIN conditions only when the question needs data from more than one table.
4. Add WHERE clauses for filtering.
5. Use aggregation functions when necessary.
6. Alias complex columns for readability.

OUTPUT FORMAT:
Return ONLY the SQL statement wrapped in a ```sql code block, without explanations."#;

/// A natural-language question as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NlQuery(String);

impl NlQuery {
    /// Wraps a question, rejecting blank input.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QueryGateError::EmptyQuery);
        }
        Ok(Self(text))
    }

    /// Returns the question text, trimmed.
    pub fn as_str(&self) -> &str {
        self.0.trim()
    }
}

/// A fully built model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Instructions plus schema context.
    pub system: Arc<str>,
    /// The question, framed for the model.
    pub user: String,
}

impl Prompt {
    /// Returns the prompt as chat messages.
    pub fn to_messages(&self) -> Vec<Message> {
        vec![
            Message::system(self.system.to_string()),
            Message::user(self.user.clone()),
        ]
    }

    /// Returns the prompt as a single block of text.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Builds prompts against a fixed schema.
///
/// The system prompt is rendered once and shared by every request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: Arc<str>,
}

impl PromptBuilder {
    /// Creates a builder for the given schema.
    pub fn new(schema: &Schema) -> Self {
        Self {
            system_prompt: Arc::from(build_system_prompt(schema)),
        }
    }

    /// Builds the prompt for a question.
    pub fn build(&self, query: &NlQuery) -> Prompt {
        Prompt {
            system: Arc::clone(&self.system_prompt),
            user: format!("Generate a SQL query for: \"{}\"", query.as_str()),
        }
    }

    /// Validates raw input and builds the prompt in one step.
    pub fn build_from_text(&self, text: &str) -> Result<Prompt> {
        let query = NlQuery::new(text)?;
        Ok(self.build(&query))
    }

    /// Returns the shared system prompt.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// Builds the system prompt with the database schema injected.
pub fn build_system_prompt(schema: &Schema) -> String {
    let schema_text = schema.format_for_llm();
    SYSTEM_PROMPT_TEMPLATE.replace("{schema}", &schema_text)
}
