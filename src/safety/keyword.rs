//! Keyword-based statement classification.
//!
//! Reads only the leading verb token of a statement. Identifiers that merely
//! contain a denylisted word (`updated_at`, `drop_count`) never match because
//! the token is compared whole.

use tracing::debug;

use super::{Classification, LeadingVerb, SafetyLabel, StatementClassifier};

/// Leading verbs that can mutate or destroy data.
pub const DENYLIST: [&str; 6] = ["DROP", "DELETE", "UPDATE", "ALTER", "TRUNCATE", "INSERT"];

/// Classifier that labels statements by their leading verb.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    /// Creates a new keyword classifier.
    pub fn new() -> Self {
        Self
    }
}

impl StatementClassifier for KeywordClassifier {
    fn classify(&self, sql: &str) -> Classification {
        let token = leading_verb_token(sql);
        let label = if DENYLIST.iter().any(|verb| verb.eq_ignore_ascii_case(token)) {
            SafetyLabel::Unsafe
        } else {
            SafetyLabel::Safe
        };
        debug!("Classified leading verb '{}' as {}", token, label);
        Classification::new(label, LeadingVerb::from_token(token))
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> Classification {
    KeywordClassifier::new().classify(sql)
}

/// Returns the first word token of a statement.
///
/// Skips leading whitespace, `--` line comments and `/* */` block comments.
/// A word token is a run of ASCII letters, digits and underscores; the
/// returned slice is empty when the statement starts with anything else.
pub fn leading_verb_token(sql: &str) -> &str {
    let rest = skip_trivia(sql);
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    &rest[..end]
}

fn skip_trivia(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(after) = sql.strip_prefix("--") {
            sql = match after.find('\n') {
                Some(idx) => &after[idx + 1..],
                None => "",
            };
        } else if let Some(after) = sql.strip_prefix("/*") {
            sql = match after.find("*/") {
                Some(idx) => &after[idx + 2..],
                None => "",
            };
        } else {
            return sql;
        }
    }
}
