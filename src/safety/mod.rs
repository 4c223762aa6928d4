//! Statement safety classification.
//!
//! Labels a candidate statement as safe or unsafe to decide whether the
//! confirmation gate must hold it before execution. The classifier sits
//! behind [`StatementClassifier`] so the keyword heuristic can be swapped
//! for a grammar-aware one without touching the pipeline.

mod keyword;

pub use keyword::{classify_sql, leading_verb_token, KeywordClassifier, DENYLIST};

use std::fmt;

/// Safety label for a candidate statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLabel {
    /// Cannot mutate data; runs without confirmation.
    Safe,
    /// Leading verb can mutate or destroy data; requires confirmation.
    Unsafe,
}

impl SafetyLabel {
    /// Returns true if this label requires user confirmation.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Unsafe)
    }
}

impl fmt::Display for SafetyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Unsafe => write!(f, "UNSAFE"),
        }
    }
}

/// The leading SQL keyword of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadingVerb {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Alter,
    Create,
    Truncate,
    With,
    /// Any other leading token, uppercased.
    Other(String),
    /// No token at all (empty or comment-only input).
    Missing,
}

impl LeadingVerb {
    /// Maps a raw token to a verb, case-insensitively.
    pub fn from_token(token: &str) -> Self {
        if token.is_empty() {
            return Self::Missing;
        }
        match token.to_ascii_uppercase().as_str() {
            "SELECT" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "DROP" => Self::Drop,
            "ALTER" => Self::Alter,
            "CREATE" => Self::Create,
            "TRUNCATE" => Self::Truncate,
            "WITH" => Self::With,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns true if statements led by this verb normally produce a row set.
    pub fn returns_rows(&self) -> bool {
        match self {
            Self::Select | Self::With => true,
            Self::Other(token) => matches!(token.as_str(), "PRAGMA" | "EXPLAIN" | "VALUES"),
            _ => false,
        }
    }
}

impl fmt::Display for LeadingVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Truncate => write!(f, "TRUNCATE"),
            Self::With => write!(f, "WITH"),
            Self::Other(token) => write!(f, "{}", token),
            Self::Missing => write!(f, "(none)"),
        }
    }
}

/// Result of classifying a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The safety label.
    pub label: SafetyLabel,
    /// The leading verb the label was derived from.
    pub verb: LeadingVerb,
}

impl Classification {
    /// Creates a new classification.
    pub fn new(label: SafetyLabel, verb: LeadingVerb) -> Self {
        Self { label, verb }
    }

    /// Returns true if user confirmation is required.
    pub fn requires_confirmation(&self) -> bool {
        self.label.requires_confirmation()
    }

    /// Message shown alongside the confirmation prompt.
    pub fn warning(&self) -> Option<String> {
        self.requires_confirmation().then(|| {
            format!(
                "This {} statement can modify or destroy data.",
                self.verb
            )
        })
    }
}

/// Assigns a safety label to a candidate statement.
///
/// Implementations must be deterministic: classifying the same text twice
/// yields the same result.
pub trait StatementClassifier: Send + Sync {
    /// Classifies the given statement text.
    fn classify(&self, sql: &str) -> Classification;
}
