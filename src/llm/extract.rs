//! Statement extraction from model output.
//!
//! Model output is best-effort SQL-shaped text: it may wrap the statement in
//! markdown fences, surround it with prose, or offer several candidates.
//! Extraction is lexical and always selects exactly one statement.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{QueryGateError, Result};
use crate::safety::leading_verb_token;

/// Verbs that may start an extracted statement.
pub const SQL_VERBS: [&str; 8] = [
    "SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE",
];

/// Keywords that may open a statement inside a `sql` fence without a verb line.
const FENCE_LEADING_KEYWORDS: [&str; 5] = ["WITH", "PRAGMA", "EXPLAIN", "VALUES", "REPLACE"];

/// Matches the first line that begins with a recognized verb.
fn verb_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(r"(?im)^[ \t]*({})\b", SQL_VERBS.join("|"));
        Regex::new(&pattern).expect("verb pattern is valid")
    })
}

/// Extracts a single executable statement from raw model output.
///
/// A fenced code block labeled `sql` wins over an unlabeled one; blocks in
/// other languages are ignored. Inside the chosen block, or across the whole
/// text when no usable block exists, the statement starts at the first line
/// beginning with a recognized verb and ends at the first terminating
/// semicolon (kept) or the end of the text.
pub fn extract_statement(response: &str) -> Result<String> {
    if let Some(statement) = preferred_fence(response).and_then(statement_in_fence) {
        return Ok(statement);
    }

    scan_statement(response).ok_or(QueryGateError::NoStatementFound)
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fence<'a> {
    lang: &'a str,
    body: &'a str,
}

impl Fence<'_> {
    fn is_sql(&self) -> bool {
        self.lang.eq_ignore_ascii_case("sql") || self.lang.eq_ignore_ascii_case("sqlite")
    }

    fn is_unlabeled(&self) -> bool {
        self.lang.is_empty()
    }
}

fn preferred_fence(text: &str) -> Option<Fence<'_>> {
    let fences = fenced_blocks(text);
    let has_body = |f: &&Fence<'_>| !f.body.trim().is_empty();

    fences
        .iter()
        .filter(has_body)
        .find(|f| f.is_sql())
        .or_else(|| fences.iter().filter(has_body).find(|f| f.is_unlabeled()))
        .cloned()
}

/// Splits out every ``` fenced block, in order.
///
/// An unclosed final fence runs to the end of the text.
fn fenced_blocks(text: &str) -> Vec<Fence<'_>> {
    let mut fences = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_ticks = &rest[open + 3..];
        let Some(newline) = after_ticks.find('\n') else {
            break;
        };
        let lang = after_ticks[..newline].trim();
        let body_start = &after_ticks[newline + 1..];

        match body_start.find("```") {
            Some(close) => {
                fences.push(Fence {
                    lang,
                    body: &body_start[..close],
                });
                rest = &body_start[close + 3..];
            }
            None => {
                fences.push(Fence {
                    lang,
                    body: body_start,
                });
                break;
            }
        }
    }

    fences
}

/// Takes the statement from a fence, or the whole body of a `sql` fence that
/// opens with another statement keyword. Prose bodies yield nothing.
fn statement_in_fence(fence: Fence<'_>) -> Option<String> {
    if let Some(statement) = scan_statement(fence.body) {
        return Some(statement);
    }

    let token = leading_verb_token(fence.body);
    let opens_statement = FENCE_LEADING_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(token));

    if fence.is_sql() && opens_statement {
        terminate(fence.body)
    } else {
        None
    }
}

/// Finds the first verb-led line and captures the statement from there.
fn scan_statement(text: &str) -> Option<String> {
    let captures = verb_line_regex().captures(text)?;
    let verb = captures.get(1)?;
    terminate(&text[verb.start()..])
}

/// Cuts a statement at its first semicolon outside of quotes.
fn terminate(text: &str) -> Option<String> {
    let mut quote: Option<char> = None;

    for (idx, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, ';') => return non_empty(&text[..=idx]),
            (None, _) => {}
        }
    }

    non_empty(text)
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
