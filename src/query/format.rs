//! Result formatting.
//!
//! Turns an [`ExecutionResult`] into a display-ready shape. Pure: no I/O and
//! no mutation of the input.

use std::fmt;

use crate::query::executor::ExecutionResult;

/// A display-ready execution outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedResult {
    /// Tabular result with headers, stringified cells and trailing notes.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        notes: Vec<String>,
    },
    /// Single-line outcome for statements that return no row set.
    Message(String),
    /// Failure with its category label and message.
    Error { category: String, message: String },
}

/// Formats an execution result for display.
pub fn format_result(result: &ExecutionResult) -> FormattedResult {
    match result {
        ExecutionResult::Success(query_result) => {
            if let Some(affected) = query_result.rows_affected {
                return FormattedResult::Message(format!("{} row(s) affected.", affected));
            }

            let headers = query_result.column_names();
            let rows = query_result
                .rows
                .iter()
                .map(|row| row.iter().map(|value| value.to_display_string()).collect())
                .collect();

            let mut notes = Vec::new();
            if query_result.is_empty() {
                notes.push("No rows returned.".to_string());
            }
            if let Some(warning) = query_result.truncation_warning() {
                notes.push(warning);
            }

            FormattedResult::Table {
                headers,
                rows,
                notes,
            }
        }
        ExecutionResult::Failure(e) => FormattedResult::Error {
            category: e.category().to_string(),
            message: e.to_string(),
        },
    }
}

impl FormattedResult {
    /// Returns true if this is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Renders as plain text.
    pub fn render(&self) -> String {
        match self {
            Self::Table {
                headers,
                rows,
                notes,
            } => {
                let mut output = format_table(headers, rows);
                for note in notes {
                    if !output.is_empty() {
                        output.push('\n');
                    }
                    output.push_str(note);
                }
                output
            }
            Self::Message(message) => message.clone(),
            Self::Error { category, message } => format!("{}: {}", category, message),
        }
    }
}

impl fmt::Display for FormattedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Formats a table as aligned text.
fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    output.push_str(&format_line(headers, &widths));
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&separator.join("─┼─"));
    output.push('\n');

    for row in rows {
        output.push_str(&format_line(row, &widths));
        output.push('\n');
    }

    output.trim_end().to_string()
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let width = widths.get(i).copied().unwrap_or(0);
            format!("{:width$}", cell, width = width)
        })
        .collect::<Vec<_>>()
        .join(" │ ")
        .trim_end()
        .to_string()
}
