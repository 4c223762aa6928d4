//! Line-oriented terminal front end.
//!
//! Shows the generated statement, asks for a yes/no answer when the gate holds
//! it, and prints the final table or error. Generic over its input and output
//! so sessions can be scripted in tests.

use std::io::Write;

use querygate::error::{QueryGateError, Result};
use querygate::pipeline::{Orchestrator, PipelineOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

const PROMPT: &str = "querygate> ";
const CONFIRM_PROMPT: &str = "Execute this statement? [y/N] ";

/// Interactive session over an orchestrator.
pub struct Repl<R, W> {
    orchestrator: Orchestrator,
    input: Lines<R>,
    output: W,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    /// Creates a session reading answers from `input` and printing to `output`.
    pub fn new(orchestrator: Orchestrator, input: R, output: W) -> Self {
        Self {
            orchestrator,
            input: input.lines(),
            output,
        }
    }

    /// Reads questions until end of input or `exit`.
    pub async fn run(&mut self) -> Result<()> {
        self.print_line("Ask a question about your data. Type 'exit' to quit.")?;

        loop {
            self.print(PROMPT)?;
            let Some(line) = self.read_line().await? else {
                break;
            };

            let question = line.trim();
            match question {
                "" => continue,
                "exit" | "quit" | "\\q" => break,
                _ => {
                    self.ask(question).await?;
                }
            }
        }

        Ok(())
    }

    /// Runs one question to completion, asking for confirmation if needed.
    pub async fn ask(&mut self, question: &str) -> Result<PipelineOutcome> {
        let mut outcome = self.orchestrator.handle_question(question).await;
        self.show(&outcome)?;

        if matches!(outcome, PipelineOutcome::AwaitingConfirmation { .. }) {
            let confirmed = self.confirm().await?;
            outcome = self.orchestrator.resolve_pending(confirmed).await;
            self.show(&outcome)?;
        }

        Ok(outcome)
    }

    /// Consumes the session, returning the orchestrator and output.
    pub fn into_parts(self) -> (Orchestrator, W) {
        (self.orchestrator, self.output)
    }

    async fn confirm(&mut self) -> Result<bool> {
        self.print(CONFIRM_PROMPT)?;
        // End of input counts as "no".
        let answer = self.read_line().await?.unwrap_or_default();
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    fn show(&mut self, outcome: &PipelineOutcome) -> Result<()> {
        match outcome {
            PipelineOutcome::Completed { sql, result } => {
                self.print_line(&format!("SQL: {}", sql))?;
                self.print_line(&result.render())?;
            }
            PipelineOutcome::AwaitingConfirmation { sql, warning } => {
                self.print_line(&format!("SQL: {}", sql))?;
                self.print_line(&format!("Warning: {}", warning))?;
            }
            PipelineOutcome::Rejected { .. } => {
                self.print_line("Statement not executed.")?;
            }
            PipelineOutcome::Failed { message, .. } => {
                self.print_line(&format!("Error: {}", message))?;
            }
        }
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        self.input
            .next_line()
            .await
            .map_err(|e| QueryGateError::internal(format!("Failed to read input: {e}")))
    }

    fn print(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{}", text)
            .and_then(|_| self.output.flush())
            .map_err(|e| QueryGateError::internal(format!("Failed to write output: {e}")))
    }

    fn print_line(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)
            .map_err(|e| QueryGateError::internal(format!("Failed to write output: {e}")))
    }
}
