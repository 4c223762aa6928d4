//! Confirmation gate for unsafe statements.
//!
//! A statement reaches the store only as an [`ApprovedStatement`], and the
//! only ways to obtain one are a safe classification or an affirmative
//! answer to a [`PendingDecision`]. Holding a decision and executing are
//! therefore mutually exclusive by construction.

use std::fmt;

use tracing::info;

use crate::safety::{Classification, SafetyLabel};

/// An extracted statement together with its safety classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSql {
    /// The statement text, exactly as extracted.
    pub sql: String,
    /// How the classifier labeled it.
    pub classification: Classification,
}

impl GeneratedSql {
    /// Creates a new generated statement.
    pub fn new(sql: impl Into<String>, classification: Classification) -> Self {
        Self {
            sql: sql.into(),
            classification,
        }
    }

    /// Returns the safety label.
    pub fn label(&self) -> SafetyLabel {
        self.classification.label
    }
}

/// Where a statement stands with respect to confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateState {
    /// Safe statement; no confirmation needed.
    NotRequired,
    /// Unsafe statement waiting for a yes/no answer.
    PendingConfirmation,
    /// Unsafe statement the user approved.
    Confirmed,
    /// Unsafe statement the user declined or abandoned.
    Rejected,
}

impl GateState {
    /// Returns true if a statement in this state may be executed.
    pub fn permits_execution(&self) -> bool {
        matches!(self, Self::NotRequired | Self::Confirmed)
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PendingConfirmation)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotRequired => "not required",
            Self::PendingConfirmation => "pending confirmation",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// A statement cleared for execution.
///
/// Can only be created inside this module, from the `NotRequired` or
/// `Confirmed` transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedStatement {
    statement: GeneratedSql,
    state: GateState,
}

impl ApprovedStatement {
    fn new(statement: GeneratedSql, state: GateState) -> Self {
        debug_assert!(state.permits_execution());
        Self { statement, state }
    }

    /// Returns the statement text.
    pub fn sql(&self) -> &str {
        &self.statement.sql
    }

    /// Returns the gate state the approval came from.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Returns the generated statement.
    pub fn statement(&self) -> &GeneratedSql {
        &self.statement
    }
}

/// An unsafe statement awaiting an explicit decision.
///
/// Resolving consumes the decision, so it cannot be answered twice.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingDecision {
    statement: GeneratedSql,
}

impl PendingDecision {
    /// Returns the statement under review.
    pub fn statement(&self) -> &GeneratedSql {
        &self.statement
    }

    /// Returns the warning to show next to the yes/no prompt.
    pub fn warning(&self) -> String {
        self.statement
            .classification
            .warning()
            .unwrap_or_else(|| "This statement requires confirmation.".to_string())
    }

    /// Applies the user's answer.
    pub fn resolve(self, confirmed: bool) -> Resolution {
        if confirmed {
            info!(sql = %self.statement.sql, "Unsafe statement confirmed");
            Resolution::Confirmed(ApprovedStatement::new(self.statement, GateState::Confirmed))
        } else {
            info!(sql = %self.statement.sql, "Unsafe statement rejected");
            Resolution::Rejected(self.statement)
        }
    }
}

/// Outcome of resolving a [`PendingDecision`].
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The statement may now run.
    Confirmed(ApprovedStatement),
    /// The statement is dropped without running.
    Rejected(GeneratedSql),
}

impl Resolution {
    /// Returns the terminal gate state.
    pub fn state(&self) -> GateState {
        match self {
            Self::Confirmed(_) => GateState::Confirmed,
            Self::Rejected(_) => GateState::Rejected,
        }
    }
}

/// What the gate decided for a freshly classified statement.
#[derive(Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Safe: execute now.
    Proceed(ApprovedStatement),
    /// Unsafe: held until [`ConfirmationGate::resolve`] is called.
    Held {
        /// The statement under review.
        sql: String,
        /// Warning to display with the prompt.
        warning: String,
    },
}

/// Holds the single pending-confirmation slot and tracks the last state.
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    pending: Option<PendingDecision>,
    last_state: Option<GateState>,
}

impl ConfirmationGate {
    /// Creates a gate with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes a classified statement.
    ///
    /// A statement still pending from an earlier request is abandoned first.
    pub fn evaluate(&mut self, generated: GeneratedSql) -> GateDecision {
        self.abandon();

        if generated.classification.requires_confirmation() {
            let decision = PendingDecision {
                statement: generated,
            };
            let held = GateDecision::Held {
                sql: decision.statement.sql.clone(),
                warning: decision.warning(),
            };
            info!(sql = %decision.statement.sql, "Holding unsafe statement for confirmation");
            self.pending = Some(decision);
            self.last_state = Some(GateState::PendingConfirmation);
            held
        } else {
            self.last_state = Some(GateState::NotRequired);
            GateDecision::Proceed(ApprovedStatement::new(generated, GateState::NotRequired))
        }
    }

    /// Resolves the pending decision, if any.
    pub fn resolve(&mut self, confirmed: bool) -> Option<Resolution> {
        let resolution = self.pending.take()?.resolve(confirmed);
        self.last_state = Some(resolution.state());
        Some(resolution)
    }

    /// Drops the pending decision as rejected, returning the statement it held.
    pub fn abandon(&mut self) -> Option<GeneratedSql> {
        let decision = self.pending.take()?;
        info!(sql = %decision.statement.sql, "Pending statement abandoned");
        self.last_state = Some(GateState::Rejected);
        Some(decision.statement)
    }

    /// Returns true if a statement is waiting for a decision.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the pending decision, if any.
    pub fn pending(&self) -> Option<&PendingDecision> {
        self.pending.as_ref()
    }

    /// Returns the state reached by the most recent statement.
    pub fn state(&self) -> Option<GateState> {
        self.last_state
    }
}
