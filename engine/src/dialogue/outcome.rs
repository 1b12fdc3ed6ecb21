//! Turn results handed back to the host

use sdk::types::RecognizedCommand;
use serde::{Deserialize, Serialize};

/// Result of processing one user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Fully specified command; the host executes it and calls `update_context`
    Command { command: RecognizedCommand },
    /// A required entity is missing and a question was asked
    NeedsEntity {
        command: RecognizedCommand,
        entity: String,
        question: String,
    },
    ConfirmationRequired {
        command: RecognizedCommand,
        prompt: String,
    },
    Confirmed { command: RecognizedCommand },
    /// A follow-up answer completed the pending command
    FollowUp { command: RecognizedCommand },
    /// An unrelated request interrupted a pending question
    DigressionStarted {
        command: RecognizedCommand,
        depth: usize,
        question: Option<String>,
    },
    NotUnderstood { command: RecognizedCommand },
    Cancelled { message: String },
    /// The follow-up limit was reached
    GaveUp { message: String },
    Dormant { message: String },
    Error { message: String },
}

impl TurnOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            TurnOutcome::Command { .. } => "command",
            TurnOutcome::NeedsEntity { .. } => "needs_entity",
            TurnOutcome::ConfirmationRequired { .. } => "confirmation_required",
            TurnOutcome::Confirmed { .. } => "confirmed",
            TurnOutcome::FollowUp { .. } => "follow_up",
            TurnOutcome::DigressionStarted { .. } => "digression_started",
            TurnOutcome::NotUnderstood { .. } => "not_understood",
            TurnOutcome::Cancelled { .. } => "cancelled",
            TurnOutcome::GaveUp { .. } => "gave_up",
            TurnOutcome::Dormant { .. } => "dormant",
            TurnOutcome::Error { .. } => "error",
        }
    }

    pub fn command(&self) -> Option<&RecognizedCommand> {
        match self {
            TurnOutcome::Command { command }
            | TurnOutcome::NeedsEntity { command, .. }
            | TurnOutcome::ConfirmationRequired { command, .. }
            | TurnOutcome::Confirmed { command }
            | TurnOutcome::FollowUp { command }
            | TurnOutcome::DigressionStarted { command, .. }
            | TurnOutcome::NotUnderstood { command } => Some(command),
            _ => None,
        }
    }

    /// Text to show the user, when the engine has something to say
    pub fn message(&self) -> Option<&str> {
        match self {
            TurnOutcome::NeedsEntity { question, .. } => Some(question),
            TurnOutcome::ConfirmationRequired { prompt, .. } => Some(prompt),
            TurnOutcome::DigressionStarted { question, .. } => question.as_deref(),
            TurnOutcome::Cancelled { message }
            | TurnOutcome::GaveUp { message }
            | TurnOutcome::Dormant { message }
            | TurnOutcome::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Whether the host should execute the carried command now
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            TurnOutcome::Command { .. }
                | TurnOutcome::Confirmed { .. }
                | TurnOutcome::FollowUp { .. }
                | TurnOutcome::DigressionStarted { question: None, .. }
        )
    }
}

/// Where an ended digression handed control back to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumedFrame {
    pub topic: Option<String>,
    pub awaiting_for: Option<String>,
    /// The resumed frame's pending question, re-asked
    pub question: Option<String>,
}

/// Result of `update_context`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextUpdate {
    pub depth: usize,
    pub resumed: Option<ResumedFrame>,
}

/// Result of `check_timeout`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeoutCheck {
    Active,
    Reminder { remaining_secs: u64, message: String },
    /// The window elapsed (now or earlier); the session is dormant
    Dormant { message: String },
}
