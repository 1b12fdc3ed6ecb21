//! Error types and handling
//!
//! This module provides the error types used throughout the Parlo engine.
//! All errors implement the `ParloErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Soft errors
//!
//! Several variants (`ContextExpired`, `FollowUpLimitExceeded`, `MalformedInput`)
//! describe irregular but expected conversation situations. The dialogue engine
//! normally represents them as data (a specific turn outcome or an `unknown`
//! command) and only uses the error values for logging and hints. Only genuine
//! collaborator failures put a dialogue frame into the `error` state.

use thiserror::Error;

/// Trait for Parlo error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait ParloErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to show in a conversation and does not contain
    /// internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors leave the conversation usable. Non-recoverable
    /// errors typically require fixing configuration and restarting.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Dialogue**: rejected state transitions, missing collaborators, expiry
/// - **Recognition**: malformed input
/// - **Configuration**: invalid config or vocabulary tables
/// - **Persistence**: key/value store and SQLite failures
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, ParloErrorExt};
///
/// let error = EngineError::FollowUpLimitExceeded { limit: 3 };
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Vocabulary("no intents defined".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Dialogue errors
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Entity extraction service unavailable")]
    EntityExtractionUnavailable,

    #[error("Entity extraction failed: {0}")]
    EntityExtraction(String),

    #[error("Conversation context expired")]
    ContextExpired,

    #[error("Follow-up limit exceeded ({limit} questions)")]
    FollowUpLimitExceeded { limit: u8 },

    // Recognition errors
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    #[error("Invalid pattern '{pattern}' in {owner}: {reason}")]
    InvalidPattern {
        owner: String,
        pattern: String,
        reason: String,
    },

    // Persistence errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParloErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            // Dialogue errors
            Self::InvalidTransition { .. } => "That step is not possible right now",
            Self::EntityExtractionUnavailable => {
                "Sorry, I can't understand follow-up answers right now"
            }
            Self::EntityExtraction(_) => "Sorry, something went wrong reading your answer",
            Self::ContextExpired => "The conversation was idle for too long",
            Self::FollowUpLimitExceeded { .. } => "Too many questions. Let's start over",

            // Recognition errors
            Self::MalformedInput(_) => "I didn't catch that. Try rephrasing",

            // Configuration errors
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Vocabulary(_) | Self::InvalidPattern { .. } => {
                "Check your vocabulary file for errors"
            }

            // Persistence errors
            Self::Database(_) => "Database operation failed. Insights may not be saved",
            Self::Persistence(_) => "Saving conversation data failed",
            Self::Serialization(_) => "Stored conversation data is unreadable",

            // Generic IO error
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Broken tables need a fix and a restart
            Self::Config(_) | Self::Vocabulary(_) | Self::InvalidPattern { .. } => false,

            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_errors_are_recoverable() {
        assert!(EngineError::ContextExpired.is_recoverable());
        assert!(EngineError::FollowUpLimitExceeded { limit: 3 }.is_recoverable());
        assert!(EngineError::MalformedInput("".to_string()).is_recoverable());
        assert!(EngineError::EntityExtractionUnavailable.is_recoverable());
    }

    #[test]
    fn test_table_errors_are_fatal() {
        let err = EngineError::InvalidPattern {
            owner: "intent openProject".to_string(),
            pattern: "(".to_string(),
            reason: "unclosed group".to_string(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.user_hint(), "Check your vocabulary file for errors");
    }

    #[test]
    fn test_display_messages() {
        let err = EngineError::InvalidTransition {
            from: "idle".to_string(),
            to: "dormant".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid transition from idle to dormant");

        let err = EngineError::FollowUpLimitExceeded { limit: 3 };
        assert_eq!(err.to_string(), "Follow-up limit exceeded (3 questions)");
    }
}
