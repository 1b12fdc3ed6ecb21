//! Frame states and guarded transitions
//!
//! ```text
//!            ask            supplied
//!   Idle ──────────► AwaitingEntity ──────────► Processing ──► Idle
//!    │                   │ cancel                  │  ▲
//!    │ process           ▼                         │  │ confirmed
//!    └──────────────►  Idle     need info/confirm  ▼  │
//!                                      AwaitingConfirmation ──cancel──► Idle
//!
//!   any ──error──► Error ──► Idle        any ──expired──► Dormant ──resume──► Idle
//! ```
//!
//! A transition whose guard is not satisfied is rejected and leaves the
//! state unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one dialogue frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Idle,
    AwaitingEntity,
    AwaitingConfirmation,
    Processing,
    Error,
    Dormant,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Idle => "idle",
            DialogueState::AwaitingEntity => "awaiting_entity",
            DialogueState::AwaitingConfirmation => "awaiting_confirmation",
            DialogueState::Processing => "processing",
            DialogueState::Error => "error",
            DialogueState::Dormant => "dormant",
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditions asserted by the caller of a transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guard {
    /// A question is being asked explicitly
    pub explicit_ask: bool,
    /// The follow-up answer contained the awaited entity
    pub entity_supplied: bool,
    /// The user confirmed the pending action
    pub confirmed: bool,
    /// The user (or the engine) abandoned the pending step
    pub cancelled: bool,
    /// Explicit resumption after dormancy
    pub resume: bool,
    /// The inactivity window elapsed
    pub expired: bool,
}

impl Guard {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ask() -> Self {
        Self {
            explicit_ask: true,
            ..Self::default()
        }
    }

    pub fn supplied() -> Self {
        Self {
            entity_supplied: true,
            ..Self::default()
        }
    }

    pub fn confirmed() -> Self {
        Self {
            confirmed: true,
            ..Self::default()
        }
    }

    pub fn cancel() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }

    pub fn resume() -> Self {
        Self {
            resume: true,
            ..Self::default()
        }
    }

    pub fn expired() -> Self {
        Self {
            expired: true,
            ..Self::default()
        }
    }
}

/// Whether `from -> to` is legal under `guard`
pub fn is_allowed(from: DialogueState, to: DialogueState, guard: Guard) -> bool {
    use DialogueState::*;

    match (from, to) {
        (Dormant, Idle) => guard.resume,
        (_, Error) => true,
        (Dormant, _) => false,
        (_, Dormant) => guard.expired,
        (Idle, Processing) => true,
        (Idle, AwaitingEntity) => guard.explicit_ask,
        (AwaitingEntity, AwaitingEntity) => guard.explicit_ask,
        (AwaitingEntity, Processing) => guard.entity_supplied,
        (AwaitingEntity, Idle) => guard.cancelled,
        (AwaitingConfirmation, Processing) => guard.confirmed,
        (AwaitingConfirmation, Idle) => guard.cancelled,
        (Processing, Idle) => true,
        (Processing, AwaitingEntity) | (Processing, AwaitingConfirmation) => true,
        (Error, Idle) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::DialogueState::*;
    use super::*;

    const ALL: [DialogueState; 6] = [
        Idle,
        AwaitingEntity,
        AwaitingConfirmation,
        Processing,
        Error,
        Dormant,
    ];

    #[test]
    fn test_unconditional_transitions() {
        assert!(is_allowed(Idle, Processing, Guard::none()));
        assert!(is_allowed(Processing, Idle, Guard::none()));
        assert!(is_allowed(Processing, AwaitingEntity, Guard::none()));
        assert!(is_allowed(Processing, AwaitingConfirmation, Guard::none()));
        assert!(is_allowed(Error, Idle, Guard::none()));
    }

    #[test]
    fn test_guarded_transitions() {
        assert!(!is_allowed(Idle, AwaitingEntity, Guard::none()));
        assert!(is_allowed(Idle, AwaitingEntity, Guard::ask()));

        assert!(!is_allowed(AwaitingEntity, Processing, Guard::none()));
        assert!(is_allowed(AwaitingEntity, Processing, Guard::supplied()));

        assert!(!is_allowed(AwaitingEntity, Idle, Guard::none()));
        assert!(is_allowed(AwaitingEntity, Idle, Guard::cancel()));

        assert!(!is_allowed(AwaitingConfirmation, Processing, Guard::none()));
        assert!(is_allowed(AwaitingConfirmation, Processing, Guard::confirmed()));
        assert!(is_allowed(AwaitingConfirmation, Idle, Guard::cancel()));
    }

    #[test]
    fn test_any_state_can_fail() {
        for state in ALL {
            assert!(is_allowed(state, Error, Guard::none()), "{} -> error", state);
        }
    }

    #[test]
    fn test_dormant_only_leaves_on_resume() {
        assert!(!is_allowed(Dormant, Idle, Guard::none()));
        assert!(is_allowed(Dormant, Idle, Guard::resume()));
        assert!(!is_allowed(Dormant, Processing, Guard::resume()));
        assert!(!is_allowed(Dormant, AwaitingEntity, Guard::ask()));
    }

    #[test]
    fn test_expiry_reaches_dormant() {
        for state in [Idle, AwaitingEntity, AwaitingConfirmation, Processing, Error] {
            assert!(!is_allowed(state, Dormant, Guard::none()));
            assert!(is_allowed(state, Dormant, Guard::expired()));
        }
    }

    #[test]
    fn test_illegal_shortcuts() {
        assert!(!is_allowed(Idle, AwaitingConfirmation, Guard::ask()));
        assert!(!is_allowed(Error, Processing, Guard::none()));
        assert!(!is_allowed(AwaitingConfirmation, AwaitingEntity, Guard::ask()));
    }

    #[test]
    fn test_display() {
        assert_eq!(AwaitingEntity.to_string(), "awaiting_entity");
        assert_eq!(
            serde_json::to_string(&AwaitingConfirmation).unwrap(),
            "\"awaiting_confirmation\""
        );
    }
}
