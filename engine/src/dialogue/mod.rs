//! Dialogue management
//!
//! Per-conversation state: a stack of frames (the root plus any digressions),
//! each running a small guarded state machine, an inactivity timer that puts
//! the session to sleep, and a capped history of frames that were closed.

pub mod engine;
pub mod frame;
pub mod outcome;
pub mod stack;
pub mod state;
pub mod timeout;

pub use engine::{AskOptions, DialogueEngine, UpdateOptions, HISTORY_KEY, INSIGHTS_KEY};
pub use frame::{DialogueFrame, FlowEntry, FrameContext, PendingAction};
pub use outcome::{ContextUpdate, ResumedFrame, TimeoutCheck, TurnOutcome};
pub use stack::{ConversationHistory, DialogueStack};
pub use state::{DialogueState, Guard};
pub use timeout::{TimeoutManager, TimeoutStatus};
