//! Dialogue frames
//!
//! A frame is the unit of conversational context: what was last said and
//! understood, which entity the engine is waiting for, and how many
//! clarifying questions it has already asked.

use sdk::errors::EngineError;
use sdk::types::{EntityMap, RecognizedCommand};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{is_allowed, DialogueState, Guard};

/// Flow entries kept per frame
const MAX_FLOW_ENTRIES: usize = 50;

/// What the frame last understood
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameContext {
    pub last_intent: Option<String>,
    #[serde(default)]
    pub last_entities: EntityMap,
    pub last_response: Option<String>,
    pub topic: Option<String>,
    pub sub_topic: Option<String>,
    /// Last activity, epoch milliseconds
    pub timestamp: i64,
}

/// One completed turn in a frame's flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEntry {
    pub intent: String,
    #[serde(default)]
    pub entities: EntityMap,
    pub confidence: Option<f64>,
    pub timestamp: i64,
}

/// A command waiting on an entity or a confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub command: RecognizedCommand,
    /// The question or prompt shown to the user
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueFrame {
    pub id: String,
    pub context: FrameContext,
    state: DialogueState,
    pub awaiting_for: Option<String>,
    pub follow_up_count: u8,
    #[serde(default)]
    pub conversation_flow: Vec<FlowEntry>,
    pub pending_action: Option<PendingAction>,
    /// Values offered with the current question
    #[serde(default)]
    pub valid_values: Vec<String>,
    pub is_digression: bool,
    pub created_at: i64,
}

impl DialogueFrame {
    /// A fresh root frame
    pub fn new(now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            context: FrameContext {
                timestamp: now_ms,
                ..FrameContext::default()
            },
            state: DialogueState::Idle,
            awaiting_for: None,
            follow_up_count: 0,
            conversation_flow: Vec::new(),
            pending_action: None,
            valid_values: Vec::new(),
            is_digression: false,
            created_at: now_ms,
        }
    }

    /// A digression frame seeded from the interrupted frame's context
    pub fn digression_from(parent: &DialogueFrame, now_ms: i64) -> Self {
        let mut frame = Self::new(now_ms);
        frame.context = FrameContext {
            last_response: None,
            timestamp: now_ms,
            ..parent.context.clone()
        };
        frame.is_digression = true;
        frame
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    /// Move to `to` if `guard` allows it; state is unchanged otherwise
    pub fn transition(&mut self, to: DialogueState, guard: Guard) -> Result<(), EngineError> {
        if !is_allowed(self.state, to, guard) {
            return Err(EngineError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Whether there is any conversation to expire
    pub fn is_engaged(&self) -> bool {
        self.state != DialogueState::Idle || self.context.last_intent.is_some()
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.context.timestamp = now_ms;
    }

    /// Drop the pending question/action without touching the state
    pub fn clear_pending(&mut self) {
        self.awaiting_for = None;
        self.follow_up_count = 0;
        self.pending_action = None;
        self.valid_values.clear();
    }

    /// Return to idle in place, abandoning whatever was pending
    ///
    /// Dormant frames stay dormant; only an explicit resume wakes them.
    pub fn reset(&mut self) {
        self.clear_pending();
        match self.state {
            DialogueState::Idle | DialogueState::Dormant => {}
            _ => {
                // every non-dormant state reaches idle under a cancel guard
                let _ = self.transition(DialogueState::Idle, Guard::cancel());
            }
        }
    }

    pub fn record_flow(
        &mut self,
        intent: &str,
        entities: &EntityMap,
        confidence: Option<f64>,
        now_ms: i64,
    ) {
        self.conversation_flow.push(FlowEntry {
            intent: intent.to_string(),
            entities: entities.clone(),
            confidence,
            timestamp: now_ms,
        });
        if self.conversation_flow.len() > MAX_FLOW_ENTRIES {
            let excess = self.conversation_flow.len() - MAX_FLOW_ENTRIES;
            self.conversation_flow.drain(..excess);
        }
    }

    /// Most recent intents, oldest first
    pub fn recent_intents(&self, n: usize) -> Vec<String> {
        let start = self.conversation_flow.len().saturating_sub(n);
        self.conversation_flow[start..]
            .iter()
            .map(|e| e.intent.clone())
            .collect()
    }

    /// `a>b>c` over the last `n` intents
    pub fn flow_signature(&self, n: usize) -> String {
        self.recent_intents(n).join(">")
    }

    /// The command a follow-up answer completes
    pub fn pending_command(&self) -> RecognizedCommand {
        if let Some(pending) = &self.pending_action {
            return pending.command.clone();
        }
        match &self.context.last_intent {
            Some(intent) => {
                let mut command = RecognizedCommand::new(intent.clone(), 1.0);
                command.entities = self.context.last_entities.clone();
                command
            }
            None => RecognizedCommand::unknown(),
        }
    }
}
