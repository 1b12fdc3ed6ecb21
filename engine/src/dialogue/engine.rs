//! Per-session dialogue engine
//!
//! Owns the frame stack of one conversation and runs every user turn through
//! the same pipeline:
//!
//! 1. recover from `error`
//! 2. dormant or expired sessions answer with the re-engagement message
//! 3. cancel words abandon a pending question or confirmation
//! 4. confirmation replies
//! 5. recognition, then digression detection while a question is pending
//! 6. follow-up answers, missing-entity questions, confirmations
//!
//! The host executes commands itself and reports back through
//! [`DialogueEngine::update_context`].

use sdk::errors::EngineError;
use sdk::services::{Clock, EntityExtractionService, KeyValueStore, SystemClock};
use sdk::types::{EntityMap, RecognizedCommand};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::frame::{DialogueFrame, PendingAction};
use super::outcome::{ContextUpdate, ResumedFrame, TimeoutCheck, TurnOutcome};
use super::stack::{ConversationHistory, DialogueStack};
use super::state::{DialogueState, Guard};
use super::timeout::{TimeoutManager, TimeoutStatus};
use crate::config::{Config, DialogueConfig, InsightsConfig};
use crate::insights::{Candidate, Insights, InsightsTracker, Suggestion, TurnRecord};
use crate::recognizer::normalize::contains_phrase;
use crate::recognizer::IntentRecognizer;
use crate::vocabulary::{render, Vocabulary};

/// Store key for serialized insights
pub const INSIGHTS_KEY: &str = "parlo.insights";
/// Store key for serialized closed frames
pub const HISTORY_KEY: &str = "parlo.history";

/// Intents used for flow signatures and suggestion novelty
const FLOW_WINDOW: usize = 3;

/// Options for [`DialogueEngine::ask_for`]
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// Values the answer may take; offered to the extraction service
    pub valid_values: Vec<String>,
}

/// Options for [`DialogueEngine::update_context`]
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// The turn finished a digression; pop back to the interrupted frame
    pub is_nested: bool,
    pub success: bool,
    pub confidence: Option<f64>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            is_nested: false,
            success: true,
            confidence: None,
        }
    }
}

pub struct DialogueEngine {
    vocabulary: Arc<Vocabulary>,
    recognizer: IntentRecognizer,
    stack: DialogueStack,
    history: ConversationHistory,
    insights: InsightsTracker,
    timeouts: TimeoutManager,
    settings: DialogueConfig,
    insights_settings: InsightsConfig,
    clock: Arc<dyn Clock>,
    extraction: Option<Arc<dyn EntityExtractionService>>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl DialogueEngine {
    pub fn new(vocabulary: Vocabulary, config: &Config) -> Result<Self, EngineError> {
        Self::with_clock(vocabulary, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        vocabulary: Vocabulary,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        let recognizer = IntentRecognizer::new(&vocabulary, config.recognizer.clone())?;
        let now = clock.now_ms();

        Ok(Self {
            vocabulary: Arc::new(vocabulary),
            recognizer,
            stack: DialogueStack::new(DialogueFrame::new(now), config.dialogue.max_stack_depth),
            history: ConversationHistory::new(config.dialogue.history_limit),
            insights: InsightsTracker::new(),
            timeouts: TimeoutManager::from_config(&config.dialogue),
            settings: config.dialogue.clone(),
            insights_settings: config.insights.clone(),
            clock,
            extraction: None,
            store: None,
        })
    }

    /// Answer follow-ups with the recognizer's own pattern extractor
    pub fn with_builtin_extraction(mut self) -> Self {
        let service: Arc<dyn EntityExtractionService> = self.recognizer.entity_extractor();
        self.extraction = Some(service);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn set_entity_extraction_service(&mut self, service: Arc<dyn EntityExtractionService>) {
        self.extraction = Some(service);
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn current_frame(&self) -> &DialogueFrame {
        self.stack.top()
    }

    /// Frames bottom to top
    pub fn frames(&self) -> impl Iterator<Item = &DialogueFrame> {
        self.stack.iter()
    }

    pub fn state(&self) -> DialogueState {
        self.stack.top().state()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn insights(&self) -> &Insights {
        self.insights.insights()
    }

    /// Recognition only; no dialogue state changes
    pub fn recognize(&self, text: &str, history: &[String]) -> RecognizedCommand {
        self.recognizer.recognize(text, history)
    }

    /// Run one user turn through the dialogue pipeline
    pub async fn process(&mut self, text: &str) -> TurnOutcome {
        let now = self.clock.now_ms();

        if self.state() == DialogueState::Error {
            let _ = self.transition(DialogueState::Idle, Guard::none());
            self.stack.top_mut().clear_pending();
        }

        if self.state() == DialogueState::Dormant {
            return TurnOutcome::Dormant {
                message: self.reengage_message(),
            };
        }

        let frame = self.stack.top();
        if frame.is_engaged() && self.timeouts.is_context_expired(frame, now) {
            self.go_dormant();
            return TurnOutcome::Dormant {
                message: self.reengage_message(),
            };
        }

        let outcome = self.process_active(text).await;

        if self.state() != DialogueState::Dormant {
            self.stack.top_mut().touch(now);
        }
        debug!("Turn outcome: {}", outcome.kind());
        outcome
    }

    async fn process_active(&mut self, text: &str) -> TurnOutcome {
        let state = self.state();
        let pending = matches!(
            state,
            DialogueState::AwaitingEntity | DialogueState::AwaitingConfirmation
        );

        if pending && self.is_cancel(text) {
            return self.cancel();
        }
        if state == DialogueState::AwaitingConfirmation {
            return self.handle_confirmation(text);
        }

        let recent = self.stack.top().recent_intents(FLOW_WINDOW);
        let command = self.recognizer.recognize(text, &recent);

        if state == DialogueState::AwaitingEntity {
            let awaited = self.stack.top().awaiting_for.clone().unwrap_or_default();
            if command.is_unknown() || self.vocabulary.is_compatible(&command.intent, &awaited) {
                return self.follow_up_turn(text).await;
            }
            if !self.stack.is_full() {
                return self.start_digression(command);
            }
            info!(
                "Stack full at depth {}, dropping question for {}",
                self.stack.depth(),
                awaited
            );
            self.stack.top_mut().reset();
        }

        if command.is_unknown() {
            debug!("Not understood: {:?}", text);
            return TurnOutcome::NotUnderstood { command };
        }

        self.dispatch(command)
    }

    /// Route a recognized command: ask for what is missing, confirm what
    /// needs confirming, hand back the rest
    fn dispatch(&mut self, command: RecognizedCommand) -> TurnOutcome {
        if self.state() == DialogueState::Processing {
            // the host never reported the previous command
            let _ = self.transition(DialogueState::Idle, Guard::none());
        }
        self.stack.top_mut().clear_pending();
        let _ = self.transition(DialogueState::Processing, Guard::none());

        let (missing, confirmation) = match self.vocabulary.intent(&command.intent) {
            Some(definition) => (
                definition
                    .required_entities
                    .iter()
                    .find(|e| !command.entities.contains_key(*e))
                    .cloned(),
                definition.requires_confirmation.then(|| {
                    definition
                        .confirmation_prompt
                        .clone()
                        .unwrap_or_else(|| self.vocabulary.messages.confirmation_prompt.clone())
                }),
            ),
            None => (None, None),
        };

        if let Some(entity) = missing {
            let question = self.vocabulary.prompt_for(&entity);
            self.stack.top_mut().pending_action = Some(PendingAction {
                command: command.clone(),
                prompt: question.clone(),
            });
            return match self.try_ask(&entity, question, Vec::new()) {
                Ok(question) => TurnOutcome::NeedsEntity {
                    command,
                    entity,
                    question,
                },
                Err(_) => TurnOutcome::GaveUp {
                    message: self.vocabulary.messages.too_many_questions.clone(),
                },
            };
        }

        if let Some(prompt) = confirmation {
            let prompt = self.request_confirmation(command.clone(), prompt);
            return TurnOutcome::ConfirmationRequired { command, prompt };
        }

        TurnOutcome::Command { command }
    }

    fn start_digression(&mut self, command: RecognizedCommand) -> TurnOutcome {
        let frame = DialogueFrame::digression_from(self.stack.top(), self.clock.now_ms());
        if self.stack.push(frame).is_err() {
            return self.dispatch(command);
        }
        let depth = self.stack.depth();
        info!("Digression to {} at depth {}", command.intent, depth);

        match self.dispatch(command) {
            TurnOutcome::Command { command } => TurnOutcome::DigressionStarted {
                command,
                depth,
                question: None,
            },
            TurnOutcome::NeedsEntity {
                command, question, ..
            } => TurnOutcome::DigressionStarted {
                command,
                depth,
                question: Some(question),
            },
            TurnOutcome::ConfirmationRequired { command, prompt } => {
                TurnOutcome::DigressionStarted {
                    command,
                    depth,
                    question: Some(prompt),
                }
            }
            other => other,
        }
    }

    async fn follow_up_turn(&mut self, text: &str) -> TurnOutcome {
        match self.handle_follow_up(text).await {
            Ok(Some(command)) => match self.dispatch(command) {
                TurnOutcome::Command { command } => TurnOutcome::FollowUp { command },
                other => other,
            },
            Ok(None) => self.reask(),
            Err(e) => {
                debug!("Follow-up failed: {}", e);
                TurnOutcome::Error {
                    message: self.vocabulary.messages.extraction_unavailable.clone(),
                }
            }
        }
    }

    /// Ask the pending question again, counting it against the limit
    fn reask(&mut self) -> TurnOutcome {
        let frame = self.stack.top();
        let entity = match (&frame.awaiting_for, frame.state()) {
            (Some(entity), DialogueState::AwaitingEntity) => entity.clone(),
            _ => {
                return TurnOutcome::NotUnderstood {
                    command: RecognizedCommand::unknown(),
                }
            }
        };
        let command = frame.pending_command();
        let valid_values = frame.valid_values.clone();
        let question = frame
            .pending_action
            .as_ref()
            .map(|p| p.prompt.clone())
            .unwrap_or_else(|| self.vocabulary.prompt_for(&entity));

        match self.try_ask(&entity, question, valid_values) {
            Ok(question) => TurnOutcome::NeedsEntity {
                command,
                entity,
                question,
            },
            Err(_) => TurnOutcome::GaveUp {
                message: self.vocabulary.messages.too_many_questions.clone(),
            },
        }
    }

    /// Ask the user for `entity`
    ///
    /// Returns `question` while under the follow-up limit. Past the limit the
    /// frame is forced back to idle and the give-up message is returned.
    pub fn ask_for(&mut self, entity: &str, question: &str, options: AskOptions) -> String {
        let frame = self.stack.top_mut();
        if frame.pending_action.is_none() {
            frame.pending_action = Some(PendingAction {
                command: frame.pending_command(),
                prompt: question.to_string(),
            });
        }

        match self.try_ask(entity, question.to_string(), options.valid_values) {
            Ok(question) => question,
            Err(EngineError::FollowUpLimitExceeded { .. }) => {
                self.vocabulary.messages.too_many_questions.clone()
            }
            Err(_) => question.to_string(),
        }
    }

    fn try_ask(
        &mut self,
        entity: &str,
        question: String,
        valid_values: Vec<String>,
    ) -> Result<String, EngineError> {
        let limit = self.settings.max_follow_ups;
        if self.stack.top().follow_up_count >= limit {
            warn!("Follow-up limit ({}) reached asking for {}", limit, entity);
            self.stack.top_mut().reset();
            return Err(EngineError::FollowUpLimitExceeded { limit });
        }

        self.transition(DialogueState::AwaitingEntity, Guard::ask())?;

        let frame = self.stack.top_mut();
        frame.awaiting_for = Some(entity.to_string());
        frame.follow_up_count += 1;
        frame.valid_values = valid_values;
        if let Some(pending) = frame.pending_action.as_mut() {
            pending.prompt = question.clone();
        }
        debug!(
            "Asking for {} ({}/{})",
            entity, frame.follow_up_count, limit
        );

        Ok(question)
    }

    /// Interpret `text` as the answer to the pending question
    ///
    /// Returns the completed command, or `None` when nothing is pending, the
    /// context expired, or the answer did not contain the awaited entity.
    pub async fn handle_follow_up(
        &mut self,
        text: &str,
    ) -> Result<Option<RecognizedCommand>, EngineError> {
        let now = self.clock.now_ms();
        let frame = self.stack.top();
        let expired = self.timeouts.is_context_expired(frame, now);
        let awaited = frame
            .awaiting_for
            .clone()
            .filter(|_| !expired && frame.state() == DialogueState::AwaitingEntity);
        let valid_values = frame.valid_values.clone();

        let Some(awaited) = awaited else {
            debug!("No follow-up pending (expired: {})", expired);
            self.stack.top_mut().reset();
            return Ok(None);
        };

        let Some(service) = self.extraction.clone() else {
            warn!("Follow-up for {} without an entity extraction service", awaited);
            let _ = self.transition(DialogueState::Error, Guard::none());
            return Err(EngineError::EntityExtractionUnavailable);
        };

        let value = match service.extract_entity(text, &awaited, &valid_values).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Entity extraction failed: {}", e);
                let _ = self.transition(DialogueState::Error, Guard::none());
                return Err(e);
            }
        };
        let Some(value) = value else {
            debug!("Follow-up did not supply {}", awaited);
            return Ok(None);
        };

        self.transition(DialogueState::Processing, Guard::supplied())?;

        let frame = self.stack.top_mut();
        let mut command = frame.pending_command();
        command.entities.insert(awaited.clone(), value);
        command.is_follow_up = true;
        command.follow_up_count = Some(frame.follow_up_count);
        frame.clear_pending();

        self.transition(DialogueState::Idle, Guard::none())?;
        info!("Follow-up supplied {} for {}", awaited, command.intent);

        Ok(Some(command))
    }

    /// Record the result of an executed command
    ///
    /// With `is_nested` set and a digression on the stack, the finished frame
    /// is popped into the history and the interrupted frame's pending
    /// question is returned for re-asking.
    pub async fn update_context(
        &mut self,
        intent: &str,
        entities: &EntityMap,
        response: &str,
        options: UpdateOptions,
    ) -> ContextUpdate {
        let now = self.clock.now_ms();
        let topic = self.vocabulary.topic_of(intent).map(str::to_string);
        let sub_topic = self.vocabulary.intent(intent).and_then(|definition| {
            definition
                .required_entities
                .iter()
                .find_map(|e| entities.get(e).cloned())
        });

        let frame = self.stack.top_mut();
        let previous_intent = frame.context.last_intent.clone();
        let previous_topic = frame.context.topic.clone();

        frame.context.last_intent = Some(intent.to_string());
        frame.context.last_entities = entities.clone();
        frame.context.last_response = Some(response.to_string());
        if topic.is_some() {
            frame.context.topic = topic.clone();
            frame.context.sub_topic = sub_topic;
        }
        frame.touch(now);
        frame.record_flow(intent, entities, options.confidence, now);
        let signature = frame.flow_signature(FLOW_WINDOW);

        if self.state() == DialogueState::Processing {
            let _ = self.transition(DialogueState::Idle, Guard::none());
        }
        if self.state() == DialogueState::Idle {
            self.stack.top_mut().clear_pending();
        }

        if self.insights_settings.enabled {
            self.insights.record(TurnRecord {
                previous_intent: previous_intent.as_deref(),
                intent,
                previous_topic: previous_topic.as_deref(),
                topic: topic.as_deref(),
                flow_signature: &signature,
                success: options.success,
            });
        }

        let mut resumed = None;
        if options.is_nested && self.stack.depth() > 1 && self.state() == DialogueState::Idle {
            if let Some(closed) = self.stack.pop() {
                info!(
                    "Digression {} finished, back to depth {}",
                    closed.id,
                    self.stack.depth()
                );
                self.history.push(closed);
            }

            let frame = self.stack.top_mut();
            frame.touch(now);
            let awaiting_for = frame.awaiting_for.clone();
            let question = match &awaiting_for {
                Some(entity) => Some(
                    frame
                        .pending_action
                        .as_ref()
                        .map(|p| p.prompt.clone())
                        .unwrap_or_else(|| self.vocabulary.prompt_for(entity)),
                ),
                None => None,
            };
            resumed = Some(ResumedFrame {
                topic: frame.context.topic.clone(),
                awaiting_for,
                question,
            });
        }

        self.flush_if_due().await;

        ContextUpdate {
            depth: self.stack.depth(),
            resumed,
        }
    }

    /// Hold `command` until the user confirms it
    pub fn request_confirmation(&mut self, command: RecognizedCommand, prompt: String) -> String {
        if self.state() == DialogueState::Idle {
            let _ = self.transition(DialogueState::Processing, Guard::none());
        }
        if self
            .transition(DialogueState::AwaitingConfirmation, Guard::none())
            .is_ok()
        {
            self.stack.top_mut().pending_action = Some(PendingAction {
                command,
                prompt: prompt.clone(),
            });
        }
        prompt
    }

    /// Interpret `text` as a yes/no answer to the pending confirmation
    pub fn handle_confirmation(&mut self, text: &str) -> TurnOutcome {
        if self.state() != DialogueState::AwaitingConfirmation {
            return TurnOutcome::NotUnderstood {
                command: RecognizedCommand::unknown(),
            };
        }

        let replies = &self.vocabulary.replies;
        let denied = replies.deny.iter().any(|p| contains_phrase(text, p));
        let confirmed = !denied && replies.confirm.iter().any(|p| contains_phrase(text, p));
        let pending = self.stack.top().pending_action.clone();

        if confirmed {
            let _ = self.transition(DialogueState::Processing, Guard::confirmed());
            self.stack.top_mut().pending_action = None;
            let command = pending
                .map(|p| p.command)
                .unwrap_or_else(RecognizedCommand::unknown);
            info!("Confirmed {}", command.intent);
            return TurnOutcome::Confirmed { command };
        }

        if denied {
            let message = self.vocabulary.messages.confirmation_declined.clone();
            return self.abandon(message);
        }

        match pending {
            Some(pending) => TurnOutcome::ConfirmationRequired {
                command: pending.command,
                prompt: pending.prompt,
            },
            None => {
                self.stack.top_mut().reset();
                TurnOutcome::NotUnderstood {
                    command: RecognizedCommand::unknown(),
                }
            }
        }
    }

    /// Abandon the pending question or confirmation
    pub fn cancel(&mut self) -> TurnOutcome {
        let message = self.vocabulary.messages.cancelled.clone();
        self.abandon(message)
    }

    fn abandon(&mut self, message: String) -> TurnOutcome {
        let frame = self.stack.top_mut();
        frame.reset();
        if frame.is_digression {
            if let Some(closed) = self.stack.pop() {
                debug!("Dropped digression {}", closed.id);
                self.history.push(closed);
            }
        }
        TurnOutcome::Cancelled { message }
    }

    /// Wake a dormant session
    pub fn resume(&mut self) -> String {
        let now = self.clock.now_ms();
        if self.state() == DialogueState::Dormant
            && self.transition(DialogueState::Idle, Guard::resume()).is_ok()
        {
            info!("Session resumed");
        }
        self.stack.top_mut().touch(now);

        match &self.stack.top().context.topic {
            Some(topic) => render(
                &self.vocabulary.messages.welcome_back,
                &[("topic", topic.as_str())],
            ),
            None => self.vocabulary.messages.welcome_back_fresh.clone(),
        }
    }

    pub fn check_timeout(&mut self) -> TimeoutCheck {
        if self.state() == DialogueState::Dormant {
            return TimeoutCheck::Dormant {
                message: self.reengage_message(),
            };
        }

        let frame = self.stack.top();
        if !frame.is_engaged() {
            return TimeoutCheck::Active;
        }

        match self.timeouts.status(frame, self.clock.now_ms()) {
            TimeoutStatus::Active => TimeoutCheck::Active,
            TimeoutStatus::Reminder { remaining_secs } => TimeoutCheck::Reminder {
                remaining_secs,
                message: render(
                    &self.vocabulary.messages.reminder,
                    &[("seconds", remaining_secs.to_string().as_str())],
                ),
            },
            TimeoutStatus::Expired => {
                self.go_dormant();
                TimeoutCheck::Dormant {
                    message: self.reengage_message(),
                }
            }
        }
    }

    pub fn is_context_expired(&self, frame: &DialogueFrame) -> bool {
        self.timeouts.is_context_expired(frame, self.clock.now_ms())
    }

    /// Unwind digressions into the history and put the root to sleep
    fn go_dormant(&mut self) {
        let topic = self.stack.top().context.topic.clone();
        for frame in self.stack.unwind() {
            self.history.push(frame);
        }

        let root = self.stack.root_mut();
        if root.context.topic.is_none() {
            root.context.topic = topic;
        }
        root.clear_pending();
        match root.transition(DialogueState::Dormant, Guard::expired()) {
            Ok(()) => info!(
                "Session dormant after {} ms of inactivity",
                self.timeouts.timeout_ms()
            ),
            Err(e) => warn!("Could not put session to sleep: {}", e),
        }
    }

    fn reengage_message(&self) -> String {
        match &self.stack.top().context.topic {
            Some(topic) => render(&self.vocabulary.messages.reengage, &[("topic", topic.as_str())]),
            None => self.vocabulary.messages.welcome_back_fresh.clone(),
        }
    }

    fn is_cancel(&self, text: &str) -> bool {
        self.vocabulary
            .replies
            .cancel
            .iter()
            .any(|phrase| contains_phrase(text, phrase))
    }

    /// Rank likely next intents for the current frame
    pub fn suggest(&self, limit: usize) -> Vec<Suggestion> {
        let candidates: Vec<Candidate> = self
            .vocabulary
            .intents
            .iter()
            .map(|intent| Candidate {
                intent: &intent.name,
                topic: intent.topic.as_deref(),
            })
            .collect();
        let frame = self.stack.top();

        self.insights.rank(
            &candidates,
            frame.context.topic.as_deref(),
            &frame.recent_intents(FLOW_WINDOW),
            limit,
        )
    }

    /// Reload insights and history from the store, best-effort
    pub async fn restore(&mut self) {
        if let Err(e) = self.try_restore().await {
            warn!("Failed to restore dialogue insights: {}", e);
        }
    }

    async fn try_restore(&mut self) -> Result<(), EngineError> {
        let Some(store) = self.store.clone() else {
            return Ok(());
        };

        if let Some(json) = store.get(INSIGHTS_KEY).await? {
            let insights: Insights = serde_json::from_str(&json)?;
            self.insights = InsightsTracker::from_insights(insights);
        }
        if let Some(json) = store.get(HISTORY_KEY).await? {
            let frames: Vec<DialogueFrame> = serde_json::from_str(&json)?;
            self.history.restore(frames);
        }

        info!("Restored {} closed frames", self.history.len());
        Ok(())
    }

    /// Persist insights and history now
    pub async fn flush(&mut self) -> Result<(), EngineError> {
        let Some(store) = self.store.clone() else {
            self.insights.mark_flushed();
            return Ok(());
        };

        let insights = serde_json::to_string(self.insights.insights())?;
        let history = serde_json::to_string(&self.history.to_vec())?;
        store.set(INSIGHTS_KEY, &insights).await?;
        store.set(HISTORY_KEY, &history).await?;
        self.insights.mark_flushed();

        debug!("Flushed insights and {} closed frames", self.history.len());
        Ok(())
    }

    async fn flush_if_due(&mut self) {
        if self.insights.unflushed() < self.insights_settings.flush_every.max(1) {
            return;
        }
        if let Err(e) = self.flush().await {
            warn!("Failed to persist dialogue insights: {}", e);
            self.insights.mark_flushed();
        }
    }

    fn transition(&mut self, to: DialogueState, guard: Guard) -> Result<(), EngineError> {
        let frame = self.stack.top_mut();
        let from = frame.state();
        match frame.transition(to, guard) {
            Ok(()) => {
                debug!("Frame {}: {} -> {}", frame.id, from, to);
                Ok(())
            }
            Err(e) => {
                warn!("Frame {}: {}", frame.id, e);
                Err(e)
            }
        }
    }
}
