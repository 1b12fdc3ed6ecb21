//! Recognition result types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Intent tag used when nothing in the vocabulary matched well enough
pub const UNKNOWN_INTENT: &str = "unknown";

/// Extracted entities, keyed by entity type, holding canonical values
pub type EntityMap = HashMap<String, String>;

/// Coarse polarity of an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// A free-text utterance resolved to a closed-vocabulary intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedCommand {
    /// Intent name from the vocabulary, or [`UNKNOWN_INTENT`]
    pub intent: String,

    /// Canonical entity values found in the utterance
    #[serde(default)]
    pub entities: EntityMap,

    /// Recognition confidence in 0..=1
    pub confidence: f64,

    #[serde(default)]
    pub sentiment: Sentiment,

    /// Auxiliary evidence score used for thresholding and tie-breaking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_quality: Option<f64>,

    /// Set on commands synthesized from a clarifying answer
    #[serde(default)]
    pub is_follow_up: bool,

    /// Number of follow-up questions asked before this command completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_count: Option<u8>,
}

impl RecognizedCommand {
    /// Create a command for a known intent
    pub fn new(intent: impl Into<String>, confidence: f64) -> Self {
        Self {
            intent: intent.into(),
            entities: EntityMap::new(),
            confidence,
            sentiment: Sentiment::Neutral,
            match_quality: None,
            is_follow_up: false,
            follow_up_count: None,
        }
    }

    /// The empty `unknown` result with zero confidence
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_INTENT, 0.0)
    }

    /// Add an entity value
    pub fn with_entity(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities.insert(name.into(), value.into());
        self
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == UNKNOWN_INTENT
    }

    /// Get an entity value
    pub fn entity(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(String::as_str)
    }
}
