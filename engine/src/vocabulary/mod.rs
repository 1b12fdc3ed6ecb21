//! Declarative intent and entity vocabulary
//!
//! Everything domain-specific lives in a TOML table rather than in code:
//! intent patterns and weights, entity surface forms, synonyms, keyword
//! boosters, pairwise conflict rules, the intent/entity compatibility table
//! used for digression detection, reply word lists and user-facing messages.
//!
//! A default table ships inside the binary (`data/vocabulary.toml`); a user
//! table can replace it through `[vocabulary] path` in the configuration.
//!
//! # Example
//!
//! ```
//! use parlo_engine::vocabulary::Vocabulary;
//!
//! let vocabulary = Vocabulary::builtin().unwrap();
//! assert!(vocabulary.intent("openProject").is_some());
//! assert!(vocabulary.is_compatible("openProject", "projectName"));
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

const BUILTIN_VOCABULARY: &str = include_str!("../../data/vocabulary.toml");

/// Complete vocabulary table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    pub intents: Vec<IntentDefinition>,

    #[serde(default)]
    pub entities: Vec<EntityDefinition>,

    /// Canonical phrase -> variants rewritten to it before scoring
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub boosters: Vec<Booster>,

    #[serde(default)]
    pub conflicts: Vec<ConflictRule>,

    /// Intent -> entity types it can satisfy on top of its required entities
    #[serde(default)]
    pub compatibility: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub sentiment: SentimentLexicon,

    #[serde(default)]
    pub replies: ReplyLexicon,

    #[serde(default)]
    pub messages: Messages,
}

/// One recognizable intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub name: String,

    /// Human-readable conversation topic, used in re-engagement messages
    #[serde(default)]
    pub topic: Option<String>,

    /// Case-insensitive regexes; the first match counts
    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub required_entities: Vec<String>,

    #[serde(default)]
    pub weights: FeatureWeights,

    /// Ask the user before handing the command off for execution
    #[serde(default)]
    pub requires_confirmation: bool,

    #[serde(default)]
    pub confirmation_prompt: Option<String>,
}

/// Per-feature contribution of an intent's evidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    #[serde(default = "default_pattern_weight")]
    pub pattern: f64,

    #[serde(default = "default_keyword_weight")]
    pub keyword: f64,

    /// Added once per required entity found
    #[serde(default = "default_entity_weight")]
    pub entity: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            pattern: default_pattern_weight(),
            keyword: default_keyword_weight(),
            entity: default_entity_weight(),
        }
    }
}

fn default_pattern_weight() -> f64 {
    0.5
}

fn default_keyword_weight() -> f64 {
    0.3
}

fn default_entity_weight() -> f64 {
    0.3
}

/// One extractable entity type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,

    /// Literal surface forms, matched case-insensitively as substrings
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Surface form -> canonical value. Unlisted forms are their own canonical value.
    #[serde(default)]
    pub normalization: HashMap<String, String>,

    /// Reserved for approximate matching; currently has no effect
    #[serde(default)]
    pub fuzzy: bool,

    /// Higher priorities are scanned first; ties keep declaration order
    #[serde(default)]
    pub priority: i32,

    /// Question asked when an intent needs this entity and it is missing
    #[serde(default)]
    pub prompt: Option<String>,
}

impl EntityDefinition {
    /// Map a matched surface form to its canonical value
    pub fn canonical(&self, surface: &str) -> String {
        let surface = surface.to_lowercase();
        self.normalization
            .iter()
            .find(|(form, _)| form.to_lowercase() == surface)
            .map(|(_, canonical)| canonical.clone())
            .unwrap_or(surface)
    }
}

/// Keyword co-occurrence amplifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booster {
    pub intent: String,
    pub anchor: String,
    pub partner: String,
    #[serde(default = "default_booster_factor")]
    pub factor: f64,
}

fn default_booster_factor() -> f64 {
    1.2
}

/// Pairwise tie-break heuristic between two intents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRule {
    /// Exactly two intent names
    pub between: Vec<String>,

    /// Case-insensitive regex evaluated against the analysis text
    pub when: String,

    /// Winner when `when` matches
    pub winner: String,

    /// Winner when `when` does not match; falls back to match quality if unset
    #[serde(default)]
    pub otherwise: Option<String>,
}

impl ConflictRule {
    /// Order-independent key for the intent pair, if the rule names exactly two
    pub fn pair_key(&self) -> Option<(String, String)> {
        match self.between.as_slice() {
            [a, b] => Some(pair_key(a, b)),
            _ => None,
        }
    }
}

/// Sorted key for an intent pair
pub fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentLexicon {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

/// Words recognized in replies to confirmations and questions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyLexicon {
    #[serde(default)]
    pub confirm: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
    #[serde(default)]
    pub cancel: Vec<String>,
}

/// User-facing message templates
///
/// `{topic}` and `{seconds}` are substituted where noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default = "default_too_many_questions")]
    pub too_many_questions: String,
    /// Uses `{topic}`
    #[serde(default = "default_welcome_back")]
    pub welcome_back: String,
    #[serde(default = "default_welcome_back_fresh")]
    pub welcome_back_fresh: String,
    /// Uses `{topic}`
    #[serde(default = "default_reengage")]
    pub reengage: String,
    /// Uses `{seconds}`
    #[serde(default = "default_reminder")]
    pub reminder: String,
    #[serde(default = "default_extraction_unavailable")]
    pub extraction_unavailable: String,
    #[serde(default = "default_cancelled")]
    pub cancelled: String,
    #[serde(default = "default_confirmation_declined")]
    pub confirmation_declined: String,
    #[serde(default = "default_confirmation_prompt")]
    pub confirmation_prompt: String,
    /// Uses `{entity}`
    #[serde(default = "default_entity_question")]
    pub entity_question: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            too_many_questions: default_too_many_questions(),
            welcome_back: default_welcome_back(),
            welcome_back_fresh: default_welcome_back_fresh(),
            reengage: default_reengage(),
            reminder: default_reminder(),
            extraction_unavailable: default_extraction_unavailable(),
            cancelled: default_cancelled(),
            confirmation_declined: default_confirmation_declined(),
            confirmation_prompt: default_confirmation_prompt(),
            entity_question: default_entity_question(),
        }
    }
}

fn default_too_many_questions() -> String {
    "Ho fatto troppe domande senza capirci. Ricominciamo: dimmi pure cosa ti serve.".to_string()
}

fn default_welcome_back() -> String {
    "Bentornato! Stavamo parlando di {topic}.".to_string()
}

fn default_welcome_back_fresh() -> String {
    "Bentornato! Da dove ripartiamo?".to_string()
}

fn default_reengage() -> String {
    "Sei ancora lì? Stavamo parlando di {topic}.".to_string()
}

fn default_reminder() -> String {
    "Ci sei ancora? Ricorderò la conversazione per circa {seconds} secondi.".to_string()
}

fn default_extraction_unavailable() -> String {
    "Mi dispiace, al momento non riesco a leggere la tua risposta.".to_string()
}

fn default_cancelled() -> String {
    "Va bene, lascio perdere.".to_string()
}

fn default_confirmation_declined() -> String {
    "Ok, non procedo.".to_string()
}

fn default_confirmation_prompt() -> String {
    "Confermi?".to_string()
}

fn default_entity_question() -> String {
    "Mi serve ancora un'informazione: {entity}?".to_string()
}

/// Substitute `{name}` placeholders in a message template
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

impl Vocabulary {
    /// The table compiled into the binary
    pub fn builtin() -> Result<Self, EngineError> {
        Self::from_toml_str(BUILTIN_VOCABULARY)
    }

    /// Load a vocabulary file
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EngineError::Vocabulary(format!("Failed to read vocabulary file: {}", e))
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate a vocabulary from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let vocabulary: Vocabulary = toml::from_str(contents)
            .map_err(|e| EngineError::Vocabulary(format!("Failed to parse vocabulary: {}", e)))?;

        vocabulary.validate()?;

        Ok(vocabulary)
    }

    /// Check cross references between tables
    ///
    /// Regex syntax is checked when the recognizer compiles the table.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.intents.is_empty() {
            return Err(EngineError::Vocabulary("no intents defined".to_string()));
        }

        let mut intent_names = HashSet::new();
        for intent in &self.intents {
            if intent.name.trim().is_empty() {
                return Err(EngineError::Vocabulary("intent with empty name".to_string()));
            }
            if intent.name == sdk::UNKNOWN_INTENT {
                return Err(EngineError::Vocabulary(format!(
                    "'{}' is reserved",
                    sdk::UNKNOWN_INTENT
                )));
            }
            if !intent_names.insert(intent.name.as_str()) {
                return Err(EngineError::Vocabulary(format!(
                    "duplicate intent '{}'",
                    intent.name
                )));
            }
            let w = intent.weights;
            if [w.pattern, w.keyword, w.entity]
                .iter()
                .any(|v| !(0.0..=1.0).contains(v))
            {
                return Err(EngineError::Vocabulary(format!(
                    "weights of intent '{}' must be between 0.0 and 1.0",
                    intent.name
                )));
            }
        }

        let mut entity_names = HashSet::new();
        for entity in &self.entities {
            if !entity_names.insert(entity.name.as_str()) {
                return Err(EngineError::Vocabulary(format!(
                    "duplicate entity '{}'",
                    entity.name
                )));
            }
        }

        for intent in &self.intents {
            for required in &intent.required_entities {
                if !entity_names.contains(required.as_str()) {
                    return Err(EngineError::Vocabulary(format!(
                        "intent '{}' requires unknown entity '{}'",
                        intent.name, required
                    )));
                }
            }
        }

        for (intent, entities) in &self.compatibility {
            if !intent_names.contains(intent.as_str()) {
                return Err(EngineError::Vocabulary(format!(
                    "compatibility entry for unknown intent '{}'",
                    intent
                )));
            }
            if let Some(unknown) = entities
                .iter()
                .find(|e| !entity_names.contains(e.as_str()))
            {
                return Err(EngineError::Vocabulary(format!(
                    "compatibility entry for '{}' names unknown entity '{}'",
                    intent, unknown
                )));
            }
        }

        for booster in &self.boosters {
            if !intent_names.contains(booster.intent.as_str()) {
                return Err(EngineError::Vocabulary(format!(
                    "booster for unknown intent '{}'",
                    booster.intent
                )));
            }
            if booster.factor < 1.0 {
                return Err(EngineError::Vocabulary(format!(
                    "booster factor for '{}' must be at least 1.0",
                    booster.intent
                )));
            }
        }

        for rule in &self.conflicts {
            if rule.between.len() != 2 || rule.between[0] == rule.between[1] {
                return Err(EngineError::Vocabulary(
                    "conflict rules need exactly two distinct intents".to_string(),
                ));
            }
            if let Some(unknown) = rule
                .between
                .iter()
                .find(|name| !intent_names.contains(name.as_str()))
            {
                return Err(EngineError::Vocabulary(format!(
                    "conflict rule names unknown intent '{}'",
                    unknown
                )));
            }
            let winners = std::iter::once(&rule.winner).chain(rule.otherwise.iter());
            for winner in winners {
                if !rule.between.contains(winner) {
                    return Err(EngineError::Vocabulary(format!(
                        "conflict winner '{}' is not one of {:?}",
                        winner, rule.between
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn intent(&self, name: &str) -> Option<&IntentDefinition> {
        self.intents.iter().find(|i| i.name == name)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDefinition> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn intent_names(&self) -> impl Iterator<Item = &str> {
        self.intents.iter().map(|i| i.name.as_str())
    }

    /// Topic of an intent, if it has one
    pub fn topic_of(&self, intent: &str) -> Option<&str> {
        self.intent(intent).and_then(|i| i.topic.as_deref())
    }

    /// Whether `intent` can fill `entity`
    ///
    /// Intents are compatible with their required entities plus whatever the
    /// compatibility table lists for them.
    pub fn is_compatible(&self, intent: &str, entity: &str) -> bool {
        let required = self
            .intent(intent)
            .map(|i| i.required_entities.iter().any(|e| e == entity))
            .unwrap_or(false);

        required
            || self
                .compatibility
                .get(intent)
                .map(|entities| entities.iter().any(|e| e == entity))
                .unwrap_or(false)
    }

    /// Question to ask when `entity` is missing
    pub fn prompt_for(&self, entity: &str) -> String {
        self.entity(entity)
            .and_then(|e| e.prompt.clone())
            .unwrap_or_else(|| render(&self.messages.entity_question, &[("entity", entity)]))
    }
}
