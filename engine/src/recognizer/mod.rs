//! Intent Recognizer
//!
//! Resolves an utterance to one intent of the configured vocabulary:
//!
//! 1. Short-circuit malformed input (no alphabetic characters) to `unknown`
//! 2. Normalize the text and expand synonyms; cap the analysis text length
//! 3. Extract entities from the full normalized text
//! 4. Score every intent on pattern, keyword and required-entity evidence
//! 5. Resolve near-ties with the conflict table, then by match quality
//! 6. Adjust for repetition in the recent intent history
//! 7. Gate the result with a quality-dependent threshold and an absolute floor
//!
//! Recognition is a pure function of the text, the recent history and the
//! vocabulary; it holds no conversation state.
//!
//! # Example
//!
//! ```
//! use parlo_engine::recognizer::IntentRecognizer;
//! use parlo_engine::vocabulary::Vocabulary;
//!
//! let recognizer = IntentRecognizer::with_defaults(&Vocabulary::builtin().unwrap()).unwrap();
//! let command = recognizer.recognize("cursore pacman", &[]);
//! assert_eq!(command.intent, "setCursor");
//! assert_eq!(command.entity("cursorType"), Some("pacman"));
//! ```

pub mod conflict;
pub mod normalize;

use regex::Regex;
use sdk::errors::EngineError;
use sdk::types::{EntityMap, RecognizedCommand, Sentiment, UNKNOWN_INTENT};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::config::RecognizerConfig;
use crate::entities::EntityExtractor;
use crate::vocabulary::{FeatureWeights, SentimentLexicon, Vocabulary};

use conflict::ConflictResolver;
use normalize::{cap_chars, clean, contains_phrase, is_malformed, tokens, SynonymExpander};

/// Confidence bonus per repetition of the same intent in recent turns
const REPEAT_BONUS: f64 = 0.1;

/// Cap on the total repetition bonus
const MAX_REPEAT_BONUS: f64 = 0.3;

/// Penalty when the same intent filled the whole recent window
const SATURATION_PENALTY: f64 = 0.2;

/// Score of one intent for one utterance
#[derive(Debug, Clone, PartialEq)]
pub struct IntentScore {
    pub intent: String,
    pub confidence: f64,
    pub match_quality: f64,
}

#[derive(Debug, Clone)]
struct Booster {
    anchor: String,
    partner: String,
    factor: f64,
}

#[derive(Debug, Clone)]
struct CompiledIntent {
    name: String,
    patterns: Vec<Regex>,
    keywords: Vec<String>,
    required_entities: Vec<String>,
    weights: FeatureWeights,
    boosters: Vec<Booster>,
}

/// Pattern/keyword/entity intent scorer
#[derive(Debug, Clone)]
pub struct IntentRecognizer {
    intents: Vec<CompiledIntent>,
    synonyms: SynonymExpander,
    conflicts: ConflictResolver,
    extractor: Arc<EntityExtractor>,
    sentiment: SentimentLexicon,
    settings: RecognizerConfig,
}

impl IntentRecognizer {
    /// Compile a vocabulary
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Vocabulary` if the table is inconsistent, or
    /// `EngineError::InvalidPattern` if any intent pattern, synonym or
    /// conflict regex fails to compile.
    pub fn new(vocabulary: &Vocabulary, settings: RecognizerConfig) -> Result<Self, EngineError> {
        vocabulary.validate()?;

        let mut intents = Vec::with_capacity(vocabulary.intents.len());

        for definition in &vocabulary.intents {
            let patterns = definition
                .patterns
                .iter()
                .map(|p| {
                    Regex::new(&format!("(?i){}", p)).map_err(|e| EngineError::InvalidPattern {
                        owner: format!("intent {}", definition.name),
                        pattern: p.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let boosters = vocabulary
                .boosters
                .iter()
                .filter(|b| b.intent == definition.name)
                .map(|b| Booster {
                    anchor: b.anchor.to_lowercase(),
                    partner: b.partner.to_lowercase(),
                    factor: b.factor,
                })
                .collect();

            intents.push(CompiledIntent {
                name: definition.name.clone(),
                patterns,
                keywords: definition.keywords.iter().map(|k| k.to_lowercase()).collect(),
                required_entities: definition.required_entities.clone(),
                weights: definition.weights,
                boosters,
            });
        }

        Ok(Self {
            intents,
            synonyms: SynonymExpander::new(&vocabulary.synonyms)?,
            conflicts: ConflictResolver::new(&vocabulary.conflicts)?,
            extractor: Arc::new(EntityExtractor::new(vocabulary)),
            sentiment: vocabulary.sentiment.clone(),
            settings,
        })
    }

    /// Compile a vocabulary with default scoring settings
    pub fn with_defaults(vocabulary: &Vocabulary) -> Result<Self, EngineError> {
        Self::new(vocabulary, RecognizerConfig::default())
    }

    /// Shared handle to the entity extractor built from the same vocabulary
    pub fn entity_extractor(&self) -> Arc<EntityExtractor> {
        Arc::clone(&self.extractor)
    }

    pub fn settings(&self) -> &RecognizerConfig {
        &self.settings
    }

    /// Recognize an utterance
    ///
    /// `recent_history` holds the intents of previous turns, oldest first.
    /// Only the last `history_window` entries are considered.
    pub fn recognize(&self, text: &str, recent_history: &[String]) -> RecognizedCommand {
        if is_malformed(text) {
            debug!("Malformed input, resolving to unknown");
            return RecognizedCommand::unknown();
        }

        let full = self.synonyms.expand(&clean(text));
        let analysis = cap_chars(&full, self.settings.max_analysis_chars);
        let entities = self.extractor.extract(&full);
        let sentiment = self.sentiment(&full);

        let scores = self.score_all(analysis, &entities);
        let Some(best) = self.select(&scores, analysis) else {
            return RecognizedCommand {
                entities,
                sentiment,
                match_quality: Some(0.0),
                ..RecognizedCommand::unknown()
            };
        };

        let confidence = self.adjust_for_history(best.confidence, &best.intent, recent_history);
        let threshold = self.threshold(best.match_quality);

        debug!(
            intent = %best.intent,
            raw = best.confidence,
            adjusted = confidence,
            quality = best.match_quality,
            threshold,
            "Best intent candidate"
        );

        let intent = if confidence >= threshold {
            best.intent
        } else {
            UNKNOWN_INTENT.to_string()
        };

        RecognizedCommand {
            intent,
            entities,
            confidence,
            sentiment,
            match_quality: Some(best.match_quality),
            is_follow_up: false,
            follow_up_count: None,
        }
    }

    /// Normalized, synonym-expanded and capped form of `text`
    pub fn analysis_text(&self, text: &str) -> String {
        let full = self.synonyms.expand(&clean(text));
        cap_chars(&full, self.settings.max_analysis_chars).to_string()
    }

    /// Score every intent, highest confidence first
    pub fn score_all(&self, analysis: &str, entities: &EntityMap) -> Vec<IntentScore> {
        let token_count = tokens(analysis).len();
        let mut scores: Vec<IntentScore> = self
            .intents
            .iter()
            .map(|intent| self.score_intent(intent, analysis, token_count, entities))
            .collect();

        scores.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.match_quality
                        .partial_cmp(&a.match_quality)
                        .unwrap_or(Ordering::Equal)
                })
        });

        scores
    }

    fn score_intent(
        &self,
        intent: &CompiledIntent,
        analysis: &str,
        token_count: usize,
        entities: &EntityMap,
    ) -> IntentScore {
        let weights = intent.weights;
        let mut confidence: f64 = 0.0;
        let mut evidence: f64 = 0.0;
        let mut capacity: f64 = 0.0;

        if !intent.patterns.is_empty() {
            capacity += weights.pattern;
            if intent.patterns.iter().any(|p| p.is_match(analysis)) {
                confidence += weights.pattern;
                evidence += weights.pattern;
            }
        }

        if !intent.keywords.is_empty() {
            let matched = intent
                .keywords
                .iter()
                .filter(|k| contains_phrase(analysis, k))
                .count();
            let ratio = matched as f64 / intent.keywords.len() as f64;

            let mut keyword_score = weights.keyword * ratio;
            if token_count > self.settings.long_text_tokens && ratio < 0.5 {
                keyword_score *= self.settings.long_text_penalty;
            }
            for booster in &intent.boosters {
                if contains_phrase(analysis, &booster.anchor)
                    && contains_phrase(analysis, &booster.partner)
                {
                    keyword_score *= booster.factor;
                }
            }

            confidence += keyword_score;
            capacity += weights.keyword;
            evidence += weights.keyword * ratio;
        }

        if !intent.required_entities.is_empty() {
            let found = intent
                .required_entities
                .iter()
                .filter(|e| entities.contains_key(e.as_str()))
                .count();

            confidence += weights.entity * found as f64;
            capacity += weights.entity * intent.required_entities.len() as f64;
            evidence += weights.entity * found as f64;

            if found == 0 {
                confidence *= self.settings.missing_entity_penalty;
            }
        }

        let match_quality = if capacity > 0.0 {
            (evidence / capacity).clamp(0.0, 1.0)
        } else {
            0.0
        };

        IntentScore {
            intent: intent.name.clone(),
            confidence: confidence.clamp(0.0, 1.0),
            match_quality,
        }
    }

    /// Pick the winning candidate from sorted scores
    fn select(&self, scores: &[IntentScore], analysis: &str) -> Option<IntentScore> {
        let mut candidates = scores.iter().filter(|s| s.confidence > 0.0);
        let top = candidates.next()?;
        let Some(second) = candidates.next() else {
            return Some(top.clone());
        };

        if top.confidence - second.confidence >= self.settings.tie_gap {
            return Some(top.clone());
        }

        if let Some(winner) = self.conflicts.resolve(&top.intent, &second.intent, analysis) {
            debug!(
                "Conflict between {} and {} resolved to {}",
                top.intent, second.intent, winner
            );
            let chosen = if winner == second.intent { second } else { top };
            return Some(chosen.clone());
        }

        if second.match_quality > top.match_quality {
            Some(second.clone())
        } else {
            Some(top.clone())
        }
    }

    fn adjust_for_history(&self, confidence: f64, intent: &str, history: &[String]) -> f64 {
        let window = self.settings.history_window;
        if window == 0 || history.is_empty() {
            return confidence;
        }

        let recent = &history[history.len().saturating_sub(window)..];
        let repeats = recent.iter().filter(|h| h.as_str() == intent).count();

        let adjusted = if recent.len() == window && repeats == window {
            confidence - SATURATION_PENALTY
        } else {
            confidence + (REPEAT_BONUS * repeats as f64).min(MAX_REPEAT_BONUS)
        };

        adjusted.clamp(0.0, 1.0)
    }

    /// Minimum accepted confidence for a candidate of the given quality
    pub fn threshold(&self, match_quality: f64) -> f64 {
        let dynamic: f64 = if match_quality < 0.3 {
            0.35
        } else if match_quality < 0.5 {
            0.25
        } else {
            0.15
        };
        dynamic.max(self.settings.absolute_floor)
    }

    /// Polarity from the vocabulary's sentiment word lists
    pub fn sentiment(&self, text: &str) -> Sentiment {
        let positive = self
            .sentiment
            .positive
            .iter()
            .filter(|w| contains_phrase(text, w))
            .count();
        let negative = self
            .sentiment
            .negative
            .iter()
            .filter(|w| contains_phrase(text, w))
            .count();

        match positive.cmp(&negative) {
            Ordering::Greater => Sentiment::Positive,
            Ordering::Less => Sentiment::Negative,
            Ordering::Equal => Sentiment::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> IntentRecognizer {
        IntentRecognizer::with_defaults(&Vocabulary::builtin().unwrap()).unwrap()
    }

    fn history(intents: &[&str]) -> Vec<String> {
        intents.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_open_project_with_entity() {
        let cmd = recognizer().recognize("apri progetto Biosphaera", &[]);
        assert_eq!(cmd.intent, "openProject");
        assert_eq!(cmd.entity("projectName"), Some("biosphaera"));
        assert!(cmd.confidence >= 0.9);
        assert!(cmd.match_quality.unwrap() > 0.0);
    }

    #[test]
    fn test_missing_required_entity_is_penalized() {
        let r = recognizer();
        let with = r.recognize("apri progetto atlas", &[]);
        let without = r.recognize("apri progetto", &[]);
        assert_eq!(without.intent, "openProject");
        assert!(without.confidence < with.confidence);
    }

    #[test]
    fn test_gibberish_is_unknown() {
        let cmd = recognizer().recognize("ajsdlfkj qwer", &[]);
        assert_eq!(cmd.intent, UNKNOWN_INTENT);
        assert!(cmd.confidence < 0.4);
    }

    #[test]
    fn test_malformed_short_circuits() {
        for text in ["", "   ", "?!?!", "42"] {
            let cmd = recognizer().recognize(text, &[]);
            assert_eq!(cmd, RecognizedCommand::unknown());
        }
    }

    #[test]
    fn test_synonym_expansion_feeds_scoring() {
        let cmd = recognizer().recognize("fammi vedere il lavoro nebula", &[]);
        assert_eq!(cmd.intent, "openProject");
        assert_eq!(cmd.entity("projectName"), Some("nebula"));
    }

    #[test]
    fn test_list_projects_outscores_open_project() {
        let r = recognizer();
        let analysis = r.analysis_text("elenca tutti i progetti");
        let scores = r.score_all(&analysis, &EntityMap::new());
        assert_eq!(scores[0].intent, "listProjects");

        let cmd = r.recognize("elenca tutti i progetti", &[]);
        assert_eq!(cmd.intent, "listProjects");
    }

    const MUSIC: &str = r#"
[[intents]]
name = "play"
keywords = ["suona", "musica"]
weights = { pattern = 0.0, keyword = 1.0, entity = 0.0 }

[[intents]]
name = "stop"
keywords = ["ferma", "musica"]
weights = { pattern = 0.0, keyword = 1.0, entity = 0.0 }
"#;

    #[test]
    fn test_conflict_table_breaks_near_tie() {
        let toml = format!(
            "{}\n[[conflicts]]\nbetween = [\"play\", \"stop\"]\nwhen = '\\badesso\\b'\nwinner = \"stop\"\notherwise = \"play\"\n",
            MUSIC
        );
        let r = IntentRecognizer::with_defaults(&Vocabulary::from_toml_str(&toml).unwrap())
            .unwrap();

        assert_eq!(r.recognize("musica adesso", &[]).intent, "stop");
        assert_eq!(r.recognize("musica", &[]).intent, "play");
    }

    #[test]
    fn test_near_tie_without_rule_prefers_quality() {
        let toml = format!(
            "{}\n[[intents]]\nname = \"volume\"\npatterns = ['\\bmusica\\b']\nkeywords = [\"volume\", \"alto\", \"basso\", \"su\"]\nweights = {{ pattern = 0.5, keyword = 0.2, entity = 0.0 }}\n",
            MUSIC
        );
        let r = IntentRecognizer::with_defaults(&Vocabulary::from_toml_str(&toml).unwrap())
            .unwrap();

        // play: confidence 0.5, quality 0.5; volume: confidence 0.5, quality ~0.71
        let cmd = r.recognize("musica", &[]);
        assert_eq!(cmd.intent, "volume");
    }

    #[test]
    fn test_history_repetition_bonus() {
        let r = recognizer();
        let base = r.recognize("cursore mirino", &[]).confidence;
        let boosted = r
            .recognize("cursore mirino", &history(&["greet", "setCursor"]))
            .confidence;
        assert!((boosted - (base + 0.1).min(1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_history_saturation_penalty() {
        let r = recognizer();
        let base = r.recognize("cursore mirino", &[]).confidence;
        let penalized = r
            .recognize(
                "cursore mirino",
                &history(&["setCursor", "setCursor", "setCursor"]),
            )
            .confidence;
        assert!((penalized - (base - 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_only_recent_window_counts() {
        let r = recognizer();
        let base = r.recognize("cursore mirino", &[]).confidence;
        let adjusted = r
            .recognize(
                "cursore mirino",
                &history(&["setCursor", "setCursor", "greet", "greet", "greet"]),
            )
            .confidence;
        assert!((adjusted - base).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_levels() {
        let r = recognizer();
        assert_eq!(r.threshold(0.9), 0.4);
        assert_eq!(r.threshold(0.1), 0.4);

        let mut settings = RecognizerConfig::default();
        settings.absolute_floor = 0.0;
        let lenient = IntentRecognizer::new(&Vocabulary::builtin().unwrap(), settings).unwrap();
        assert_eq!(lenient.threshold(0.9), 0.15);
        assert_eq!(lenient.threshold(0.4), 0.25);
        assert_eq!(lenient.threshold(0.2), 0.35);
    }

    #[test]
    fn test_analysis_text_is_capped() {
        let mut settings = RecognizerConfig::default();
        settings.max_analysis_chars = 10;
        let r = IntentRecognizer::new(&Vocabulary::builtin().unwrap(), settings).unwrap();
        assert_eq!(r.analysis_text("ciao come stai oggi").chars().count(), 10);
    }

    #[test]
    fn test_entities_use_full_text_beyond_cap() {
        let mut settings = RecognizerConfig::default();
        settings.max_analysis_chars = 14;
        let r = IntentRecognizer::new(&Vocabulary::builtin().unwrap(), settings).unwrap();
        let cmd = r.recognize("apri progetto orbita", &[]);
        assert_eq!(cmd.entity("projectName"), Some("orbita"));
    }

    #[test]
    fn test_sentiment() {
        let r = recognizer();
        assert_eq!(r.sentiment("perfetto, grazie"), Sentiment::Positive);
        assert_eq!(r.sentiment("non funziona"), Sentiment::Negative);
        assert_eq!(r.sentiment("apri il progetto"), Sentiment::Neutral);
    }

    fn score_of(r: &IntentRecognizer, text: &str, intent: &str) -> f64 {
        let analysis = r.analysis_text(text);
        r.score_all(&analysis, &EntityMap::new())
            .into_iter()
            .find(|s| s.intent == intent)
            .map(|s| s.confidence)
            .unwrap()
    }

    #[test]
    fn test_booster_needs_both_words() {
        let toml = format!(
            "{}\n[[boosters]]\nintent = \"play\"\nanchor = \"suona\"\npartner = \"chitarra\"\nfactor = 1.5\n",
            MUSIC
        );
        let r = IntentRecognizer::with_defaults(&Vocabulary::from_toml_str(&toml).unwrap())
            .unwrap();

        // one of two keywords matched: 1.0 * 0.5
        let plain = score_of(&r, "suona la batteria", "play");
        let boosted = score_of(&r, "suona la chitarra", "play");
        assert!((plain - 0.5).abs() < 1e-9);
        assert!((boosted - 0.75).abs() < 1e-9);

        let partner_only = score_of(&r, "chitarra e batteria", "play");
        assert_eq!(partner_only, 0.0);
    }

    const LONG_TEXT: &str = r#"
[[intents]]
name = "play"
keywords = ["suona", "musica", "canzone", "forte"]
weights = { pattern = 0.0, keyword = 1.0, entity = 0.0 }
"#;

    #[test]
    fn test_long_text_damps_weak_keyword_match() {
        let r = IntentRecognizer::with_defaults(&Vocabulary::from_toml_str(LONG_TEXT).unwrap())
            .unwrap();

        // ten tokens is still short; eleven crosses the limit
        let short = score_of(&r, "per favore adesso suona qualcosa di bello per me stasera", "play");
        let long = score_of(
            &r,
            "per favore adesso suona qualcosa di bello per me stasera dai",
            "play",
        );
        assert!((short - 0.25).abs() < 1e-9);
        assert!((long - 0.25 * 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_long_text_keeps_strong_keyword_match() {
        let r = IntentRecognizer::with_defaults(&Vocabulary::from_toml_str(LONG_TEXT).unwrap())
            .unwrap();

        // half the keywords matched: no penalty even when long
        let score = score_of(
            &r,
            "per favore adesso suona una canzone di quelle belle per me stasera",
            "play",
        );
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_conflict_rule_rejected_without_panic() {
        let mut vocabulary = Vocabulary::from_toml_str(MUSIC).unwrap();
        vocabulary.conflicts.push(crate::vocabulary::ConflictRule {
            between: vec!["play".to_string()],
            when: "adesso".to_string(),
            winner: "play".to_string(),
            otherwise: None,
        });

        let err = IntentRecognizer::with_defaults(&vocabulary).unwrap_err();
        assert!(matches!(err, EngineError::Vocabulary(_)));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let vocabulary = Vocabulary::from_toml_str(
            "[[intents]]\nname = \"broken\"\npatterns = [\"(unclosed\"]\n",
        )
        .unwrap();
        let err = IntentRecognizer::with_defaults(&vocabulary).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPattern { .. }));
    }
}
