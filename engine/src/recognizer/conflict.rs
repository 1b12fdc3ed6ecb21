//! Near-tie resolution between two candidate intents

use regex::Regex;
use sdk::errors::EngineError;
use std::collections::HashMap;

use crate::vocabulary::{pair_key, ConflictRule};

#[derive(Debug, Clone)]
struct CompiledRule {
    when: Regex,
    winner: String,
    otherwise: Option<String>,
}

/// Pairwise conflict table keyed by the sorted intent-name pair
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    rules: HashMap<(String, String), CompiledRule>,
}

impl ConflictResolver {
    pub fn new(rules: &[ConflictRule]) -> Result<Self, EngineError> {
        let mut compiled = HashMap::new();

        for rule in rules {
            let key = rule.pair_key().ok_or_else(|| {
                EngineError::Vocabulary(format!(
                    "conflict rule {:?} needs exactly two intents",
                    rule.between
                ))
            })?;
            let when = Regex::new(&format!("(?i){}", rule.when)).map_err(|e| {
                EngineError::InvalidPattern {
                    owner: format!("conflict {:?}", rule.between),
                    pattern: rule.when.clone(),
                    reason: e.to_string(),
                }
            })?;
            compiled.insert(
                key,
                CompiledRule {
                    when,
                    winner: rule.winner.clone(),
                    otherwise: rule.otherwise.clone(),
                },
            );
        }

        Ok(Self { rules: compiled })
    }

    /// Pick a winner between `a` and `b` for `text`
    ///
    /// Returns `None` when no rule covers the pair, or the rule does not match
    /// and has no fallback winner.
    pub fn resolve(&self, a: &str, b: &str, text: &str) -> Option<&str> {
        let rule = self.rules.get(&pair_key(a, b))?;
        if rule.when.is_match(text) {
            Some(rule.winner.as_str())
        } else {
            rule.otherwise.as_deref()
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
