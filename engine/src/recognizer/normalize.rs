//! Utterance preprocessing
//!
//! Turns raw user text into the analysis form the scorer works on:
//! lowercase, repeated punctuation collapsed, whitespace normalized,
//! configured synonyms rewritten to their canonical phrase.

use regex::Regex;
use sdk::errors::EngineError;
use std::collections::BTreeMap;

/// Whether the text carries anything worth scoring
///
/// Empty, whitespace-only and punctuation/digit-only input is malformed.
pub fn is_malformed(text: &str) -> bool {
    !text.chars().any(char::is_alphabetic)
}

/// Lowercase, collapse repeated punctuation and whitespace
pub fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last: Option<char> = None;

    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            if last != Some(' ') {
                out.push(' ');
            }
            last = Some(' ');
            continue;
        }
        if c.is_ascii_punctuation() && last == Some(c) {
            continue;
        }
        out.push(c);
        last = Some(c);
    }

    out
}

/// Truncate to at most `max_chars` characters on a char boundary
pub fn cap_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Split into lowercase word tokens
pub fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `phrase` occurs in `text` as a whole-word sequence
///
/// ```
/// use parlo_engine::recognizer::normalize::contains_phrase;
///
/// assert!(contains_phrase("lascia stare, grazie", "lascia stare"));
/// assert!(!contains_phrase("nonno", "no"));
/// ```
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let needle = tokens(phrase);
    if needle.is_empty() {
        return false;
    }
    let hay = tokens(text);
    hay.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// One compiled variant -> canonical rewrite
#[derive(Debug, Clone)]
struct SynonymRule {
    canonical: String,
    canonical_re: Regex,
    variant_re: Regex,
    variant_len: usize,
}

/// Synonym expansion table
///
/// Rules apply longest variant first. A rule is skipped when its canonical
/// phrase is already present, so the canonical word is never duplicated.
#[derive(Debug, Clone, Default)]
pub struct SynonymExpander {
    rules: Vec<SynonymRule>,
}

impl SynonymExpander {
    pub fn new(synonyms: &BTreeMap<String, Vec<String>>) -> Result<Self, EngineError> {
        let mut rules = Vec::new();

        for (canonical, variants) in synonyms {
            let canonical = canonical.to_lowercase();
            let canonical_re = word_regex(&canonical, "synonyms")?;
            for variant in variants {
                let variant = variant.to_lowercase();
                rules.push(SynonymRule {
                    canonical: canonical.clone(),
                    canonical_re: canonical_re.clone(),
                    variant_re: word_regex(&variant, "synonyms")?,
                    variant_len: variant.chars().count(),
                });
            }
        }

        rules.sort_by(|a, b| b.variant_len.cmp(&a.variant_len));

        Ok(Self { rules })
    }

    pub fn expand(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            if rule.canonical_re.is_match(&out) {
                continue;
            }
            if rule.variant_re.is_match(&out) {
                out = rule
                    .variant_re
                    .replace_all(&out, rule.canonical.as_str())
                    .into_owned();
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn word_regex(phrase: &str, owner: &str) -> Result<Regex, EngineError> {
    let pattern = format!(r"\b{}\b", regex::escape(phrase));
    Regex::new(&pattern).map_err(|e| EngineError::InvalidPattern {
        owner: owner.to_string(),
        pattern: phrase.to_string(),
        reason: e.to_string(),
    })
}
