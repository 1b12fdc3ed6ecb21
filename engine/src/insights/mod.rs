//! Conversation insights
//!
//! Counts what users talk about and how conversations move, and ranks
//! candidate next intents from those counts:
//!
//! - topic histogram
//! - intent bigrams (`a>b`)
//! - topic transitions (`a>b`)
//! - flow signatures (last three intents joined by `>`) with success/failure
//!
//! Ranking score = 0.4·success rate + 0.2·novelty + 0.3·relevance + 0.1·topic
//! frequency. Unseen intents get a neutral success rate of 0.5.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SUCCESS_WEIGHT: f64 = 0.4;
const NOVELTY_WEIGHT: f64 = 0.2;
const RELEVANCE_WEIGHT: f64 = 0.3;
const FREQUENCY_WEIGHT: f64 = 0.1;
const NEUTRAL_SUCCESS_RATE: f64 = 0.5;

/// Success/failure tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcomes {
    pub success: u64,
    pub failure: u64,
}

impl Outcomes {
    pub fn record(&mut self, success: bool) {
        if success {
            self.success += 1;
        } else {
            self.failure += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.success + self.failure
    }

    pub fn success_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.success as f64 / total as f64),
        }
    }
}

/// Serialized insight counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default)]
    pub topics: HashMap<String, u64>,
    #[serde(default)]
    pub intent_bigrams: HashMap<String, u64>,
    #[serde(default)]
    pub topic_transitions: HashMap<String, u64>,
    #[serde(default)]
    pub flows: HashMap<String, Outcomes>,
    #[serde(default)]
    pub intents: HashMap<String, Outcomes>,
}

/// One completed turn as seen by the tracker
#[derive(Debug, Clone, Copy)]
pub struct TurnRecord<'a> {
    pub previous_intent: Option<&'a str>,
    pub intent: &'a str,
    pub previous_topic: Option<&'a str>,
    pub topic: Option<&'a str>,
    pub flow_signature: &'a str,
    pub success: bool,
}

/// A ranked next-intent suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub intent: String,
    pub topic: Option<String>,
    pub score: f64,
}

/// A rankable intent and its topic
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub intent: &'a str,
    pub topic: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct InsightsTracker {
    insights: Insights,
    unflushed: u32,
}

impl InsightsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_insights(insights: Insights) -> Self {
        Self {
            insights,
            unflushed: 0,
        }
    }

    pub fn insights(&self) -> &Insights {
        &self.insights
    }

    /// Updates recorded since the last flush
    pub fn unflushed(&self) -> u32 {
        self.unflushed
    }

    pub fn mark_flushed(&mut self) {
        self.unflushed = 0;
    }

    pub fn record(&mut self, turn: TurnRecord<'_>) {
        let insights = &mut self.insights;

        if let Some(topic) = turn.topic {
            *insights.topics.entry(topic.to_string()).or_default() += 1;
        }
        if let Some(previous) = turn.previous_intent {
            *insights
                .intent_bigrams
                .entry(edge(previous, turn.intent))
                .or_default() += 1;
        }
        if let (Some(from), Some(to)) = (turn.previous_topic, turn.topic) {
            if from != to {
                *insights.topic_transitions.entry(edge(from, to)).or_default() += 1;
            }
        }
        if !turn.flow_signature.is_empty() {
            insights
                .flows
                .entry(turn.flow_signature.to_string())
                .or_default()
                .record(turn.success);
        }
        insights
            .intents
            .entry(turn.intent.to_string())
            .or_default()
            .record(turn.success);

        self.unflushed += 1;
    }

    /// Rank `candidates` as possible next intents
    ///
    /// `recent` holds the latest intents, oldest first; the last one anchors
    /// the bigram relevance.
    pub fn rank(
        &self,
        candidates: &[Candidate<'_>],
        current_topic: Option<&str>,
        recent: &[String],
        limit: usize,
    ) -> Vec<Suggestion> {
        let last_intent = recent.last().map(String::as_str);
        let window_start = recent.len().saturating_sub(3);
        let window = &recent[window_start..];
        let topic_total: u64 = self.insights.topics.values().sum();

        let mut ranked: Vec<Suggestion> = candidates
            .iter()
            .map(|candidate| {
                let success = self
                    .insights
                    .intents
                    .get(candidate.intent)
                    .and_then(Outcomes::success_rate)
                    .unwrap_or(NEUTRAL_SUCCESS_RATE);

                let novelty = if window.iter().any(|r| r == candidate.intent) {
                    0.0
                } else {
                    1.0
                };

                let topic_affinity = match (current_topic, candidate.topic) {
                    (Some(current), Some(topic)) if current == topic => 1.0,
                    (Some(current), Some(topic)) => {
                        share(&self.insights.topic_transitions, current, topic)
                    }
                    _ => 0.0,
                };
                let bigram_affinity = last_intent
                    .map(|last| share(&self.insights.intent_bigrams, last, candidate.intent))
                    .unwrap_or(0.0);
                let relevance = 0.5 * topic_affinity + 0.5 * bigram_affinity;

                let frequency = match (candidate.topic, topic_total) {
                    (Some(topic), total) if total > 0 => {
                        self.insights.topics.get(topic).copied().unwrap_or(0) as f64 / total as f64
                    }
                    _ => 0.0,
                };

                Suggestion {
                    intent: candidate.intent.to_string(),
                    topic: candidate.topic.map(str::to_string),
                    score: SUCCESS_WEIGHT * success
                        + NOVELTY_WEIGHT * novelty
                        + RELEVANCE_WEIGHT * relevance
                        + FREQUENCY_WEIGHT * frequency,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.intent.cmp(&b.intent))
        });
        ranked.truncate(limit);
        ranked
    }
}

fn edge(from: &str, to: &str) -> String {
    format!("{}>{}", from, to)
}

/// Fraction of edges leaving `from` that go to `to`
fn share(edges: &HashMap<String, u64>, from: &str, to: &str) -> f64 {
    let prefix = format!("{}>", from);
    let total: u64 = edges
        .iter()
        .filter(|(key, _)| key.starts_with(&prefix))
        .map(|(_, count)| count)
        .sum();
    if total == 0 {
        return 0.0;
    }
    edges.get(&edge(from, to)).copied().unwrap_or(0) as f64 / total as f64
}
