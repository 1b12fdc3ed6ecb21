//! Collaborator traits
//!
//! The dialogue engine depends on three services it does not implement itself:
//!
//! - an entity extraction service, used to read the answer to a clarifying question
//! - a tolerant key/value store, used to persist insights and closed frames
//! - a clock, so that inactivity timeouts can be tested deterministically
//!
//! Each trait ships with a simple implementation suitable for tests and
//! single-process use.

use crate::errors::EngineError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// Reads one typed value out of a follow-up answer
#[async_trait]
pub trait EntityExtractionService: Send + Sync {
    /// Extract the canonical value of `entity_type` from `text`
    ///
    /// `valid_values` optionally narrows the accepted answers (for example the
    /// options offered in the question). Returns `Ok(None)` when the answer
    /// does not contain the entity.
    async fn extract_entity(
        &self,
        text: &str,
        entity_type: &str,
        valid_values: &[String],
    ) -> Result<Option<String>, EngineError>;
}

/// String key/value persistence
///
/// Callers treat every failure as non-fatal.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, EngineError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), EngineError>;
}

/// In-memory key/value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), EngineError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Source of the current time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for deterministic timeout tests
///
/// # Examples
///
/// ```
/// use sdk::services::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000);
/// clock.advance(90_001);
/// assert_eq!(clock.now_ms(), 91_001);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    /// Move the clock forward by `ms` milliseconds
    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.get("insights").await.unwrap(), None);

        store.set("insights", "{}").await.unwrap();
        assert_eq!(store.get("insights").await.unwrap().as_deref(), Some("{}"));

        store.set("insights", "{\"a\":1}").await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(500);
        assert_eq!(clock.now_ms(), 500);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 750);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn test_system_clock_is_positive() {
        assert!(SystemClock.now_ms() > 0);
    }
}
