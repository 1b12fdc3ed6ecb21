//! Parlo SDK
//!
//! Shared library providing types, error taxonomy, and collaborator traits for
//! Parlo components. This crate is used by the engine and by hosts that embed it.

/// Error types and handling
pub mod errors;

/// Recognition result types
pub mod types;

/// Collaborator traits (entity extraction, persistence, clock)
pub mod services;

// Re-export commonly used types
pub use errors::{EngineError, ParloErrorExt};
pub use services::{
    Clock, EntityExtractionService, KeyValueStore, ManualClock, MemoryStore, SystemClock,
};
pub use types::{EntityMap, RecognizedCommand, Sentiment, UNKNOWN_INTENT};
