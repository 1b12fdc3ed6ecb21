//! Parlo Engine Library
//!
//! Intent recognition and multi-turn dialogue management for short
//! natural-language requests. Used by the `parlo` binary and the
//! integration tests.

/// Configuration management module
pub mod config;

/// Declarative intent/entity vocabulary
pub mod vocabulary;

/// Entity extraction module
pub mod entities;

/// Intent recognition module
pub mod recognizer;

/// Dialogue state, stack and timeout management
pub mod dialogue;

/// Conversation insights and next-intent suggestions
pub mod insights;

/// Database persistence module
pub mod db;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
