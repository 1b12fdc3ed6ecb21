//! Configuration management
//!
//! This module handles loading, validation, and management of the Parlo configuration.
//! Configuration is stored in TOML format at ~/.parlo/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **dialogue**: Inactivity timeout, follow-up cap, history and stack limits
//! - **recognizer**: Scoring thresholds and penalties
//! - **insights**: Suggestion tracking and flush cadence
//! - **vocabulary**: Optional path to a user intent/entity table
//!
//! # Examples
//!
//! ```no_run
//! use parlo_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Timeout: {} ms", config.dialogue.timeout_ms);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Every section is optional in a hand-written file and falls back to its
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Dialogue state settings
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Intent recognizer settings
    #[serde(default)]
    pub recognizer: RecognizerConfig,

    /// Insights tracker settings
    #[serde(default)]
    pub insights: InsightsConfig,

    /// Vocabulary source
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

/// Dialogue state machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Inactivity window after which a frame goes dormant
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i64,

    /// Fraction of the window after which a reminder is offered (0.0-1.0)
    #[serde(default = "default_reminder_ratio")]
    pub reminder_ratio: f64,

    /// Clarifying questions allowed per frame
    #[serde(default = "default_max_follow_ups")]
    pub max_follow_ups: u8,

    /// Closed frames kept in the conversation history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum number of stacked frames (root included)
    #[serde(default = "default_max_stack_depth")]
    pub max_stack_depth: usize,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            reminder_ratio: default_reminder_ratio(),
            max_follow_ups: default_max_follow_ups(),
            history_limit: default_history_limit(),
            max_stack_depth: default_max_stack_depth(),
        }
    }
}

/// Intent recognizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Characters of normalized text used for scoring
    #[serde(default = "default_max_analysis_chars")]
    pub max_analysis_chars: usize,

    /// Confidence below which the result is always `unknown`
    #[serde(default = "default_absolute_floor")]
    pub absolute_floor: f64,

    /// Top-two confidence gap that triggers conflict resolution
    #[serde(default = "default_tie_gap")]
    pub tie_gap: f64,

    /// Token count above which sparse keyword matches are penalized
    #[serde(default = "default_long_text_tokens")]
    pub long_text_tokens: usize,

    /// Multiplier applied to sparse keyword matches in long text
    #[serde(default = "default_long_text_penalty")]
    pub long_text_penalty: f64,

    /// Multiplier applied when an intent's required entities are all missing
    #[serde(default = "default_missing_entity_penalty")]
    pub missing_entity_penalty: f64,

    /// Recent turns considered for repetition adjustment
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            max_analysis_chars: default_max_analysis_chars(),
            absolute_floor: default_absolute_floor(),
            tie_gap: default_tie_gap(),
            long_text_tokens: default_long_text_tokens(),
            long_text_penalty: default_long_text_penalty(),
            missing_entity_penalty: default_missing_entity_penalty(),
            history_window: default_history_window(),
        }
    }
}

/// Insights tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Track insights at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Persist after this many updates
    #[serde(default = "default_flush_every")]
    pub flush_every: u32,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flush_every: default_flush_every(),
        }
    }
}

/// Vocabulary source configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VocabularyConfig {
    /// User vocabulary file (supports ~ expansion). Built-in table when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.parlo")
}

fn default_timeout_ms() -> i64 {
    90_000
}

fn default_reminder_ratio() -> f64 {
    0.8
}

fn default_max_follow_ups() -> u8 {
    3
}

fn default_history_limit() -> usize {
    10
}

fn default_max_stack_depth() -> usize {
    5
}

fn default_max_analysis_chars() -> usize {
    300
}

fn default_absolute_floor() -> f64 {
    0.4
}

fn default_tie_gap() -> f64 {
    0.15
}

fn default_long_text_tokens() -> usize {
    10
}

fn default_long_text_penalty() -> f64 {
    0.7
}

fn default_missing_entity_penalty() -> f64 {
    0.6
}

fn default_history_window() -> usize {
    3
}

fn default_flush_every() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            dialogue: DialogueConfig::default(),
            recognizer: RecognizerConfig::default(),
            insights: InsightsConfig::default(),
            vocabulary: VocabularyConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.parlo/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.parlo/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".parlo").join("config.toml"))
    }

    /// Path of the SQLite file holding persisted insights
    pub fn database_path(&self) -> PathBuf {
        self.core.data_dir.join("parlo.db")
    }

    /// Validate values and expand ~ in paths
    ///
    /// The data directory is not created here; the SQLite store creates it
    /// on first use.
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.dialogue.timeout_ms <= 0 {
            return Err(EngineError::Config(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dialogue.reminder_ratio) {
            return Err(EngineError::Config(
                "reminder_ratio must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.dialogue.max_follow_ups == 0 {
            return Err(EngineError::Config(
                "max_follow_ups must be at least 1".to_string(),
            ));
        }
        if self.dialogue.history_limit == 0 {
            return Err(EngineError::Config(
                "history_limit must be at least 1".to_string(),
            ));
        }
        if self.dialogue.max_stack_depth == 0 {
            return Err(EngineError::Config(
                "max_stack_depth must be at least 1".to_string(),
            ));
        }

        let ratios = [
            ("absolute_floor", self.recognizer.absolute_floor),
            ("tie_gap", self.recognizer.tie_gap),
            ("long_text_penalty", self.recognizer.long_text_penalty),
            ("missing_entity_penalty", self.recognizer.missing_entity_penalty),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "{} must be between 0.0 and 1.0",
                    name
                )));
            }
        }
        let limits = [
            ("max_analysis_chars", self.recognizer.max_analysis_chars),
            ("long_text_tokens", self.recognizer.long_text_tokens),
            ("history_window", self.recognizer.history_window),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(EngineError::Config(format!("{} must be at least 1", name)));
            }
        }

        if self.insights.flush_every == 0 {
            return Err(EngineError::Config(
                "flush_every must be at least 1".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if let Some(path) = &self.vocabulary.path {
            self.vocabulary.path = Some(expand_path(path)?);
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.dialogue.timeout_ms, 90_000);
        assert_eq!(config.dialogue.max_follow_ups, 3);
        assert_eq!(config.dialogue.history_limit, 10);
        assert_eq!(config.recognizer.max_analysis_chars, 300);
        assert_eq!(config.recognizer.absolute_floor, 0.4);
        assert_eq!(config.insights.flush_every, 10);
        assert!(config.vocabulary.path.is_none());
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = Config::from_toml_str("[core]\nlog_level = \"debug\"\ndata_dir = \"/tmp/parlo\"\n")
            .unwrap();

        assert_eq!(config.core.log_level, "debug");
        assert_eq!(config.core.data_dir, PathBuf::from("/tmp/parlo"));
        assert_eq!(config.dialogue.timeout_ms, 90_000);
        assert_eq!(config.recognizer.tie_gap, 0.15);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let err = Config::from_toml_str("[core]\nlog_level = \"loud\"\n").unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.dialogue.max_follow_ups, 3);
    }

    #[test]
    fn test_zero_limits_rejected() {
        for (toml, name) in [
            ("[dialogue]\nmax_follow_ups = 0\n", "max_follow_ups"),
            ("[recognizer]\nhistory_window = 0\n", "history_window"),
            ("[recognizer]\nlong_text_tokens = 0\n", "long_text_tokens"),
        ] {
            let err = Config::from_toml_str(toml).unwrap_err();
            assert!(err.to_string().contains(name), "{}", err);
        }
    }

    #[test]
    fn test_out_of_range_ratio_rejected() {
        let toml = "[core]\n[recognizer]\nabsolute_floor = 1.5\n";
        let err = Config::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("absolute_floor"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(
            config.dialogue.max_stack_depth,
            deserialized.dialogue.max_stack_depth
        );
    }
}
