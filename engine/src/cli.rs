//! CLI interface for Parlo
//!
//! Command-line definitions using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parlo conversational engine
///
/// Recognizes intents and entities in short natural-language requests and
/// keeps a multi-turn dialogue going: clarifying questions, digressions,
/// confirmations and inactivity timeouts.
#[derive(Parser, Debug)]
#[command(name = "parlo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive conversation
    Chat {
        /// Do not load or persist insights
        #[arg(long)]
        ephemeral: bool,
    },

    /// Recognize a single utterance and exit
    Recognize {
        /// The text to analyze
        text: String,

        /// Intents of previous turns, oldest first
        #[arg(long = "history", value_name = "INTENT")]
        history: Vec<String>,
    },

    /// Inspect vocabularies
    Vocab {
        #[command(subcommand)]
        action: VocabAction,
    },
}

/// Vocabulary actions
#[derive(Subcommand, Debug)]
pub enum VocabAction {
    /// Validate a vocabulary file (the configured one when omitted)
    Check {
        /// Vocabulary file path
        path: Option<PathBuf>,
    },

    /// List intents and entity types
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_recognize_with_history() {
        let cli = Cli::parse_from([
            "parlo",
            "--json",
            "recognize",
            "apri progetto",
            "--history",
            "greet",
            "--history",
            "listProjects",
        ]);
        assert!(cli.json);
        match cli.command {
            Command::Recognize { text, history } => {
                assert_eq!(text, "apri progetto");
                assert_eq!(history, vec!["greet", "listProjects"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_vocab_check() {
        let cli = Cli::parse_from(["parlo", "vocab", "check", "my.toml"]);
        match cli.command {
            Command::Vocab {
                action: VocabAction::Check { path },
            } => assert_eq!(path, Some(PathBuf::from("my.toml"))),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["parlo", "chat", "--log", "debug", "--ephemeral"]);
        assert_eq!(cli.log.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Chat { ephemeral: true }));
    }
}
