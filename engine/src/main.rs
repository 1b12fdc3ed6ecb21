// Parlo conversational engine
// Main entry point for the parlo binary

use clap::Parser;
use parlo_engine::cli::{Cli, Command, VocabAction};
use parlo_engine::config::Config;
use parlo_engine::handlers::{
    handle_chat, handle_recognize, handle_vocab_check, handle_vocab_list, OutputFormat,
};
use parlo_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::info!("Parlo v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Chat { ephemeral } => handle_chat(ephemeral, &config, format).await,

        Command::Recognize { text, history } => {
            handle_recognize(text, history, &config, format).await
        }

        Command::Vocab { action } => match action {
            VocabAction::Check { path } => handle_vocab_check(path, &config, format).await,
            VocabAction::List => handle_vocab_list(&config, format).await,
        },
    }
}
