//! Command handlers for CLI operations
//!
//! - chat: interactive conversation over stdin
//! - recognize: one-shot intent recognition
//! - vocab check: validate a vocabulary file
//! - vocab list: show intents and entity types

use anyhow::{Context, Result};
use sdk::types::RecognizedCommand;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::dialogue::{DialogueEngine, TimeoutCheck, TurnOutcome, UpdateOptions};
use crate::recognizer::IntentRecognizer;
use crate::vocabulary::Vocabulary;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// The configured vocabulary, or the built-in one
pub fn load_vocabulary(config: &Config) -> Result<Vocabulary> {
    match &config.vocabulary.path {
        Some(path) => {
            info!("Loading vocabulary from {}", path.display());
            Vocabulary::load_from_path(path)
                .with_context(|| format!("Failed to load vocabulary {}", path.display()))
        }
        None => Vocabulary::builtin().context("Built-in vocabulary is invalid"),
    }
}

/// Recognize one utterance and print the result
pub async fn handle_recognize(
    text: String,
    history: Vec<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let vocabulary = load_vocabulary(config)?;
    let recognizer = IntentRecognizer::new(&vocabulary, config.recognizer.clone())?;
    let command = recognizer.recognize(&text, &history);

    match format {
        OutputFormat::Text => {
            println!("Intent:     {}", command.intent);
            println!("Confidence: {:.3}", command.confidence);
            if let Some(quality) = command.match_quality {
                println!("Quality:    {:.3}", quality);
            }
            println!("Sentiment:  {:?}", command.sentiment);
            if !command.entities.is_empty() {
                println!("Entities:");
                for (name, value) in sorted_entities(&command) {
                    println!("  {} = {}", name, value);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&command)?);
        }
    }

    Ok(())
}

/// Validate a vocabulary file and compile its patterns
pub async fn handle_vocab_check(
    path: Option<PathBuf>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let (source, result) = match path.or_else(|| config.vocabulary.path.clone()) {
        Some(path) => (path.display().to_string(), check_vocabulary_file(&path, config)),
        None => (
            "built-in".to_string(),
            Vocabulary::builtin()
                .and_then(|v| IntentRecognizer::new(&v, config.recognizer.clone()).map(|_| v))
                .map_err(anyhow::Error::from),
        ),
    };

    match (format, &result) {
        (OutputFormat::Text, Ok(vocabulary)) => {
            println!("✓ Vocabulary {} is valid", source);
            println!("  Intents:  {}", vocabulary.intents.len());
            println!("  Entities: {}", vocabulary.entities.len());
            println!("  Synonyms: {}", vocabulary.synonyms.len());
            println!("  Conflict rules: {}", vocabulary.conflicts.len());
        }
        (OutputFormat::Text, Err(e)) => {
            println!("✗ Vocabulary {} is invalid", source);
            println!("  {:#}", e);
        }
        (OutputFormat::Json, Ok(vocabulary)) => {
            let output = json!({
                "source": source,
                "valid": true,
                "intents": vocabulary.intents.len(),
                "entities": vocabulary.entities.len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        (OutputFormat::Json, Err(e)) => {
            let output = json!({
                "source": source,
                "valid": false,
                "error": format!("{:#}", e),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    result.map(|_| ())
}

fn check_vocabulary_file(path: &Path, config: &Config) -> Result<Vocabulary> {
    let vocabulary = Vocabulary::load_from_path(path)?;
    IntentRecognizer::new(&vocabulary, config.recognizer.clone())?;
    Ok(vocabulary)
}

/// List intents and entity types of the configured vocabulary
pub async fn handle_vocab_list(config: &Config, format: OutputFormat) -> Result<()> {
    let vocabulary = load_vocabulary(config)?;

    match format {
        OutputFormat::Text => {
            println!("Intents ({}):", vocabulary.intents.len());
            for intent in &vocabulary.intents {
                let mut flags = Vec::new();
                if !intent.required_entities.is_empty() {
                    flags.push(format!("needs {}", intent.required_entities.join(", ")));
                }
                if intent.requires_confirmation {
                    flags.push("confirm".to_string());
                }
                let topic = intent.topic.as_deref().unwrap_or("-");
                if flags.is_empty() {
                    println!("  {} [{}]", intent.name, topic);
                } else {
                    println!("  {} [{}] ({})", intent.name, topic, flags.join("; "));
                }
            }
            println!();
            println!("Entities ({}):", vocabulary.entities.len());
            for entity in &vocabulary.entities {
                println!(
                    "  {} (priority {}): {}",
                    entity.name,
                    entity.priority,
                    entity.patterns.join(", ")
                );
            }
        }
        OutputFormat::Json => {
            let intents: Vec<_> = vocabulary
                .intents
                .iter()
                .map(|i| {
                    json!({
                        "name": i.name,
                        "topic": i.topic,
                        "required_entities": i.required_entities,
                        "requires_confirmation": i.requires_confirmation,
                    })
                })
                .collect();
            let entities: Vec<_> = vocabulary
                .entities
                .iter()
                .map(|e| json!({ "name": e.name, "priority": e.priority, "patterns": e.patterns }))
                .collect();
            let output = json!({ "intents": intents, "entities": entities });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Interactive conversation
///
/// Commands are not executed for real: each actionable outcome is answered
/// with a description of the command and reported back as a success.
pub async fn handle_chat(ephemeral: bool, config: &Config, format: OutputFormat) -> Result<()> {
    let vocabulary = load_vocabulary(config)?;
    let mut engine = DialogueEngine::new(vocabulary, config)?.with_builtin_extraction();

    let database = if ephemeral {
        None
    } else {
        let database = Database::new(&config.database_path())
            .await
            .context("Failed to open database")?;
        engine = engine.with_store(Arc::new(database.store()));
        engine.restore().await;
        Some(database)
    };

    if format == OutputFormat::Text {
        println!("Parlo chat. Commands: /resume /cancel /suggest /stack /quit");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_notice: Option<&'static str> = None;

    prompt(format)?;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                last_notice = None;
                let line = line.trim();

                if let Some(command) = line.strip_prefix('/') {
                    if !handle_chat_command(&mut engine, command, format)? {
                        break;
                    }
                } else if !line.is_empty() {
                    let outcome = engine.process(line).await;
                    report_outcome(&mut engine, outcome, format).await?;
                }
                prompt(format)?;
            }
            _ = ticker.tick() => {
                let notice = match engine.check_timeout() {
                    TimeoutCheck::Active => None,
                    TimeoutCheck::Reminder { message, .. } => Some(("reminder", message)),
                    TimeoutCheck::Dormant { message } => Some(("dormant", message)),
                };
                if let Some((kind, message)) = notice {
                    if last_notice != Some(kind) {
                        last_notice = Some(kind);
                        emit(format, json!({ "type": kind, "message": message }), &message)?;
                        prompt(format)?;
                    }
                }
            }
        }
    }

    if let Err(e) = engine.flush().await {
        warn!("Failed to persist insights on exit: {}", e);
    }
    if let Some(database) = database {
        database.close().await?;
    }

    Ok(())
}

/// Returns false when the session should end
fn handle_chat_command(
    engine: &mut DialogueEngine,
    command: &str,
    format: OutputFormat,
) -> Result<bool> {
    match command {
        "quit" | "exit" => return Ok(false),
        "resume" => {
            let message = engine.resume();
            emit(format, json!({ "type": "resumed", "message": message }), &message)?;
        }
        "cancel" => {
            let outcome = engine.cancel();
            let text = outcome.message().unwrap_or_default().to_string();
            emit(format, serde_json::to_value(&outcome)?, &text)?;
        }
        "suggest" => {
            let suggestions = engine.suggest(3);
            let text = suggestions
                .iter()
                .map(|s| format!("  {} ({:.2})", s.intent, s.score))
                .collect::<Vec<_>>()
                .join("\n");
            emit(format, json!({ "type": "suggestions", "suggestions": suggestions }), &text)?;
        }
        "stack" => {
            let frames: Vec<_> = engine
                .frames()
                .map(|f| {
                    json!({
                        "id": f.id,
                        "state": f.state(),
                        "topic": f.context.topic,
                        "awaiting_for": f.awaiting_for,
                        "follow_up_count": f.follow_up_count,
                        "is_digression": f.is_digression,
                    })
                })
                .collect();
            let text = engine
                .frames()
                .enumerate()
                .map(|(depth, f)| {
                    format!(
                        "  {}: {} topic={} awaiting={}",
                        depth + 1,
                        f.state(),
                        f.context.topic.as_deref().unwrap_or("-"),
                        f.awaiting_for.as_deref().unwrap_or("-")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            emit(
                format,
                json!({ "type": "stack", "depth": engine.stack_depth(), "frames": frames }),
                &text,
            )?;
        }
        other => {
            let message = format!("Unknown command /{}", other);
            emit(format, json!({ "type": "unknown_command", "message": message }), &message)?;
        }
    }
    Ok(true)
}

/// Print a turn outcome and simulate execution of actionable commands
async fn report_outcome(
    engine: &mut DialogueEngine,
    outcome: TurnOutcome,
    format: OutputFormat,
) -> Result<()> {
    let text = match &outcome {
        TurnOutcome::NotUnderstood { .. } => "Sorry, I did not understand that.".to_string(),
        other => other.message().unwrap_or_default().to_string(),
    };
    if !text.is_empty() || format == OutputFormat::Json {
        emit(format, serde_json::to_value(&outcome)?, &text)?;
    }

    if !outcome.is_actionable() {
        return Ok(());
    }
    let Some(command) = outcome.command().cloned() else {
        return Ok(());
    };

    let response = describe_command(&command);
    let update = engine
        .update_context(
            &command.intent,
            &command.entities,
            &response,
            UpdateOptions {
                is_nested: engine.current_frame().is_digression,
                success: true,
                confidence: Some(command.confidence),
            },
        )
        .await;
    emit(
        format,
        json!({ "type": "executed", "response": response, "depth": update.depth }),
        &response,
    )?;

    if let Some(question) = update.resumed.and_then(|r| r.question) {
        emit(format, json!({ "type": "resumed", "message": question }), &question)?;
    }

    Ok(())
}

/// Simulated execution result
pub fn describe_command(command: &RecognizedCommand) -> String {
    if command.entities.is_empty() {
        return format!("→ {}", command.intent);
    }
    let entities = sorted_entities(command)
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("→ {} ({})", command.intent, entities)
}

fn sorted_entities(command: &RecognizedCommand) -> Vec<(&str, &str)> {
    let mut entities: Vec<(&str, &str)> = command
        .entities
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    entities.sort();
    entities
}

fn emit(format: OutputFormat, value: serde_json::Value, text: &str) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", text),
        OutputFormat::Json => println!("{}", serde_json::to_string(&value)?),
    }
    Ok(())
}

fn prompt(format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Text {
        print!("> ");
        std::io::stdout().flush()?;
    }
    Ok(())
}
