//! Integration tests for intent recognition against the built-in vocabulary

use parlo_engine::recognizer::IntentRecognizer;
use parlo_engine::vocabulary::Vocabulary;
use sdk::types::{RecognizedCommand, Sentiment};

fn recognizer() -> IntentRecognizer {
    IntentRecognizer::with_defaults(&Vocabulary::builtin().unwrap()).unwrap()
}

#[test]
fn test_open_project_with_name() {
    let command = recognizer().recognize("apri progetto Biosphaera", &[]);

    assert_eq!(command.intent, "openProject");
    assert!(command.confidence >= 0.9, "confidence {}", command.confidence);
    assert_eq!(command.entity("projectName"), Some("biosphaera"));
}

#[test]
fn test_cursor_with_normalized_entity() {
    let command = recognizer().recognize("cursore pac-man", &[]);

    assert_eq!(command.intent, "setCursor");
    assert_eq!(command.entity("cursorType"), Some("pacman"));
}

#[test]
fn test_gibberish_is_unknown() {
    let command = recognizer().recognize("xyzzy plugh frobnicate", &[]);
    assert!(command.is_unknown());
}

#[test]
fn test_malformed_input_is_exactly_unknown() {
    let recognizer = recognizer();
    for text in ["", "   ", "?!?!", "12345", "..."] {
        assert_eq!(recognizer.recognize(text, &[]), RecognizedCommand::unknown());
    }
}

#[test]
fn test_synonym_reaches_canonical_intent() {
    let command = recognizer().recognize("cambia i colori del sito in scuro", &[]);
    assert_eq!(command.intent, "setTheme");
    assert_eq!(command.entity("themeName"), Some("dark"));
}

#[test]
fn test_entity_alone_is_not_a_command() {
    // bare answers are left for follow-up handling
    let command = recognizer().recognize("biosphaera", &[]);
    assert!(command.is_unknown());
    assert_eq!(command.entity("projectName"), Some("biosphaera"));
}

#[test]
fn test_greeting_has_no_entities() {
    let command = recognizer().recognize("buongiorno", &[]);
    assert_eq!(command.intent, "greet");
    assert!(command.entities.is_empty());
}

#[test]
fn test_repetition_is_damped() {
    let recognizer = recognizer();
    let fresh = recognizer.recognize("apri progetto atlas", &[]);
    let repeated = recognizer.recognize(
        "apri progetto atlas",
        &[
            "openProject".to_string(),
            "openProject".to_string(),
            "openProject".to_string(),
        ],
    );
    assert_eq!(repeated.intent, "openProject");
    assert!(repeated.confidence < fresh.confidence);
}

#[test]
fn test_sentiment_is_reported() {
    let command = recognizer().recognize("grazie, apri progetto nebula", &[]);
    assert_eq!(command.intent, "openProject");
    assert_eq!(command.sentiment, Sentiment::Positive);
}

#[test]
fn test_confidence_bounds_on_varied_input() {
    let recognizer = recognizer();
    let inputs = [
        "ciao",
        "elenca tutti i progetti",
        "torna alla home",
        "voglio scrivere una email",
        "ripristina tutte le impostazioni",
        "aiuto, cosa sai fare?",
        "mostrami il progetto orbita e poi cambia il tema in chiaro",
    ];
    for text in inputs {
        let command = recognizer.recognize(text, &[]);
        assert!(
            (0.0..=1.0).contains(&command.confidence),
            "{} -> {}",
            text,
            command.confidence
        );
    }
}
