//! Integration tests for multi-turn dialogue flows
//!
//! All tests drive the engine with a manual clock so inactivity windows are
//! deterministic.

use parlo_engine::config::Config;
use parlo_engine::dialogue::{
    AskOptions, DialogueEngine, DialogueState, TimeoutCheck, TurnOutcome, UpdateOptions,
};
use parlo_engine::vocabulary::Vocabulary;
use sdk::services::{Clock, ManualClock};
use std::sync::Arc;

fn session() -> (DialogueEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let engine = DialogueEngine::with_clock(
        Vocabulary::builtin().unwrap(),
        &Config::default(),
        Arc::clone(&clock) as Arc<dyn Clock>,
    )
    .unwrap()
    .with_builtin_extraction();
    (engine, clock)
}

/// Report an actionable outcome back to the engine as a successful execution
async fn execute(engine: &mut DialogueEngine, outcome: &TurnOutcome) {
    let command = outcome.command().expect("actionable outcome").clone();
    let is_nested = engine.current_frame().is_digression;
    engine
        .update_context(
            &command.intent,
            &command.entities,
            "fatto",
            UpdateOptions {
                is_nested,
                ..UpdateOptions::default()
            },
        )
        .await;
}

#[tokio::test]
async fn test_clarifying_question_then_answer() {
    let (mut engine, _) = session();

    let outcome = engine.process("apri progetto").await;
    match &outcome {
        TurnOutcome::NeedsEntity {
            command, entity, ..
        } => {
            assert_eq!(command.intent, "openProject");
            assert_eq!(entity, "projectName");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(engine.state(), DialogueState::AwaitingEntity);

    let outcome = engine.process("biosphaera").await;
    let command = outcome.command().unwrap();
    assert_eq!(outcome.kind(), "follow_up");
    assert_eq!(command.intent, "openProject");
    assert_eq!(command.entity("projectName"), Some("biosphaera"));
    assert!(command.is_follow_up);

    execute(&mut engine, &outcome).await;
    assert_eq!(engine.state(), DialogueState::Idle);
    assert_eq!(
        engine.current_frame().context.last_intent.as_deref(),
        Some("openProject")
    );
}

#[tokio::test]
async fn test_digression_returns_to_pending_question() {
    let (mut engine, _) = session();

    engine.process("apri progetto").await;
    let outcome = engine.process("cambia tema scuro").await;

    assert_eq!(outcome.kind(), "digression_started");
    assert_eq!(outcome.command().unwrap().intent, "setTheme");
    assert_eq!(engine.stack_depth(), 2);

    let is_nested = engine.current_frame().is_digression;
    let command = outcome.command().unwrap().clone();
    let update = engine
        .update_context(
            &command.intent,
            &command.entities,
            "tema scuro attivato",
            UpdateOptions {
                is_nested,
                ..UpdateOptions::default()
            },
        )
        .await;

    assert_eq!(update.depth, 1);
    assert_eq!(engine.stack_depth(), 1);
    let resumed = update.resumed.unwrap();
    assert_eq!(resumed.awaiting_for.as_deref(), Some("projectName"));
    assert_eq!(engine.state(), DialogueState::AwaitingEntity);

    let outcome = engine.process("nebula").await;
    assert_eq!(outcome.kind(), "follow_up");
    assert_eq!(
        outcome.command().unwrap().entity("projectName"),
        Some("nebula")
    );
}

#[tokio::test]
async fn test_dormancy_and_resume_name_the_topic() {
    let (mut engine, clock) = session();

    let outcome = engine.process("apri progetto atlas").await;
    execute(&mut engine, &outcome).await;

    clock.advance(91_000);
    let outcome = engine.process("ciao").await;
    assert_eq!(outcome.kind(), "dormant");
    assert_eq!(engine.state(), DialogueState::Dormant);

    let message = engine.resume();
    assert!(message.contains("progetti"), "{}", message);
    assert_eq!(engine.state(), DialogueState::Idle);

    assert_eq!(engine.process("ciao").await.kind(), "command");
}

#[tokio::test]
async fn test_expiry_boundary_is_strict() {
    let (mut engine, clock) = session();
    let outcome = engine.process("apri progetto atlas").await;
    execute(&mut engine, &outcome).await;

    clock.advance(90_000);
    assert!(!engine.is_context_expired(engine.current_frame()));
    assert!(!matches!(engine.check_timeout(), TimeoutCheck::Dormant { .. }));

    clock.advance(1);
    assert!(engine.is_context_expired(engine.current_frame()));
    assert!(matches!(engine.check_timeout(), TimeoutCheck::Dormant { .. }));
}

#[tokio::test]
async fn test_follow_up_limit_forces_idle() {
    let (mut engine, _) = session();

    assert_eq!(engine.process("apri progetto").await.kind(), "needs_entity");
    assert_eq!(engine.process("boh").await.kind(), "needs_entity");
    assert_eq!(engine.process("non lo so").await.kind(), "needs_entity");
    assert_eq!(engine.process("mah").await.kind(), "gave_up");

    assert_eq!(engine.state(), DialogueState::Idle);
    assert!(engine.current_frame().follow_up_count <= 3);
}

#[test]
fn test_ask_for_never_exceeds_cap() {
    let (mut engine, _) = session();
    let give_up = engine.vocabulary().messages.too_many_questions.clone();

    for call in 1..=6 {
        let reply = engine.ask_for("projectName", "Quale progetto?", AskOptions::default());
        assert!(engine.current_frame().follow_up_count <= 3);
        if call == 4 {
            assert_eq!(reply, give_up);
        } else if call < 4 {
            assert_eq!(reply, "Quale progetto?");
        }
    }
}

#[tokio::test]
async fn test_stack_root_survives_everything() {
    let (mut engine, clock) = session();
    let inputs = [
        "apri progetto",
        "cambia tema scuro",
        "lascia stare",
        "lascia stare",
        "cursore",
        "xyzzy",
        "ripristina le impostazioni",
        "no",
    ];

    for text in inputs {
        engine.process(text).await;
        assert!(engine.stack_depth() >= 1);
        engine.cancel();
        assert!(engine.stack_depth() >= 1);
    }

    clock.advance(200_000);
    engine.check_timeout();
    assert_eq!(engine.stack_depth(), 1);
}

#[tokio::test]
async fn test_confirmation_round_trip() {
    let (mut engine, _) = session();

    let outcome = engine.process("ripristina le impostazioni").await;
    match &outcome {
        TurnOutcome::ConfirmationRequired { prompt, .. } => {
            assert_eq!(prompt, "Vuoi davvero ripristinare tutte le impostazioni?")
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let outcome = engine.process("ok").await;
    assert_eq!(outcome.kind(), "confirmed");
    execute(&mut engine, &outcome).await;
    assert_eq!(engine.state(), DialogueState::Idle);
}

#[tokio::test]
async fn test_suggestions_follow_history() {
    let (mut engine, _) = session();

    for text in ["elenca tutti i progetti", "apri progetto atlas"] {
        let outcome = engine.process(text).await;
        execute(&mut engine, &outcome).await;
    }
    for text in ["elenca tutti i progetti", "apri progetto orbita"] {
        let outcome = engine.process(text).await;
        execute(&mut engine, &outcome).await;
    }
    let outcome = engine.process("elenca tutti i progetti").await;
    execute(&mut engine, &outcome).await;

    let suggestions = engine.suggest(3);
    assert_eq!(suggestions.len(), 3);
    assert!(suggestions.windows(2).all(|w| w[0].score >= w[1].score));
}
