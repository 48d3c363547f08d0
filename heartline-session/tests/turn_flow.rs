//! Session-level flow: session start, turns, event resolution and persistence
//! across restarts.

use chrono::{DateTime, Duration, TimeZone, Utc};

use heartline_core::events::{EventFilter, find_event};
use heartline_core::facts::MemoryFact;
use heartline_core::{
    AppMode, CharacterState, ConversationTurn, Emotion, HeartlineConfig, HeartlineError,
    InMemoryStore, RecordStore, RelationshipStage, Role, SequenceSource, SqliteStore,
};
use heartline_llm::{ChatRole, LlmError, ScriptedSource};
use heartline_session::{Companion, SessionError, StageChange};

/// Saturday afternoon, so no time-of-day events interfere.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 14, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn fenced(body: &str) -> String {
    format!("```json\n{body}\n```")
}

/// Random conditions never pass with draws this high.
fn companion<S: RecordStore + Send + Sync + 'static>(store: S, initial: CharacterState) -> Companion<S> {
    Companion::new(store, HeartlineConfig::default(), initial).with_rng(SequenceSource::constant(0.99))
}

fn fresh() -> Companion<InMemoryStore> {
    companion(InMemoryStore::new(), CharacterState::new_at("Aiko", now()))
}

/// Companion whose store already holds `saved`.
fn restored(saved: CharacterState) -> Companion<InMemoryStore> {
    companion(InMemoryStore::with_state(saved), CharacterState::new_at("Unused", now()))
}

// ---------------------------------------------------------------------------
// Turns
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_turn_fires_first_conversation() {
    let mut c = fresh();
    let start = c.start_session_at(Vec::new(), now()).await.expect("start");
    assert_eq!(start.hours_away, None);
    assert!(start.decay.is_empty());
    assert!(start.triggered_events.is_empty());
    assert!(!start.hydrated);

    let raw = format!("Nice to meet you!\n{}", fenced(r#"{"affection_delta":3}"#));
    let outcome = c
        .process_turn_at("Hi! I work as a nurse.", &raw, now())
        .await
        .expect("turn");

    assert_eq!(outcome.dialogue, "Nice to meet you!");
    assert!(outcome.parse_error.is_none());
    assert_eq!(outcome.applied.affection_delta, Some(3));
    assert_eq!(outcome.triggered_events, vec!["first_conversation".to_string()]);
    assert!(outcome.pending_event.is_none());
    assert!(outcome.new_facts.iter().any(|f| f == "User: a nurse"));

    assert_eq!(c.state().total_interactions, 1);
    assert_eq!(c.state().affection, 3);
    assert_eq!(c.memory().len(), 2);

    let saved = c.store().load_state().expect("load").expect("saved");
    assert_eq!(saved.total_interactions, 1);
    let facts = c.store().facts(10).expect("facts");
    assert!(facts.iter().any(|f| f.content == "User: a nurse"));
}

#[tokio::test]
async fn malformed_directive_falls_back_to_baseline() {
    let mut c = fresh();
    c.start_session_at(Vec::new(), now()).await.expect("start");
    let outcome = c
        .process_turn_at("hello", "Hey!\n```json\n{broken json\n```", now())
        .await
        .expect("turn");
    assert_eq!(outcome.dialogue, "Hey!");
    assert!(outcome.parse_error.is_some());
    // baseline always carries every stat delta
    assert!(outcome.applied.affection_delta.is_some());
    assert!(outcome.applied.energy_delta.is_some());
}

#[tokio::test]
async fn turn_can_cross_a_stage() {
    let mut initial = CharacterState::new_at("Aiko", now() - Duration::days(1));
    initial.affection = 49;
    initial.trust = 20;
    initial.total_interactions = 2;
    let mut c = companion(InMemoryStore::new(), initial);
    c.start_session_at(Vec::new(), now()).await.expect("start");

    let raw = format!("Thank you!\n{}", fenced(r#"{"affection_delta":3,"trust_delta":1}"#));
    let outcome = c
        .process_turn_at("Thank you, you're so kind!", &raw, now())
        .await
        .expect("turn");

    assert_eq!(
        outcome.stage_change,
        Some(StageChange {
            from: RelationshipStage::Stranger,
            to: RelationshipStage::Acquaintance,
        })
    );
    assert_eq!(c.state().relationship_stage, RelationshipStage::Acquaintance);
}

#[tokio::test]
async fn companion_mode_keeps_its_stage() {
    let mut initial = CharacterState::new_at("Aiko", now() - Duration::days(60)).into_companion_mode();
    initial.affection = 1000;
    initial.trust = 100;
    initial.total_interactions = 500;
    let mut c = companion(InMemoryStore::new(), initial);
    c.start_session_at(Vec::new(), now()).await.expect("start");

    let outcome = c
        .process_turn_at("You're wonderful.", "Thank you!", now())
        .await
        .expect("turn");
    assert!(outcome.stage_change.is_none());
    assert_eq!(c.state().app_mode, AppMode::Companion);
    assert_eq!(c.state().relationship_stage, RelationshipStage::Companion);
}

#[tokio::test]
async fn model_suggestion_is_only_pending() {
    let mut c = fresh();
    c.start_session_at(Vec::new(), now()).await.expect("start");

    let raw = format!("Aw, thanks!\n{}", fenced(r#"{"triggered_event":"random_compliment"}"#));
    let outcome = c.process_turn_at("You're great", &raw, now()).await.expect("turn");
    assert_eq!(outcome.pending_event.as_deref(), Some("random_compliment"));
    assert!(!c.state().completed_events.iter().any(|e| e == "random_compliment"));
    assert!(
        c.store()
            .completed_events(&EventFilter::for_event("random_compliment"))
            .expect("history")
            .is_empty()
    );

    let raw = format!("Ok!\n{}", fenced(r#"{"triggered_event":"made_up_event"}"#));
    let outcome = c.process_turn_at("ok", &raw, now()).await.expect("turn");
    assert!(outcome.pending_event.is_none());
}

#[tokio::test]
async fn prompt_carries_recent_turns() {
    let mut c = fresh();
    c.start_session_at(Vec::new(), now()).await.expect("start");
    c.process_turn_at("Hi!", "Hello!", now()).await.expect("turn");

    let messages = c.prompt_for("How are you?").await;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, ChatRole::System);
    assert!(messages[0].content.contains("You are Aiko."));
    assert_eq!(messages[1].content, "Hi!");
    assert_eq!(messages[2].role, ChatRole::Assistant);
    assert_eq!(messages[3].content, "How are you?");
}

#[tokio::test]
async fn respond_uses_the_dialogue_source() {
    let mut c = fresh();
    c.start_session_at(Vec::new(), now()).await.expect("start");
    let source = ScriptedSource::new(["*smiles* Hello there!"]);

    let outcome = c.respond("Hi", &source).await.expect("respond");
    assert_eq!(outcome.dialogue, "Hello there!");
    assert_eq!(source.remaining(), 0);

    let err = c.respond("Still there?", &source).await.expect_err("exhausted");
    assert!(matches!(err, SessionError::Llm(LlmError::Unavailable(_))));
    // the failed turn left no trace
    assert_eq!(c.memory().len(), 2);
}

// ---------------------------------------------------------------------------
// Session start
// ---------------------------------------------------------------------------

#[tokio::test]
async fn absence_decays_and_welcomes_back() {
    let mut saved = CharacterState::new_at("Aiko", now() - Duration::days(30));
    saved.energy = 40;
    saved.affection = 300;
    saved.total_interactions = 12;
    saved.last_interaction = Some(now() - Duration::days(4));
    let mut c = restored(saved);

    let prior = vec![
        ConversationTurn::new(Role::User, "see you soon", now() - Duration::days(4)),
        ConversationTurn::new(Role::Companion, "bye!", now() - Duration::days(4)),
    ];
    let start = c.start_session_at(prior, now()).await.expect("start");

    assert_eq!(start.hours_away, Some(96.0));
    assert_eq!(start.decay.energy_delta, Some(60));
    assert_eq!(start.decay.affection_delta, Some(-6));
    assert!(start.triggered_events.iter().any(|e| e == "return_after_absence"));
    assert!(start.hydrated);

    assert_eq!(c.state().name, "Aiko");
    assert_eq!(c.state().energy, 100);
    assert_eq!(c.state().affection, 294);
    assert_eq!(c.state().mood.primary, Emotion::Melancholy);
    assert_eq!(c.memory().len(), 2);
}

#[tokio::test]
async fn back_to_back_sessions_decay_once() {
    let mut saved = CharacterState::new_at("Aiko", now() - Duration::days(30));
    saved.affection = 800;
    saved.trust = 80;
    saved.last_interaction = Some(now() - Duration::days(10));
    let mut c = restored(saved);

    let first = c.start_session_at(Vec::new(), now()).await.expect("start");
    assert_eq!(first.decay.affection_delta, Some(-40));
    assert_eq!(first.decay.trust_delta, Some(-2));
    c.end_session().await.expect("end");

    for minutes in 1..=2 {
        let at = now() + Duration::minutes(minutes);
        let again = c.start_session_at(Vec::new(), at).await.expect("restart");
        assert!(again.decay.is_empty());
        // the real absence is still reported
        assert!(again.hours_away.is_some_and(|h| h > 240.0));
        c.end_session().await.expect("end");
    }

    assert_eq!(c.state().affection, 760);
    assert_eq!(c.state().trust, 78);
    let stored = c.store().load_state().expect("load").expect("saved");
    assert_eq!(stored.affection, 760);
    assert_eq!(stored.last_decay_at, Some(now()));
}

#[tokio::test]
async fn decay_can_demote_the_stage() {
    let mut saved = CharacterState::new_at("Aiko", now() - Duration::days(40));
    saved.relationship_stage = RelationshipStage::Acquaintance;
    saved.affection = 60;
    saved.trust = 21;
    saved.total_interactions = 5;
    saved.last_interaction = Some(now() - Duration::days(30));
    let mut c = restored(saved);

    let start = c.start_session_at(Vec::new(), now()).await.expect("start");
    assert_eq!(start.decay.trust_delta, Some(-8));
    assert_eq!(
        start.stage_change,
        Some(StageChange {
            from: RelationshipStage::Acquaintance,
            to: RelationshipStage::Stranger,
        })
    );
    assert_eq!(c.state().affection, 57);
    assert_eq!(c.state().trust, 13);
    assert_eq!(c.state().relationship_stage, RelationshipStage::Stranger);
    let stored = c.store().load_state().expect("load").expect("saved");
    assert_eq!(stored.relationship_stage, RelationshipStage::Stranger);
}

#[tokio::test]
async fn end_session_clears_working_memory() {
    let mut c = fresh();
    c.start_session_at(Vec::new(), now()).await.expect("start");
    c.process_turn_at("Hi!", "Hello!", now()).await.expect("turn");
    c.end_session().await.expect("end");
    assert!(c.memory().is_empty());
    assert_eq!(c.memory().message_count(), 0);
    assert!(c.store().load_state().expect("load").is_some());
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolving_a_one_time_event_retires_it() {
    let mut c = fresh();
    c.start_session_at(Vec::new(), now()).await.expect("start");
    c.process_turn_at("Hi!", "Hello!", now()).await.expect("turn");
    let before = c.state().clone();

    let resolution = c
        .resolve_event_at("first_conversation", None, now())
        .await
        .expect("resolve");
    assert!(resolution.record.id.is_some());
    assert!(resolution.response.is_none());
    assert_eq!(c.state().affection, before.affection + 10);
    assert_eq!(c.state().trust, before.trust + 5);
    assert!(c.state().completed_events.iter().any(|e| e == "first_conversation"));

    let outcome = c.process_turn_at("Hi again", "Hey!", now()).await.expect("turn");
    assert!(!outcome.triggered_events.iter().any(|e| e == "first_conversation"));
}

#[tokio::test]
async fn choices_record_outcome_and_follow_up() {
    let confession = find_event("confession_event").expect("catalogue entry");
    let (index, choice) = confession
        .choices()
        .iter()
        .enumerate()
        .find(|(_, c)| c.next_scene_id.as_deref() == Some("confession_accepted"))
        .expect("accepting branch");

    let mut c = fresh();
    c.start_session_at(Vec::new(), now()).await.expect("start");
    let resolution = c
        .resolve_event_at("confession_event", Some(index), now())
        .await
        .expect("resolve");

    assert_eq!(resolution.record.choice_index, Some(index));
    assert_eq!(resolution.record.outcome.as_deref(), Some(choice.text.as_str()));
    assert_eq!(resolution.response.as_deref(), Some(choice.response.as_str()));
    let completed = &c.state().completed_events;
    assert!(completed.iter().any(|e| e == "confession_event"));
    assert!(completed.iter().any(|e| e == "confession_accepted"));

    let history = c
        .store()
        .completed_events(&EventFilter::for_event("confession_event"))
        .expect("history");
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn resolution_rejects_bad_input() {
    let mut c = fresh();
    c.start_session_at(Vec::new(), now()).await.expect("start");

    let err = c.resolve_event("no_such_event", None).await.expect_err("unknown");
    assert!(matches!(err, SessionError::Core(HeartlineError::UnknownEvent(ref id)) if id == "no_such_event"));

    let available = find_event("first_deep_conversation").expect("entry").choices().len();
    let err = c
        .resolve_event("first_deep_conversation", Some(available))
        .await
        .expect_err("out of range");
    assert!(matches!(
        err,
        SessionError::Core(HeartlineError::InvalidChoice { index, available: a, .. })
            if index == available && a == available
    ));
    assert!(c.state().completed_events.is_empty());
}

// ---------------------------------------------------------------------------
// Memory facts
// ---------------------------------------------------------------------------

fn fact(content: &str, importance: u8) -> MemoryFact {
    MemoryFact {
        importance,
        ..MemoryFact::scored(content, 0.0, now())
    }
}

#[tokio::test]
async fn prompt_recalls_facts_the_message_points_at() {
    let c = fresh();
    for i in 0..12 {
        c.store().save_fact(&fact(&format!("filler fact {i}"), 80)).expect("save");
    }
    c.store().save_fact(&fact("Yui moved to Osaka", 75)).expect("save");
    c.store().save_fact(&fact("Yui likes pottery", 40)).expect("save");
    c.store().save_fact(&fact("Weekend hiking trip", 30)).expect("save");

    let messages = c
        .prompt_for("Do you remember when Yui moved? That hiking trip was fun.")
        .await;
    let system = &messages[0].content;
    assert!(system.contains("Yui moved to Osaka"));
    assert!(system.contains("Weekend hiking trip"));
    // trigger words only recall important facts
    assert!(!system.contains("Yui likes pottery"));
    assert_eq!(system.matches("- filler fact").count(), 8);
}

#[tokio::test]
async fn companion_remarks_become_facts() {
    let mut c = fresh();
    c.start_session_at(Vec::new(), now()).await.expect("start");
    let outcome = c
        .process_turn_at(
            "hello",
            "You work as a chef, right? Noted! Spicy food is your thing.",
            now(),
        )
        .await
        .expect("turn");
    assert!(outcome.new_facts.iter().any(|f| f == "Spicy food is your thing"));
    let stored = c.store().facts(10).expect("facts");
    assert!(stored.iter().any(|f| f.content == "Spicy food is your thing"));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sqlite_session_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("heartline.db");
    let config = HeartlineConfig::default();

    {
        let store = SqliteStore::open(&path, &config.persistence).expect("open");
        let mut c = companion(store, CharacterState::new_at("Aiko", now()));
        c.start_session_at(Vec::new(), now()).await.expect("start");
        c.process_turn_at("Hi! I work as a nurse.", "Nice to meet you!", now())
            .await
            .expect("turn");
        c.resolve_event_at("first_conversation", None, now())
            .await
            .expect("resolve");
        c.end_session().await.expect("end");
    }

    let store = SqliteStore::open(&path, &config.persistence).expect("reopen");
    let mut c = companion(store, CharacterState::new_at("Someone else", now()));
    let later = now() + Duration::hours(2);
    let start = c.start_session_at(Vec::new(), later).await.expect("start");

    assert_eq!(c.state().name, "Aiko");
    assert_eq!(c.state().total_interactions, 1);
    assert_eq!(start.hours_away, Some(2.0));
    assert!(!start.triggered_events.iter().any(|e| e == "first_conversation"));

    let messages = c.prompt_for("Remember me?").await;
    assert!(messages[0].content.contains("User: a nurse"));
}
