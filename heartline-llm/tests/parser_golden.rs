//! Response parser golden set.
//!
//! Curated generated replies and the dialogue/directive each must produce,
//! plus property checks that no input escapes the directive bounds.

use proptest::prelude::*;

use heartline_core::{Emotion, StateUpdates};
use heartline_llm::{FALLBACK_DIALOGUE, parse_response};

/// A golden parser case.
struct GoldenCase {
    /// Human-readable name.
    name: &'static str,
    /// Raw generated text.
    raw: String,
    /// Exact dialogue expected after cleanup.
    dialogue: &'static str,
    /// Expected bounded directive, `None` when nothing should be found.
    directive: Option<StateUpdates>,
    /// Whether a parse error must be reported.
    parse_error: bool,
}

fn fenced(body: &str) -> String {
    format!("```json\n{body}\n```")
}

fn golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            name: "clamped_fenced_block",
            raw: format!(
                "*grins* That's the nicest thing anyone has said to me today!\n{}",
                fenced(r#"{"affection_delta":100,"trust_delta":-50}"#)
            ),
            dialogue: "That's the nicest thing anyone has said to me today!",
            directive: Some(StateUpdates {
                affection_delta: Some(20),
                trust_delta: Some(-10),
                ..StateUpdates::default()
            }),
            parse_error: false,
        },
        GoldenCase {
            name: "all_secondary_stats_clamped",
            raw: format!(
                "Nice! {}",
                fenced(r#"{"intimacy_delta":99,"comfort_delta":-99,"respect_delta":99}"#)
            ),
            dialogue: "Nice!",
            directive: Some(StateUpdates {
                intimacy_delta: Some(10),
                comfort_delta: Some(-10),
                respect_delta: Some(10),
                ..StateUpdates::default()
            }),
            parse_error: false,
        },
        GoldenCase {
            name: "invalid_emotion_dropped",
            raw: format!(
                "Hey! {}",
                fenced(r#"{"mood_change":{"emotion":"INVALID","intensity_delta":5}}"#)
            ),
            dialogue: "Hey!",
            directive: Some(StateUpdates::default()),
            parse_error: false,
        },
        GoldenCase {
            name: "text_fields_pass_through",
            raw: format!(
                "Ok! {}",
                fenced(r#"{"new_memory":" User likes cats ","triggered_event":"random_compliment"}"#)
            ),
            dialogue: "Ok!",
            directive: Some(StateUpdates {
                new_memory: Some("User likes cats".into()),
                triggered_event: Some("random_compliment".into()),
                ..StateUpdates::default()
            }),
            parse_error: false,
        },
        GoldenCase {
            name: "null_text_fields_ignored",
            raw: format!(
                "Ok {}",
                fenced(r#"{"new_memory":null,"triggered_event":null,"affection_delta":1}"#)
            ),
            dialogue: "Ok",
            directive: Some(StateUpdates {
                affection_delta: Some(1),
                ..StateUpdates::default()
            }),
            parse_error: false,
        },
        GoldenCase {
            name: "broken_fenced_block",
            raw: "Hey!\n```json\n{broken json\n```".into(),
            dialogue: "Hey!",
            directive: None,
            parse_error: true,
        },
        GoldenCase {
            name: "inline_object",
            raw: r#"Sure thing! {"affection_delta": 3, "trust_delta": 1}"#.into(),
            dialogue: "Sure thing!",
            directive: Some(StateUpdates {
                affection_delta: Some(3),
                trust_delta: Some(1),
                ..StateUpdates::default()
            }),
            parse_error: false,
        },
        GoldenCase {
            name: "speaker_labels_per_line",
            raw: "Aiko: Morning!\nAiko: Did you sleep well?".into(),
            dialogue: "Morning!\nDid you sleep well?",
            directive: None,
            parse_error: false,
        },
        GoldenCase {
            name: "only_stage_directions",
            raw: "*nods* (smiles)".into(),
            dialogue: FALLBACK_DIALOGUE,
            directive: None,
            parse_error: false,
        },
        GoldenCase {
            name: "blank_runs_collapsed",
            raw: "First thought.\n\n\n\n(sighs happily)\n\n\nSecond thought.".into(),
            dialogue: "First thought.\n\nSecond thought.",
            directive: None,
            parse_error: false,
        },
    ]
}

#[test]
fn golden_parser_cases() {
    for case in golden_cases() {
        let parsed = parse_response(&case.raw);
        assert_eq!(parsed.dialogue, case.dialogue, "[{}] dialogue", case.name);
        assert_eq!(parsed.directive, case.directive, "[{}] directive", case.name);
        assert_eq!(
            parsed.parse_error.is_some(),
            case.parse_error,
            "[{}] parse error: {:?}",
            case.name,
            parsed.parse_error
        );
    }
}

#[test]
fn mood_directive_round_trip() {
    let raw = format!(
        "Oh that is so sweet of you!\n\n{}",
        fenced(r#"{"mood_change":{"emotion":"Flustered","intensity_delta":12.4},"affection_delta":5}"#)
    );
    let parsed = parse_response(&raw);
    let directive = parsed.directive.expect("directive");
    let mood = directive.mood_change.expect("mood");
    assert_eq!(mood.emotion, Emotion::Flustered);
    assert_eq!(mood.intensity_delta, Some(12));
    assert_eq!(directive.affection_delta, Some(5));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn dialogue_never_empty(raw in ".{0,200}") {
        prop_assert!(!parse_response(&raw).dialogue.is_empty());
    }

    #[test]
    fn fenced_deltas_always_bounded(
        affection in -1.0e6..1.0e6f64,
        trust in -1.0e6..1.0e6f64,
        intimacy in -1.0e6..1.0e6f64,
        intensity in -1.0e6..1.0e6f64,
    ) {
        let body = format!(
            r#"{{"mood_change":{{"emotion":"curious","intensity_delta":{intensity}}},"affection_delta":{affection},"trust_delta":{trust},"intimacy_delta":{intimacy}}}"#
        );
        let parsed = parse_response(&format!("Hmm. {}", fenced(&body)));
        let d = parsed.directive.expect("directive");
        prop_assert!(d.affection_delta.is_some_and(|v| (-20..=20).contains(&v)));
        prop_assert!(d.trust_delta.is_some_and(|v| (-10..=10).contains(&v)));
        prop_assert!(d.intimacy_delta.is_some_and(|v| (-10..=10).contains(&v)));
        let mood = d.mood_change.expect("mood");
        prop_assert!(mood.intensity_delta.is_some_and(|v| (-30..=30).contains(&v)));
        prop_assert_eq!(d.energy_delta, None);
    }
}
