//! Message impact calculator.
//!
//! Turns a [`MessageAnalysis`] into bounded per-stat deltas, then wraps it
//! into the baseline [`StateUpdates`] used by the turn pipeline.

use serde::{Deserialize, Serialize};

use crate::heuristics::{MessageAnalysis, TopicDepth, analyze};
use crate::rng::UniformSource;
use crate::types::{CharacterState, Emotion, MoodChange, StateUpdates};

/// Per-stat deltas produced by [`calculate_impact`].
///
/// Every field except `energy` is already clamped to its per-turn band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageImpact {
    /// Energy delta (unclamped here; clamped on application).
    pub energy: i32,
    /// Affection delta, [-5, 10].
    pub affection: i32,
    /// Trust delta, [-3, 5].
    pub trust: i32,
    /// Intimacy delta, [-2, 5].
    pub intimacy: i32,
    /// Comfort delta, [-3, 3].
    pub comfort: i32,
    /// Respect delta, [-2, 3].
    pub respect: i32,
}

/// Affection multiplier for the current relationship phase.
///
/// Honeymoon (< 300) accelerates growth, comfort (< 700) is neutral and the
/// deep-bond phase damps it.
#[must_use]
pub fn phase_multiplier(affection: i32) -> f64 {
    if affection < 300 {
        1.5
    } else if affection < 700 {
        1.0
    } else {
        0.7
    }
}

/// Compute bounded deltas for one message.
///
/// `variance` is the symmetric multiplicative jitter applied to affection and
/// trust (0.2 = ±20%); affection draws first, then trust.
#[must_use]
pub fn calculate_impact(
    analysis: &MessageAnalysis,
    state: &CharacterState,
    variance: f64,
    rng: &mut dyn UniformSource,
) -> MessageImpact {
    let mut d = MessageImpact {
        energy: -2,
        affection: 1,
        ..MessageImpact::default()
    };

    if analysis.sentiment > 0.3 {
        d.affection += 2;
        d.comfort += 1;
    } else if analysis.sentiment < -0.3 {
        d.affection -= 1;
        d.comfort -= 1;
    }

    match analysis.topic_depth {
        TopicDepth::Deep => {
            d.energy -= 2;
            d.affection += 2;
            d.intimacy += 2;
            d.trust += 1;
        }
        TopicDepth::Moderate => {
            d.energy -= 1;
            d.affection += 1;
            d.intimacy += 1;
        }
        TopicDepth::Shallow => d.comfort -= 1,
    }

    if analysis.has_emotional_content {
        d.intimacy += 2;
        d.trust += 1;
        d.affection += 1;
    }

    if analysis.is_question {
        d.respect += 1;
        d.trust += 1;
    }

    d.affection = floor_scale(d.affection, phase_multiplier(state.affection));

    let affection_factor = variance_factor(rng.next_unit(), variance);
    let trust_factor = variance_factor(rng.next_unit(), variance);
    d.affection = floor_scale(d.affection, affection_factor);
    d.trust = floor_scale(d.trust, trust_factor);

    d.affection = d.affection.clamp(-5, 10);
    d.trust = d.trust.clamp(-3, 5);
    d.intimacy = d.intimacy.clamp(-2, 5);
    d.comfort = d.comfort.clamp(-3, 3);
    d.respect = d.respect.clamp(-2, 3);
    d
}

fn variance_factor(draw: f64, variance: f64) -> f64 {
    1.0 + (draw - 0.5) * 2.0 * variance
}

#[allow(clippy::cast_possible_truncation)]
fn floor_scale(value: i32, factor: f64) -> i32 {
    (f64::from(value) * factor).floor() as i32
}

/// Heuristic-only delta for a user message: analyze, compute impact, and
/// derive a mood change and candidate memory.
///
/// All six stat deltas are present. A mood change appears only when the
/// sentiment magnitude exceeds 0.3.
#[must_use]
pub fn baseline_updates(
    text: &str,
    state: &CharacterState,
    variance: f64,
    rng: &mut dyn UniformSource,
) -> StateUpdates {
    let analysis = analyze(text);
    let impact = calculate_impact(&analysis, state, variance, rng);
    updates_from_impact(&analysis, impact)
}

/// Wrap a computed impact and its analysis into a baseline delta.
#[must_use]
pub fn updates_from_impact(analysis: &MessageAnalysis, impact: MessageImpact) -> StateUpdates {
    let s = analysis.sentiment;
    let emotion = if s > 0.5 {
        Some(Emotion::Happy)
    } else if s > 0.3 {
        Some(Emotion::Content)
    } else if s < -0.5 {
        Some(Emotion::Sad)
    } else if s < -0.3 {
        Some(Emotion::Anxious)
    } else {
        None
    };

    #[allow(clippy::cast_possible_truncation)]
    let mood_change = emotion.map(|emotion| {
        let cause = if s > 0.0 {
            "positive conversation"
        } else {
            "concerning conversation"
        };
        MoodChange::new(emotion, (s.abs() * 20.0).floor() as i32).with_cause(cause)
    });

    StateUpdates {
        mood_change,
        energy_delta: Some(impact.energy),
        affection_delta: Some(impact.affection),
        trust_delta: Some(impact.trust),
        intimacy_delta: Some(impact.intimacy),
        comfort_delta: Some(impact.comfort),
        respect_delta: Some(impact.respect),
        new_memory: analysis.extracted_facts.first().cloned(),
        triggered_event: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SequenceSource;

    fn midpoint() -> SequenceSource {
        SequenceSource::constant(0.5)
    }

    #[test]
    fn shallow_neutral_message_in_honeymoon() {
        let state = CharacterState::new("Aiko");
        let a = analyze("ok");
        let d = calculate_impact(&a, &state, 0.2, &mut midpoint());
        // base affection 1, ×1.5 floored
        assert_eq!(d.affection, 1);
        assert_eq!(d.energy, -2);
        assert_eq!(d.comfort, -1);
        assert_eq!(d.trust, 0);
    }

    #[test]
    fn deep_emotional_question_hits_caps() {
        let state = CharacterState::new("Aiko");
        let a = analyze("Do you ever feel like love and trust matter more than anything in life?");
        let d = calculate_impact(&a, &state, 0.2, &mut midpoint());
        assert_eq!(d.energy, -4);
        assert_eq!(d.intimacy, 4);
        assert_eq!(d.trust, 3);
        assert_eq!(d.respect, 1);
        assert!(d.affection <= 10);
    }

    #[test]
    fn deep_bond_damps_affection() {
        let mut state = CharacterState::new("Aiko");
        state.affection = 900;
        let a = analyze("thank you, that was wonderful");
        let d = calculate_impact(&a, &state, 0.0, &mut midpoint());
        // (1 + 2) × 0.7 floors to 2
        assert_eq!(d.affection, 2);
    }

    #[test]
    fn variance_extremes_stay_within_band() {
        let state = CharacterState::new("Aiko");
        let a = analyze("I love you so much, you are amazing and wonderful!! <3");
        for draw in [0.0, 0.999] {
            let mut src = SequenceSource::constant(draw);
            let d = calculate_impact(&a, &state, 0.2, &mut src);
            assert!((-5..=10).contains(&d.affection));
            assert!((-3..=5).contains(&d.trust));
        }
    }

    #[test]
    fn baseline_mood_follows_sentiment() {
        let state = CharacterState::new("Aiko");
        let up = baseline_updates("haha awesome, thanks!", &state, 0.2, &mut midpoint());
        let mood = up.mood_change.expect("mood");
        assert_eq!(mood.emotion, Emotion::Happy);
        assert_eq!(mood.intensity_delta, Some(20));
        assert_eq!(mood.cause.as_deref(), Some("positive conversation"));
        assert!(up.energy_delta.is_some());

        let flat = baseline_updates("ok", &state, 0.2, &mut midpoint());
        assert!(flat.mood_change.is_none());
        assert!(flat.respect_delta.is_some());
    }

    #[test]
    fn baseline_memory_is_first_fact() {
        let state = CharacterState::new("Aiko");
        let up = baseline_updates("I'm Jun and I enjoy painting", &state, 0.2, &mut midpoint());
        assert_eq!(up.new_memory.as_deref(), Some("User said: I'm Jun"));
    }
}
