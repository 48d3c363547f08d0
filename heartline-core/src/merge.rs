//! Update merger.
//!
//! Reconciles the heuristic baseline with the model-suggested directive.
//! The model may amplify affection and trust up to twice the baseline's
//! magnitude (with a small floor), is held to a fixed band on the secondary
//! stats, and never touches energy.

use crate::types::StateUpdates;

/// Minimum affection cap regardless of baseline.
pub const AFFECTION_CAP_FLOOR: i32 = 5;
/// Minimum trust cap regardless of baseline.
pub const TRUST_CAP_FLOOR: i32 = 3;
/// Fixed band for suggested intimacy, comfort and respect.
pub const SECONDARY_BAND: (i32, i32) = (-3, 5);

/// Merge a baseline delta with an optional model suggestion.
#[must_use]
pub fn merge_updates(baseline: &StateUpdates, suggested: Option<&StateUpdates>) -> StateUpdates {
    let Some(suggested) = suggested else {
        return baseline.clone();
    };

    StateUpdates {
        mood_change: suggested
            .mood_change
            .clone()
            .or_else(|| baseline.mood_change.clone()),
        energy_delta: baseline.energy_delta,
        affection_delta: capped(
            baseline.affection_delta,
            suggested.affection_delta,
            AFFECTION_CAP_FLOOR,
        ),
        trust_delta: capped(baseline.trust_delta, suggested.trust_delta, TRUST_CAP_FLOOR),
        intimacy_delta: banded(baseline.intimacy_delta, suggested.intimacy_delta),
        comfort_delta: banded(baseline.comfort_delta, suggested.comfort_delta),
        respect_delta: banded(baseline.respect_delta, suggested.respect_delta),
        new_memory: suggested
            .new_memory
            .clone()
            .or_else(|| baseline.new_memory.clone()),
        triggered_event: suggested
            .triggered_event
            .clone()
            .or_else(|| baseline.triggered_event.clone()),
    }
}

/// `cap = max(2·|baseline|, floor)`; the suggestion is clamped to `[-cap, cap]`.
fn capped(baseline: Option<i32>, suggested: Option<i32>, floor: i32) -> Option<i32> {
    match suggested {
        Some(value) => {
            let cap = baseline.unwrap_or(0).saturating_abs().saturating_mul(2).max(floor);
            Some(value.clamp(-cap, cap))
        }
        None => baseline,
    }
}

fn banded(baseline: Option<i32>, suggested: Option<i32>) -> Option<i32> {
    suggested
        .map(|v| v.clamp(SECONDARY_BAND.0, SECONDARY_BAND.1))
        .or(baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Emotion, MoodChange};

    fn with_affection(b: i32) -> StateUpdates {
        StateUpdates {
            affection_delta: Some(b),
            energy_delta: Some(-2),
            ..StateUpdates::default()
        }
    }

    #[test]
    fn affection_cap_examples() {
        let s = with_affection(20);
        assert_eq!(merge_updates(&with_affection(3), Some(&s)).affection_delta, Some(6));
        let s = with_affection(10);
        assert_eq!(merge_updates(&with_affection(1), Some(&s)).affection_delta, Some(5));
        let s = with_affection(-20);
        assert_eq!(merge_updates(&with_affection(0), Some(&s)).affection_delta, Some(-5));
    }

    #[test]
    fn trust_floor_is_three() {
        let base = StateUpdates {
            trust_delta: Some(1),
            ..StateUpdates::default()
        };
        let s = StateUpdates {
            trust_delta: Some(9),
            ..StateUpdates::default()
        };
        assert_eq!(merge_updates(&base, Some(&s)).trust_delta, Some(3));
    }

    #[test]
    fn energy_never_from_suggestion() {
        let s = StateUpdates {
            energy_delta: Some(50),
            ..StateUpdates::default()
        };
        let merged = merge_updates(&with_affection(1), Some(&s));
        assert_eq!(merged.energy_delta, Some(-2));
    }

    #[test]
    fn secondary_stats_use_fixed_band() {
        let base = StateUpdates {
            comfort_delta: Some(1),
            ..StateUpdates::default()
        };
        let s = StateUpdates {
            intimacy_delta: Some(10),
            respect_delta: Some(-10),
            ..StateUpdates::default()
        };
        let merged = merge_updates(&base, Some(&s));
        assert_eq!(merged.intimacy_delta, Some(5));
        assert_eq!(merged.respect_delta, Some(-3));
        assert_eq!(merged.comfort_delta, Some(1));
    }

    #[test]
    fn suggested_mood_and_memory_override() {
        let base = StateUpdates {
            mood_change: Some(MoodChange::new(Emotion::Happy, 10)),
            new_memory: Some("User said: I'm Jun".into()),
            ..StateUpdates::default()
        };
        let s = StateUpdates {
            mood_change: Some(MoodChange::new(Emotion::Flustered, 5)),
            ..StateUpdates::default()
        };
        let merged = merge_updates(&base, Some(&s));
        assert_eq!(merged.mood_change.map(|m| m.emotion), Some(Emotion::Flustered));
        assert_eq!(merged.new_memory.as_deref(), Some("User said: I'm Jun"));
    }

    #[test]
    fn no_suggestion_returns_baseline() {
        let base = with_affection(4);
        assert_eq!(merge_updates(&base, None), base);
    }
}
