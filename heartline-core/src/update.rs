//! State updater and interaction bookkeeping.
//!
//! Both functions take a snapshot and return a fresh one; the input is never
//! mutated. Every bounded field is clamped as it is written.

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::types::{AFFECTION_MAX, CharacterState, STAT_MAX, StateUpdates};

/// Apply a delta to a state snapshot, refreshing `updated_at` to now.
#[must_use]
pub fn apply_state_updates(state: &CharacterState, updates: &StateUpdates) -> CharacterState {
    apply_state_updates_at(state, updates, Utc::now())
}

/// [`apply_state_updates`] with an explicit clock.
#[must_use]
pub fn apply_state_updates_at(
    state: &CharacterState,
    updates: &StateUpdates,
    now: DateTime<Utc>,
) -> CharacterState {
    let mut next = state.clone();

    if let Some(change) = &updates.mood_change {
        next.mood.primary = change.emotion;
        next.mood.intensity =
            add_clamped(next.mood.intensity, change.intensity_delta.unwrap_or(0), STAT_MAX);
        if let Some(cause) = &change.cause {
            next.mood.push_cause(cause.clone());
        }
    }

    let bounded = [
        (&mut next.energy, updates.energy_delta, STAT_MAX),
        (&mut next.affection, updates.affection_delta, AFFECTION_MAX),
        (&mut next.trust, updates.trust_delta, STAT_MAX),
        (&mut next.intimacy, updates.intimacy_delta, STAT_MAX),
        (&mut next.comfort, updates.comfort_delta, STAT_MAX),
        (&mut next.respect, updates.respect_delta, STAT_MAX),
    ];
    for (field, delta, max) in bounded {
        if let Some(delta) = delta {
            *field = add_clamped(*field, delta, max);
        }
    }

    next.updated_at = now;
    trace!(persona = %state.persona_id, affection = next.affection, trust = next.trust, "State updated");
    next
}

fn add_clamped(current: i32, delta: i32, max: i32) -> i32 {
    current.saturating_add(delta).clamp(0, max)
}

/// Count one interaction at `now`.
///
/// Increments the counter, stamps `last_interaction`, recomputes `days_known`
/// from `first_met`, and advances the daily streak: same calendar day leaves it
/// unchanged, the next day extends it, any longer gap restarts it at 1.
#[must_use]
pub fn record_interaction(state: &CharacterState, now: DateTime<Utc>) -> CharacterState {
    let mut next = state.clone();
    next.total_interactions = next.total_interactions.saturating_add(1);
    next.last_interaction = Some(now);
    next.days_known = u32::try_from((now - next.first_met).num_days().max(0)).unwrap_or(u32::MAX);

    let today = now.date_naive();
    match next.streak_last_date.map(|d| (today - d.date_naive()).num_days()) {
        Some(0) => {}
        Some(1) => next.current_streak = next.current_streak.saturating_add(1),
        _ => next.current_streak = 1,
    }
    if next.current_streak == 0 {
        next.current_streak = 1;
    }
    next.streak_last_date = Some(now);
    next.longest_streak = next.longest_streak.max(next.current_streak);
    next.updated_at = now;
    next
}
