//! Time-decay calculator.
//!
//! Run once at session start with the hours of absence not yet decayed
//! (see [`CharacterState::hours_since_last_decay`]). Produces a delta rather than a new state so the caller can
//! apply it through the normal updater.
//!
//!   energy     full recovery after 6h, otherwise proportional (at least +1)
//!   affection  after 48h: floor(−aff × min(0.05, 0.01 × (days_away − 2))), |Δ| ≤ 50
//!   trust      after 168h: −2 per full week away, |Δ| ≤ 10
//!   mood       after 72h: melancholy, +min(30, 5 × whole days), "missing you"

use tracing::debug;

use crate::types::{CharacterState, Emotion, MoodChange, STAT_MAX, StateUpdates};

/// Hours after which affection starts to decay.
pub const AFFECTION_GRACE_HOURS: f64 = 48.0;
/// Hours after which trust starts to decay.
pub const TRUST_GRACE_HOURS: f64 = 168.0;
/// Hours after which the persona turns melancholy.
pub const MELANCHOLY_HOURS: f64 = 72.0;
/// Hours for a full energy recovery.
pub const FULL_REST_HOURS: f64 = 6.0;

/// Compute the decay/recovery delta for an absence of `hours_away`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn calculate_time_decay(state: &CharacterState, hours_away: f64) -> StateUpdates {
    let hours = if hours_away.is_finite() { hours_away.max(0.0) } else { 0.0 };
    let mut updates = StateUpdates::default();

    if state.energy < STAT_MAX {
        let missing = STAT_MAX - state.energy;
        updates.energy_delta = Some(if hours >= FULL_REST_HOURS {
            missing
        } else {
            let recovered = (f64::from(missing) * (hours / FULL_REST_HOURS).min(1.0)).ceil() as i32;
            recovered.max(1)
        });
    }

    if hours > AFFECTION_GRACE_HOURS && state.affection > 0 {
        let days_away = hours / 24.0 - 2.0;
        let rate = (0.01 * days_away).min(0.05);
        let delta = (-f64::from(state.affection) * rate).floor() as i32;
        if delta < 0 {
            updates.affection_delta = Some(delta.max(-50));
        }
    }

    if hours > TRUST_GRACE_HOURS && state.trust > 0 {
        let weeks = (hours / TRUST_GRACE_HOURS).floor() as i32;
        updates.trust_delta = Some(-(weeks * 2).min(10));
    }

    if hours > MELANCHOLY_HOURS {
        let days = (hours / 24.0).floor() as i32;
        updates.mood_change =
            Some(MoodChange::new(Emotion::Melancholy, (days * 5).min(30)).with_cause("missing you"));
    }

    debug!(
        persona = %state.persona_id,
        hours_away = hours,
        affection = ?updates.affection_delta,
        trust = ?updates.trust_delta,
        "Time decay computed"
    );
    updates
}
