//! Event evaluator: gating, catalogue sweep and near-trigger diagnostics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::condition::{Condition, EvaluationContext};
use super::definition::{CompletedEventRecord, EventDefinition};
use crate::rng::UniformSource;
use crate::types::CharacterState;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Whether `event` is blocked by its repeat rules.
///
/// One-time events are blocked by any completed record. Repeatable events
/// with a cooldown are blocked while their most recent record is younger
/// than `cooldown_days`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn is_event_on_cooldown(
    event: &EventDefinition,
    records: &[CompletedEventRecord],
    now: DateTime<Utc>,
) -> bool {
    let mut own = records.iter().filter(|r| r.event_id == event.id);
    if event.one_time {
        return own.next().is_some();
    }
    let Some(cooldown) = event.cooldown_days else {
        return false;
    };
    own.map(|r| r.completed_at)
        .max()
        .is_some_and(|last| {
            let elapsed_days = (now - last).num_milliseconds() as f64 / MS_PER_DAY;
            elapsed_days < f64::from(cooldown)
        })
}

/// Outcome of checking a single event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCheck {
    /// All conditions held and the event is not gated.
    pub triggered: bool,
    /// Conditions that did not hold (empty when gated).
    pub failed_conditions: Vec<Condition>,
}

fn completed_ids(records: &[CompletedEventRecord]) -> Vec<String> {
    records.iter().map(|r| r.event_id.clone()).collect()
}

/// Check one event against the state and history.
pub fn check_event(
    event: &EventDefinition,
    state: &CharacterState,
    records: &[CompletedEventRecord],
    ctx: &EvaluationContext<'_>,
    rng: &mut dyn UniformSource,
) -> EventCheck {
    check_event_with_ids(event, state, records, &completed_ids(records), ctx, rng)
}

fn check_event_with_ids(
    event: &EventDefinition,
    state: &CharacterState,
    records: &[CompletedEventRecord],
    ids: &[String],
    ctx: &EvaluationContext<'_>,
    rng: &mut dyn UniformSource,
) -> EventCheck {
    if is_event_on_cooldown(event, records, ctx.now_utc()) {
        return EventCheck {
            triggered: false,
            failed_conditions: Vec::new(),
        };
    }

    let failed_conditions: Vec<Condition> = event
        .conditions
        .iter()
        .filter(|c| !c.check(state, ids, ctx, rng))
        .cloned()
        .collect();

    EventCheck {
        triggered: failed_conditions.is_empty(),
        failed_conditions,
    }
}

/// Sweep the catalogue and return every event that fires, highest priority
/// first (ties keep catalogue order).
pub fn check_all_events<'e>(
    events: &'e [EventDefinition],
    state: &CharacterState,
    records: &[CompletedEventRecord],
    ctx: &EvaluationContext<'_>,
    rng: &mut dyn UniformSource,
) -> Vec<&'e EventDefinition> {
    let ids = completed_ids(records);
    let mut triggered: Vec<&EventDefinition> = events
        .iter()
        .filter(|event| check_event_with_ids(event, state, records, &ids, ctx, rng).triggered)
        .collect();
    triggered.sort_by(|a, b| b.priority.cmp(&a.priority));
    debug!(
        persona = %state.persona_id,
        triggered = triggered.len(),
        top = triggered.first().map(|e| e.id.as_str()),
        "Event sweep complete"
    );
    triggered
}

/// An event that is partly satisfied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearTrigger<'e> {
    /// The event.
    pub event: &'e EventDefinition,
    /// Percentage of conditions met, floored.
    pub progress: u32,
    /// Conditions not yet met (random conditions are never listed).
    pub missing_conditions: Vec<&'e Condition>,
}

/// Advisory list of events that are more than `min_progress`% but less than
/// 100% satisfied, most advanced first. Random conditions count as half met
/// and no randomness is consumed.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn near_trigger_events<'e>(
    events: &'e [EventDefinition],
    state: &CharacterState,
    records: &[CompletedEventRecord],
    ctx: &EvaluationContext<'_>,
    min_progress: u32,
) -> Vec<NearTrigger<'e>> {
    let ids = completed_ids(records);
    let now = ctx.now_utc();

    let mut near: Vec<NearTrigger<'e>> = events
        .iter()
        .filter(|event| !is_event_on_cooldown(event, records, now))
        .filter_map(|event| {
            let total = event.conditions.len();
            if total == 0 {
                return None;
            }
            let mut met = 0.0_f64;
            let mut missing = Vec::new();
            for condition in &event.conditions {
                match condition.check_static(state, &ids, ctx) {
                    None => met += 0.5,
                    Some(true) => met += 1.0,
                    Some(false) => missing.push(condition),
                }
            }
            let progress = met / total as f64 * 100.0;
            (progress > f64::from(min_progress) && progress < 100.0).then(|| NearTrigger {
                event,
                progress: progress.floor() as u32,
                missing_conditions: missing,
            })
        })
        .collect();

    near.sort_by(|a, b| b.progress.cmp(&a.progress));
    near
}
