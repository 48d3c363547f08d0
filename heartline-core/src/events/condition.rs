//! Event trigger conditions.
//!
//! Conditions are a closed, serde-tagged sum type. Anything the deserializer
//! does not recognise lands in [`Condition::Unknown`], which is logged and
//! never satisfied.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rng::UniformSource;
use crate::stages::is_stage_at_least;
use crate::types::{CharacterState, Emotion, RelationshipStage, hours_between};

/// Coarse local time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    /// 05:00–11:59.
    Morning,
    /// 12:00–16:59.
    Afternoon,
    /// 17:00–20:59.
    Evening,
    /// 21:00–04:59.
    Night,
}

impl TimeOfDay {
    /// Bucket for a local hour (0–23).
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }
}

/// Inputs that come from outside the state: the local clock and the message
/// being answered (if any).
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Local wall-clock time.
    pub now: DateTime<FixedOffset>,
    /// Current user message.
    pub message: Option<&'a str>,
}

impl<'a> EvaluationContext<'a> {
    /// Context at `now` with no message.
    #[must_use]
    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self { now, message: None }
    }

    /// Attach the current user message.
    #[must_use]
    pub fn with_message(mut self, message: &'a str) -> Self {
        self.message = Some(message);
        self
    }

    /// `now` in UTC.
    #[must_use]
    pub fn now_utc(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }
}

/// One trigger condition. An event fires only when all of its conditions hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// `affection >= value`.
    MinAffection {
        /// Threshold.
        value: i32,
    },
    /// `trust >= value`.
    MinTrust {
        /// Threshold.
        value: i32,
    },
    /// `intimacy >= value`.
    MinIntimacy {
        /// Threshold.
        value: i32,
    },
    /// `comfort >= value`.
    MinComfort {
        /// Threshold.
        value: i32,
    },
    /// `respect >= value`.
    MinRespect {
        /// Threshold.
        value: i32,
    },
    /// `energy <= value`.
    MaxEnergy {
        /// Threshold.
        value: i32,
    },
    /// Stage equals `value`.
    RelationshipStage {
        /// Required stage.
        value: RelationshipStage,
    },
    /// Stage is at least `value` in progression order.
    RelationshipStageMin {
        /// Minimum stage.
        value: RelationshipStage,
    },
    /// `days_known >= value`.
    DaysKnown {
        /// Threshold.
        value: u32,
    },
    /// `total_interactions >= value`.
    TotalInteractions {
        /// Threshold.
        value: u32,
    },
    /// `current_streak >= value`.
    ConsecutiveDays {
        /// Threshold.
        value: u32,
    },
    /// Event `value` has a completed record.
    EventCompleted {
        /// Event identifier.
        value: String,
    },
    /// Event `value` has no completed record.
    EventNotCompleted {
        /// Event identifier.
        value: String,
    },
    /// Local time falls in the bucket.
    TimeOfDay {
        /// Bucket.
        value: TimeOfDay,
    },
    /// Local weekday equals `value` (0 = Sunday).
    DayOfWeek {
        /// Weekday.
        value: u32,
    },
    /// A uniform draw is below `value`.
    RandomChance {
        /// Probability in [0, 1].
        value: f64,
    },
    /// The current message contains `value` (case-insensitive).
    KeywordMentioned {
        /// Keyword.
        value: String,
    },
    /// Primary mood equals `value`.
    MoodIs {
        /// Emotion.
        value: Emotion,
    },
    /// `mood.intensity >= value`.
    MoodIntensityMin {
        /// Threshold.
        value: i32,
    },
    /// At least `value` hours since the last interaction (true if none).
    HoursSinceLastInteractionMin {
        /// Hours.
        value: f64,
    },
    /// At most `value` hours since the last interaction (false if none).
    HoursSinceLastInteractionMax {
        /// Hours.
        value: f64,
    },
    /// Unrecognised condition kind.
    #[serde(other)]
    Unknown,
}

impl Condition {
    /// Evaluate without consuming randomness. Returns `None` for
    /// [`Condition::RandomChance`], whose outcome depends on a draw.
    #[must_use]
    pub fn check_static(
        &self,
        state: &CharacterState,
        completed: &[String],
        ctx: &EvaluationContext<'_>,
    ) -> Option<bool> {
        let met = match self {
            Self::MinAffection { value } => state.affection >= *value,
            Self::MinTrust { value } => state.trust >= *value,
            Self::MinIntimacy { value } => state.intimacy >= *value,
            Self::MinComfort { value } => state.comfort >= *value,
            Self::MinRespect { value } => state.respect >= *value,
            Self::MaxEnergy { value } => state.energy <= *value,
            Self::RelationshipStage { value } => state.relationship_stage == *value,
            Self::RelationshipStageMin { value } => {
                is_stage_at_least(state.relationship_stage, *value)
            }
            Self::DaysKnown { value } => state.days_known >= *value,
            Self::TotalInteractions { value } => state.total_interactions >= *value,
            Self::ConsecutiveDays { value } => state.current_streak >= *value,
            Self::EventCompleted { value } => completed.contains(value),
            Self::EventNotCompleted { value } => !completed.contains(value),
            Self::TimeOfDay { value } => TimeOfDay::from_hour(ctx.now.hour()) == *value,
            Self::DayOfWeek { value } => ctx.now.weekday().num_days_from_sunday() == *value,
            Self::RandomChance { .. } => return None,
            Self::KeywordMentioned { value } => ctx
                .message
                .is_some_and(|m| m.to_lowercase().contains(&value.to_lowercase())),
            Self::MoodIs { value } => state.mood.primary == *value,
            Self::MoodIntensityMin { value } => state.mood.intensity >= *value,
            Self::HoursSinceLastInteractionMin { value } => state
                .last_interaction
                .is_none_or(|last| hours_between(last, ctx.now_utc()) >= *value),
            Self::HoursSinceLastInteractionMax { value } => state
                .last_interaction
                .is_some_and(|last| hours_between(last, ctx.now_utc()) <= *value),
            Self::Unknown => {
                warn!("Unknown event condition kind, treating as unmet");
                false
            }
        };
        Some(met)
    }

    /// Evaluate, drawing from `rng` for [`Condition::RandomChance`].
    pub fn check(
        &self,
        state: &CharacterState,
        completed: &[String],
        ctx: &EvaluationContext<'_>,
        rng: &mut dyn UniformSource,
    ) -> bool {
        match self.check_static(state, completed, ctx) {
            Some(met) => met,
            None => match self {
                Self::RandomChance { value } => rng.next_unit() < *value,
                _ => false,
            },
        }
    }
}
