//! Stage table and stage evaluator.
//!
//! The requirement table is immutable data. [`calculate_stage`] recomputes the
//! correct stage from scratch on every call: it walks the progression from the
//! top down and returns the first stage whose whole requirement set holds.
//! Gated stages need specific completed events, so no amount of raw stats can
//! skip over them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{AppMode, CharacterState, RelationshipStage};

// ---------------------------------------------------------------------------
// Requirements
// ---------------------------------------------------------------------------

/// Everything a state must satisfy to sit at a given stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRequirements {
    /// Minimum affection.
    pub min_affection: i32,
    /// Minimum trust.
    pub min_trust: i32,
    /// Minimum intimacy.
    pub min_intimacy: Option<i32>,
    /// Minimum comfort.
    pub min_comfort: Option<i32>,
    /// Minimum respect.
    pub min_respect: Option<i32>,
    /// Minimum whole days known.
    pub min_days_known: Option<u32>,
    /// Minimum total interactions.
    pub min_interactions: Option<u32>,
    /// Event identifiers that must all be completed.
    pub required_events: &'static [&'static str],
}

impl StageRequirements {
    const NONE: Self = Self {
        min_affection: 0,
        min_trust: 0,
        min_intimacy: None,
        min_comfort: None,
        min_respect: None,
        min_days_known: None,
        min_interactions: None,
        required_events: &[],
    };

    /// Whether `state` (with `completed` events) meets every requirement.
    #[must_use]
    pub fn is_met(&self, state: &CharacterState, completed: &[String]) -> bool {
        state.affection >= self.min_affection
            && state.trust >= self.min_trust
            && self.min_intimacy.is_none_or(|v| state.intimacy >= v)
            && self.min_comfort.is_none_or(|v| state.comfort >= v)
            && self.min_respect.is_none_or(|v| state.respect >= v)
            && self.min_days_known.is_none_or(|v| state.days_known >= v)
            && self
                .min_interactions
                .is_none_or(|v| state.total_interactions >= v)
            && self
                .required_events
                .iter()
                .all(|id| completed.iter().any(|c| c == id))
    }
}

/// Requirement table in progression order (lowest first).
pub static STAGE_REQUIREMENTS: [(RelationshipStage, StageRequirements); 8] = [
    (RelationshipStage::Stranger, StageRequirements::NONE),
    (
        RelationshipStage::Acquaintance,
        StageRequirements {
            min_affection: 50,
            min_trust: 20,
            min_interactions: Some(3),
            ..StageRequirements::NONE
        },
    ),
    (
        RelationshipStage::Friend,
        StageRequirements {
            min_affection: 150,
            min_trust: 50,
            min_days_known: Some(3),
            min_interactions: Some(10),
            ..StageRequirements::NONE
        },
    ),
    (
        RelationshipStage::CloseFriend,
        StageRequirements {
            min_affection: 300,
            min_trust: 70,
            min_comfort: Some(50),
            min_days_known: Some(7),
            min_interactions: Some(25),
            ..StageRequirements::NONE
        },
    ),
    (
        RelationshipStage::RomanticInterest,
        StageRequirements {
            min_affection: 450,
            min_trust: 75,
            min_intimacy: Some(30),
            min_days_known: Some(10),
            required_events: &["first_deep_conversation", "shared_vulnerability"],
            ..StageRequirements::NONE
        },
    ),
    (
        RelationshipStage::Dating,
        StageRequirements {
            min_affection: 600,
            min_trust: 85,
            min_intimacy: Some(50),
            min_days_known: Some(14),
            required_events: &["confession_accepted"],
            ..StageRequirements::NONE
        },
    ),
    (
        RelationshipStage::Committed,
        StageRequirements {
            min_affection: 800,
            min_trust: 95,
            min_intimacy: Some(75),
            min_comfort: Some(80),
            min_days_known: Some(30),
            required_events: &["commitment_discussion"],
            ..StageRequirements::NONE
        },
    ),
    (
        RelationshipStage::Soulmate,
        StageRequirements {
            min_affection: 950,
            min_trust: 100,
            min_intimacy: Some(90),
            min_comfort: Some(95),
            min_respect: Some(90),
            min_days_known: Some(60),
            required_events: &["deep_bond_moment"],
            ..StageRequirements::NONE
        },
    ),
];

/// Requirement record for a progression stage; `None` for `Companion`.
#[must_use]
pub fn requirements_for(stage: RelationshipStage) -> Option<&'static StageRequirements> {
    STAGE_REQUIREMENTS
        .iter()
        .find(|(s, _)| *s == stage)
        .map(|(_, req)| req)
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// The highest stage whose full requirement set is satisfied.
#[must_use]
pub fn calculate_stage(state: &CharacterState, completed: &[String]) -> RelationshipStage {
    STAGE_REQUIREMENTS
        .iter()
        .rev()
        .find(|(_, req)| req.is_met(state, completed))
        .map_or(RelationshipStage::Stranger, |(stage, _)| *stage)
}

/// `current >= minimum` in progression order.
///
/// `Companion` sits outside the ordering: it is never at least a progression
/// stage and no progression stage is at least `Companion`.
#[must_use]
pub fn is_stage_at_least(current: RelationshipStage, minimum: RelationshipStage) -> bool {
    match (current.order_index(), minimum.order_index()) {
        (Some(c), Some(m)) => c >= m,
        _ => false,
    }
}

/// Result of [`check_stage_transition`].
#[derive(Debug, Clone, PartialEq)]
pub struct StageTransition {
    /// The state with `relationship_stage` (and `updated_at`) refreshed.
    pub state: CharacterState,
    /// Whether the stage changed.
    pub transitioned: bool,
    /// Stage before the check.
    pub from: RelationshipStage,
    /// Stage after the check.
    pub to: RelationshipStage,
}

/// Recompute the stage and report whether it moved. Only touches
/// `relationship_stage` and `updated_at`; companion mode is left as is.
#[must_use]
pub fn check_stage_transition(state: &CharacterState, completed: &[String]) -> StageTransition {
    check_stage_transition_at(state, completed, Utc::now())
}

/// [`check_stage_transition`] with an explicit clock.
#[must_use]
pub fn check_stage_transition_at(
    state: &CharacterState,
    completed: &[String],
    now: DateTime<Utc>,
) -> StageTransition {
    let from = state.relationship_stage;
    if state.app_mode == AppMode::Companion {
        return StageTransition {
            state: state.clone(),
            transitioned: false,
            from,
            to: from,
        };
    }

    let to = calculate_stage(state, completed);
    let mut next = state.clone();
    let transitioned = to != from;
    if transitioned {
        info!(persona = %state.persona_id, %from, %to, "Relationship stage changed");
        next.relationship_stage = to;
        next.updated_at = now;
    }
    StageTransition {
        state: next,
        transitioned,
        from,
        to,
    }
}

// ---------------------------------------------------------------------------
// Behaviour descriptors
// ---------------------------------------------------------------------------

/// How formal the persona speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    /// No formality at all.
    None,
    /// Casual.
    Low,
    /// Polite.
    Medium,
    /// Reserved.
    High,
}

/// How much the persona shares about themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Openness {
    /// Guarded.
    Low,
    /// Some sharing.
    Medium,
    /// Open.
    High,
    /// Nothing held back.
    Full,
}

/// How romance colours the persona's dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RomanticTone {
    /// Platonic.
    None,
    /// Hints only.
    Subtle,
    /// Openly romantic.
    Open,
    /// Romance is the normal register.
    Natural,
    /// Deep, settled romance.
    Deep,
}

/// Behaviour descriptor attached to every stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageBehavior {
    /// Actions available at this stage.
    pub available_actions: &'static [&'static str],
    /// Formality of speech.
    pub formality: Formality,
    /// Self-disclosure level.
    pub openness: Openness,
    /// Romantic register.
    pub romantic: RomanticTone,
    /// Physical-affection level, 0–100.
    pub physical_affection: u8,
    /// Vulnerability level, 0–100.
    pub vulnerability: u8,
    /// Chance the persona initiates a topic, 0–1.
    pub initiation_chance: f64,
}

const ALL_ACTIONS: &[&str] = &["all"];

#[allow(clippy::too_many_arguments)]
const fn behavior(
    available_actions: &'static [&'static str],
    formality: Formality,
    openness: Openness,
    romantic: RomanticTone,
    physical_affection: u8,
    vulnerability: u8,
    initiation_chance: f64,
) -> StageBehavior {
    StageBehavior {
        available_actions,
        formality,
        openness,
        romantic,
        physical_affection,
        vulnerability,
        initiation_chance,
    }
}

/// Behaviour descriptor for `stage`.
#[must_use]
pub fn stage_behavior(stage: RelationshipStage) -> StageBehavior {
    use Formality as F;
    use Openness as O;
    use RomanticTone as R;

    match stage {
        RelationshipStage::Companion => {
            behavior(&["chat", "help", "advise"], F::Low, O::Medium, R::None, 0, 30, 0.3)
        }
        RelationshipStage::Stranger => {
            behavior(&["chat", "introduce"], F::High, O::Low, R::None, 0, 5, 0.1)
        }
        RelationshipStage::Acquaintance => behavior(
            &["chat", "ask_about_day", "share_interest"],
            F::Medium,
            O::Low,
            R::None,
            5,
            15,
            0.2,
        ),
        RelationshipStage::Friend => behavior(
            &["chat", "hang_out", "ask_advice", "share_problem", "joke_around"],
            F::Low,
            O::Medium,
            R::None,
            15,
            35,
            0.4,
        ),
        RelationshipStage::CloseFriend => behavior(
            &["chat", "deep_talk", "comfort", "share_secret", "plan_together"],
            F::None,
            O::High,
            R::None,
            30,
            60,
            0.5,
        ),
        RelationshipStage::RomanticInterest => behavior(
            &["chat", "flirt", "compliment", "hint_feelings", "nervous_moment"],
            F::None,
            O::High,
            R::Subtle,
            40,
            70,
            0.6,
        ),
        RelationshipStage::Dating => behavior(
            &["chat", "date", "express_love", "plan_future", "be_romantic"],
            F::None,
            O::Full,
            R::Open,
            70,
            85,
            0.7,
        ),
        RelationshipStage::Committed => {
            behavior(ALL_ACTIONS, F::None, O::Full, R::Natural, 90, 95, 0.8)
        }
        RelationshipStage::Soulmate => {
            behavior(ALL_ACTIONS, F::None, O::Full, R::Deep, 100, 100, 0.9)
        }
    }
}
