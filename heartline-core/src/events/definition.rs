//! Event definitions and completed-event records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::Condition;
use crate::types::StateUpdates;

/// Event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Relationship milestone.
    Milestone,
    /// Random flavour moment.
    Random,
    /// Fixed-schedule event.
    Scheduled,
    /// Fires when a condition set lines up.
    Conditional,
    /// Anniversary of first meeting.
    Anniversary,
}

/// One branch of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneChoice {
    /// What the user picks.
    pub text: String,
    /// What the companion says back.
    pub response: String,
    /// Delta applied when this branch is chosen.
    #[serde(default)]
    pub state_changes: StateUpdates,
    /// Outcome marker recorded as completed alongside the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_scene_id: Option<String>,
}

/// Narrative scene attached to an event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Narration before the companion speaks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    /// What the companion says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
    /// Branches, if the scene is interactive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<SceneChoice>,
    /// Narration after the scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outro: Option<String>,
}

/// Immutable catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Conjunctive trigger conditions.
    pub conditions: Vec<Condition>,
    /// Optional narrative scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<Scene>,
    /// Delta applied when the event resolves without a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_changes: Option<StateUpdates>,
    /// Content unlocked by the event.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unlocks: Vec<String>,
    /// Fires at most once.
    pub one_time: bool,
    /// Minimum days between repeats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_days: Option<u32>,
    /// Higher fires first.
    pub priority: i32,
}

impl EventDefinition {
    /// Choices offered by the scene (empty when there is no scene).
    #[must_use]
    pub fn choices(&self) -> &[SceneChoice] {
        self.scene
            .as_ref()
            .map(|s| s.choices.as_slice())
            .unwrap_or_default()
    }
}

/// Append-only record of a resolved event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedEventRecord {
    /// Store-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Event identifier.
    pub event_id: String,
    /// Event category.
    pub event_type: EventType,
    /// Chosen branch, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_index: Option<usize>,
    /// Outcome label (the chosen branch's text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// Delta that was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_changes: Option<StateUpdates>,
    /// When the event was resolved.
    pub completed_at: DateTime<Utc>,
}

/// Filter for reading back completed records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Only records for this event.
    pub event_id: Option<String>,
    /// At most this many records (most recent first).
    pub limit: Option<usize>,
}

impl EventFilter {
    /// Records for one event.
    #[must_use]
    pub fn for_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            limit: None,
        }
    }

    /// Cap the number of records.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `record` passes the id filter.
    #[must_use]
    pub fn matches(&self, record: &CompletedEventRecord) -> bool {
        self.event_id.as_ref().is_none_or(|id| *id == record.event_id)
    }
}
