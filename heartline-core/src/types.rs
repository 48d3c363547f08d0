//! Core type definitions for the heartline relationship engine.
//!
//! [`CharacterState`] is the long-lived snapshot owned by the persistence
//! collaborator; [`StateUpdates`] is the ephemeral per-turn delta applied to it.
//! All bounded numeric fields are clamped on every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Upper bound for affection (the only stat on a 0–1000 scale).
pub const AFFECTION_MAX: i32 = 1000;
/// Upper bound for trust, intimacy, comfort, respect, energy and mood intensity.
pub const STAT_MAX: i32 = 100;
/// Mood causes retained (oldest evicted first).
pub const MAX_MOOD_CAUSES: usize = 5;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Unique identifier for a user/persona pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonaId(pub Uuid);

impl PersonaId {
    /// Create a new random persona ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PersonaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Emotion & Mood
// ---------------------------------------------------------------------------

/// The fixed emotion vocabulary shared by the engine and the directive parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// Joyful.
    Happy,
    /// Down.
    Sad,
    /// Energised.
    Excited,
    /// Uneasy.
    Anxious,
    /// Quietly satisfied.
    Content,
    /// Irritated.
    Frustrated,
    /// Inquisitive.
    Curious,
    /// Warm toward the user.
    Affectionate,
    /// Teasing, light.
    Playful,
    /// Wistful; the mood drifted into after long absences.
    Melancholy,
    /// Embarrassed, nervous.
    Flustered,
    /// Baseline.
    Neutral,
}

impl Emotion {
    /// Every valid emotion, in declaration order.
    pub const ALL: [Emotion; 12] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Excited,
        Emotion::Anxious,
        Emotion::Content,
        Emotion::Frustrated,
        Emotion::Curious,
        Emotion::Affectionate,
        Emotion::Playful,
        Emotion::Melancholy,
        Emotion::Flustered,
        Emotion::Neutral,
    ];

    /// Wire name of the emotion.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Excited => "excited",
            Self::Anxious => "anxious",
            Self::Content => "content",
            Self::Frustrated => "frustrated",
            Self::Curious => "curious",
            Self::Affectionate => "affectionate",
            Self::Playful => "playful",
            Self::Melancholy => "melancholy",
            Self::Flustered => "flustered",
            Self::Neutral => "neutral",
        }
    }

    /// Case-insensitive lookup; `None` for anything outside the vocabulary.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|e| e.as_str() == lowered)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown emotion: {s}"))
    }
}

/// Current mood of the companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodState {
    /// Dominant emotion.
    pub primary: Emotion,
    /// Strength of the emotion, 0–100.
    pub intensity: i32,
    /// Most recent causes, oldest first, at most [`MAX_MOOD_CAUSES`].
    pub causes: Vec<String>,
}

impl MoodState {
    /// Create a mood, clamping intensity to [0, 100].
    #[must_use]
    pub fn new(primary: Emotion, intensity: i32) -> Self {
        Self {
            primary,
            intensity: intensity.clamp(0, STAT_MAX),
            causes: Vec::new(),
        }
    }

    /// Append a cause, evicting the oldest once more than five are held.
    pub fn push_cause(&mut self, cause: impl Into<String>) {
        self.causes.push(cause.into());
        if self.causes.len() > MAX_MOOD_CAUSES {
            let excess = self.causes.len() - MAX_MOOD_CAUSES;
            self.causes.drain(..excess);
        }
    }
}

impl Default for MoodState {
    fn default() -> Self {
        Self::new(Emotion::Neutral, 50)
    }
}

// ---------------------------------------------------------------------------
// Relationship Stage
// ---------------------------------------------------------------------------

/// Discrete relationship stage.
///
/// The eight progression stages are strictly ordered; `Companion` is a locked
/// variant used by companion mode and is never reached by progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStage {
    /// Locked stage for companion mode.
    Companion,
    /// Just met.
    Stranger,
    /// Polite familiarity.
    Acquaintance,
    /// Casual and relaxed.
    Friend,
    /// Open and vulnerable.
    CloseFriend,
    /// Feelings developing.
    RomanticInterest,
    /// Together.
    Dating,
    /// Deep commitment.
    Committed,
    /// Profound bond.
    Soulmate,
}

impl RelationshipStage {
    /// The progression order, lowest first. `Companion` is not part of it.
    pub const PROGRESSION: [RelationshipStage; 8] = [
        RelationshipStage::Stranger,
        RelationshipStage::Acquaintance,
        RelationshipStage::Friend,
        RelationshipStage::CloseFriend,
        RelationshipStage::RomanticInterest,
        RelationshipStage::Dating,
        RelationshipStage::Committed,
        RelationshipStage::Soulmate,
    ];

    /// Position in the progression, or `None` for the locked companion stage.
    #[must_use]
    pub fn order_index(self) -> Option<usize> {
        Self::PROGRESSION.iter().position(|s| *s == self)
    }

    /// Wire name of the stage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Companion => "companion",
            Self::Stranger => "stranger",
            Self::Acquaintance => "acquaintance",
            Self::Friend => "friend",
            Self::CloseFriend => "close_friend",
            Self::RomanticInterest => "romantic_interest",
            Self::Dating => "dating",
            Self::Committed => "committed",
            Self::Soulmate => "soulmate",
        }
    }
}

impl fmt::Display for RelationshipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application mode the persona runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    /// Full relationship progression.
    #[default]
    DatingSim,
    /// Helpful assistant; stage locked to [`RelationshipStage::Companion`].
    Companion,
}

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// How quickly the persona lets romance develop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RomanticStyle {
    /// Gradual.
    #[default]
    SlowBurn,
    /// Neither slow nor fast.
    Balanced,
    /// Forward.
    Fast,
}

/// Persona personality sliders. Each ranges -100 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Personality {
    /// Closed (-100) to open (+100).
    pub openness: i32,
    /// Cold (-100) to warm (+100).
    pub warmth: i32,
    /// Passive (-100) to assertive (+100).
    pub assertiveness: i32,
    /// Serious (-100) to playful (+100).
    pub playfulness: i32,
    /// Thick-skinned (-100) to sensitive (+100).
    pub sensitivity: i32,
    /// Dislikes (-100) to enjoys (+100) being teased.
    pub likes_teasing: i32,
    /// Prefers indirect (-100) to direct (+100) communication.
    pub prefers_directness: i32,
    /// Romance pacing.
    pub romantic_style: RomanticStyle,
}

impl Personality {
    /// Return a copy with every slider clamped to [-100, 100].
    #[must_use]
    pub fn clamped(self) -> Self {
        let c = |v: i32| v.clamp(-100, 100);
        Self {
            openness: c(self.openness),
            warmth: c(self.warmth),
            assertiveness: c(self.assertiveness),
            playfulness: c(self.playfulness),
            sensitivity: c(self.sensitivity),
            likes_teasing: c(self.likes_teasing),
            prefers_directness: c(self.prefers_directness),
            romantic_style: self.romantic_style,
        }
    }
}

// ---------------------------------------------------------------------------
// Character State
// ---------------------------------------------------------------------------

/// The long-lived relationship snapshot for one user/persona pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    /// Pairing identifier.
    pub persona_id: PersonaId,
    /// Persona display name.
    pub name: String,
    /// Persona system prompt (opaque to the engine).
    pub system_prompt: String,
    /// Free-form extension map (opaque to the engine).
    #[serde(default)]
    pub extensions: BTreeMap<String, serde_json::Value>,
    /// Application mode.
    #[serde(default)]
    pub app_mode: AppMode,
    /// Personality sliders.
    #[serde(default)]
    pub personality: Personality,

    /// Current mood.
    pub mood: MoodState,
    /// 0–100.
    pub energy: i32,
    /// 0–1000.
    pub affection: i32,
    /// 0–100.
    pub trust: i32,
    /// 0–100.
    pub intimacy: i32,
    /// 0–100.
    pub comfort: i32,
    /// 0–100.
    pub respect: i32,
    /// Current relationship stage.
    pub relationship_stage: RelationshipStage,

    /// When the user last interacted, if ever.
    pub last_interaction: Option<DateTime<Utc>>,
    /// When absence decay was last applied. Decay covers only the time since
    /// the later of this and `last_interaction`.
    #[serde(default)]
    pub last_decay_at: Option<DateTime<Utc>>,
    /// When the pairing was created from the user's point of view.
    pub first_met: DateTime<Utc>,
    /// Whole days since `first_met`.
    pub days_known: u32,
    /// Total interactions counted by [`crate::update::record_interaction`].
    pub total_interactions: u32,
    /// Consecutive days with at least one interaction.
    pub current_streak: u32,
    /// Longest streak ever reached.
    pub longest_streak: u32,
    /// Calendar date (UTC) of the last streak update.
    pub streak_last_date: Option<DateTime<Utc>>,
    /// Denormalized completed-event identifiers.
    #[serde(default)]
    pub completed_events: Vec<String>,

    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every applied update.
    pub updated_at: DateTime<Utc>,
}

impl CharacterState {
    /// Default state for a newly met persona.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::new_at(name, Utc::now())
    }

    /// Default state with an explicit creation time.
    #[must_use]
    pub fn new_at(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            persona_id: PersonaId::new(),
            name: name.into(),
            system_prompt: String::new(),
            extensions: BTreeMap::new(),
            app_mode: AppMode::DatingSim,
            personality: Personality::default(),
            mood: MoodState::default(),
            energy: STAT_MAX,
            affection: 0,
            trust: 0,
            intimacy: 0,
            comfort: 0,
            respect: 0,
            relationship_stage: RelationshipStage::Stranger,
            last_interaction: None,
            last_decay_at: None,
            first_met: now,
            days_known: 0,
            total_interactions: 0,
            current_streak: 0,
            longest_streak: 0,
            streak_last_date: None,
            completed_events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Switch to companion mode, locking the stage.
    #[must_use]
    pub fn into_companion_mode(mut self) -> Self {
        self.app_mode = AppMode::Companion;
        self.relationship_stage = RelationshipStage::Companion;
        self
    }

    /// Hours elapsed since the last interaction, or `None` if there was none.
    #[must_use]
    pub fn hours_since_last_interaction(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_interaction.map(|last| hours_between(last, now))
    }

    /// Hours of absence not yet covered by decay: measured from the later of
    /// `last_interaction` and `last_decay_at`.
    #[must_use]
    pub fn hours_since_last_decay(&self, now: DateTime<Utc>) -> Option<f64> {
        let since = match (self.last_interaction, self.last_decay_at) {
            (Some(interaction), Some(decay)) => interaction.max(decay),
            (Some(interaction), None) => interaction,
            (None, _) => return None,
        };
        Some(hours_between(since, now))
    }

    /// Re-clamp every bounded field. Used after deserializing untrusted data.
    pub fn clamp_all(&mut self) {
        self.energy = self.energy.clamp(0, STAT_MAX);
        self.affection = self.affection.clamp(0, AFFECTION_MAX);
        self.trust = self.trust.clamp(0, STAT_MAX);
        self.intimacy = self.intimacy.clamp(0, STAT_MAX);
        self.comfort = self.comfort.clamp(0, STAT_MAX);
        self.respect = self.respect.clamp(0, STAT_MAX);
        self.mood.intensity = self.mood.intensity.clamp(0, STAT_MAX);
        if self.mood.causes.len() > MAX_MOOD_CAUSES {
            let excess = self.mood.causes.len() - MAX_MOOD_CAUSES;
            self.mood.causes.drain(..excess);
        }
        self.personality = self.personality.clamped();
    }
}

/// Fractional hours from `earlier` to `later` (never negative).
#[must_use]
pub fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let ms = (later - earlier).num_milliseconds().max(0);
    ms as f64 / 3_600_000.0
}

// ---------------------------------------------------------------------------
// State Updates (delta)
// ---------------------------------------------------------------------------

/// Mood change carried by a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodChange {
    /// New primary emotion.
    pub emotion: Emotion,
    /// Added to the current intensity (absent = 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_delta: Option<i32>,
    /// Appended to the mood-cause ring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl MoodChange {
    /// Mood change with an intensity delta and no cause.
    #[must_use]
    pub fn new(emotion: Emotion, intensity_delta: i32) -> Self {
        Self {
            emotion,
            intensity_delta: Some(intensity_delta),
            cause: None,
        }
    }

    /// Attach a cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// Ephemeral per-turn delta. `None` means "no change", distinct from `Some(0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdates {
    /// Mood change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_change: Option<MoodChange>,
    /// Energy delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_delta: Option<i32>,
    /// Affection delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affection_delta: Option<i32>,
    /// Trust delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_delta: Option<i32>,
    /// Intimacy delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intimacy_delta: Option<i32>,
    /// Comfort delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comfort_delta: Option<i32>,
    /// Respect delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respect_delta: Option<i32>,
    /// Candidate memory to store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_memory: Option<String>,
    /// Identifier of a scripted event the turn suggests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_event: Option<String>,
}

impl StateUpdates {
    /// An empty delta.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Stat deltas as `(name, value)` pairs, skipping absent and zero entries.
    ///
    /// Handy for surfacing floating stat-change indicators in a UI.
    #[must_use]
    pub fn stat_changes(&self) -> Vec<(&'static str, i32)> {
        [
            ("affection", self.affection_delta),
            ("trust", self.trust_delta),
            ("intimacy", self.intimacy_delta),
            ("comfort", self.comfort_delta),
            ("respect", self.respect_delta),
            ("energy", self.energy_delta),
        ]
        .into_iter()
        .filter_map(|(name, delta)| delta.filter(|d| *d != 0).map(|d| (name, d)))
        .collect()
    }
}
