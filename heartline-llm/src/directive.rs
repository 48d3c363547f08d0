//! Structured directives emitted by the dialogue generator.
//!
//! Wire format (all keys optional):
//!
//! ```json
//! {
//!   "mood_change": { "emotion": "happy", "intensity_delta": 10 },
//!   "affection_delta": 5,
//!   "trust_delta": 1,
//!   "intimacy_delta": 0,
//!   "comfort_delta": 2,
//!   "respect_delta": 0,
//!   "new_memory": "User adopted a cat",
//!   "triggered_event": "random_compliment"
//! }
//! ```
//!
//! Numbers are rounded half-up and clamped; missing or non-numeric values
//! become 0. An unknown emotion drops the whole mood change.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use heartline_core::{Emotion, MoodChange, StateUpdates};

use crate::error::{LlmError, Result};

/// Bounds applied to each directive field.
pub const MOOD_INTENSITY_RANGE: (i32, i32) = (-30, 30);
/// Affection bounds.
pub const AFFECTION_RANGE: (i32, i32) = (-20, 20);
/// Trust bounds.
pub const TRUST_RANGE: (i32, i32) = (-10, 10);
/// Intimacy, comfort and respect bounds.
pub const SECONDARY_RANGE: (i32, i32) = (-10, 10);

/// Affection magnitude above which [`Directive::validate`] warns.
pub const AFFECTION_WARN_ABOVE: f64 = 50.0;
/// Trust magnitude above which [`Directive::validate`] warns.
pub const TRUST_WARN_ABOVE: f64 = 20.0;

/// Mood part of a directive, before vocabulary checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectiveMood {
    /// Emotion name as emitted (any case).
    pub emotion: String,
    /// Intensity change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_delta: Option<f64>,
    /// Why the mood changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// A directive as emitted, not yet bounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directive {
    /// Suggested mood change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_change: Option<DirectiveMood>,
    /// Suggested affection change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affection_delta: Option<f64>,
    /// Suggested trust change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_delta: Option<f64>,
    /// Suggested intimacy change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intimacy_delta: Option<f64>,
    /// Suggested comfort change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfort_delta: Option<f64>,
    /// Suggested respect change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respect_delta: Option<f64>,
    /// Something worth remembering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_memory: Option<String>,
    /// Scripted event the generator thinks should happen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_event: Option<String>,
}

/// Result of [`Directive::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveValidation {
    /// `false` exactly when at least one warning was produced.
    pub valid: bool,
    /// Bounded delta.
    pub sanitized: StateUpdates,
    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl DirectiveValidation {
    /// Treat warnings as a failure.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::SchemaValidation`] listing every warning when the
    /// directive was not valid.
    pub fn into_result(self) -> Result<StateUpdates> {
        if self.valid {
            Ok(self.sanitized)
        } else {
            Err(LlmError::SchemaValidation(self.warnings.join("; ")))
        }
    }
}

impl Directive {
    /// Strictly deserialize a directive.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ParseError`] if `text` is not a JSON directive.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Leniently read a directive out of any JSON value.
    ///
    /// Present numeric keys always yield a number: `null` reads as 0, numeric
    /// strings are parsed, anything else becomes NaN (and so 0 once bounded).
    /// Text fields are kept only when they are non-empty strings.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let number = |key: &str| obj.get(key).map(loose_number);
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let mood_change = obj
            .get("mood_change")
            .and_then(Value::as_object)
            .map(|mood| DirectiveMood {
                emotion: mood
                    .get("emotion")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                intensity_delta: mood.get("intensity_delta").map(loose_number),
                cause: mood
                    .get("cause")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });

        Self {
            mood_change,
            affection_delta: number("affection_delta"),
            trust_delta: number("trust_delta"),
            intimacy_delta: number("intimacy_delta"),
            comfort_delta: number("comfort_delta"),
            respect_delta: number("respect_delta"),
            new_memory: text("new_memory"),
            triggered_event: text("triggered_event"),
        }
    }

    /// Bound the directive into a delta, silently dropping an unknown emotion.
    #[must_use]
    pub fn to_updates(&self) -> StateUpdates {
        self.bounded(&mut Vec::new())
    }

    /// Bound the directive and report anything suspicious.
    ///
    /// Warns on an unknown emotion, on affection beyond ±50 and on trust
    /// beyond ±20. Out-of-range values are still clamped into their normal
    /// bounds.
    #[must_use]
    pub fn validate(&self) -> DirectiveValidation {
        let mut warnings = Vec::new();
        let sanitized = self.bounded(&mut warnings);
        DirectiveValidation {
            valid: warnings.is_empty(),
            sanitized,
            warnings,
        }
    }

    fn bounded(&self, warnings: &mut Vec<String>) -> StateUpdates {
        let mood_change = self.mood_change.as_ref().and_then(|mood| {
            let Some(emotion) = Emotion::parse(&mood.emotion) else {
                warnings.push(format!("Invalid emotion: {}", mood.emotion));
                return None;
            };
            Some(MoodChange {
                emotion,
                intensity_delta: Some(clamp_delta(mood.intensity_delta, MOOD_INTENSITY_RANGE)),
                cause: mood.cause.clone(),
            })
        });

        if let Some(a) = self.affection_delta.filter(|a| a.abs() > AFFECTION_WARN_ABOVE) {
            warnings.push(format!("Affection delta too large: {a}"));
        }
        if let Some(t) = self.trust_delta.filter(|t| t.abs() > TRUST_WARN_ABOVE) {
            warnings.push(format!("Trust delta too large: {t}"));
        }

        let bound = |v: Option<f64>, range| v.map(|v| clamp_delta(Some(v), range));
        StateUpdates {
            mood_change,
            energy_delta: None,
            affection_delta: bound(self.affection_delta, AFFECTION_RANGE),
            trust_delta: bound(self.trust_delta, TRUST_RANGE),
            intimacy_delta: bound(self.intimacy_delta, SECONDARY_RANGE),
            comfort_delta: bound(self.comfort_delta, SECONDARY_RANGE),
            respect_delta: bound(self.respect_delta, SECONDARY_RANGE),
            new_memory: self.new_memory.clone().filter(|s| !s.is_empty()),
            triggered_event: self.triggered_event.clone().filter(|s| !s.is_empty()),
        }
    }
}

/// Round half-up and clamp into `(min, max)`; missing or NaN reads as 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn clamp_delta(value: Option<f64>, (min, max): (i32, i32)) -> i32 {
    match value {
        Some(v) if !v.is_nan() => (v + 0.5).floor().clamp(f64::from(min), f64::from(max)) as i32,
        _ => 0,
    }
}

fn loose_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}
