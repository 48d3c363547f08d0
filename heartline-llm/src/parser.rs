//! Response parser.
//!
//! Splits raw generated text into spoken dialogue and an optional bounded
//! directive. A fenced ```` ```json ```` block wins; without one, an inline
//! object mentioning `mood_change`, `affection_delta` or `trust_delta` is
//! tried. Only a malformed fenced block is reported: inline matches are
//! heuristic and a failed parse there is treated as a false positive.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use heartline_core::StateUpdates;

use crate::directive::Directive;

/// Substituted when cleanup leaves nothing to say.
pub const FALLBACK_DIALOGUE: &str = "Hmm... *thinking*";

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("static regex"));

static INLINE_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{.*"(?:mood_change|affection_delta|trust_delta)".*\}"#)
        .expect("static regex")
});

// Dialogue cleanup, applied in this order.
static JSON_REMNANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\{[^}]*"(?:mood|delta|emotion)[^}]*\}"#).expect("static regex")
});
static ACTION_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*[^*]+\*").expect("static regex"));
static STAGE_DIRECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\([^)]*(?:smiles|laughs|sighs|blushes|looks|nods)[^)]*\)")
        .expect("static regex")
});
static SPEAKER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[A-Za-z]+:\s*").expect("static regex"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));

/// Output of [`parse_response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedResponse {
    /// Cleaned dialogue; never empty.
    pub dialogue: String,
    /// Bounded directive, if one was found and parsed.
    pub directive: Option<StateUpdates>,
    /// Why a fenced directive block could not be parsed.
    pub parse_error: Option<String>,
}

/// Parse raw generated text.
#[must_use]
pub fn parse_response(raw: &str) -> ParsedResponse {
    let mut dialogue = raw.trim().to_string();
    let mut directive = None;
    let mut parse_error = None;

    if let Some(caps) = FENCED_JSON.captures(raw) {
        let (block, body) = (&caps[0], &caps[1]);
        dialogue = raw.replacen(block, "", 1).trim().to_string();
        match serde_json::from_str::<Value>(body) {
            Ok(value) => directive = Some(Directive::from_value(&value).to_updates()),
            Err(e) => {
                debug!(error = %e, "Malformed directive block");
                parse_error = Some(format!("Failed to parse JSON: {e}"));
            }
        }
    } else if let Some(m) = INLINE_JSON.find(raw) {
        dialogue = raw.replacen(m.as_str(), "", 1).trim().to_string();
        if let Ok(value) = serde_json::from_str::<Value>(m.as_str()) {
            directive = Some(Directive::from_value(&value).to_updates());
        }
    }

    ParsedResponse {
        dialogue: clean_dialogue(&dialogue),
        directive,
        parse_error,
    }
}

/// Strip directive remnants, `*actions*`, parenthetical stage directions and
/// `Name:` speaker labels; collapse blank runs; fall back when empty.
#[must_use]
pub fn clean_dialogue(text: &str) -> String {
    let cleaned = JSON_REMNANT.replace_all(text, "");
    let cleaned = ACTION_TEXT.replace_all(&cleaned, "");
    let cleaned = STAGE_DIRECTION.replace_all(&cleaned, "");
    let cleaned = SPEAKER_LABEL.replace_all(&cleaned, "");
    let cleaned = EXCESS_NEWLINES.replace_all(&cleaned, "\n\n");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        FALLBACK_DIALOGUE.to_string()
    } else {
        cleaned.to_string()
    }
}
