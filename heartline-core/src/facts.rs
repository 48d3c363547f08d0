//! Memory-fact heuristics.
//!
//! Candidate facts are plain strings. The fact store (a collaborator) keeps
//! them with an importance score and a coarse category computed here.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse fact category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
    /// About the user.
    User,
    /// About the relationship itself.
    Relationship,
    /// Something the pair did or talked about together.
    SharedExperience,
}

impl FactCategory {
    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Relationship => "relationship",
            Self::SharedExperience => "shared_experience",
        }
    }
}

/// A stored memory fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFact {
    /// Store-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Fact text.
    pub content: String,
    /// Category.
    pub category: FactCategory,
    /// Importance, 0–100.
    pub importance: u8,
    /// When the fact was recorded.
    pub created_at: DateTime<Utc>,
}

impl MemoryFact {
    /// Score and categorise `content`, using `sentiment` of the message it came from.
    #[must_use]
    pub fn scored(content: impl Into<String>, sentiment: f64, now: DateTime<Utc>) -> Self {
        let content = content.into();
        Self {
            id: None,
            category: fact_category(&content),
            importance: fact_importance(&content, sentiment),
            content,
            created_at: now,
        }
    }

    /// Whether the content contains any of `keywords`, ignoring case.
    #[must_use]
    pub fn mentions_any(&self, keywords: &[String]) -> bool {
        let lower = self.content.to_lowercase();
        keywords
            .iter()
            .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

static USER_SELF: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        re(r"(?i)\bI(?:'m| am)\s+(a |an )?([^.!?,]+)"),
        re(r"(?i)\bmy (?:name|job|hobby|favorite|family) is\s+([^.!?,]+)"),
        re(r"(?i)\bI (?:work|live|study) (?:at|in|as)\s+([^.!?,]+)"),
        re(r"(?i)\bI (?:like|love|enjoy|hate|prefer)\s+([^.!?,]+)"),
    ]
});

static ACKNOWLEDGEMENTS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        re(r"(?i)I(?:'ll)? remember\s+([^.!?]+)"),
        re(r"(?i)so you(?:'re| are)\s+([^.!?,]+)"),
        re(r"(?i)you (?:like|love|enjoy)\s+([^.!?,]+)"),
    ]
});

static AI_PERSPECTIVE: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        re(r"(?i)you (?:are|work as|live in|like|love|enjoy|hate|prefer|have)\s+([^.!?]+)"),
        re(r"(?i)your (?:name|job|favorite|hobby|family|home|work)\s+(?:is|are)\s+([^.!?]+)"),
        re(r"(?i)you (?:said|mentioned|told me)\s+(?:that\s+)?([^.!?]+)"),
    ]
});

static REMEMBER: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        re(r"(?i)I(?:'ll)? remember (?:that )?([^.!?]+)"),
        re(r"(?i)I(?:'ll)? keep that in mind[.!]?\s*([^.!?]*)"),
        re(r"(?i)noted[!.]?\s*([^.!?]*)"),
    ]
});

/// Text of the last capture group of every match of `pattern` in `text`, trimmed.
fn last_captures<'t>(pattern: &Regex, text: &'t str) -> impl Iterator<Item = &'t str> {
    pattern.captures_iter(text).filter_map(|caps| {
        (1..caps.len())
            .rev()
            .find_map(|i| caps.get(i))
            .map(|m| m.as_str().trim())
    })
}

/// Facts from one exchange: user self-statements prefixed `User: ` and
/// companion acknowledgements. Keeps 3 < length < 150 and drops
/// acknowledgements already contained in an earlier fact.
#[must_use]
pub fn extract_facts_from_conversation(user_message: &str, companion_response: &str) -> Vec<String> {
    let in_range = |f: &str| (4..150).contains(&f.chars().count());
    let mut facts: Vec<String> = USER_SELF
        .iter()
        .flat_map(|p| last_captures(p, user_message))
        .filter(|f| in_range(*f))
        .map(|f| format!("User: {f}"))
        .collect();

    for pattern in ACKNOWLEDGEMENTS.iter() {
        for fact in last_captures(pattern, companion_response) {
            if in_range(fact) && !facts.iter().any(|f| f.contains(fact)) {
                facts.push(fact.to_string());
            }
        }
    }
    facts
}

/// Parser-side variant used on generated dialogue. Also picks up what the
/// companion says about the user and explicit "I'll remember" remarks.
/// Keeps 5 < length < 200.
#[must_use]
pub fn extract_potential_facts(dialogue: &str, user_message: &str) -> Vec<String> {
    let user = USER_SELF
        .iter()
        .flat_map(|p| last_captures(p, user_message))
        .filter(|f| f.chars().count() > 2)
        .map(|f| format!("User: {f}"));
    let perspective = AI_PERSPECTIVE
        .iter()
        .flat_map(|p| last_captures(p, dialogue))
        .map(str::to_string);
    let remembered = REMEMBER
        .iter()
        .flat_map(|p| last_captures(p, dialogue))
        .filter(|f| !f.is_empty())
        .map(str::to_string);

    user.chain(perspective)
        .chain(remembered)
        .filter(|f| (6..200).contains(&f.chars().count()))
        .collect()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

static USER_TOPIC: LazyLock<Regex> =
    LazyLock::new(|| re(r"\b(name|job|work|live|family|hobby|favorite)\b"));
static SHARED_TOPIC: LazyLock<Regex> = LazyLock::new(|| {
    re(r"\b(we|together|our|shared|both)\b|\b(talked about|discussed|laughed|cried)\b")
});

const EMOTIONAL_WORDS: &[&str] = &["love", "hate", "fear", "dream", "hope", "wish", "important", "special"];
const PERSONAL_WORDS: &[&str] = &["name", "birthday", "family", "job", "home", "secret"];

/// Category by keyword presence; defaults to [`FactCategory::Relationship`].
#[must_use]
pub fn fact_category(content: &str) -> FactCategory {
    let lower = content.to_lowercase();
    if lower.contains("user")
        || lower.contains("their")
        || lower.contains("they")
        || USER_TOPIC.is_match(&lower)
    {
        FactCategory::User
    } else if SHARED_TOPIC.is_match(&lower) {
        FactCategory::SharedExperience
    } else {
        FactCategory::Relationship
    }
}

/// Additive importance: base 50, +10 over 50 chars, +5 more over 100,
/// +10 emotional word, +15 personal word, +10 when |sentiment| > 0.5; cap 100.
#[must_use]
pub fn fact_importance(content: &str, sentiment: f64) -> u8 {
    let lower = content.to_lowercase();
    let length = content.chars().count();
    let mut importance: u8 = 50;
    if length > 50 {
        importance += 10;
    }
    if length > 100 {
        importance += 5;
    }
    if EMOTIONAL_WORDS.iter().any(|w| lower.contains(w)) {
        importance += 10;
    }
    if PERSONAL_WORDS.iter().any(|w| lower.contains(w)) {
        importance += 15;
    }
    if sentiment.abs() > 0.5 {
        importance += 10;
    }
    importance.min(100)
}

static RECALL: LazyLock<Regex> =
    LazyLock::new(|| re(r"\b(remember|recall|forgot|forget)\s+(?:when|that|about)\s+([^.!?]+)"));
static CAPITALISED: LazyLock<Regex> = LazyLock::new(|| re(r"\b([A-Z][a-z]+)\b"));

/// Words in `message` that should pull matching memories into context:
/// the subject of "remember when/that/about …" phrases and capitalised words.
#[must_use]
pub fn trigger_words(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let recalled = RECALL
        .captures_iter(&lower)
        .filter_map(|c| c.get(2).map(|m| m.as_str().trim().to_string()));
    let names = CAPITALISED
        .captures_iter(message)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()));
    recalled
        .chain(names)
        .filter(|t| t.chars().count() > 2)
        .collect()
}
