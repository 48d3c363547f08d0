//! Heuristic message analyzer.
//!
//! A pure keyword/regex pass over a single user message. No model is
//! involved; the output only needs to be directionally right because it is
//! scaled and clamped by [`crate::impact`] afterwards.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::Emotion;

// ---------------------------------------------------------------------------
// Vocabularies
// ---------------------------------------------------------------------------

/// Words and glyphs that signal positive sentiment.
pub const POSITIVE_WORDS: &[&str] = &[
    "happy", "glad", "love", "great", "awesome", "amazing", "wonderful", "thank", "thanks",
    "appreciate", "enjoy", "fun", "excited", "nice", "good", "best", "beautiful", "cute", "sweet",
    "kind", "funny", "haha", "lol", "lmao", ":)", ":d", "<3", "❤", "😊", "😄", "🥰", "💕",
];

/// Words and glyphs that signal negative sentiment.
pub const NEGATIVE_WORDS: &[&str] = &[
    "sad", "sorry", "hate", "bad", "awful", "terrible", "angry", "upset", "annoyed", "frustrated",
    "disappointed", "worry", "worried", "scared", "afraid", "hurt", "pain", "lonely", "alone",
    "cry", "crying", ":(", "😢", "😔", "😞",
];

/// Markers of a conversation going below the surface.
pub const DEPTH_MARKERS: &[&str] = &[
    "feel", "feeling", "feelings", "think", "believe", "hope", "dream", "wish", "fear", "scared",
    "worry", "love", "hate", "care", "mean", "matter", "important", "understand", "remember",
    "miss", "future", "past", "life", "death", "relationship", "family", "friend", "trust",
    "honest", "truth", "secret",
];

/// Markers of emotional content.
pub const EMOTIONAL_MARKERS: &[&str] = &[
    "feel", "feeling", "emotion", "emotional", "heart", "soul", "cry", "tears", "happy", "sad",
    "angry", "scared", "love", "hate", "miss", "hurt", "pain", "joy", "excited", "nervous",
    "anxious", "worried",
];

static QUESTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(what|who|where|when|why|how|do|does|did|is|are|was|were|can|could|would|will|should)\b",
    )
    .expect("static regex")
});

static SELF_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(i'?m|i am|my (?:name|job|hobby|favorite|family) is)\s+(\w+)")
        .expect("static regex")
});

static PREFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(i (?:really )?(like|love|hate|enjoy|prefer))\s+([^.!?]+)")
        .expect("static regex")
});

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// How far below the surface a message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicDepth {
    /// Small talk.
    Shallow,
    /// Some substance.
    Moderate,
    /// Personal or philosophical.
    Deep,
}

/// Output of [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAnalysis {
    /// Sentiment in [-1, 1].
    pub sentiment: f64,
    /// Topic depth bucket.
    pub topic_depth: TopicDepth,
    /// Best-guess emotion, if any.
    pub detected_emotion: Option<Emotion>,
    /// Labelled self-statements and preferences.
    pub extracted_facts: Vec<String>,
    /// Lowercased words longer than four characters.
    pub mentioned_keywords: Vec<String>,
    /// Whether the message reads as a question.
    pub is_question: bool,
    /// Whether any emotional marker appears.
    pub has_emotional_content: bool,
}

/// Analyze a single user message.
#[must_use]
pub fn analyze(text: &str) -> MessageAnalysis {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    let positive = count_hits(&words, &lower, POSITIVE_WORDS);
    let negative = count_hits(&words, &lower, NEGATIVE_WORDS);
    let sentiment = if positive + negative == 0 {
        0.0
    } else {
        (f64::from(positive) - f64::from(negative)) / f64::from(positive + negative)
    };

    let depth_hits = DEPTH_MARKERS.iter().filter(|m| lower.contains(*m)).count();
    let length = text.chars().count();
    let topic_depth = if depth_hits >= 3 || length > 200 {
        TopicDepth::Deep
    } else if depth_hits >= 1 || length > 80 {
        TopicDepth::Moderate
    } else {
        TopicDepth::Shallow
    };

    let is_question = text.contains('?') || QUESTION_START.is_match(text.trim_start());
    let has_emotional_content = EMOTIONAL_MARKERS.iter().any(|m| lower.contains(m));

    let detected_emotion = if sentiment > 0.5 {
        Some(Emotion::Happy)
    } else if sentiment < -0.5 {
        Some(Emotion::Sad)
    } else if is_question && depth_hits > 0 {
        Some(Emotion::Curious)
    } else {
        None
    };

    MessageAnalysis {
        sentiment,
        topic_depth,
        detected_emotion,
        extracted_facts: extract_facts(text),
        mentioned_keywords: words
            .iter()
            .filter(|w| w.chars().count() > 4)
            .map(|w| (*w).to_string())
            .collect(),
        is_question,
        has_emotional_content,
    }
}

/// One hit per word containing any keyword, plus one per keyword present in
/// the full text.
fn count_hits(words: &[&str], lower: &str, vocabulary: &[&str]) -> u32 {
    let word_hits = words
        .iter()
        .filter(|w| vocabulary.iter().any(|k| w.contains(k)))
        .count();
    let text_hits = vocabulary.iter().filter(|k| lower.contains(*k)).count();
    u32::try_from(word_hits + text_hits).unwrap_or(u32::MAX)
}

fn extract_facts(text: &str) -> Vec<String> {
    let statements = SELF_STATEMENT
        .find_iter(text)
        .map(|m| format!("User said: {}", m.as_str()));
    let preferences = PREFERENCE
        .find_iter(text)
        .map(|m| format!("User preference: {}", m.as_str()));
    statements.chain(preferences).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_text_has_zero_sentiment() {
        let a = analyze("the bus was on schedule");
        assert!(a.sentiment.abs() < f64::EPSILON);
        assert_eq!(a.topic_depth, TopicDepth::Shallow);
        assert_eq!(a.detected_emotion, None);
    }

    #[test]
    fn positive_text_is_happy() {
        let a = analyze("haha that was awesome, thanks!");
        assert!(a.sentiment > 0.5);
        assert_eq!(a.detected_emotion, Some(Emotion::Happy));
    }

    #[test]
    fn negative_text_is_sad() {
        let a = analyze("I feel so lonely and sad today");
        assert!(a.sentiment < -0.5);
        assert_eq!(a.detected_emotion, Some(Emotion::Sad));
        assert!(a.has_emotional_content);
    }

    #[test]
    fn deep_question_is_curious() {
        let a = analyze("What do you think matters in life");
        assert!(a.is_question);
        assert_eq!(a.topic_depth, TopicDepth::Deep);
        assert_eq!(a.detected_emotion, Some(Emotion::Curious));
    }

    #[test]
    fn long_text_is_at_least_moderate() {
        let a = analyze(&"the weather report said clouds ".repeat(3));
        assert_eq!(a.topic_depth, TopicDepth::Moderate);
        let a = analyze(&"x".repeat(201));
        assert_eq!(a.topic_depth, TopicDepth::Deep);
    }

    #[test]
    fn extracts_labelled_facts() {
        let a = analyze("My name is Sam. I really love hiking in the hills.");
        assert!(a.extracted_facts.contains(&"User said: My name is Sam".to_string()));
        assert!(
            a.extracted_facts
                .contains(&"User preference: I really love hiking in the hills".to_string())
        );
    }

    #[test]
    fn keywords_are_long_words() {
        let a = analyze("Pizza tonight sounds great");
        assert_eq!(a.mentioned_keywords, vec!["pizza", "tonight", "sounds", "great"]);
    }
}
