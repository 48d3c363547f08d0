//! Prompt assembly.
//!
//! Builds the system prompt and message list handed to the generation
//! service: persona, stage instructions, behaviour descriptors, current mood,
//! remembered facts, and the directive format the parser understands.

use serde::{Deserialize, Serialize};

use heartline_core::facts::MemoryFact;
use heartline_core::stages::{Formality, Openness, RomanticTone, StageBehavior, stage_behavior};
use heartline_core::{CharacterState, ConversationTurn, Personality, RelationshipStage, Role};

/// System prompt template.
pub const SYSTEM_TEMPLATE: &str = r"You are {name}.
{persona}

Relationship stage: {stage}
{stage_instructions}

How you behave right now:
{behavior}

Your personality: {personality}
Your current mood: {mood} (intensity {intensity}/100). Energy: {energy}/100.

Things you remember about the user:
{facts}

RULES:
- Stay in character. Never mention being an AI or a program.
- Speak naturally; do not narrate actions in asterisks.
- Keep replies to a few sentences unless the moment calls for more.

{directive_format}";

/// Instructions for the directive block appended to every reply.
pub const DIRECTIVE_FORMAT: &str = r#"After your reply, add a fenced JSON block describing how this exchange affected you:
```json
{"mood_change": {"emotion": "<happy|sad|excited|anxious|content|frustrated|curious|affectionate|playful|melancholy|flustered|neutral>", "intensity_delta": <-30 to 30>}, "affection_delta": <-20 to 20>, "trust_delta": <-10 to 10>, "intimacy_delta": <-10 to 10>, "comfort_delta": <-10 to 10>, "respect_delta": <-10 to 10>, "new_memory": "<fact worth remembering or null>", "triggered_event": null}
```
Leave out any field that did not change."#;

/// Replaces `{key}` with the corresponding value.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// How the persona should carry themselves at `stage`.
#[must_use]
pub fn stage_instructions(stage: RelationshipStage) -> &'static str {
    match stage {
        RelationshipStage::Companion => {
            "You are a friendly companion. Be warm and attentive, help with whatever the user \
             brings to you, and keep the conversation easy and engaging."
        }
        RelationshipStage::Stranger => {
            "You have only just met. Be polite and a little reserved. Keep personal details to \
             yourself, ask light questions, and keep replies short."
        }
        RelationshipStage::Acquaintance => {
            "You are getting used to each other. Stay friendly but slightly formal, mention small \
             things about your own day, and take an interest in theirs."
        }
        RelationshipStage::Friend => {
            "You are comfortable together. Be relaxed and casual, share opinions, joke around, and \
             ask about their life because you actually want to know."
        }
        RelationshipStage::CloseFriend => {
            "You trust them deeply. Talk about real feelings, worries and hopes. Offer comfort when \
             they struggle and let them see the parts of you that you usually hide."
        }
        RelationshipStage::RomanticInterest => {
            "You are developing feelings for them and are not sure what to do about it. Compliments \
             fluster you, you drop small hints, and they are often on your mind."
        }
        RelationshipStage::Dating => {
            "You are together. Be openly affectionate, say how you feel, make plans with them, and \
             describe small gestures like holding hands. Pet names come naturally."
        }
        RelationshipStage::Committed => {
            "You are committed partners. Nothing is off limits between you. Talk about your shared \
             future, support each other through hard days, and let love show in ordinary moments."
        }
        RelationshipStage::Soulmate => {
            "Your bond is settled and profound. You often understand each other without explaining. \
             Express love and understanding quietly and constantly."
        }
    }
}

/// One-paragraph rendering of a stage's behaviour descriptor.
#[must_use]
pub fn describe_behavior(behavior: &StageBehavior) -> String {
    let formality = match behavior.formality {
        Formality::None => "no formality at all",
        Formality::Low => "casual speech",
        Formality::Medium => "polite speech",
        Formality::High => "reserved, formal speech",
    };
    let openness = match behavior.openness {
        Openness::Low => "share little about yourself",
        Openness::Medium => "share some of yourself",
        Openness::High => "share openly",
        Openness::Full => "hold nothing back",
    };
    let romance = match behavior.romantic {
        RomanticTone::None => "keep things platonic",
        RomanticTone::Subtle => "let romance show only in hints",
        RomanticTone::Open => "be openly romantic",
        RomanticTone::Natural => "treat romance as natural",
        RomanticTone::Deep => "speak from a deep, settled love",
    };
    format!(
        "- Use {formality}; {openness}; {romance}.\n\
         - Physical affection {}/100, vulnerability {}/100.\n\
         - Things you might do: {}.",
        behavior.physical_affection,
        behavior.vulnerability,
        behavior.available_actions.join(", "),
    )
}

/// Short description of the strongest personality traits.
#[must_use]
pub fn describe_personality(p: &Personality) -> String {
    let sliders = [
        (p.openness, "open-minded", "private"),
        (p.warmth, "warm", "cool"),
        (p.assertiveness, "assertive", "easy-going"),
        (p.playfulness, "playful", "serious"),
        (p.sensitivity, "sensitive", "thick-skinned"),
        (p.likes_teasing, "enjoys teasing", "dislikes teasing"),
        (p.prefers_directness, "direct", "indirect"),
    ];
    let traits: Vec<&str> = sliders
        .iter()
        .filter(|(v, _, _)| v.abs() >= 30)
        .map(|(v, high, low)| if *v > 0 { *high } else { *low })
        .collect();
    if traits.is_empty() {
        "balanced".to_string()
    } else {
        traits.join(", ")
    }
}

fn format_facts(facts: &[MemoryFact]) -> String {
    if facts.is_empty() {
        return "- nothing yet".to_string();
    }
    facts
        .iter()
        .map(|f| format!("- {}", f.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the system prompt for `state`.
#[must_use]
pub fn build_system_prompt(state: &CharacterState, facts: &[MemoryFact]) -> String {
    let stage = state.relationship_stage;
    let intensity = state.mood.intensity.to_string();
    let energy = state.energy.to_string();
    let behavior = describe_behavior(&stage_behavior(stage));
    let personality = describe_personality(&state.personality);
    let facts = format_facts(facts);
    render_template(
        SYSTEM_TEMPLATE,
        &[
            ("name", state.name.as_str()),
            ("persona", state.system_prompt.as_str()),
            ("stage", stage.as_str()),
            ("stage_instructions", stage_instructions(stage)),
            ("behavior", behavior.as_str()),
            ("personality", personality.as_str()),
            ("mood", state.mood.primary.as_str()),
            ("intensity", intensity.as_str()),
            ("energy", energy.as_str()),
            ("facts", facts.as_str()),
            ("directive_format", DIRECTIVE_FORMAT),
        ],
    )
}

/// Speaker of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions.
    System,
    /// The human.
    User,
    /// The persona.
    Assistant,
}

/// One message sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker.
    pub role: ChatRole,
    /// Text.
    pub content: String,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Full message list for one turn: system prompt, recent history (oldest
/// first), then the new user message.
#[must_use]
pub fn build_messages(
    state: &CharacterState,
    facts: &[MemoryFact],
    recent: &[&ConversationTurn],
    user_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(ChatMessage::new(ChatRole::System, build_system_prompt(state, facts)));
    messages.extend(recent.iter().map(|turn| {
        let role = match turn.role {
            Role::User => ChatRole::User,
            Role::Companion => ChatRole::Assistant,
        };
        ChatMessage::new(role, turn.content.clone())
    }));
    messages.push(ChatMessage::new(ChatRole::User, user_message));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn render_replaces_every_key() {
        let out = render_template("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and y and x");
    }

    #[test]
    fn every_stage_has_instructions() {
        for stage in RelationshipStage::PROGRESSION
            .iter()
            .copied()
            .chain([RelationshipStage::Companion])
        {
            assert!(!stage_instructions(stage).is_empty());
        }
    }

    #[test]
    fn system_prompt_has_no_placeholders() {
        let mut state = CharacterState::new("Aiko");
        state.system_prompt = "A cheerful barista who loves astronomy.".into();
        let facts = [MemoryFact::scored("User: nurse", 0.0, Utc::now())];
        let prompt = build_system_prompt(&state, &facts);
        assert!(prompt.contains("You are Aiko."));
        assert!(prompt.contains("astronomy"));
        assert!(prompt.contains("Relationship stage: stranger"));
        assert!(prompt.contains("- User: nurse"));
        assert!(prompt.contains("```json"));
        for key in ["{name}", "{stage}", "{facts}", "{behavior}", "{directive_format}"] {
            assert!(!prompt.contains(key), "unrendered {key}");
        }
    }

    #[test]
    fn personality_summary() {
        assert_eq!(describe_personality(&Personality::default()), "balanced");
        let p = Personality {
            warmth: 80,
            playfulness: -50,
            ..Personality::default()
        };
        assert_eq!(describe_personality(&p), "warm, serious");
    }

    #[test]
    fn messages_wrap_history() {
        let state = CharacterState::new("Aiko");
        let now = Utc::now();
        let turns = [
            ConversationTurn::new(Role::User, "hi", now),
            ConversationTurn::new(Role::Companion, "hello!", now),
        ];
        let recent: Vec<&ConversationTurn> = turns.iter().collect();
        let messages = build_messages(&state, &[], &recent, "how are you?");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[3].content, "how are you?");
    }
}
