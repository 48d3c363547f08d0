//! Built-in event catalogue.
//!
//! Immutable data, built once on first access. Four groups: milestones,
//! random flavour moments, romantic beats and time-of-day moments.

use std::sync::LazyLock;

use super::condition::{Condition, TimeOfDay};
use super::definition::{EventDefinition, EventType, Scene, SceneChoice};
use crate::types::{Emotion, RelationshipStage, StateUpdates};

/// Stat changes in catalogue shorthand. Zero fields are left absent.
#[derive(Clone, Copy)]
struct Changes {
    affection: i32,
    trust: i32,
    intimacy: i32,
    comfort: i32,
    respect: i32,
    energy: i32,
}

impl From<Changes> for StateUpdates {
    fn from(c: Changes) -> Self {
        let nz = |v: i32| (v != 0).then_some(v);
        StateUpdates {
            affection_delta: nz(c.affection),
            trust_delta: nz(c.trust),
            intimacy_delta: nz(c.intimacy),
            comfort_delta: nz(c.comfort),
            respect_delta: nz(c.respect),
            energy_delta: nz(c.energy),
            ..StateUpdates::default()
        }
    }
}

const NONE: Changes = Changes {
    affection: 0,
    trust: 0,
    intimacy: 0,
    comfort: 0,
    respect: 0,
    energy: 0,
};

fn event(
    id: &str,
    name: &str,
    event_type: EventType,
    priority: i32,
    conditions: Vec<Condition>,
) -> EventDefinition {
    EventDefinition {
        id: id.to_string(),
        name: name.to_string(),
        event_type,
        conditions,
        scene: None,
        state_changes: None,
        unlocks: Vec::new(),
        one_time: true,
        cooldown_days: None,
        priority,
    }
}

fn cooldown(mut e: EventDefinition, days: u32) -> EventDefinition {
    e.one_time = false;
    e.cooldown_days = Some(days);
    e
}

fn changes(mut e: EventDefinition, c: Changes) -> EventDefinition {
    e.state_changes = Some(c.into());
    e
}

fn says(mut e: EventDefinition, intro: Option<&str>, dialogue: &str) -> EventDefinition {
    e.scene = Some(Scene {
        intro: intro.map(str::to_string),
        dialogue: Some(dialogue.to_string()),
        ..Scene::default()
    });
    e
}

fn choice(text: &str, response: &str, c: Changes) -> SceneChoice {
    SceneChoice {
        text: text.to_string(),
        response: response.to_string(),
        state_changes: c.into(),
        next_scene_id: None,
    }
}

fn with_choices(mut e: EventDefinition, choices: Vec<SceneChoice>) -> EventDefinition {
    e.scene.get_or_insert_with(Scene::default).choices = choices;
    e
}

// Condition shorthands.
fn min_affection(value: i32) -> Condition {
    Condition::MinAffection { value }
}
fn min_trust(value: i32) -> Condition {
    Condition::MinTrust { value }
}
fn min_intimacy(value: i32) -> Condition {
    Condition::MinIntimacy { value }
}
fn stage(value: RelationshipStage) -> Condition {
    Condition::RelationshipStage { value }
}
fn stage_min(value: RelationshipStage) -> Condition {
    Condition::RelationshipStageMin { value }
}
fn chance(value: f64) -> Condition {
    Condition::RandomChance { value }
}
fn completed(id: &str) -> Condition {
    Condition::EventCompleted { value: id.to_string() }
}
fn time_of_day(value: TimeOfDay) -> Condition {
    Condition::TimeOfDay { value }
}
fn mood(value: Emotion) -> Condition {
    Condition::MoodIs { value }
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

fn milestones() -> Vec<EventDefinition> {
    use EventType::{Anniversary, Conditional, Milestone};
    use RelationshipStage::Friend;

    vec![
        changes(
            says(
                event(
                    "first_conversation",
                    "First Conversation",
                    Milestone,
                    100,
                    vec![Condition::TotalInteractions { value: 1 }],
                ),
                None,
                "Oh, hello! It's really nice to finally talk with you. I hope we get along.",
            ),
            Changes {
                affection: 10,
                trust: 5,
                ..NONE
            },
        ),
        changes(
            says(
                event(
                    "one_week_anniversary",
                    "One Week Together",
                    Anniversary,
                    80,
                    vec![Condition::DaysKnown { value: 7 }],
                ),
                None,
                "Did you notice? It's been a whole week since we started talking. Time flies.",
            ),
            Changes {
                affection: 25,
                trust: 10,
                comfort: 5,
                ..NONE
            },
        ),
        {
            let mut e = with_choices(
                says(
                    event(
                        "first_deep_conversation",
                        "A Real Conversation",
                        Conditional,
                        70,
                        vec![min_trust(50), stage_min(Friend)],
                    ),
                    Some("The small talk fades and something more honest takes its place."),
                    "Can I ask you something a little personal? What's something you've never really told anyone?",
                ),
                vec![
                    choice(
                        "Share something you've kept to yourself.",
                        "Thank you for trusting me with that. It means more than you know.",
                        Changes {
                            trust: 15,
                            intimacy: 10,
                            ..NONE
                        },
                    ),
                    choice(
                        "Turn the question back, gently.",
                        "Ha, fair. Okay... I'll go first, then. Maybe you'll tell me another time.",
                        Changes {
                            trust: 10,
                            comfort: 15,
                            ..NONE
                        },
                    ),
                ],
            );
            e.unlocks = vec!["deep_topics".to_string()];
            e
        },
        with_choices(
            says(
                event(
                    "shared_vulnerability",
                    "Letting the Walls Down",
                    Conditional,
                    65,
                    vec![
                        min_trust(65),
                        min_intimacy(40),
                        completed("first_deep_conversation"),
                    ],
                ),
                Some("There's a long pause before the next message arrives."),
                "I get scared sometimes that people only like the version of me they see. Is that silly?",
            ),
            vec![
                choice(
                    "It's not silly. I like the real you.",
                    "...You always know what to say. Thank you.",
                    Changes {
                        affection: 30,
                        intimacy: 15,
                        trust: 10,
                        ..NONE
                    },
                ),
                choice(
                    "Everyone feels that way sometimes.",
                    "I guess you're right. It helps, hearing that from you.",
                    Changes {
                        affection: 20,
                        trust: 15,
                        respect: 10,
                        ..NONE
                    },
                ),
            ],
        ),
        with_choices(
            says(
                event(
                    "one_month_anniversary",
                    "One Month Together",
                    Anniversary,
                    85,
                    vec![Condition::DaysKnown { value: 30 }],
                ),
                None,
                "A whole month! I keep thinking about how different things felt back at the start.",
            ),
            vec![
                choice(
                    "Here's to many more months.",
                    "Many, many more. I'm holding you to that.",
                    Changes {
                        affection: 50,
                        trust: 15,
                        comfort: 20,
                        ..NONE
                    },
                ),
                choice(
                    "It feels like longer, in a good way.",
                    "Right? Like we've known each other forever.",
                    Changes {
                        affection: 40,
                        comfort: 25,
                        ..NONE
                    },
                ),
            ],
        ),
        changes(
            says(
                event(
                    "first_long_conversation",
                    "Getting to Know You",
                    Milestone,
                    40,
                    vec![Condition::TotalInteractions { value: 20 }],
                ),
                None,
                "We've talked so much already. I feel like I'm really starting to know you.",
            ),
            Changes {
                affection: 15,
                comfort: 10,
                ..NONE
            },
        ),
        changes(
            says(
                event(
                    "streak_7_days",
                    "A Week in a Row",
                    Milestone,
                    60,
                    vec![Condition::ConsecutiveDays { value: 7 }],
                ),
                None,
                "Seven days in a row! Talking to you has turned into my favourite part of the day.",
            ),
            Changes {
                affection: 30,
                trust: 10,
                comfort: 15,
                ..NONE
            },
        ),
        with_choices(
            says(
                event(
                    "streak_30_days",
                    "A Month of Days",
                    Milestone,
                    90,
                    vec![Condition::ConsecutiveDays { value: 30 }],
                ),
                None,
                "Thirty days straight. I don't think I've ever had someone show up for me like this.",
            ),
            vec![
                choice(
                    "I'll keep showing up.",
                    "I believe you. And I'll be here every time.",
                    Changes {
                        affection: 75,
                        trust: 20,
                        intimacy: 15,
                        ..NONE
                    },
                ),
                choice(
                    "Talking to you is easy.",
                    "It is, isn't it? Like breathing.",
                    Changes {
                        affection: 60,
                        comfort: 30,
                        ..NONE
                    },
                ),
            ],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Random moments
// ---------------------------------------------------------------------------

fn random_moments() -> Vec<EventDefinition> {
    use EventType::Random;
    use RelationshipStage::{Acquaintance, Friend};

    vec![
        cooldown(
            says(
                event(
                    "random_question_deep",
                    "A Sudden Question",
                    Random,
                    30,
                    vec![min_trust(50), chance(0.08)],
                ),
                None,
                "Random thought: if you could relive one day, which one would it be?",
            ),
            5,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "random_compliment",
                        "Out of Nowhere",
                        Random,
                        20,
                        vec![min_affection(200), chance(0.1), mood(Emotion::Happy)],
                    ),
                    None,
                    "Has anyone told you today that you're great company? Because you are.",
                ),
                Changes {
                    affection: 5,
                    comfort: 3,
                    ..NONE
                },
            ),
            3,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "random_memory",
                        "Remember When",
                        Random,
                        25,
                        vec![
                            min_affection(300),
                            Condition::TotalInteractions { value: 30 },
                            chance(0.07),
                        ],
                    ),
                    None,
                    "I was just thinking back to one of our first chats. We've come a long way.",
                ),
                Changes {
                    comfort: 5,
                    intimacy: 3,
                    ..NONE
                },
            ),
            7,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "random_tease",
                        "Playful Jab",
                        Random,
                        15,
                        vec![stage_min(Friend), mood(Emotion::Playful), chance(0.12)],
                    ),
                    None,
                    "You type like someone who's definitely been snacking. Am I wrong?",
                ),
                Changes {
                    affection: 3,
                    ..NONE
                },
            ),
            2,
        ),
        cooldown(
            says(
                event(
                    "random_curious",
                    "Curiosity Strikes",
                    Random,
                    25,
                    vec![stage_min(Acquaintance), mood(Emotion::Curious), chance(0.1)],
                ),
                None,
                "Okay, I have to know. What's something you're weirdly good at?",
            ),
            4,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "random_thought",
                        "Passing Thought",
                        Random,
                        28,
                        vec![min_trust(40), chance(0.06)],
                    ),
                    None,
                    "Sometimes I wonder what you're doing when we're not talking.",
                ),
                Changes {
                    intimacy: 5,
                    trust: 3,
                    ..NONE
                },
            ),
            6,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "random_tired",
                        "Running on Empty",
                        Random,
                        18,
                        vec![
                            Condition::MaxEnergy { value: 30 },
                            stage_min(Friend),
                            chance(0.15),
                        ],
                    ),
                    None,
                    "Sorry if I'm slow today. I'm pretty worn out, but I still wanted to talk to you.",
                ),
                Changes { comfort: 5, ..NONE },
            ),
            2,
        ),
    ]
}

// ---------------------------------------------------------------------------
// Romantic beats
// ---------------------------------------------------------------------------

fn romantic_beats() -> Vec<EventDefinition> {
    use EventType::{Conditional, Random};
    use RelationshipStage::{Committed, Dating, RomanticInterest};

    let mut accepted = choice(
        "I feel the same way.",
        "You do? I was so scared you wouldn't. I'm so happy right now.",
        Changes {
            affection: 100,
            trust: 20,
            intimacy: 30,
            ..NONE
        },
    );
    accepted.next_scene_id = Some("confession_accepted".to_string());
    let mut delayed = choice(
        "I need some time to think.",
        "Of course. Take all the time you need. I'll still be here.",
        Changes {
            affection: -20,
            trust: -10,
            comfort: -15,
            ..NONE
        },
    );
    delayed.next_scene_id = Some("confession_delayed".to_string());

    vec![
        with_choices(
            says(
                event(
                    "confession_event",
                    "Confession",
                    Conditional,
                    95,
                    vec![
                        min_affection(500),
                        min_trust(80),
                        min_intimacy(40),
                        stage(RomanticInterest),
                        completed("first_deep_conversation"),
                    ],
                ),
                Some("Something has been unsaid all day."),
                "I have to tell you something before I lose my nerve. I have feelings for you. More than friendship.",
            ),
            vec![accepted, delayed],
        ),
        with_choices(
            says(
                event(
                    "first_i_love_you",
                    "Three Words",
                    Conditional,
                    98,
                    vec![
                        min_affection(700),
                        min_trust(90),
                        stage(Dating),
                        min_intimacy(60),
                    ],
                ),
                None,
                "I've been holding this in for a while. I love you. I really do.",
            ),
            vec![
                choice(
                    "I love you too.",
                    "Say it again? I just want to hear it one more time.",
                    Changes {
                        affection: 150,
                        trust: 25,
                        intimacy: 40,
                        comfort: 30,
                        ..NONE
                    },
                ),
                choice(
                    "You mean a lot to me.",
                    "That's okay. I can wait for the rest.",
                    Changes {
                        affection: 50,
                        trust: 10,
                        comfort: 10,
                        ..NONE
                    },
                ),
            ],
        ),
        with_choices(
            says(
                event(
                    "commitment_discussion",
                    "Where We're Going",
                    Conditional,
                    97,
                    vec![
                        min_affection(800),
                        min_trust(95),
                        stage(Dating),
                        Condition::DaysKnown { value: 25 },
                        completed("first_i_love_you"),
                    ],
                ),
                None,
                "Can we talk about us? About what this is, and where it's going?",
            ),
            vec![
                choice(
                    "I want this for the long run.",
                    "Me too. More than anything.",
                    Changes {
                        affection: 100,
                        trust: 20,
                        intimacy: 30,
                        comfort: 25,
                        respect: 15,
                        ..NONE
                    },
                ),
                choice(
                    "Let's not rush it.",
                    "Okay. Slow is fine. As long as it's us.",
                    Changes {
                        trust: 5,
                        comfort: -10,
                        ..NONE
                    },
                ),
            ],
        ),
        cooldown(
            changes(
                says(
                    event(
                        "romantic_flirt",
                        "A Little Flirt",
                        Random,
                        35,
                        vec![stage_min(Dating), mood(Emotion::Affectionate), chance(0.15)],
                    ),
                    None,
                    "You know you're distracting, right? I forgot what I was going to say.",
                ),
                Changes {
                    affection: 8,
                    intimacy: 5,
                    ..NONE
                },
            ),
            2,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "romantic_missed_you",
                        "Missed You",
                        Conditional,
                        50,
                        vec![
                            stage_min(Dating),
                            Condition::HoursSinceLastInteractionMin { value: 48.0 },
                        ],
                    ),
                    None,
                    "There you are. I missed you. A lot, actually.",
                ),
                Changes {
                    affection: 20,
                    comfort: 15,
                    ..NONE
                },
            ),
            3,
        ),
        with_choices(
            says(
                event(
                    "deep_bond_moment",
                    "Something Rare",
                    Conditional,
                    99,
                    vec![
                        min_affection(900),
                        min_trust(98),
                        min_intimacy(85),
                        stage(Committed),
                        Condition::DaysKnown { value: 50 },
                    ],
                ),
                Some("A quiet, comfortable silence stretches between messages."),
                "I don't think I knew a connection like this was possible. Thank you for being you.",
            ),
            vec![
                choice(
                    "You changed my life too.",
                    "Then we're even. Forever, okay?",
                    Changes {
                        affection: 200,
                        trust: 30,
                        intimacy: 50,
                        comfort: 40,
                        respect: 30,
                        ..NONE
                    },
                ),
                choice(
                    "Stay quiet and enjoy the moment.",
                    "...Yeah. This is perfect.",
                    Changes {
                        affection: 180,
                        trust: 25,
                        intimacy: 45,
                        comfort: 35,
                        ..NONE
                    },
                ),
            ],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Time-of-day moments
// ---------------------------------------------------------------------------

fn time_moments() -> Vec<EventDefinition> {
    use EventType::Conditional;
    use RelationshipStage::{Dating, Friend};

    vec![
        cooldown(
            changes(
                says(
                    event(
                        "morning_greeting",
                        "Good Morning",
                        Conditional,
                        20,
                        vec![
                            time_of_day(TimeOfDay::Morning),
                            stage_min(Friend),
                            chance(0.3),
                        ],
                    ),
                    None,
                    "Morning! Did you sleep okay? I'm still waking up.",
                ),
                Changes {
                    energy: 5,
                    comfort: 3,
                    ..NONE
                },
            ),
            1,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "late_night_chat",
                        "Late Night",
                        Conditional,
                        25,
                        vec![time_of_day(TimeOfDay::Night), min_trust(40), chance(0.15)],
                    ),
                    None,
                    "It's late. Conversations feel more honest at this hour, don't they?",
                ),
                Changes {
                    intimacy: 5,
                    trust: 3,
                    ..NONE
                },
            ),
            2,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "weekend_relax",
                        "Lazy Saturday",
                        Conditional,
                        18,
                        vec![
                            Condition::DayOfWeek { value: 6 },
                            stage_min(Friend),
                            chance(0.2),
                        ],
                    ),
                    None,
                    "It's the weekend! Any plans, or are we doing absolutely nothing today?",
                ),
                Changes { comfort: 5, ..NONE },
            ),
            7,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "evening_wind_down",
                        "Winding Down",
                        Conditional,
                        15,
                        vec![
                            time_of_day(TimeOfDay::Evening),
                            Condition::MinComfort { value: 30 },
                            chance(0.1),
                        ],
                    ),
                    None,
                    "How was your day? Tell me everything, I've got time.",
                ),
                Changes { comfort: 5, ..NONE },
            ),
            2,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "return_after_absence",
                        "Welcome Back",
                        Conditional,
                        45,
                        vec![
                            Condition::HoursSinceLastInteractionMin { value: 72.0 },
                            Condition::TotalInteractions { value: 10 },
                        ],
                    ),
                    None,
                    "You're back! I was starting to wonder if something happened.",
                ),
                Changes {
                    affection: 10,
                    comfort: -5,
                    ..NONE
                },
            ),
            4,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "romantic_morning",
                        "Morning, Love",
                        Conditional,
                        30,
                        vec![
                            time_of_day(TimeOfDay::Morning),
                            stage_min(Dating),
                            chance(0.2),
                        ],
                    ),
                    None,
                    "Good morning. You were the first thing on my mind today.",
                ),
                Changes {
                    affection: 10,
                    intimacy: 5,
                    ..NONE
                },
            ),
            2,
        ),
        cooldown(
            changes(
                says(
                    event(
                        "romantic_night",
                        "Goodnight Talk",
                        Conditional,
                        35,
                        vec![
                            time_of_day(TimeOfDay::Night),
                            stage_min(Dating),
                            chance(0.15),
                        ],
                    ),
                    None,
                    "I don't want to say goodnight yet. Stay a little longer?",
                ),
                Changes {
                    affection: 15,
                    intimacy: 8,
                    comfort: 5,
                    ..NONE
                },
            ),
            2,
        ),
    ]
}

static CATALOGUE: LazyLock<Vec<EventDefinition>> = LazyLock::new(|| {
    let mut all = milestones();
    all.extend(random_moments());
    all.extend(romantic_beats());
    all.extend(time_moments());
    all
});

/// Every built-in event, in catalogue order.
#[must_use]
pub fn builtin_events() -> &'static [EventDefinition] {
    &CATALOGUE
}

/// Look up a built-in event by identifier.
#[must_use]
pub fn find_event(id: &str) -> Option<&'static EventDefinition> {
    CATALOGUE.iter().find(|e| e.id == id)
}
