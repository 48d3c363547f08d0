//! Scripted events: conditions, definitions, the evaluator and the built-in
//! catalogue.

pub mod catalogue;
pub mod condition;
pub mod definition;
pub mod evaluator;

pub use catalogue::{builtin_events, find_event};
pub use condition::{Condition, EvaluationContext, TimeOfDay};
pub use definition::{
    CompletedEventRecord, EventDefinition, EventFilter, EventType, Scene, SceneChoice,
};
pub use evaluator::{
    EventCheck, NearTrigger, check_all_events, check_event, is_event_on_cooldown,
    near_trigger_events,
};
