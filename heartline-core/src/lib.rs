//! # Heartline Core Library
//!
//! Relationship state-and-event engine for companion characters.
//!
//! One [`CharacterState`] per user/persona pairing tracks:
//!
//! - **Mood**: a primary [`Emotion`], an intensity and the last few causes
//! - **Relational stats**: affection (0–1000), trust, intimacy, comfort, respect
//! - **Energy**: drained by conversation, recovered by time away
//! - **Stage**: an ordered progression from stranger to soulmate, or the
//!   locked companion variant
//!
//! Each turn flows through pure functions:
//!
//! ```text
//! user text ─► heuristics::analyze ─► impact::calculate_impact ─► baseline delta ─┐
//! model directive (heartline-llm) ──────────────────────────────► suggested delta ┤
//!                                                        merge::merge_updates ◄───┘
//!                                                                   │
//!                            update::apply_state_updates ◄──────────┘
//!                                        │
//!                   stages::check_stage_transition, events::check_all_events
//! ```
//!
//! None of these functions perform I/O or fail; they return clamped,
//! best-effort values. Errors exist only at the persistence and config
//! boundary.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod decay;
pub mod error;
pub mod events;
pub mod facts;
pub mod heuristics;
pub mod impact;
pub mod merge;
pub mod persistence;
pub mod rng;
pub mod stages;
pub mod types;
pub mod update;
pub mod working_memory;

pub use config::HeartlineConfig;
pub use error::{HeartlineError, Result};
pub use persistence::{InMemoryStore, RecordStore, SqliteStore};
pub use rng::{SequenceSource, UniformSource};
pub use types::*;
pub use working_memory::{ConversationTurn, Role, WorkingMemory};
