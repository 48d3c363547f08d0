//! # Heartline Session
//!
//! Integration layer that runs the heartline engine for one persona pairing.
//! A [`Companion`] owns its [`heartline_core::RecordStore`], working memory
//! and random source, assembles prompts, feeds generated replies through the
//! parser and the turn pipeline, and resolves scripted events.
//!
//! ```no_run
//! use heartline_core::{CharacterState, HeartlineConfig, InMemoryStore};
//! use heartline_session::Companion;
//!
//! # async fn demo() -> heartline_session::Result<()> {
//! let mut companion = Companion::new(
//!     InMemoryStore::new(),
//!     HeartlineConfig::default(),
//!     CharacterState::new("Aiko"),
//! );
//! companion.start_session(Vec::new()).await?;
//! let outcome = companion
//!     .process_turn("Hi! I work as a nurse.", "Nice to meet you!")
//!     .await?;
//! println!("{}", outcome.dialogue);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod companion;
pub mod error;
pub mod telemetry;

pub use companion::{Companion, EventResolution, SessionStart, StageChange, TurnOutcome};
pub use error::{Result, SessionError};
