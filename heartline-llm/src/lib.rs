//! # heartline-llm: Generation-Service Boundary
//!
//! Everything between the relationship engine and the model that writes the
//! companion's lines:
//!   - **Prompt assembly**: persona, stage instructions and behaviour
//!     descriptors rendered into a system prompt
//!   - **Response parsing**: dialogue cleanup plus extraction of the
//!     embedded state directive
//!   - **Directive validation**: clamping and warnings for structured
//!     directives
//!
//! No network client lives here; callers plug one in through
//! [`DialogueSource`].
//!
//! ```text
//! CharacterState ─► prompt::build_messages ─► DialogueSource ─► raw text
//!                                                                  │
//!                      parser::parse_response ◄────────────────────┘
//!                        ├─ dialogue (cleaned, never empty)
//!                        └─ directive (bounded StateUpdates) ─► merge_updates
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod directive;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod source;

pub use directive::{Directive, DirectiveMood, DirectiveValidation};
pub use error::LlmError;
pub use parser::{FALLBACK_DIALOGUE, ParsedResponse, parse_response};
pub use prompt::{ChatMessage, ChatRole, build_messages, build_system_prompt};
pub use source::{DialogueSource, ScriptedSource};
