//! Error types for the session layer.

use thiserror::Error;

use heartline_core::HeartlineError;
use heartline_llm::LlmError;

/// Errors surfaced by a [`crate::Companion`].
#[derive(Error, Debug)]
pub enum SessionError {
    /// Persistence, configuration or event-resolution failure.
    #[error(transparent)]
    Core(#[from] HeartlineError),

    /// The dialogue source failed or its output was rejected.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// A blocking store call panicked or was cancelled.
    #[error("Blocking store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SessionError>;
