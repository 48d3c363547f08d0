//! Error types for the heartline core library.
//!
//! The engine functions themselves never fail: they return clamped,
//! best-effort values. These errors only surface at the persistence,
//! configuration, and event-resolution boundaries.

use thiserror::Error;

/// Top-level error type for heartline operations.
#[derive(Error, Debug)]
pub enum HeartlineError {
    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No catalogue entry exists for the given event identifier.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// A scene choice index was out of range for the event.
    #[error("Invalid choice {index} for event {event_id} ({available} available)")]
    InvalidChoice {
        /// Event the choice was made for.
        event_id: String,
        /// Requested choice index.
        index: usize,
        /// How many choices the scene offers.
        available: usize,
    },

    /// No character state has been saved yet.
    #[error("Character state not found")]
    StateNotFound,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, HeartlineError>;
