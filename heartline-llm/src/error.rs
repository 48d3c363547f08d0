//! Generation-boundary error types.

use thiserror::Error;

/// Errors raised at the generation-service boundary.
///
/// The lenient parser never returns these; they come from the strict entry
/// points ([`crate::Directive::from_json`], [`crate::DirectiveValidation::into_result`])
/// and from [`crate::DialogueSource`] implementations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Generated text was not valid JSON.
    #[error("Failed to parse directive as JSON: {0}")]
    ParseError(String),

    /// Directive parsed but failed validation.
    #[error("Directive validation failed: {0}")]
    SchemaValidation(String),

    /// The generation service could not produce a reply.
    #[error("Generation service unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LlmError>;
