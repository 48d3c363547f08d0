//! Dialogue source abstraction.
//!
//! The network client that talks to a model lives outside this workspace.
//! Anything that turns a message list into raw text implements
//! [`DialogueSource`]; [`ScriptedSource`] replays canned replies.

use std::collections::VecDeque;
use std::future::Future;

use parking_lot::Mutex;

use crate::error::{LlmError, Result};
use crate::prompt::ChatMessage;

/// Produces raw generated text for a conversation.
pub trait DialogueSource: Send + Sync {
    /// Generate a reply for `messages`.
    ///
    /// The reply may embed a directive block as described in
    /// [`crate::parser`].
    fn generate(&self, messages: &[ChatMessage]) -> impl Future<Output = Result<String>> + Send;
}

/// Replays a fixed queue of replies, then reports itself unavailable.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedSource {
    /// A source that answers with `replies` in order.
    #[must_use]
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }

    /// Replies not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

impl DialogueSource for ScriptedSource {
    async fn generate(&self, _messages: &[ChatMessage]) -> Result<String> {
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| LlmError::Unavailable("script exhausted".to_string()))
    }
}
