//! Persistence collaborators.
//!
//! The engine itself never performs I/O. [`RecordStore`] is the boundary the
//! session layer talks to: one store per user/persona pairing, holding the
//! current [`CharacterState`], the append-only completed-event log and the
//! memory facts.
//!
//! Two implementations ship with the crate:
//! - [`InMemoryStore`] for tests and ephemeral sessions.
//! - [`SqliteStore`] for durable saves (JSON blobs, CRC-32, WAL).

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::events::{CompletedEventRecord, EventFilter};
use crate::facts::MemoryFact;
use crate::types::CharacterState;

/// Storage for one pairing's state, event history and facts.
///
/// Implementations are synchronous; async callers should move calls onto a
/// blocking thread. Writes for one pairing must be serialised by the caller.
pub trait RecordStore {
    /// The saved state, if any.
    ///
    /// # Errors
    /// Returns an error if the backend fails or the stored data is unreadable.
    fn load_state(&self) -> Result<Option<CharacterState>>;

    /// Replace the saved state.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn save_state(&self, state: &CharacterState) -> Result<()>;

    /// Forget the saved state. Event history and facts are kept.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn clear_state(&self) -> Result<()>;

    /// Completed-event records matching `filter`, most recent first.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn completed_events(&self, filter: &EventFilter) -> Result<Vec<CompletedEventRecord>>;

    /// Append a completed-event record and return its identifier.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn append_completed_event(&self, record: &CompletedEventRecord) -> Result<i64>;

    /// Store a memory fact and return its identifier.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn save_fact(&self, fact: &MemoryFact) -> Result<i64>;

    /// Up to `limit` facts, most important first (newest first on ties).
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn facts(&self, limit: usize) -> Result<Vec<MemoryFact>>;

    /// Up to `limit` facts of at least `min_importance` whose content mentions
    /// any of `keywords` (case-insensitive), ordered like [`RecordStore::facts`].
    /// An empty keyword list matches nothing.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn facts_matching(
        &self,
        keywords: &[String],
        min_importance: u8,
        limit: usize,
    ) -> Result<Vec<MemoryFact>>;
}
