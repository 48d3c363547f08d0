//! In-process record store.

use parking_lot::Mutex;

use super::RecordStore;
use crate::error::Result;
use crate::events::{CompletedEventRecord, EventFilter};
use crate::facts::MemoryFact;
use crate::types::CharacterState;

#[derive(Debug, Default)]
struct Inner {
    state: Option<CharacterState>,
    events: Vec<CompletedEventRecord>,
    facts: Vec<MemoryFact>,
    next_id: i64,
}

impl Inner {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// [`RecordStore`] backed by process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `state`.
    #[must_use]
    pub fn with_state(state: CharacterState) -> Self {
        let store = Self::new();
        store.inner.lock().state = Some(state);
        store
    }
}

impl RecordStore for InMemoryStore {
    fn load_state(&self) -> Result<Option<CharacterState>> {
        Ok(self.inner.lock().state.clone())
    }

    fn save_state(&self, state: &CharacterState) -> Result<()> {
        self.inner.lock().state = Some(state.clone());
        Ok(())
    }

    fn clear_state(&self) -> Result<()> {
        self.inner.lock().state = None;
        Ok(())
    }

    fn completed_events(&self, filter: &EventFilter) -> Result<Vec<CompletedEventRecord>> {
        let inner = self.inner.lock();
        let mut matching: Vec<CompletedEventRecord> = inner
            .events
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        // Records may be appended out of chronological order.
        matching.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    fn append_completed_event(&self, record: &CompletedEventRecord) -> Result<i64> {
        let mut inner = self.inner.lock();
        let id = inner.allocate_id();
        let mut stored = record.clone();
        stored.id = Some(id);
        inner.events.push(stored);
        Ok(id)
    }

    fn save_fact(&self, fact: &MemoryFact) -> Result<i64> {
        let mut inner = self.inner.lock();
        let id = inner.allocate_id();
        let mut stored = fact.clone();
        stored.id = Some(id);
        inner.facts.push(stored);
        Ok(id)
    }

    fn facts(&self, limit: usize) -> Result<Vec<MemoryFact>> {
        let inner = self.inner.lock();
        let mut facts = inner.facts.clone();
        facts.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        facts.truncate(limit);
        Ok(facts)
    }

    fn facts_matching(
        &self,
        keywords: &[String],
        min_importance: u8,
        limit: usize,
    ) -> Result<Vec<MemoryFact>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let inner = self.inner.lock();
        let mut facts: Vec<MemoryFact> = inner
            .facts
            .iter()
            .filter(|f| f.importance >= min_importance && f.mentions_any(keywords))
            .cloned()
            .collect();
        facts.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        facts.truncate(limit);
        Ok(facts)
    }
}
