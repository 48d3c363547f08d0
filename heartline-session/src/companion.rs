//! One persona pairing, end to end.
//!
//! A [`Companion`] owns the record store, the working memory and the random
//! source for a single user/persona pairing and drives the engine through a
//! session:
//!
//! ```text
//! start_session ─► time decay ─► stage check ─► event sweep (absence, time of day)
//!       │
//!       ▼
//! prompt_for / respond ─► process_turn ─► interaction bookkeeping
//!                                        ─► baseline ⊕ directive ─► apply
//!                                        ─► stage check ─► facts ─► event sweep
//!       │
//!       ▼
//! resolve_event (caller picked a choice) ─► apply ─► record ─► stage check
//!       │
//!       ▼
//! end_session
//! ```
//!
//! Store calls run on tokio's blocking pool. Every mutating method takes
//! `&mut self`, so writes for the pairing are serialised by ownership.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use heartline_core::decay::calculate_time_decay;
use heartline_core::events::{
    CompletedEventRecord, EvaluationContext, EventDefinition, EventFilter, NearTrigger,
    builtin_events, check_all_events, is_event_on_cooldown, near_trigger_events,
};
use heartline_core::facts::{
    MemoryFact, extract_facts_from_conversation, extract_potential_facts, trigger_words,
};
use heartline_core::heuristics::analyze;
use heartline_core::impact::{calculate_impact, updates_from_impact};
use heartline_core::merge::merge_updates;
use heartline_core::stages::check_stage_transition_at;
use heartline_core::update::{apply_state_updates_at, record_interaction};
use heartline_core::{
    CharacterState, ConversationTurn, HeartlineConfig, HeartlineError, RecordStore,
    RelationshipStage, Role, StateUpdates, UniformSource, WorkingMemory,
};
use heartline_llm::{ChatMessage, DialogueSource, build_messages, parse_response};

use crate::error::Result;

/// Facts handed to prompt assembly.
pub const PROMPT_FACT_LIMIT: usize = 10;
/// Minimum importance for a fact recalled by a name or "remember when" subject.
pub const TRIGGER_FACT_IMPORTANCE: u8 = 70;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A stage move observed during a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageChange {
    /// Stage before.
    pub from: RelationshipStage,
    /// Stage after.
    pub to: RelationshipStage,
}

/// What happened when a session opened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStart {
    /// Hours since the last interaction, if there was one.
    pub hours_away: Option<f64>,
    /// Decay and recovery applied for the absence not yet decayed.
    pub decay: StateUpdates,
    /// Stage transition caused by the decay, if any.
    pub stage_change: Option<StageChange>,
    /// Whether prior turns were loaded into working memory.
    pub hydrated: bool,
    /// Catalogue events that fire right now, highest priority first.
    pub triggered_events: Vec<String>,
}

/// Result of one processed turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    /// Cleaned dialogue to show the user.
    pub dialogue: String,
    /// Why the model's directive block was rejected, if it was.
    pub parse_error: Option<String>,
    /// The merged delta that was applied.
    pub applied: StateUpdates,
    /// Stage movement caused by this turn.
    pub stage_change: Option<StageChange>,
    /// Catalogue events that fire after this turn, highest priority first.
    pub triggered_events: Vec<String>,
    /// Catalogue event the model asked for. Suggested only; resolve it with
    /// [`Companion::resolve_event`].
    pub pending_event: Option<String>,
    /// Facts stored from this exchange.
    pub new_facts: Vec<String>,
}

/// Result of resolving a scripted event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResolution {
    /// The record appended to the history (with its store id).
    pub record: CompletedEventRecord,
    /// The persona's reply to the chosen branch, if any.
    pub response: Option<String>,
    /// Stage movement caused by the event.
    pub stage_change: Option<StageChange>,
}

// ---------------------------------------------------------------------------
// Companion
// ---------------------------------------------------------------------------

/// Session driver for one user/persona pairing.
pub struct Companion<S> {
    store: Arc<S>,
    config: HeartlineConfig,
    state: CharacterState,
    memory: WorkingMemory,
    rng: Box<dyn UniformSource + Send + Sync>,
    catalogue: &'static [EventDefinition],
}

impl<S> fmt::Debug for Companion<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Companion")
            .field("persona", &self.state.persona_id)
            .field("stage", &self.state.relationship_stage)
            .field("memory_turns", &self.memory.len())
            .finish_non_exhaustive()
    }
}

impl<S> Companion<S>
where
    S: RecordStore + Send + Sync + 'static,
{
    /// A companion over `store`. `initial` is used until a session start finds
    /// a saved state.
    #[must_use]
    pub fn new(store: S, config: HeartlineConfig, initial: CharacterState) -> Self {
        let memory = WorkingMemory::new(config.session.working_memory_turns);
        Self {
            store: Arc::new(store),
            config,
            state: initial,
            memory,
            rng: Box::new(StdRng::from_entropy()),
            catalogue: builtin_events(),
        }
    }

    /// Replace the random source (seeded or scripted draws for tests).
    #[must_use]
    pub fn with_rng(mut self, rng: impl UniformSource + Send + Sync + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    /// Turns held for this session.
    #[must_use]
    pub fn memory(&self) -> &WorkingMemory {
        &self.memory
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &HeartlineConfig {
        &self.config
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> heartline_core::Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let value = tokio::task::spawn_blocking(move || op(store.as_ref())).await??;
        Ok(value)
    }

    async fn persist_state(&self) -> Result<()> {
        let snapshot = self.state.clone();
        self.with_store(move |s| s.save_state(&snapshot)).await
    }

    async fn history(&self) -> Result<Vec<CompletedEventRecord>> {
        self.with_store(|s| s.completed_events(&EventFilter::default())).await
    }

    fn local_time(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.config.session.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        now.with_timezone(&offset)
    }

    fn sweep(&mut self, records: &[CompletedEventRecord], ctx: &EvaluationContext<'_>) -> Vec<String> {
        check_all_events(self.catalogue, &self.state, records, ctx, self.rng.as_mut())
            .into_iter()
            .map(|e| e.id.clone())
            .collect()
    }

    fn recheck_stage(&mut self, now: DateTime<Utc>) -> Option<StageChange> {
        let transition =
            check_stage_transition_at(&self.state, &self.state.completed_events, now);
        self.state = transition.state;
        transition.transitioned.then_some(StageChange {
            from: transition.from,
            to: transition.to,
        })
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Open a session now. See [`Companion::start_session_at`].
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn start_session(&mut self, prior_turns: Vec<ConversationTurn>) -> Result<SessionStart> {
        self.start_session_at(prior_turns, Utc::now()).await
    }

    /// Open a session at `now`: load the saved state (or keep the initial one),
    /// apply decay for the absence not yet decayed, re-check the stage, sweep
    /// events, save, and load `prior_turns` into a fresh working memory.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn start_session_at(
        &mut self,
        prior_turns: Vec<ConversationTurn>,
        now: DateTime<Utc>,
    ) -> Result<SessionStart> {
        if let Some(saved) = self.with_store(|s| s.load_state()).await? {
            self.state = saved;
        }

        let hours_away = self.state.hours_since_last_interaction(now);
        let decay = self
            .state
            .hours_since_last_decay(now)
            .map_or_else(StateUpdates::default, |hours| {
                calculate_time_decay(&self.state, hours)
            });
        if !decay.is_empty() {
            self.state = apply_state_updates_at(&self.state, &decay, now);
            self.state.last_decay_at = Some(now);
        }
        let stage_change = self.recheck_stage(now);

        let records = self.history().await?;
        let ctx = EvaluationContext::at(self.local_time(now));
        let triggered_events = self.sweep(&records, &ctx);
        self.persist_state().await?;

        self.memory.clear_at(now);
        let hydrated = self.memory.hydrate(prior_turns);

        info!(
            persona = %self.state.persona_id,
            stage = %self.state.relationship_stage,
            hours_away,
            hydrated,
            stage_changed = stage_change.is_some(),
            triggered = triggered_events.len(),
            "Session started"
        );
        Ok(SessionStart {
            hours_away,
            decay,
            stage_change,
            hydrated,
            triggered_events,
        })
    }

    /// Close the session: save the state and drop the working memory.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn end_session(&mut self) -> Result<()> {
        self.persist_state().await?;
        info!(
            persona = %self.state.persona_id,
            messages = self.memory.message_count(),
            "Session ended"
        );
        self.memory.clear();
        Ok(())
    }

    /// Forget the saved state and start over from `fresh`. Event history and
    /// facts are kept.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn reset(&mut self, fresh: CharacterState) -> Result<()> {
        self.with_store(|s| s.clear_state()).await?;
        self.state = fresh;
        self.memory.clear();
        info!(persona = %self.state.persona_id, "State reset");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Turns
    // -----------------------------------------------------------------------

    /// Message list for answering `user_message`: system prompt with the facts
    /// relevant to it, the recent turn window, then the message itself. If the
    /// facts cannot be read the prompt is built without them.
    pub async fn prompt_for(&self, user_message: &str) -> Vec<ChatMessage> {
        let facts = match self.relevant_facts(user_message).await {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "Memory facts unavailable, prompting without them");
                Vec::new()
            }
        };
        let recent = self.memory.recent(self.config.session.recent_turn_window);
        build_messages(&self.state, &facts, &recent, user_message)
    }

    /// Up to [`PROMPT_FACT_LIMIT`] facts for `user_message`, deduplicated by
    /// content: important facts on its trigger words first, then facts on its
    /// keywords, then the most important facts overall.
    async fn relevant_facts(&self, user_message: &str) -> Result<Vec<MemoryFact>> {
        let triggers = trigger_words(user_message);
        let keywords = analyze(user_message).mentioned_keywords;
        let facts = self
            .with_store(move |s| {
                let mut facts =
                    s.facts_matching(&triggers, TRIGGER_FACT_IMPORTANCE, PROMPT_FACT_LIMIT)?;
                facts.extend(s.facts_matching(&keywords, 0, PROMPT_FACT_LIMIT)?);
                facts.extend(s.facts(PROMPT_FACT_LIMIT)?);
                Ok(facts)
            })
            .await?;

        let mut seen = HashSet::new();
        let mut relevant: Vec<MemoryFact> = facts
            .into_iter()
            .filter(|f| seen.insert(f.content.clone()))
            .collect();
        relevant.truncate(PROMPT_FACT_LIMIT);
        Ok(relevant)
    }

    /// Ask `source` for a reply to `user_message` and process it.
    ///
    /// # Errors
    /// Returns an error if the source or the store fails.
    pub async fn respond<D: DialogueSource>(
        &mut self,
        user_message: &str,
        source: &D,
    ) -> Result<TurnOutcome> {
        let messages = self.prompt_for(user_message).await;
        let raw = source.generate(&messages).await?;
        self.process_turn(user_message, &raw).await
    }

    /// Process a turn now. See [`Companion::process_turn_at`].
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn process_turn(&mut self, user_message: &str, raw_response: &str) -> Result<TurnOutcome> {
        self.process_turn_at(user_message, raw_response, Utc::now()).await
    }

    /// Run the per-turn pipeline for `user_message` and the model's
    /// `raw_response` at `now`.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn process_turn_at(
        &mut self,
        user_message: &str,
        raw_response: &str,
        now: DateTime<Utc>,
    ) -> Result<TurnOutcome> {
        let parsed = parse_response(raw_response);

        self.state = record_interaction(&self.state, now);

        let analysis = analyze(user_message);
        let impact = calculate_impact(
            &analysis,
            &self.state,
            self.config.impact.variance,
            self.rng.as_mut(),
        );
        let baseline = updates_from_impact(&analysis, impact);
        let applied = merge_updates(&baseline, parsed.directive.as_ref());
        self.state = apply_state_updates_at(&self.state, &applied, now);
        let stage_change = self.recheck_stage(now);

        self.memory
            .push(ConversationTurn::new(Role::User, user_message, now));
        self.memory
            .push(ConversationTurn::new(Role::Companion, parsed.dialogue.clone(), now));

        let mut new_facts = extract_facts_from_conversation(user_message, &parsed.dialogue);
        let candidates = extract_potential_facts(&parsed.dialogue, user_message)
            .into_iter()
            .chain(applied.new_memory.clone());
        for candidate in candidates {
            if !new_facts.iter().any(|f| f.contains(candidate.as_str())) {
                new_facts.push(candidate);
            }
        }
        if !new_facts.is_empty() {
            let scored: Vec<MemoryFact> = new_facts
                .iter()
                .map(|f| MemoryFact::scored(f.as_str(), analysis.sentiment, now))
                .collect();
            let saved = self
                .with_store(move |s| scored.iter().try_for_each(|f| s.save_fact(f).map(drop)))
                .await;
            if let Err(e) = saved {
                warn!(error = %e, "Could not store memory facts");
                new_facts.clear();
            }
        }

        let records = self.history().await?;
        let ctx = EvaluationContext::at(self.local_time(now)).with_message(user_message);
        let triggered_events = self.sweep(&records, &ctx);

        let pending_event = applied.triggered_event.as_deref().and_then(|id| {
            let event = self.catalogue.iter().find(|e| e.id == id)?;
            (!is_event_on_cooldown(event, &records, now)).then(|| event.id.clone())
        });

        self.persist_state().await?;

        debug!(
            persona = %self.state.persona_id,
            affection = self.state.affection,
            trust = self.state.trust,
            directive = parsed.directive.is_some(),
            triggered = triggered_events.len(),
            pending = pending_event.as_deref(),
            "Turn processed"
        );
        Ok(TurnOutcome {
            dialogue: parsed.dialogue,
            parse_error: parsed.parse_error,
            applied,
            stage_change,
            triggered_events,
            pending_event,
            new_facts,
        })
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Resolve an event now. See [`Companion::resolve_event_at`].
    ///
    /// # Errors
    /// See [`Companion::resolve_event_at`].
    pub async fn resolve_event(
        &mut self,
        event_id: &str,
        choice_index: Option<usize>,
    ) -> Result<EventResolution> {
        self.resolve_event_at(event_id, choice_index, Utc::now()).await
    }

    /// Play out a catalogue event at `now`.
    ///
    /// With a `choice_index` the chosen branch's delta is applied; without one
    /// the event's own delta (if any) is. The record is appended, the event
    /// (and the branch's follow-up scene id) joins `completed_events`, and the
    /// stage is re-evaluated.
    ///
    /// # Errors
    /// Returns `UnknownEvent` for an id outside the catalogue,
    /// `InvalidChoice` for an out-of-range branch, or a store error.
    pub async fn resolve_event_at(
        &mut self,
        event_id: &str,
        choice_index: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<EventResolution> {
        let catalogue = self.catalogue;
        let event = catalogue
            .iter()
            .find(|e| e.id == event_id)
            .ok_or_else(|| HeartlineError::UnknownEvent(event_id.to_string()))?;

        let choice = match choice_index {
            Some(index) => {
                let choices = event.choices();
                Some(choices.get(index).ok_or_else(|| HeartlineError::InvalidChoice {
                    event_id: event_id.to_string(),
                    index,
                    available: choices.len(),
                })?)
            }
            None => None,
        };

        let delta = choice.map_or_else(
            || event.state_changes.clone().unwrap_or_default(),
            |c| c.state_changes.clone(),
        );
        self.state = apply_state_updates_at(&self.state, &delta, now);

        let mut record = CompletedEventRecord {
            id: None,
            event_id: event.id.clone(),
            event_type: event.event_type,
            choice_index,
            outcome: choice.map(|c| c.text.clone()),
            state_changes: (!delta.is_empty()).then_some(delta),
            completed_at: now,
        };
        let to_append = record.clone();
        record.id = Some(self.with_store(move |s| s.append_completed_event(&to_append)).await?);

        let follow_up = choice.and_then(|c| c.next_scene_id.as_deref());
        for id in std::iter::once(event.id.as_str()).chain(follow_up) {
            if !self.state.completed_events.iter().any(|c| c == id) {
                self.state.completed_events.push(id.to_string());
            }
        }

        let stage_change = self.recheck_stage(now);
        self.persist_state().await?;

        info!(
            persona = %self.state.persona_id,
            event = %event.id,
            choice = choice_index,
            stage = %self.state.relationship_stage,
            "Event resolved"
        );
        Ok(EventResolution {
            record,
            response: choice.map(|c| c.response.clone()),
            stage_change,
        })
    }

    /// Events that are partly satisfied right now, most advanced first.
    /// Advisory only.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn near_trigger_events(&self) -> Result<Vec<NearTrigger<'static>>> {
        let records = self.history().await?;
        let ctx = EvaluationContext::at(self.local_time(Utc::now()));
        Ok(near_trigger_events(
            self.catalogue,
            &self.state,
            &records,
            &ctx,
            self.config.events.near_trigger_min_progress,
        ))
    }
}
