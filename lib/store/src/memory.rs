//! In-memory occurrence store.
//!
//! Backs the engine's tests and local runs without a database. Shares its
//! state across clones, so a test can open scopes through the
//! [`OccurrenceStore`] interface while inspecting the store directly.

use crate::error::StoreError;
use crate::store::{DueOccurrence, OccurrenceStore, StoreScope};
use async_trait::async_trait;
use chime_core::{MessageId, OccurrenceId};
use chime_message::{MessageOccurrence, OccurrenceState, ScheduledMessage};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MemoryState {
    messages: HashMap<MessageId, ScheduledMessage>,
    occurrences: Vec<OwnedOccurrence>,
    fail_next_saves: u32,
}

#[derive(Debug, Clone)]
struct OwnedOccurrence {
    message_id: MessageId,
    occurrence: MessageOccurrence,
}

/// An in-memory occurrence store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a message definition.
    pub fn insert_message(&self, message: ScheduledMessage) {
        let mut state = self.state.lock().expect("store lock poisoned");
        state.messages.insert(message.id, message);
    }

    /// Inserts an occurrence under an existing message, committed
    /// immediately (the authoring-flow path, not the engine's).
    pub fn insert_occurrence(&self, message_id: MessageId, occurrence: MessageOccurrence) {
        let mut state = self.state.lock().expect("store lock poisoned");
        state.occurrences.push(OwnedOccurrence {
            message_id,
            occurrence,
        });
    }

    /// Returns the committed occurrences for a message, in insertion order.
    #[must_use]
    pub fn occurrences_for(&self, message_id: MessageId) -> Vec<MessageOccurrence> {
        let state = self.state.lock().expect("store lock poisoned");
        state
            .occurrences
            .iter()
            .filter(|owned| owned.message_id == message_id)
            .map(|owned| owned.occurrence.clone())
            .collect()
    }

    /// Makes the next `count` saves fail with [`StoreError::SaveFailed`],
    /// leaving state untouched.
    pub fn fail_next_saves(&self, count: u32) {
        let mut state = self.state.lock().expect("store lock poisoned");
        state.fail_next_saves = count;
    }
}

#[async_trait]
impl OccurrenceStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreScope>, StoreError> {
        Ok(Box::new(MemoryScope {
            state: Arc::clone(&self.state),
            staged_completions: Vec::new(),
            staged_appends: Vec::new(),
        }))
    }
}

/// One tick's unit of work against a [`MemoryStore`].
struct MemoryScope {
    state: Arc<Mutex<MemoryState>>,
    staged_completions: Vec<OccurrenceId>,
    staged_appends: Vec<OwnedOccurrence>,
}

#[async_trait]
impl StoreScope for MemoryScope {
    async fn fetch_due_pending(
        &mut self,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<DueOccurrence>, StoreError> {
        let state = self.state.lock().expect("store lock poisoned");

        let mut due: Vec<DueOccurrence> = state
            .occurrences
            .iter()
            .filter(|owned| owned.occurrence.is_due(as_of))
            .filter_map(|owned| {
                let message = state.messages.get(&owned.message_id)?;
                message.is_active().then(|| DueOccurrence {
                    occurrence: owned.occurrence.clone(),
                    message: message.clone(),
                })
            })
            .collect();

        due.sort_by_key(|item| (item.occurrence.next_occurrence, item.occurrence.id));
        Ok(due)
    }

    fn stage_completed(&mut self, occurrence_id: OccurrenceId) {
        self.staged_completions.push(occurrence_id);
    }

    fn stage_append(&mut self, message_id: MessageId, occurrence: MessageOccurrence) {
        self.staged_appends.push(OwnedOccurrence {
            message_id,
            occurrence,
        });
    }

    async fn save(&mut self) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("store lock poisoned");

        if state.fail_next_saves > 0 {
            state.fail_next_saves -= 1;
            return Err(StoreError::SaveFailed {
                reason: "simulated save failure".to_string(),
            });
        }

        // Both stages apply under one lock: the batch is atomic.
        for occurrence_id in self.staged_completions.drain(..) {
            if let Some(owned) = state
                .occurrences
                .iter_mut()
                .find(|owned| owned.occurrence.id == occurrence_id)
            {
                if owned.occurrence.state == OccurrenceState::Pending {
                    owned.occurrence.complete();
                }
            }
        }
        state.occurrences.append(&mut self.staged_appends);

        Ok(())
    }
}
