//! The persistence interface the dispatch engine depends on.

use crate::error::StoreError;
use async_trait::async_trait;
use chime_core::{MessageId, OccurrenceId};
use chime_message::{MessageOccurrence, ScheduledMessage};
use chrono::{DateTime, Utc};

/// A due occurrence paired with its owning message definition.
///
/// The message is carried alongside so the engine can read the text,
/// schedule expression, and recipient metadata without a second query.
#[derive(Debug, Clone, PartialEq)]
pub struct DueOccurrence {
    /// The pending, due occurrence.
    pub occurrence: MessageOccurrence,
    /// The message definition that owns it.
    pub message: ScheduledMessage,
}

/// Factory for per-tick store scopes.
///
/// The engine opens a fresh scope each poll and drops it at tick end;
/// nothing loaded in one tick is retained into the next.
#[async_trait]
pub trait OccurrenceStore: Send + Sync {
    /// Opens a fresh unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the store cannot be
    /// reached.
    async fn begin(&self) -> Result<Box<dyn StoreScope>, StoreError>;
}

/// One tick's unit of work against the store.
///
/// Completions and appends are staged in memory and committed together by
/// [`save`](StoreScope::save): the whole batch persists atomically or not
/// at all.
#[async_trait]
pub trait StoreScope: Send {
    /// Returns every pending occurrence due at or before `as_of`, paired
    /// with its owning message, for active messages only.
    ///
    /// Ordering is stable (due instant, then occurrence id) so tests can
    /// rely on it; the engine itself processes items independently.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::QueryFailed`] when the query fails.
    async fn fetch_due_pending(
        &mut self,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<DueOccurrence>, StoreError>;

    /// Stages a Pending → Completed transition for the given occurrence.
    fn stage_completed(&mut self, occurrence_id: OccurrenceId);

    /// Stages a new pending occurrence under the given message.
    fn stage_append(&mut self, message_id: MessageId, occurrence: MessageOccurrence);

    /// Commits all staged transitions for the batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SaveFailed`] when the commit fails; in that
    /// case none of the staged transitions were persisted.
    async fn save(&mut self) -> Result<(), StoreError>;
}
