//! Postgres-backed occurrence store.
//!
//! Implements the engine's store traits over sqlx. Completions and
//! appends staged during a tick are committed in one transaction by
//! `save`, matching the batch-atomic contract the engine relies on.

use async_trait::async_trait;
use chime_core::{MessageId, OccurrenceId};
use chime_message::{
    MessageDetails, MessageOccurrence, MessageState, OccurrenceState, ScheduledMessage,
};
use chime_store::{DueOccurrence, OccurrenceStore, StoreError, StoreScope};
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{Connection, FromRow, PgPool, Postgres};
use std::str::FromStr;

/// Occurrence store over a Postgres pool.
#[derive(Clone)]
pub struct PgOccurrenceStore {
    pool: PgPool,
}

impl PgOccurrenceStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OccurrenceStore for PgOccurrenceStore {
    async fn begin(&self) -> Result<Box<dyn StoreScope>, StoreError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: e.to_string(),
            })?;

        Ok(Box::new(PgScope {
            conn,
            staged_completions: Vec::new(),
            staged_appends: Vec::new(),
        }))
    }
}

/// One tick's unit of work: a pooled connection plus staged transitions.
struct PgScope {
    conn: PoolConnection<Postgres>,
    staged_completions: Vec<OccurrenceId>,
    staged_appends: Vec<(MessageId, MessageOccurrence)>,
}

#[async_trait]
impl StoreScope for PgScope {
    async fn fetch_due_pending(
        &mut self,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<DueOccurrence>, StoreError> {
        let rows: Vec<DueRow> = sqlx::query_as(
            r#"
            SELECT o.id AS occurrence_id, o.next_occurrence, o.state AS occurrence_state,
                   m.id AS message_id, m.schedule, m.text, m.state AS message_state,
                   m.details, m.created_at
            FROM message_occurrences o
            JOIN scheduled_messages m ON m.id = o.message_id
            WHERE o.state = 'pending'
              AND o.next_occurrence <= $1
              AND m.state = 'active'
            ORDER BY o.next_occurrence, o.id
            "#,
        )
        .bind(as_of)
        .fetch_all(&mut *self.conn)
        .await
        .map_err(|e| StoreError::QueryFailed {
            reason: e.to_string(),
        })?;

        rows.into_iter().map(DueRow::try_into_due).collect()
    }

    fn stage_completed(&mut self, occurrence_id: OccurrenceId) {
        self.staged_completions.push(occurrence_id);
    }

    fn stage_append(&mut self, message_id: MessageId, occurrence: MessageOccurrence) {
        self.staged_appends.push((message_id, occurrence));
    }

    async fn save(&mut self) -> Result<(), StoreError> {
        let save_err = |e: sqlx::Error| StoreError::SaveFailed {
            reason: e.to_string(),
        };

        let mut tx = self.conn.begin().await.map_err(save_err)?;

        for occurrence_id in self.staged_completions.drain(..) {
            sqlx::query(
                r#"
                UPDATE message_occurrences
                SET state = 'completed'
                WHERE id = $1 AND state = 'pending'
                "#,
            )
            .bind(occurrence_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(save_err)?;
        }

        for (message_id, occurrence) in self.staged_appends.drain(..) {
            sqlx::query(
                r#"
                INSERT INTO message_occurrences (id, message_id, next_occurrence, state)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(occurrence.id.to_string())
            .bind(message_id.to_string())
            .bind(occurrence.next_occurrence)
            .bind(occurrence.state.as_str())
            .execute(&mut *tx)
            .await
            .map_err(save_err)?;
        }

        tx.commit().await.map_err(save_err)
    }
}

/// Row type for the due-occurrence query.
#[derive(FromRow)]
struct DueRow {
    occurrence_id: String,
    next_occurrence: DateTime<Utc>,
    occurrence_state: String,
    message_id: String,
    schedule: String,
    text: String,
    message_state: String,
    details: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl DueRow {
    fn try_into_due(self) -> Result<DueOccurrence, StoreError> {
        let decode = |field: &str, detail: String| StoreError::QueryFailed {
            reason: format!("invalid {field}: {detail}"),
        };

        let occurrence_id = OccurrenceId::from_str(&self.occurrence_id)
            .map_err(|e| decode("occurrence id", e.to_string()))?;
        let message_id = MessageId::from_str(&self.message_id)
            .map_err(|e| decode("message id", e.to_string()))?;
        let details: MessageDetails = serde_json::from_value(self.details)
            .map_err(|e| decode("message details", e.to_string()))?;

        Ok(DueOccurrence {
            occurrence: MessageOccurrence {
                id: occurrence_id,
                next_occurrence: self.next_occurrence,
                state: OccurrenceState::from_str_value(&self.occurrence_state),
            },
            message: ScheduledMessage {
                id: message_id,
                schedule: self.schedule,
                text: self.text,
                state: MessageState::from_str_value(&self.message_state),
                details,
                created_at: self.created_at,
            },
        })
    }
}
