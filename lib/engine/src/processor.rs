//! The polling loop and per-tick processing.
//!
//! Each tick opens a fresh store scope, fetches every pending occurrence
//! due by now, processes the batch item by item, and commits all staged
//! transitions with a single save. Failure handling:
//!
//! - a transport failure leaves the occurrence pending, so it is retried
//!   on a later poll (at-least-once delivery);
//! - a failure on one occurrence never aborts the rest of the batch;
//! - a failed save is logged and swallowed; nothing durably advanced, so
//!   the next poll naturally retries the same occurrences;
//! - anything escaping a whole tick is logged and the loop continues.
//!
//! The loop stops only when the shutdown signal is observed at loop top.

use chime_dispatch::{Dispatcher, TransportError};
use chime_message::{MessageOccurrence, ScheduledMessage};
use chime_schedule::Schedule;
use chime_store::{DueOccurrence, OccurrenceStore, StoreError, StoreScope};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;

/// The background processor that sends out scheduled messages.
pub struct MessageProcessor<S> {
    store: S,
    dispatcher: Dispatcher,
    polling_interval: Duration,
}

impl<S: OccurrenceStore> MessageProcessor<S> {
    /// Creates a processor over the given store and dispatcher.
    #[must_use]
    pub fn new(store: S, dispatcher: Dispatcher, polling_interval: Duration) -> Self {
        Self {
            store,
            dispatcher,
            polling_interval,
        }
    }

    /// Runs the polling loop until `shutdown` flips to true.
    ///
    /// Intended to be spawned as a long-lived task by the host process.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.polling_interval.as_secs_f64(),
            "starting scheduled message polling"
        );

        while !*shutdown.borrow() {
            if let Err(error) = self.tick().await {
                tracing::error!(error = %error, "scheduled message tick failed");
            }
            self.wait(&mut shutdown).await;
        }

        tracing::info!("stopping scheduled message polling");
    }

    /// One poll: fetch, process, persist.
    async fn tick(&self) -> Result<(), StoreError> {
        tracing::debug!("starting to process the scheduled message queue");

        let mut scope = self.store.begin().await?;
        let now = Utc::now();
        let due = scope.fetch_due_pending(now).await?;

        if !due.is_empty() {
            tracing::info!(count = due.len(), "processing due occurrences");
        }
        for item in due {
            self.process_occurrence(scope.as_mut(), item).await;
        }

        if let Err(error) = scope.save().await {
            // Staged completions and appends for this tick are lost; the
            // occurrences stayed pending in the store, so the next poll
            // fetches and retries them.
            tracing::error!(error = %error, "failed to persist tick batch");
        }

        tracing::debug!("finished processing the scheduled message queue");
        Ok(())
    }

    /// Processes one due occurrence, isolating its failures from the rest
    /// of the batch.
    async fn process_occurrence(&self, scope: &mut dyn StoreScope, due: DueOccurrence) {
        let message_id = due.message.id;
        let occurrence_id = due.occurrence.id;
        tracing::info!(%message_id, %occurrence_id, "processing scheduled message");

        match self.dispatcher.dispatch(&due.message).await {
            Ok(()) => {
                scope.stage_completed(occurrence_id);
                self.schedule_next(scope, &due.message);
                tracing::info!(%message_id, %occurrence_id, "scheduled message dispatched");
            }
            Err(TransportError::Rejected { status, body }) => {
                let body = serde_json::to_string_pretty(&body)
                    .unwrap_or_else(|_| body.to_string());
                tracing::error!(
                    %message_id,
                    %occurrence_id,
                    status = status.map(i64::from),
                    body = %body,
                    "remote rejected scheduled message; occurrence stays pending"
                );
            }
            Err(error) => {
                tracing::error!(
                    %message_id,
                    %occurrence_id,
                    error = %error,
                    "sending scheduled message failed; occurrence stays pending"
                );
            }
        }
    }

    /// Stages the following occurrence for a just-dispatched message.
    ///
    /// The next occurrence is computed from now, the dispatch instant,
    /// not from the previous scheduled time, so repeated missed polls
    /// never produce catch-up storms.
    fn schedule_next(&self, scope: &mut dyn StoreScope, message: &ScheduledMessage) {
        let schedule = match Schedule::parse(&message.schedule, message.details.time_zone_offset) {
            Ok(schedule) => schedule,
            Err(error) => {
                // The definition stops recurring until externally
                // corrected; the batch itself is unaffected.
                tracing::error!(
                    message_id = %message.id,
                    schedule = %message.schedule,
                    error = %error,
                    "schedule no longer parses; no further occurrence created"
                );
                return;
            }
        };

        match schedule.next_occurrence(Utc::now()) {
            Some(next) => {
                scope.stage_append(message.id, MessageOccurrence::pending(next));
            }
            None => {
                tracing::error!(
                    message_id = %message.id,
                    schedule = %message.schedule,
                    "schedule produced no future occurrence; none created"
                );
            }
        }
    }

    /// Sleeps out the polling interval, waking early on shutdown.
    ///
    /// A shutdown wake-up here is a normal exit from the wait, not an
    /// error; the loop-top check decides whether to stop.
    async fn wait(&self, shutdown: &mut watch::Receiver<bool>) {
        tracing::debug!("waiting for the next poll");
        tokio::select! {
            () = tokio::time::sleep(self.polling_interval) => {}
            _ = shutdown.changed() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_dispatch::MockTransport;
    use chime_message::{MessageDetails, MessageOccurrence, OccurrenceState, ScheduledMessage};
    use chime_store::MemoryStore;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use std::sync::Arc;

    fn hourly_message() -> ScheduledMessage {
        ScheduledMessage::new(
            "0 * * * *",
            "Standup in 15 minutes",
            MessageDetails {
                recipients: vec!["@standup".to_string()],
                channel: "webhook".to_string(),
                time_zone_offset: 0,
            },
        )
    }

    fn processor(
        store: &MemoryStore,
        transport: Arc<MockTransport>,
    ) -> MessageProcessor<MemoryStore> {
        MessageProcessor::new(
            store.clone(),
            Dispatcher::new(transport),
            Duration::from_millis(10),
        )
    }

    fn seed_due(store: &MemoryStore, message: &ScheduledMessage) -> MessageOccurrence {
        let occurrence =
            MessageOccurrence::pending(Utc::now() - ChronoDuration::seconds(1));
        store.insert_message(message.clone());
        store.insert_occurrence(message.id, occurrence.clone());
        occurrence
    }

    #[tokio::test]
    async fn successful_dispatch_completes_and_reschedules() {
        let store = MemoryStore::new();
        let transport = Arc::new(MockTransport::succeeding());
        let message = hourly_message();
        let seeded = seed_due(&store, &message);

        let before = Utc::now();
        processor(&store, transport.clone()).tick().await.unwrap();

        assert_eq!(transport.sent(), vec![message.id]);

        let occurrences = store.occurrences_for(message.id);
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].id, seeded.id);
        assert_eq!(occurrences[0].state, OccurrenceState::Completed);

        // The appended occurrence is pending and strictly in the future
        // relative to the dispatch instant.
        assert_eq!(occurrences[1].state, OccurrenceState::Pending);
        assert!(occurrences[1].next_occurrence > before);
    }

    #[tokio::test]
    async fn completed_occurrence_is_not_dispatched_twice() {
        let store = MemoryStore::new();
        let transport = Arc::new(MockTransport::succeeding());
        let message = hourly_message();
        seed_due(&store, &message);

        let processor = processor(&store, transport.clone());
        processor.tick().await.unwrap();
        processor.tick().await.unwrap();

        // The second tick found nothing due: exactly one send happened.
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn failed_dispatch_leaves_occurrence_pending() {
        let store = MemoryStore::new();
        let transport = Arc::new(MockTransport::failing(TransportError::Failed {
            message: "connection refused".to_string(),
        }));
        let message = hourly_message();
        let seeded = seed_due(&store, &message);

        processor(&store, transport).tick().await.unwrap();

        let occurrences = store.occurrences_for(message.id);
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].state, OccurrenceState::Pending);
        assert_eq!(occurrences[0].id, seeded.id);
    }

    #[tokio::test]
    async fn rejected_dispatch_leaves_occurrence_pending() {
        let store = MemoryStore::new();
        let transport = Arc::new(MockTransport::failing(TransportError::Rejected {
            status: Some(403),
            body: json!({"error": {"code": "Forbidden", "message": "bot removed"}}),
        }));
        let message = hourly_message();
        seed_due(&store, &message);

        processor(&store, transport).tick().await.unwrap();

        let occurrences = store.occurrences_for(message.id);
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].state, OccurrenceState::Pending);
    }

    #[tokio::test]
    async fn failed_occurrence_is_retried_on_next_tick() {
        let store = MemoryStore::new();
        let transport = Arc::new(MockTransport::scripted(vec![
            Err(TransportError::Failed {
                message: "transient outage".to_string(),
            }),
            Ok(()),
        ]));
        let message = hourly_message();
        seed_due(&store, &message);

        let processor = processor(&store, transport.clone());
        processor.tick().await.unwrap();
        processor.tick().await.unwrap();

        // Second attempt delivered it and the schedule advanced.
        assert_eq!(transport.sent(), vec![message.id]);
        let occurrences = store.occurrences_for(message.id);
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].state, OccurrenceState::Completed);
    }

    #[tokio::test]
    async fn one_bad_occurrence_does_not_starve_the_batch() {
        let store = MemoryStore::new();
        // Three due messages; the middle dispatch blows up.
        let transport = Arc::new(MockTransport::scripted(vec![
            Ok(()),
            Err(TransportError::Failed {
                message: "boom".to_string(),
            }),
            Ok(()),
        ]));

        let now = Utc::now();
        let mut messages = Vec::new();
        for minutes_overdue in [30, 20, 10] {
            let message = hourly_message();
            store.insert_message(message.clone());
            store.insert_occurrence(
                message.id,
                MessageOccurrence::pending(now - ChronoDuration::minutes(minutes_overdue)),
            );
            messages.push(message);
        }

        processor(&store, transport.clone()).tick().await.unwrap();

        // First and third (by due order) were dispatched and rescheduled.
        assert_eq!(transport.sent(), vec![messages[0].id, messages[2].id]);
        assert_eq!(store.occurrences_for(messages[0].id).len(), 2);
        assert_eq!(store.occurrences_for(messages[2].id).len(), 2);

        // The failed one is untouched and still pending.
        let failed = store.occurrences_for(messages[1].id);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].state, OccurrenceState::Pending);
    }

    #[tokio::test]
    async fn failed_save_is_retried_by_non_persistence() {
        let store = MemoryStore::new();
        let transport = Arc::new(MockTransport::succeeding());

        // Two due messages, both dispatched, then the save fails.
        let first = hourly_message();
        let second = hourly_message();
        seed_due(&store, &first);
        seed_due(&store, &second);
        store.fail_next_saves(1);

        let processor = processor(&store, transport.clone());
        processor.tick().await.unwrap();

        // Nothing durably changed.
        assert_eq!(store.occurrences_for(first.id).len(), 1);
        assert_eq!(store.occurrences_for(second.id).len(), 1);
        assert_eq!(
            store.occurrences_for(first.id)[0].state,
            OccurrenceState::Pending
        );

        // The next tick fetches the same occurrences again and persists.
        processor.tick().await.unwrap();
        assert_eq!(store.occurrences_for(first.id).len(), 2);
        assert_eq!(store.occurrences_for(second.id).len(), 2);
        assert_eq!(transport.sent().len(), 4);
    }

    #[tokio::test]
    async fn unparseable_schedule_completes_without_rescheduling() {
        let store = MemoryStore::new();
        let transport = Arc::new(MockTransport::succeeding());

        let mut message = hourly_message();
        message.schedule = "not a schedule".to_string();
        let seeded = seed_due(&store, &message);

        processor(&store, transport.clone()).tick().await.unwrap();

        // Delivered and completed, but the definition stops recurring.
        assert_eq!(transport.sent(), vec![message.id]);
        let occurrences = store.occurrences_for(message.id);
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].id, seeded.id);
        assert_eq!(occurrences[0].state, OccurrenceState::Completed);
    }

    #[tokio::test]
    async fn batch_order_does_not_change_final_state() {
        let transport_results = || Arc::new(MockTransport::succeeding());

        // Same three messages seeded in two different insertion orders.
        let now = Utc::now();
        let build = |offsets: &[i64]| {
            let store = MemoryStore::new();
            let mut ids = Vec::new();
            for minutes in offsets {
                let message = hourly_message();
                store.insert_message(message.clone());
                store.insert_occurrence(
                    message.id,
                    MessageOccurrence::pending(now - ChronoDuration::minutes(*minutes)),
                );
                ids.push(message.id);
            }
            (store, ids)
        };

        let (store_a, ids_a) = build(&[30, 20, 10]);
        let (store_b, ids_b) = build(&[10, 20, 30]);

        processor(&store_a, transport_results()).tick().await.unwrap();
        processor(&store_b, transport_results()).tick().await.unwrap();

        for (store, ids) in [(&store_a, &ids_a), (&store_b, &ids_b)] {
            for id in ids {
                let occurrences = store.occurrences_for(*id);
                assert_eq!(occurrences.len(), 2);
                assert_eq!(occurrences[0].state, OccurrenceState::Completed);
                assert_eq!(occurrences[1].state, OccurrenceState::Pending);
            }
        }
    }

    #[tokio::test]
    async fn store_outage_does_not_kill_the_loop() {
        // A store whose begin() always fails: tick returns the error, and
        // run() logs it and keeps polling until shutdown.
        #[derive(Clone)]
        struct DownStore;

        #[async_trait::async_trait]
        impl OccurrenceStore for DownStore {
            async fn begin(&self) -> Result<Box<dyn StoreScope>, StoreError> {
                Err(StoreError::Unavailable {
                    reason: "database offline".to_string(),
                })
            }
        }

        let processor = MessageProcessor::new(
            DownStore,
            Dispatcher::new(Arc::new(MockTransport::succeeding())),
            Duration::from_millis(5),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(processor.run(shutdown_rx));

        // Let several failing ticks elapse, then ask for shutdown.
        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown_tx.send(true).expect("send shutdown");

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop on shutdown")
            .expect("loop task should not panic");
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_wait() {
        let store = MemoryStore::new();
        let processor = MessageProcessor::new(
            store,
            Dispatcher::new(Arc::new(MockTransport::succeeding())),
            // A wait far longer than the test: only the shutdown signal
            // can end it in time.
            Duration::from_secs(3600),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(processor.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).expect("send shutdown");

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("shutdown should interrupt the wait")
            .expect("loop task should not panic");
    }
}
