//! The transport trait and a configurable test transport.

use crate::error::TransportError;
use async_trait::async_trait;
use chime_core::MessageId;
use chime_message::ScheduledMessage;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Trait for message delivery.
///
/// Implementations carry the message text to the definition's recipients
/// over a concrete channel (webhook, bot connector, …). Cancellation is
/// propagated by dropping the in-flight future; transports must not
/// install their own independent retry loops.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Sends the message's content to its configured recipients.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Rejected`] when the remote returns a
    /// structured error body, [`TransportError::Failed`] otherwise.
    async fn send(&self, message: &ScheduledMessage) -> Result<(), TransportError>;
}

/// A transport that can be scripted to succeed or fail per call.
pub struct MockTransport {
    script: Mutex<VecDeque<Result<(), TransportError>>>,
    fallback: Option<TransportError>,
    sent: Mutex<Vec<MessageId>>,
}

impl MockTransport {
    /// Creates a transport where every send succeeds.
    #[must_use]
    pub fn succeeding() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Creates a transport where every send fails with the given error.
    #[must_use]
    pub fn failing(error: TransportError) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(error),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Creates a transport that plays back the given results in order,
    /// then succeeds.
    #[must_use]
    pub fn scripted(results: Vec<Result<(), TransportError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            fallback: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Returns the ids of messages whose send attempt succeeded.
    #[must_use]
    pub fn sent(&self) -> Vec<MessageId> {
        self.sent.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(&self, message: &ScheduledMessage) -> Result<(), TransportError> {
        let scripted = self
            .script
            .lock()
            .expect("mock lock poisoned")
            .pop_front();
        let result = match scripted {
            Some(result) => result,
            None => match &self.fallback {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            },
        };
        if result.is_ok() {
            self.sent.lock().expect("mock lock poisoned").push(message.id);
        }
        result
    }
}
