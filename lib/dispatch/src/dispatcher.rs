//! Per-occurrence dispatch against the transport.

use crate::error::TransportError;
use crate::transport::MessageTransport;
use chime_message::ScheduledMessage;
use std::sync::Arc;

/// Dispatches one due message at a time through the configured transport.
///
/// Dispatch has no side effect beyond the transport call; marking the
/// occurrence completed and scheduling the next one stay with the engine.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn MessageTransport>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self { transport }
    }

    /// Sends the message's content to its configured recipients.
    ///
    /// # Errors
    ///
    /// Propagates the transport's [`TransportError`] unchanged; the
    /// caller decides how each variant affects occurrence state.
    pub async fn dispatch(&self, message: &ScheduledMessage) -> Result<(), TransportError> {
        tracing::debug!(
            message_id = %message.id,
            channel = %message.details.channel,
            recipients = message.details.recipients.len(),
            "dispatching scheduled message"
        );
        self.transport.send(message).await
    }
}
