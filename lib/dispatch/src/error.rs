//! Error types for message transport.

use serde_json::Value as JsonValue;
use std::fmt;

/// Errors from sending a message through a transport.
///
/// The remote-rejection case carries the structured error body so the
/// engine can log it in full; both variants leave the occurrence pending
/// for retry on a later poll.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The remote accepted the request but rejected it with a structured
    /// error body.
    Rejected {
        /// HTTP-style status code, when the transport has one.
        status: Option<u16>,
        /// The structured error body returned by the remote.
        body: JsonValue,
    },
    /// Generic or unexpected transport failure.
    Failed {
        /// Underlying failure description.
        message: String,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status, .. } => match status {
                Some(status) => write!(f, "message rejected by remote (status {status})"),
                None => write!(f, "message rejected by remote"),
            },
            Self::Failed { message } => write!(f, "message send failed: {message}"),
        }
    }
}

impl std::error::Error for TransportError {}
