//! Message transport seam and dispatcher for chime.
//!
//! The [`MessageTransport`] trait is the boundary to the outside world:
//! "send this message's content to its configured recipients". The
//! [`Dispatcher`] wraps a transport and reports per-message success or
//! failure to the engine; state mutation stays with the caller.

pub mod dispatcher;
pub mod error;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use error::TransportError;
pub use transport::{MessageTransport, MockTransport};
