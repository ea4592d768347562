//! Polling dispatch engine for chime.
//!
//! The [`MessageProcessor`] owns the run loop: wait, fetch due
//! occurrences, dispatch each one, advance each dispatched message's
//! schedule, persist the batch, repeat. A single long-lived task runs the
//! loop until the shutdown signal is observed; every failure along the
//! way is logged and survived, never fatal.

pub mod processor;

pub use processor::MessageProcessor;
