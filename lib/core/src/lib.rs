//! Core domain types and utilities for chime.
//!
//! This crate provides the strongly-typed identifiers and the error
//! handling foundation shared by the rest of the chime scheduled-message
//! dispatcher.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{MessageId, OccurrenceId, ParseIdError};
