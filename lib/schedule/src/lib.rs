//! Schedule evaluation for chime.
//!
//! This crate provides the pure schedule evaluator the dispatch engine
//! depends on: parse a schedule expression plus a timezone offset into a
//! [`Schedule`], then compute the next occurrence strictly after a
//! reference instant. No I/O, no mutation, so it is unit-testable
//! independently of the store and transport.
//!
//! The grammar is a five-field cron subset
//! (`minute hour day-of-month month day-of-week`) supporting `*`, single
//! values, ranges, steps, and comma lists. Expressions are evaluated in
//! the message's fixed UTC offset and results are returned in UTC.

pub mod error;
mod field;
pub mod schedule;

pub use error::ScheduleParseError;
pub use schedule::Schedule;
