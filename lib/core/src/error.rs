//! Error handling foundation for chime.
//!
//! The [`Result`] alias wraps a domain error enum in a rootcause
//! `Report`, which records where the failure was constructed. Crates on
//! the engine's hot path (store, transport, schedule) keep concrete
//! error enums so callers can match on variants; the alias is for
//! fallible paths whose callers only log or abort, such as host
//! bootstrap.

use rootcause::Report;

/// Result alias carrying a rootcause `Report` over a domain error.
///
/// `?` converts a bare domain error into the report.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
