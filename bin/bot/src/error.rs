//! Error types for host bootstrap and shutdown.

use std::fmt;

/// Errors from bringing the host process up or tearing it down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    /// Configuration could not be loaded from the environment.
    ConfigLoadFailed { details: String },
    /// The database pool could not be established.
    DatabaseConnectFailed { details: String },
    /// Applying database migrations failed.
    MigrationFailed { details: String },
    /// The webhook HTTP client could not be built.
    TransportBuildFailed { details: String },
    /// The shutdown signal listener could not be installed.
    ShutdownSignalFailed { details: String },
    /// The engine task ended abnormally.
    EngineTaskFailed { details: String },
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigLoadFailed { details } => {
                write!(f, "failed to load configuration: {details}")
            }
            Self::DatabaseConnectFailed { details } => {
                write!(f, "failed to connect to database: {details}")
            }
            Self::MigrationFailed { details } => {
                write!(f, "failed to run migrations: {details}")
            }
            Self::TransportBuildFailed { details } => {
                write!(f, "failed to build webhook transport: {details}")
            }
            Self::ShutdownSignalFailed { details } => {
                write!(f, "failed to listen for shutdown signal: {details}")
            }
            Self::EngineTaskFailed { details } => {
                write!(f, "engine task failed: {details}")
            }
        }
    }
}

impl std::error::Error for BotError {}
