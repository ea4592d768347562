//! Host process for the chime scheduled message dispatcher.
//!
//! Wires the Postgres store and webhook transport into the polling
//! engine, starts it at boot, and stops it on Ctrl-C.

mod config;
mod db;
mod error;
mod transport;

use chime_core::Result;
use chime_dispatch::Dispatcher;
use chime_engine::MessageProcessor;
use config::BotConfig;
use db::PgOccurrenceStore;
use error::BotError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use transport::WebhookTransport;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(report) = run().await {
        tracing::error!(error = %report, "chime-bot exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BotError> {
    // Load configuration from environment
    let config = BotConfig::from_env().map_err(|e| BotError::ConfigLoadFailed {
        details: e.to_string(),
    })?;
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| BotError::DatabaseConnectFailed {
            details: e.to_string(),
        })?;

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| BotError::MigrationFailed {
            details: e.to_string(),
        })?;

    let store = PgOccurrenceStore::new(db_pool);
    let webhook =
        WebhookTransport::new(&config.webhook).map_err(|e| BotError::TransportBuildFailed {
            details: e.to_string(),
        })?;
    let dispatcher = Dispatcher::new(Arc::new(webhook));

    let processor = MessageProcessor::new(
        store,
        dispatcher,
        Duration::from_secs(config.processor.polling_interval_seconds),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine = tokio::spawn(processor.run(shutdown_rx));
    tracing::info!("Scheduled message processor started");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| BotError::ShutdownSignalFailed {
            details: e.to_string(),
        })?;
    tracing::info!("Shutdown signal received, stopping processor");

    if shutdown_tx.send(true).is_err() {
        tracing::warn!("processor stopped before the shutdown signal");
    }
    engine.await.map_err(|e| BotError::EngineTaskFailed {
        details: e.to_string(),
    })?;
    tracing::info!("Scheduled message processor stopped");

    Ok(())
}
