//! Event Consumer Library
//!
//! Subscribes the directory to the broker topics it reacts to and forwards
//! each event to the directory's domain service over gRPC.

pub mod broker;
pub mod classify;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod jobs;
pub mod validation;

use std::sync::Arc;

use redis::aio::ConnectionManager;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use common::{AppError, AppResult};

use crate::broker::{supervise, Backoff, StreamSubscriber, Subscription};
use crate::client::{AccountLifecycle, DirectoryClient};
use crate::config::EventConsumerConfig;
use crate::dispatch::DispatchTable;

/// Run every subscription (and the expired account sweeper) until Ctrl+C or SIGTERM.
pub async fn run_consumer(config: EventConsumerConfig) -> AppResult<()> {
    let directory = Arc::new(DirectoryClient::connect_lazy(&config.directory)?);
    let table = DispatchTable::new(directory.clone(), directory.clone(), directory.clone());

    let client = redis::Client::open(config.broker.url.as_str())?;
    let conn = ConnectionManager::new(client).await?;
    info!(url = %config.broker.url, group = %config.broker.consumer_group, "Connected to broker");

    let shutdown = CancellationToken::new();
    let mut tasks = Vec::new();

    for (topic, handler) in table.iter() {
        let subscription: Arc<dyn Subscription> =
            Arc::new(StreamSubscriber::new(conn.clone(), topic, handler, &config.broker));
        tasks.push(tokio::spawn(supervise(
            subscription,
            Backoff::from_config(&config.broker),
            shutdown.clone(),
        )));
    }
    info!(topics = ?table.topics().collect::<Vec<_>>(), "Subscriptions started");

    if let Some(period) = config.sweep_interval() {
        let accounts: Arc<dyn AccountLifecycle> = directory;
        tasks.push(tokio::spawn(jobs::run_expiry_sweeper(accounts, period, shutdown.clone())));
    }

    let signalled = shutdown_signal().await;
    info!("Shutdown requested, draining in-flight messages");
    shutdown.cancel();

    for joined in futures::future::join_all(tasks).await {
        if let Err(e) = joined {
            error!(error = %e, "Background task ended abnormally");
        }
    }

    info!("Event consumer stopped");
    signalled
}

/// Wait for Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() -> AppResult<()> {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| AppError::internal(format!("Failed to listen for Ctrl+C: {}", e)))
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| AppError::internal(format!("Failed to listen for SIGTERM: {}", e)))?;
        sigterm.recv().await;
        Ok::<(), AppError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<AppResult<()>>();

    tokio::select! {
        result = ctrl_c => {
            info!("Received Ctrl+C");
            result
        }
        result = terminate => {
            info!("Received SIGTERM");
            result
        }
    }
}

/// Delete expired anonymous accounts once.
pub async fn run_sweep(config: EventConsumerConfig) -> AppResult<u64> {
    let directory = DirectoryClient::connect_lazy(&config.directory)?;
    jobs::sweep_expired_accounts(&directory)
        .await
        .map_err(|e| AppError::service_unavailable(format!("directory sweep failed: {}", e)))
}
