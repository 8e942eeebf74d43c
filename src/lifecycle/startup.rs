//! Startup orchestration.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::blockchain::{BlockchainClient, BlockchainError};
use crate::config::watcher::ConfigWatcher;
use crate::config::{ConfigError, RotatorConfig};
use crate::connectors::{CapabilityProbe, ConfiguredProbe};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::observability::{logging, metrics};
use crate::rotation::RotationError;
use crate::status::build_status_lookup;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("rotation settings rejected: {0}")]
    Rotation(#[from] RotationError),

    #[error("blockchain setup failed: {0}")]
    Blockchain(#[from] BlockchainError),

    #[error("config watcher failed: {0}")]
    Watcher(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the service until a termination signal arrives.
///
/// `config_path` enables hot reload of the rotation settings.
pub async fn start(config: RotatorConfig, config_path: Option<&Path>) -> Result<(), StartupError> {
    if logging::init_logging(&config.observability).is_err() {
        tracing::debug!("Global subscriber already installed");
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "deposit-rotator starting");

    // Validates identity and interval before anything else starts.
    let rotation = config.rotation_config()?;
    tracing::info!(
        operator = %rotation.operator_identity,
        interval = %rotation.interval,
        bind_address = %config.listener.bind_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = if config.blockchain.enabled {
        Some(BlockchainClient::new(config.blockchain.clone()).await?)
    } else {
        None
    };

    let status = build_status_lookup(&config, client.clone())?;
    let probe = ConfiguredProbe::from_env(config.blockchain.chain_id, client.clone());
    for capability in probe.capabilities() {
        tracing::info!(
            family = %capability.family,
            available = capability.available,
            "Wallet connector capability"
        );
    }
    tracing::info!(backend = status.name(), "Status lookup ready");

    let mut server = HttpServer::with_collaborators(config.clone(), status, Arc::new(probe))?;
    if let Some(client) = client {
        server = server.with_rpc_client(client);
    }

    // The watcher handle must stay alive for reloads to keep flowing.
    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, config_updates, server_shutdown).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
