//! `PassOP` server entry point.
//!
//! Opens the record store, then starts the Axum HTTP server with graceful
//! shutdown. The store connection is closed once the server has drained.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use passop_core::store::PasswordStore;
use passop_storage::{DocumentStore, MemoryBackend};

use passop_server::config::{ServerConfig, StorageBackendType};
use passop_server::routes;
use passop_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(
        storage = ?config.storage_backend,
        collection = %config.collection,
        scope_to_owner = config.scope_to_owner,
        "PassOP starting"
    );

    // The connection is established before the listener binds.
    let docs = open_store(&config).await?;
    let store = PasswordStore::new(docs);
    let state = Arc::new(AppState::new(store.clone(), config.scope_to_owner));

    let app = routes::app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "PassOP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Err(e) = store.close().await {
        warn!(error = %e, "record store did not close cleanly");
    }

    info!("PassOP server stopped");
    Ok(())
}

/// Open the document store selected by the connection string.
async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let docs: Arc<dyn DocumentStore> = match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (data will not persist)");
            Arc::new(MemoryBackend::new())
        }
        #[cfg(feature = "rocksdb-backend")]
        StorageBackendType::RocksDb { path } => {
            info!(path = %path, "using RocksDB storage");
            Arc::new(
                passop_storage::RocksDbBackend::open(path, &config.collection)
                    .context("failed to open RocksDB storage")?,
            )
        }
        #[cfg(not(feature = "rocksdb-backend"))]
        StorageBackendType::RocksDb { .. } => {
            anyhow::bail!("RocksDB backend requested but feature 'rocksdb-backend' is not enabled");
        }
        #[cfg(feature = "postgres-backend")]
        StorageBackendType::Postgres { url } => {
            info!("using PostgreSQL storage");
            Arc::new(
                passop_storage::PostgresBackend::connect(url, &config.collection)
                    .await
                    .context("failed to connect to PostgreSQL")?,
            )
        }
        #[cfg(not(feature = "postgres-backend"))]
        StorageBackendType::Postgres { .. } => {
            anyhow::bail!("PostgreSQL backend requested but feature 'postgres-backend' is not enabled");
        }
    };
    Ok(docs)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
