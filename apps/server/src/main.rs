//! Server entry point.
//!
//! Startup sequence: load config → init tracing → construct the
//! selected store → build AppState → spawn the purge task → serve with
//! graceful shutdown.

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use till_store::{DbConfig, MemoryStore, SqliteStore, Store};

use server::cleanup::spawn_purge_task;
use server::{create_app, AppState, Backend, ServerConfig};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is a development convenience; absence is not an error
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;

    // Storage polymorphism: one selection point, explicit injection
    // from here down
    let store: Arc<dyn Store> = match config.backend {
        Backend::Sqlite => {
            tracing::info!(path = %config.database_path.display(), "using SQLite store");
            Arc::new(SqliteStore::connect(DbConfig::new(&config.database_path)).await?)
        }
        Backend::Memory => {
            tracing::info!("using in-memory store (nothing will be persisted)");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store.clone());

    let purge_task = spawn_purge_task(
        store,
        config.purge_interval_hours,
        config.purge_retention_days,
    );

    let app = create_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge_task.abort();
    tracing::info!("server shut down gracefully");
    Ok(())
}
