//! taskboard server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use taskboard::api;
use taskboard::app_state::AppState;
use taskboard::config::TaskboardConfig;
use taskboard::persistence::{MemoryStore, PostgresStore, Store};
use taskboard::ws::{Hub, HubConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Load configuration
    let config = TaskboardConfig::from_env().context("invalid LISTEN_ADDR")?;
    tracing::info!(addr = %config.listen_addr, "starting taskboard");

    // Build persistence layer
    let store = Arc::new(open_store(&config).await?);
    tracing::info!(backend = store.backend(), "store ready");

    // Build notification hub
    let hub = Hub::spawn(HubConfig {
        broadcast_capacity: config.hub_broadcast_capacity,
        client_queue_capacity: config.hub_client_queue_capacity,
    });

    // Build application state and bootstrap the admin account
    let app_state = AppState::new(store, hub, &config);
    app_state
        .users
        .ensure_admin(
            &config.admin_username,
            &config.admin_email,
            &config.admin_password,
        )
        .await
        .context("failed to create bootstrap admin")?;

    let app = api::build_app(
        app_state,
        Duration::from_secs(config.request_timeout_secs),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_store(config: &TaskboardConfig) -> anyhow::Result<Store> {
    if !config.persistence_enabled {
        tracing::warn!("persistence disabled; data lives in memory only");
        return Ok(Store::Memory(MemoryStore::new()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    let store = PostgresStore::new(pool);
    store.migrate().await.context("failed to run migrations")?;
    tracing::info!("database migrations applied");
    Ok(Store::Postgres(store))
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
