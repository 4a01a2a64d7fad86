//! # Taskboard API Server
//!
//! Multi-tenant task board: accounts, tenants with admin/member roles,
//! projects with ordered statuses, tasks, and a WebSocket feed of task
//! changes per project.
//!
//! ## Startup
//!
//! 1. Tracing (`RUST_LOG`, `LOG_FORMAT=json`)
//! 2. Configuration from the environment
//! 3. Database pool and migrations
//! 4. Realtime hub
//! 5. HTTP server until Ctrl-C / SIGTERM, then the hub and pool are closed
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskboard-api
//! ```

use std::sync::Arc;

use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::{
    db::{migrations::run_migrations, pool},
    realtime::RealtimeHub,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "taskboard_api=debug,taskboard_shared=debug,tower_http=debug";

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(config.pool_config()).await?;
    run_migrations(&db).await?;

    let hub = Arc::new(RealtimeHub::new(config.realtime.channel_capacity));

    let bind_address = config.bind_address();
    let state = AppState::new(db.clone(), config, hub.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    let shutdown_hub = hub.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_hub.shutdown().await;
        })
        .await?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}
