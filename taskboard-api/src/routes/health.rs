/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 4 },
///   "realtime_channels": 2
/// }
/// ```
///
/// Always answers `200`; a failed database probe reports `"degraded"`.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use taskboard_shared::db::pool::{get_pool_stats, health_check as database_health, PoolStats};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,

    pub pool: PoolStats,

    /// Projects with at least one realtime subscriber
    pub realtime_channels: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match database_health(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        pool: get_pool_stats(&state.db),
        realtime_channels: state.realtime.channel_count().await,
    })
}
