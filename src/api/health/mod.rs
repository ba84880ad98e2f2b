//! Health check routes
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/health | GET | liveness probe |
//! | /api/health/detailed | GET | storage and audit status |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::inventory::storage::StorageStats;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/health/detailed", get(detailed_health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// ok | error
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
pub struct DetailedHealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    storage: StorageStats,
    audit_entries: u64,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /health/detailed
pub async fn detailed_health(
    State(state): State<ServerState>,
) -> AppResult<Json<DetailedHealthResponse>> {
    let storage = state
        .ledger
        .storage()
        .get_stats()
        .map_err(|e| crate::utils::AppError::Database(e.to_string()))?;
    let audit_entries = state.audit.storage().count()?;

    Ok(Json(DetailedHealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        storage,
        audit_entries,
    }))
}
