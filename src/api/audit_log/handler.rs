//! Audit log API handlers

use axum::{
    Json,
    extract::{Query, State},
};

use crate::audit::{AuditChainVerification, AuditListResponse, AuditQuery};
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/audit-log - query the audit trail
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AuditListResponse>> {
    let (items, total) = state.audit.query(&query)?;
    Ok(Json(AuditListResponse { items, total }))
}

/// GET /api/audit-log/verify - verify hash chain integrity
pub async fn verify_chain(
    State(state): State<ServerState>,
) -> AppResult<Json<AuditChainVerification>> {
    let verification = state.audit.verify_chain()?;
    Ok(Json(verification))
}
