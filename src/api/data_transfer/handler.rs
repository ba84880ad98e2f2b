//! Data transfer handlers - full data set export/import as JSON
//!
//! Export: consistent point-in-time copy from one read transaction,
//! served as a download. Import: validated, then swapped in wholesale
//! while the restore gate blocks every ledger operation.

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;

use crate::api::operator_id;
use crate::core::ServerState;
use crate::inventory::types::DataSnapshot;
use crate::utils::{AppError, AppResult, ok_with_message};

/// GET /api/data-transfer/export
pub async fn export(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.ledger.export_snapshot(operator_id(&headers)).await?;
    let json = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inventory_snapshot.json\"",
            ),
        ],
        json,
    ))
}

/// POST /api/data-transfer/import
pub async fn import(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> AppResult<impl IntoResponse> {
    let snapshot: DataSnapshot = serde_json::from_slice(&body)
        .map_err(|e| AppError::Invalid(format!("malformed snapshot body: {}", e)))?;

    let counts = (
        snapshot.products.len(),
        snapshot.movements.len(),
        snapshot.customers.len(),
    );
    state
        .ledger
        .import_snapshot(snapshot, operator_id(&headers))
        .await?;

    Ok(ok_with_message(
        serde_json::json!({
            "products": counts.0,
            "movements": counts.1,
            "customers": counts.2,
        }),
        "Snapshot imported",
    ))
}
