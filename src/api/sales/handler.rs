//! Sale API handlers

use axum::{Json, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::api::operator_id;
use crate::core::ServerState;
use crate::inventory::sales::{BatchSaleRequest, SaleRequest};
use crate::inventory::types::{Movement, Product};
use crate::utils::AppResult;

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub movement: Movement,
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct BatchSaleResponse {
    /// One OUT movement per distinct product in the batch
    pub movements: Vec<Movement>,
}

/// POST /api/sales - sell one product
pub async fn sell_single(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(mut req): Json<SaleRequest>,
) -> AppResult<Json<SaleResponse>> {
    if req.actor_id.is_none() {
        req.actor_id = operator_id(&headers);
    }
    let (movement, product) = state.ledger.sell_single(req).await?;
    Ok(Json(SaleResponse { movement, product }))
}

/// POST /api/sales/batch - all-or-nothing batch sale
pub async fn sell_batch(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(mut req): Json<BatchSaleRequest>,
) -> AppResult<Json<BatchSaleResponse>> {
    if req.actor_id.is_none() {
        req.actor_id = operator_id(&headers);
    }
    let movements = state.ledger.sell_batch(req).await?;
    Ok(Json(BatchSaleResponse { movements }))
}
