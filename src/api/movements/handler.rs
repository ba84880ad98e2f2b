//! Movement API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};

use crate::api::operator_id;
use crate::core::ServerState;
use crate::inventory::types::{Movement, MovementCreate, Product};
use crate::utils::AppResult;

/// Movement plus the product row it left behind
#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub movement: Movement,
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub product_id: Option<u64>,
}

/// GET /api/movements?product_id= - list movements
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Movement>>> {
    let movements = state.ledger.list_movements(query.product_id)?;
    Ok(Json(movements))
}

/// GET /api/movements/:id - get one movement
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<Json<Movement>> {
    let movement = state.ledger.get_movement(id)?;
    Ok(Json(movement))
}

/// POST /api/movements - apply a movement (IN / OUT / ADJUSTMENT)
pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(mut input): Json<MovementCreate>,
) -> AppResult<Json<MovementResponse>> {
    if input.actor_id.is_none() {
        input.actor_id = operator_id(&headers);
    }
    let (movement, product) = state.ledger.apply_movement(input).await?;
    Ok(Json(MovementResponse { movement, product }))
}

#[derive(Debug, Deserialize)]
pub struct AmendRequest {
    pub quantity: i64,
}

/// PUT /api/movements/:id - amend a movement's quantity
pub async fn amend(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<AmendRequest>,
) -> AppResult<Json<MovementResponse>> {
    let (movement, product) = state
        .ledger
        .amend_movement(id, req.quantity, operator_id(&headers))
        .await?;
    Ok(Json(MovementResponse { movement, product }))
}

/// DELETE /api/movements/:id - revert a movement with full compensation
pub async fn revert(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> AppResult<Json<Product>> {
    let product = state.ledger.revert_movement(id, operator_id(&headers)).await?;
    Ok(Json(product))
}
