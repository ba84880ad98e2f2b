//! Product API handlers

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};

use crate::api::operator_id;
use crate::core::ServerState;
use crate::inventory::types::{Movement, Product, ProductCreate};
use crate::utils::AppResult;

/// GET /api/products - list all products
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let products = state.ledger.list_products()?;
    Ok(Json(products))
}

/// GET /api/products/low-stock - products at or below their threshold
pub async fn list_low_stock(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let products = state.ledger.list_low_stock()?;
    Ok(Json(products))
}

/// GET /api/products/:id - get one product
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<Json<Product>> {
    let product = state.ledger.get_product(id)?;
    Ok(Json(product))
}

/// GET /api/products/:id/movements - movement history of one product
pub async fn list_movements(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<Json<Vec<Movement>>> {
    // 404 for unknown products rather than an empty history
    state.ledger.get_product(id)?;
    let movements = state.ledger.list_movements(Some(id))?;
    Ok(Json(movements))
}

/// POST /api/products - create a product (opening stock becomes an IN movement)
pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    let product = state.ledger.create_product(input, operator_id(&headers)).await?;
    Ok(Json(product))
}

/// DELETE /api/products/:id - delete a product without movement history
pub async fn delete(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> AppResult<Json<serde_json::Value>> {
    state.ledger.delete_product(id, operator_id(&headers)).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
