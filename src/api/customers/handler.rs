//! Customer API handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::inventory::types::{Customer, CustomerCreate};
use crate::utils::AppResult;

/// GET /api/customers - list all customers
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Customer>>> {
    let customers = state.ledger.list_customers()?;
    Ok(Json(customers))
}

/// GET /api/customers/:id - get one customer
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<Json<Customer>> {
    let customer = state.ledger.get_customer(id)?;
    Ok(Json(customer))
}

/// POST /api/customers - create a customer
pub async fn create(
    State(state): State<ServerState>,
    Json(input): Json<CustomerCreate>,
) -> AppResult<Json<Customer>> {
    let customer = state.ledger.create_customer(input).await?;
    Ok(Json(customer))
}
