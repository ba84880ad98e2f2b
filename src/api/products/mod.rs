//! Product API module

mod handler;

use axum::{
    Router,
    routing::get,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/low-stock", get(handler::list_low_stock))
        .route("/{id}", get(handler::get_by_id).delete(handler::delete))
        .route("/{id}/movements", get(handler::list_movements))
}
