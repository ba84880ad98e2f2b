//! Data transfer API module (snapshot export / import)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/data-transfer", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/export", get(handler::export))
        .route("/import", post(handler::import))
}
