//! API route modules
//!
//! # Structure
//!
//! - [`health`] - health checks
//! - [`products`] - product catalog and low-stock report
//! - [`movements`] - ledger entries: apply, amend, revert
//! - [`sales`] - single and batch sales
//! - [`customers`] - thin customer CRUD
//! - [`audit_log`] - audit trail query and verification
//! - [`data_transfer`] - snapshot export/import


pub mod audit_log;
pub mod customers;
pub mod data_transfer;
pub mod health;
pub mod movements;
pub mod products;
pub mod sales;

use axum::http::HeaderValue;
use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResponse, AppResult};

/// Operator identity header; requests without it count as system actions
pub const OPERATOR_ID_HEADER: &str = "x-operator-id";

/// Extract the operator id from request headers
pub fn operator_id(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(OPERATOR_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[derive(Clone, Default)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// HTTP access log middleware
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();
    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the axum router (without state)
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(products::router())
        .merge(movements::router())
        .merge(sales::router())
        .merge(customers::router())
        .merge(audit_log::router())
        .merge(data_transfer::router())
}

/// Build the full application: routes, state and tower-http middleware
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
        .layer(middleware::from_fn(log_request))
}
