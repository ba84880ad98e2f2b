use serde::Serialize;
use thiserror::Error;

use super::super::storage::StorageError;
use crate::utils::error::{AppError, StockShortfall};

/// One failed item of a batch sale
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub product_id: u64,
    pub available: i64,
    pub requested: i64,
}

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error("Movement not found: {0}")]
    MovementNotFound(u64),

    #[error("Customer not found: {0}")]
    CustomerNotFound(u64),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: u64,
        available: i64,
        requested: i64,
    },

    #[error("Batch validation failed for {} item(s)", .0.len())]
    BatchValidation(Vec<BatchFailure>),

    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("Duplicate SKU: {0}")]
    DuplicateSku(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Storage(e) => {
                tracing::error!(error = %e, "Storage error in ledger operation");
                AppError::Database(e.to_string())
            }
            LedgerError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {} not found", id))
            }
            LedgerError::MovementNotFound(id) => {
                AppError::NotFound(format!("Movement {} not found", id))
            }
            LedgerError::CustomerNotFound(id) => {
                AppError::NotFound(format!("Customer {} not found", id))
            }
            LedgerError::InvalidQuantity(q) => {
                AppError::Validation(format!("Quantity must be a positive integer, got {}", q))
            }
            LedgerError::InsufficientStock {
                product_id,
                available,
                requested,
            } => AppError::InsufficientStock(StockShortfall {
                product_id,
                available,
                requested,
            }),
            LedgerError::BatchValidation(failures) => AppError::BatchValidation(
                failures
                    .into_iter()
                    .map(|f| StockShortfall {
                        product_id: f.product_id,
                        available: f.available,
                        requested: f.requested,
                    })
                    .collect(),
            ),
            LedgerError::ReferentialIntegrity(msg) => AppError::ReferentialIntegrity(msg),
            LedgerError::DuplicateSku(sku) => {
                AppError::Conflict(format!("SKU already exists: {}", sku))
            }
            LedgerError::InvalidSnapshot(msg) => {
                AppError::Validation(format!("Invalid snapshot: {}", msg))
            }
        }
    }
}
