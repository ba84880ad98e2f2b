use thiserror::Error;

use crate::audit::AuditStorageError;
use crate::inventory::StorageError;

/// Fatal server-level errors (startup, shutdown, infrastructure)
///
/// Request-level errors use [`crate::utils::AppError`] instead.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Inventory storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Audit storage error: {0}")]
    AuditStorage(#[from] AuditStorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
