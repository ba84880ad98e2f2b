//! Audit log service
//!
//! `AuditService` is the write/query facade over the audit store:
//! - async writes through an mpsc channel (consumed by [`super::AuditWorker`])
//! - synchronous writes for lifecycle events (startup/shutdown, before the
//!   worker exists or after it stopped)
//! - queries and chain verification read the store directly

use std::sync::Arc;

use tokio::sync::mpsc;

use super::storage::{AuditStorage, AuditStorageResult};
use super::types::{AuditAction, AuditChainVerification, AuditEntry, AuditQuery};

/// Log request sent to the worker
pub struct AuditLogRequest {
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: Option<String>,
    pub details: serde_json::Value,
}

/// Audit log service
///
/// Writes go through an mpsc channel so callers never block on disk I/O.
/// A dropped request (channel closed) is logged but never fails the caller:
/// the business operation has already committed.
pub struct AuditService {
    storage: AuditStorage,
    tx: mpsc::Sender<AuditLogRequest>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    /// Create the service and the receiver half for the worker
    pub fn new(
        storage: AuditStorage,
        buffer_size: usize,
    ) -> (Arc<Self>, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let service = Arc::new(Self { storage, tx });
        (service, rx)
    }

    pub fn storage(&self) -> &AuditStorage {
        &self.storage
    }

    /// Queue an audit entry for asynchronous persistence
    pub async fn log(
        &self,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        operator_id: Option<String>,
        details: serde_json::Value,
    ) {
        let request = AuditLogRequest {
            action,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            operator_id,
            details,
        };
        if self.tx.send(request).await.is_err() {
            tracing::error!("Audit channel closed, entry dropped: {:?}", action);
        }
    }

    /// Write an entry synchronously, bypassing the channel.
    ///
    /// Used for startup/shutdown records where the worker may not be running.
    pub fn log_sync(
        &self,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        operator_id: Option<String>,
        details: serde_json::Value,
    ) -> AuditStorageResult<AuditEntry> {
        self.storage.append(
            action,
            resource_type.into(),
            resource_id.into(),
            operator_id,
            details,
        )
    }

    /// Query the log with filters, newest first
    pub fn query(&self, query: &AuditQuery) -> AuditStorageResult<(Vec<AuditEntry>, u64)> {
        self.storage.query(query)
    }

    /// Verify the whole hash chain
    pub fn verify_chain(&self) -> AuditStorageResult<AuditChainVerification> {
        self.storage.verify_chain()
    }
}
