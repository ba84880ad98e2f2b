//! Audit log type definitions
//!
//! Core data structures for the compliance history. Entries are immutable
//! and never deleted; a SHA-256 hash chain makes tampering detectable.

use serde::{Deserialize, Serialize};

/// Audit action type (closed enum, not free text)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // === Ledger ===
    /// Movement committed (direct adjustment, single sale or batch line)
    MovementCreated,
    /// Movement quantity edited in place
    MovementAmended,
    /// Movement deleted with compensating stock reversal
    MovementReverted,
    /// Batch sale summary (one entry per batch)
    BatchSaleCompleted,

    // === Catalog ===
    /// Product created
    ProductCreated,
    /// Product deleted
    ProductDeleted,

    // === Snapshots ===
    /// Full data set exported
    SnapshotExported,
    /// Full data set replaced from a snapshot
    SnapshotImported,

    // === System lifecycle ===
    /// Server started
    SystemStartup,
    /// Server shut down cleanly
    SystemShutdown,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Audit log entry (immutable)
///
/// Each record carries a SHA-256 hash chain:
/// - `prev_hash`: hash of the previous record
/// - `curr_hash`: hash over `prev_hash` + all stored fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Globally increasing sequence number
    pub id: u64,
    /// Unix millis
    pub timestamp: i64,
    pub action: AuditAction,
    /// Resource kind, e.g. "movement", "system"
    pub resource_type: String,
    /// Resource id, e.g. a movement id
    pub resource_id: String,
    /// Operator id; None for system events
    pub operator_id: Option<String>,
    /// Structured details (JSON)
    pub details: serde_json::Value,
    pub prev_hash: String,
    pub curr_hash: String,
}

/// Audit log query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    /// Start timestamp (Unix millis, inclusive)
    pub from: Option<i64>,
    /// End timestamp (Unix millis, inclusive)
    pub to: Option<i64>,
    pub action: Option<AuditAction>,
    pub operator_id: Option<String>,
    pub resource_type: Option<String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            action: None,
            operator_id: None,
            resource_type: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

/// Audit log list response
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: u64,
}

/// Chain verification result
#[derive(Debug, Serialize)]
pub struct AuditChainVerification {
    pub total_entries: u64,
    pub chain_intact: bool,
    pub breaks: Vec<AuditChainBreak>,
}

/// A detected break in the hash chain
#[derive(Debug, Serialize)]
pub struct AuditChainBreak {
    /// Sequence number where the break was detected
    pub entry_id: u64,
    pub expected_prev_hash: String,
    pub actual_prev_hash: String,
}
