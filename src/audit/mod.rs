//! Tamper-evident audit trail
//!
//! # Architecture
//!
//! ```text
//! ledger operation commits
//!   ├─ AuditService::log()      → mpsc → AuditWorker → redb (audit_entries)
//!   └─ AuditService::log_sync() → redb (startup/shutdown)
//!
//! SHA256 hash chain: genesis → entry₁ → entry₂ → ... → entryₙ
//! ```
//!
//! # Tamper evidence
//!
//! - **SHA256 hash chain**: every record embeds the hash of the previous one
//! - **Append-only**: no delete/update interface
//! - **Verification API**: the whole chain can be re-checked at any time
//!
//! Audit failures never fail the business operation that triggered them;
//! the ledger commit is the source of truth, the audit log is the witness.

pub mod service;
pub mod storage;
pub mod types;
pub mod worker;

pub use service::{AuditLogRequest, AuditService};
pub use storage::{AuditStorage, AuditStorageError, AuditStorageResult};
pub use types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditListResponse,
    AuditQuery,
};
pub use worker::AuditWorker;
