//! Audit log persistence (redb)
//!
//! Append-only table keyed by sequence number. The hash chain is computed
//! here so that every append is anchored to the current tail, whatever the
//! caller.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use sha2::{Digest, Sha256};

use crate::utils::now_millis;

use super::types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditQuery,
};

const AUDIT_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_entries");

pub type AuditStorageResult<T> = Result<T, AuditStorageError>;

#[derive(Debug, thiserror::Error)]
pub enum AuditStorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// redb-backed audit store
#[derive(Clone)]
pub struct AuditStorage {
    db: Arc<Database>,
}

impl AuditStorage {
    /// Open (or create) the audit database at the given path
    pub fn open(path: impl AsRef<Path>) -> AuditStorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> AuditStorageResult<Self> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> AuditStorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            txn.open_table(AUDIT_TABLE)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Append a new entry, chained to the current tail
    pub fn append(
        &self,
        action: AuditAction,
        resource_type: String,
        resource_id: String,
        operator_id: Option<String>,
        details: serde_json::Value,
    ) -> AuditStorageResult<AuditEntry> {
        let txn = self.db.begin_write()?;
        let entry = {
            let mut table = txn.open_table(AUDIT_TABLE)?;

            // Tail of the chain. Genesis entries link to the zero hash.
            let (next_id, prev_hash) = match table.last()? {
                Some((key, value)) => {
                    let prev: AuditEntry = serde_json::from_slice(value.value())?;
                    (key.value() + 1, prev.curr_hash)
                }
                None => (1, genesis_hash()),
            };

            let mut entry = AuditEntry {
                id: next_id,
                timestamp: now_millis(),
                action,
                resource_type,
                resource_id,
                operator_id,
                details,
                prev_hash,
                curr_hash: String::new(),
            };
            entry.curr_hash = compute_entry_hash(&entry);

            let bytes = serde_json::to_vec(&entry)?;
            table.insert(next_id, bytes.as_slice())?;
            entry
        };
        txn.commit()?;
        Ok(entry)
    }

    /// Query entries with filters, newest first
    pub fn query(&self, query: &AuditQuery) -> AuditStorageResult<(Vec<AuditEntry>, u64)> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(AUDIT_TABLE)?;

        let mut matched = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let entry: AuditEntry = serde_json::from_slice(value.value())?;

            if let Some(from) = query.from
                && entry.timestamp < from
            {
                continue;
            }
            if let Some(to) = query.to
                && entry.timestamp > to
            {
                continue;
            }
            if let Some(action) = query.action
                && entry.action != action
            {
                continue;
            }
            if let Some(ref operator) = query.operator_id
                && entry.operator_id.as_deref() != Some(operator.as_str())
            {
                continue;
            }
            if let Some(ref rt) = query.resource_type
                && entry.resource_type != *rt
            {
                continue;
            }
            matched.push(entry);
        }

        let total = matched.len() as u64;
        matched.sort_by(|a, b| b.id.cmp(&a.id));
        let items = matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        Ok((items, total))
    }

    /// Walk the whole chain and verify both linkage and content hashes
    pub fn verify_chain(&self) -> AuditStorageResult<AuditChainVerification> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(AUDIT_TABLE)?;

        let mut total = 0u64;
        let mut breaks = Vec::new();
        let mut expected_prev = genesis_hash();

        for item in table.iter()? {
            let (_, value) = item?;
            let entry: AuditEntry = serde_json::from_slice(value.value())?;
            total += 1;

            if entry.prev_hash != expected_prev {
                breaks.push(AuditChainBreak {
                    entry_id: entry.id,
                    expected_prev_hash: expected_prev.clone(),
                    actual_prev_hash: entry.prev_hash.clone(),
                });
            }

            let recomputed = compute_entry_hash(&entry);
            if recomputed != entry.curr_hash {
                breaks.push(AuditChainBreak {
                    entry_id: entry.id,
                    expected_prev_hash: recomputed,
                    actual_prev_hash: entry.curr_hash.clone(),
                });
            }

            expected_prev = entry.curr_hash;
        }

        Ok(AuditChainVerification {
            total_entries: total,
            chain_intact: breaks.is_empty(),
            breaks,
        })
    }

    /// Number of entries in the log
    pub fn count(&self) -> AuditStorageResult<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(AUDIT_TABLE)?;
        Ok(table.len()?)
    }
}

fn genesis_hash() -> String {
    "0".repeat(64)
}

/// SHA-256 over the chained fields, NUL-separated.
/// `curr_hash` itself is excluded.
fn compute_entry_hash(entry: &AuditEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.prev_hash.as_bytes());
    hasher.update(b"\x00");
    hasher.update(entry.id.to_be_bytes());
    hasher.update(b"\x00");
    hasher.update(entry.timestamp.to_be_bytes());
    hasher.update(b"\x00");
    hasher.update(entry.action.to_string().as_bytes());
    hasher.update(b"\x00");
    hasher.update(entry.resource_type.as_bytes());
    hasher.update(b"\x00");
    hasher.update(entry.resource_id.as_bytes());
    hasher.update(b"\x00");
    // Presence marker keeps None and Some("") distinguishable in the chain
    match &entry.operator_id {
        Some(operator) => {
            hasher.update(b"\x01");
            hasher.update(operator.as_bytes());
        }
        None => {
            hasher.update(b"\x00");
        }
    }
    hasher.update(b"\x00");
    hasher.update(entry.details.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> AuditStorage {
        AuditStorage::open_in_memory().unwrap()
    }

    #[test]
    fn test_append_builds_chain() {
        let storage = store();
        let first = storage
            .append(
                AuditAction::MovementCreated,
                "movement".into(),
                "1".into(),
                Some("alice".into()),
                json!({"quantity": 5}),
            )
            .unwrap();
        let second = storage
            .append(
                AuditAction::MovementReverted,
                "movement".into(),
                "1".into(),
                Some("alice".into()),
                json!({}),
            )
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(first.prev_hash, genesis_hash());
        assert_eq!(second.id, 2);
        assert_eq!(second.prev_hash, first.curr_hash);
    }

    #[test]
    fn test_verify_intact_chain() {
        let storage = store();
        for i in 0..5 {
            storage
                .append(
                    AuditAction::MovementCreated,
                    "movement".into(),
                    i.to_string(),
                    None,
                    json!({"n": i}),
                )
                .unwrap();
        }
        let report = storage.verify_chain().unwrap();
        assert_eq!(report.total_entries, 5);
        assert!(report.chain_intact);
        assert!(report.breaks.is_empty());
    }

    #[test]
    fn test_query_filters_and_pagination() {
        let storage = store();
        for i in 0..10 {
            let action = if i % 2 == 0 {
                AuditAction::MovementCreated
            } else {
                AuditAction::MovementAmended
            };
            storage
                .append(action, "movement".into(), i.to_string(), None, json!({}))
                .unwrap();
        }

        let (items, total) = storage
            .query(&AuditQuery {
                action: Some(AuditAction::MovementAmended),
                limit: 3,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 3);
        // Newest first
        assert!(items[0].id > items[1].id);
    }

    #[test]
    fn test_hash_distinguishes_missing_operator_from_empty() {
        let entry = AuditEntry {
            id: 1,
            timestamp: 42,
            action: AuditAction::MovementCreated,
            resource_type: "movement".to_string(),
            resource_id: "1".to_string(),
            operator_id: None,
            details: json!({}),
            prev_hash: genesis_hash(),
            curr_hash: String::new(),
        };
        let mut with_empty = entry.clone();
        with_empty.operator_id = Some(String::new());

        assert_ne!(compute_entry_hash(&entry), compute_entry_hash(&with_empty));
    }

    #[test]
    fn test_query_by_operator() {
        let storage = store();
        storage
            .append(
                AuditAction::ProductCreated,
                "movement".into(),
                "1".into(),
                Some("alice".into()),
                json!({}),
            )
            .unwrap();
        storage
            .append(
                AuditAction::ProductCreated,
                "movement".into(),
                "2".into(),
                Some("bob".into()),
                json!({}),
            )
            .unwrap();

        let (items, total) = storage
            .query(&AuditQuery {
                operator_id: Some("bob".into()),
                limit: 50,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].resource_id, "2");
    }
}
