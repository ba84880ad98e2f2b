use std::sync::Arc;

use crate::audit::{AuditService, AuditStorage, AuditWorker};
use crate::core::error::Result;
use crate::core::Config;
use crate::inventory::{InventoryStorage, MovementLedger};

/// Server state - shared references to every service
///
/// Cloning is cheap (Arc all the way down); one clone goes into the axum
/// router, one stays with the server for lifecycle bookkeeping.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    /// Movement ledger (the only stock writer in the system)
    pub ledger: Arc<MovementLedger>,
    /// Audit trail facade
    pub audit: Arc<AuditService>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Open storages, wire the ledger to the audit sink and start the
    /// audit worker
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        let inventory_storage = InventoryStorage::open(config.inventory_db_path())?;
        let audit_storage = AuditStorage::open(config.audit_db_path())?;

        let (audit, rx) = AuditService::new(audit_storage.clone(), config.audit_buffer_size);
        tokio::spawn(AuditWorker::new(audit_storage).run(rx));

        let mut ledger = MovementLedger::new(inventory_storage);
        ledger.set_audit_service(Arc::clone(&audit));

        tracing::info!(
            work_dir = %config.work_dir,
            "Server state initialized"
        );

        Ok(Self {
            config: config.clone(),
            ledger: Arc::new(ledger),
            audit,
        })
    }

    /// In-memory state for tests (no worker, synchronous audit only)
    #[cfg(test)]
    pub fn initialize_in_memory() -> Result<Self> {
        let inventory_storage = InventoryStorage::open_in_memory()?;
        let audit_storage = AuditStorage::open_in_memory()?;
        let (audit, _rx) = AuditService::new(audit_storage, 16);

        let ledger = MovementLedger::new(inventory_storage);

        Ok(Self {
            config: Config::with_overrides("/tmp/stockroom-test", 0),
            ledger: Arc::new(ledger),
            audit,
        })
    }
}
