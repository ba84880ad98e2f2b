//! MovementLedger - stock consistency engine
//!
//! Owns the rules for applying, amending and reverting stock movements
//! against product rows. Every mutating operation follows the same sequence:
//!
//! ```text
//! operation(...)
//!     ├─ 1. Validate quantities (no locks taken yet)
//!     ├─ 2. Acquire restore gate (read) + per-product lock(s), ascending id
//!     ├─ 3. Begin write transaction
//!     ├─ 4. Re-read rows, check stock sufficiency
//!     ├─ 5. Write movement row(s) + product row(s)
//!     ├─ 6. Commit (movement and stock land atomically)
//!     └─ 7. Notify audit sink (fire-and-forget)
//! ```
//!
//! Amends are delta-exact: editing a movement's quantity applies
//! `new − old` (signed per movement type) against current stock instead of
//! replaying the product's history, O(1) in history length. The per-product
//! lock is what makes that sound: no concurrent mutation can race the same
//! product between the read and the write.
//!
//! Stock is never allowed below zero on any path. Reverting an inbound
//! movement whose quantity has since been sold is a referential-integrity
//! violation, not a silent negative balance.

mod error;
pub use error::*;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::sales::{BatchSaleRequest, SaleRequest, aggregate_items};
use super::storage::{InventoryStorage, StorageError};
use super::types::{
    Customer, CustomerCreate, Movement, MovementCreate, MovementType, Product, ProductCreate,
    DataSnapshot, SNAPSHOT_VERSION,
};
use crate::audit::{AuditAction, AuditService};
use crate::utils::now_millis;

/// Movement ledger and product store facade
///
/// All stock mutations in the system route through this type; nothing else
/// writes the `stock` field, which is what keeps the ledger invariant
/// (`stock == Σ IN + Σ ADJUSTMENT − Σ OUT`) true at every commit boundary.
pub struct MovementLedger {
    storage: InventoryStorage,
    /// Per-product mutual exclusion for every read-check-write sequence
    product_locks: DashMap<u64, Arc<Mutex<()>>>,
    /// Snapshot restore takes this exclusively; every mutator holds a read
    restore_gate: RwLock<()>,
    /// Audit sink; absent in some test setups
    audit: Option<Arc<AuditService>>,
}

impl std::fmt::Debug for MovementLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementLedger")
            .field("storage", &"<InventoryStorage>")
            .field("product_locks", &self.product_locks.len())
            .finish_non_exhaustive()
    }
}

impl MovementLedger {
    pub fn new(storage: InventoryStorage) -> Self {
        Self {
            storage,
            product_locks: DashMap::new(),
            restore_gate: RwLock::new(()),
            audit: None,
        }
    }

    /// Set the audit sink for committed-change notifications
    pub fn set_audit_service(&mut self, audit: Arc<AuditService>) {
        self.audit = Some(audit);
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &InventoryStorage {
        &self.storage
    }

    fn product_lock(&self, product_id: u64) -> Arc<Mutex<()>> {
        self.product_locks
            .entry(product_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn lock_product(&self, product_id: u64) -> OwnedMutexGuard<()> {
        self.product_lock(product_id).lock_owned().await
    }

    /// Fire-and-forget audit notification; failure never fails the operation
    async fn notify_audit(
        &self,
        action: AuditAction,
        resource_id: String,
        actor_id: Option<String>,
        details: serde_json::Value,
    ) {
        if let Some(audit) = &self.audit {
            audit.log(action, "movement", resource_id, actor_id, details).await;
        }
    }

    // ========== Movement Operations ==========

    /// Apply a new movement and its stock delta atomically
    ///
    /// `IN`/`ADJUSTMENT` add to stock, `OUT` subtracts and is rejected with
    /// `InsufficientStock` when the requested quantity exceeds what is
    /// available. Check and mutation run under the product lock.
    pub async fn apply_movement(&self, input: MovementCreate) -> LedgerResult<(Movement, Product)> {
        if input.quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(input.quantity));
        }

        let _gate = self.restore_gate.read().await;
        let _lock = self.lock_product(input.product_id).await;

        let txn = self.storage.begin_write()?;

        let mut product = self
            .storage
            .get_product_txn(&txn, input.product_id)?
            .ok_or(LedgerError::ProductNotFound(input.product_id))?;

        let stock_before = product.stock;
        let new_stock = input
            .movement_type
            .sign()
            .checked_mul(input.quantity)
            .and_then(|delta| stock_before.checked_add(delta))
            .ok_or(LedgerError::InvalidQuantity(input.quantity))?;
        if new_stock < 0 {
            return Err(LedgerError::InsufficientStock {
                product_id: product.id,
                available: stock_before,
                requested: input.quantity,
            });
        }

        let movement = Movement {
            id: self.storage.next_movement_id(&txn)?,
            movement_type: input.movement_type,
            product_id: input.product_id,
            quantity: input.quantity,
            date: now_millis(),
            actor_id: input.actor_id.clone(),
            note: input.note,
            reference_doc: input.reference_doc,
        };
        self.storage.put_movement(&txn, &movement)?;

        product.stock = new_stock;
        product.updated_at = movement.date;
        self.storage.put_product(&txn, &product)?;

        txn.commit().map_err(StorageError::from)?;

        tracing::debug!(
            movement_id = movement.id,
            product_id = product.id,
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            stock = product.stock,
            "Movement applied"
        );

        self.notify_audit(
            AuditAction::MovementCreated,
            movement.id.to_string(),
            input.actor_id,
            serde_json::json!({
                "product_id": product.id,
                "movement_type": movement.movement_type,
                "quantity": movement.quantity,
                "stock_before": stock_before,
                "stock_after": product.stock,
                "description": format!(
                    "{} {} x product {} ({} -> {})",
                    movement.movement_type, movement.quantity, product.id,
                    stock_before, product.stock
                ),
            }),
        )
        .await;

        Ok((movement, product))
    }

    /// Amend a movement's quantity, applying the exact stock delta
    ///
    /// For `OUT` movements a larger quantity consumes more stock; for
    /// `IN`/`ADJUSTMENT` a smaller quantity gives stock back. The movement
    /// and the product are left untouched when the delta would push stock
    /// below zero.
    pub async fn amend_movement(
        &self,
        movement_id: u64,
        new_quantity: i64,
        actor_id: Option<String>,
    ) -> LedgerResult<(Movement, Product)> {
        if new_quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(new_quantity));
        }

        // The product id of a movement never changes, so it is safe to read
        // it before taking the lock.
        let peek = self
            .storage
            .get_movement(movement_id)?
            .ok_or(LedgerError::MovementNotFound(movement_id))?;

        let _gate = self.restore_gate.read().await;
        let _lock = self.lock_product(peek.product_id).await;

        let txn = self.storage.begin_write()?;

        // Re-read under the lock; the movement may have been reverted while
        // we were waiting.
        let mut movement = self
            .storage
            .get_movement_txn(&txn, movement_id)?
            .ok_or(LedgerError::MovementNotFound(movement_id))?;
        let mut product = self
            .storage
            .get_product_txn(&txn, movement.product_id)?
            .ok_or(LedgerError::ProductNotFound(movement.product_id))?;

        let old_quantity = movement.quantity;
        let stock_before = product.stock;
        // Both quantities are positive, so the difference itself cannot
        // overflow; applying it to stock can.
        let delta = new_quantity - old_quantity;
        let new_stock = movement
            .movement_type
            .sign()
            .checked_mul(delta)
            .and_then(|d| stock_before.checked_add(d))
            .ok_or(LedgerError::InvalidQuantity(new_quantity))?;

        if new_stock < 0 {
            // For OUT the bound is what the sale could grow to; for inbound
            // shrink it is what is still left to take back.
            let available = match movement.movement_type {
                MovementType::Out => stock_before + old_quantity,
                MovementType::In | MovementType::Adjustment => stock_before,
            };
            return Err(LedgerError::InsufficientStock {
                product_id: product.id,
                available,
                requested: new_quantity,
            });
        }

        movement.quantity = new_quantity;
        self.storage.put_movement(&txn, &movement)?;

        product.stock = new_stock;
        product.updated_at = now_millis();
        self.storage.put_product(&txn, &product)?;

        txn.commit().map_err(StorageError::from)?;

        tracing::debug!(
            movement_id,
            old_quantity,
            new_quantity,
            stock = product.stock,
            "Movement amended"
        );

        self.notify_audit(
            AuditAction::MovementAmended,
            movement_id.to_string(),
            actor_id,
            serde_json::json!({
                "product_id": product.id,
                "movement_type": movement.movement_type,
                "quantity_before": old_quantity,
                "quantity_after": new_quantity,
                "stock_before": stock_before,
                "stock_after": product.stock,
                "description": format!(
                    "amend movement {}: qty {} -> {} (stock {} -> {})",
                    movement_id, old_quantity, new_quantity, stock_before, product.stock
                ),
            }),
        )
        .await;

        Ok((movement, product))
    }

    /// Revert a movement: remove the row and apply the full compensating delta
    ///
    /// An inbound movement whose quantity has already been consumed by later
    /// outbound movements cannot be reverted; that would drive stock negative.
    pub async fn revert_movement(
        &self,
        movement_id: u64,
        actor_id: Option<String>,
    ) -> LedgerResult<Product> {
        let peek = self
            .storage
            .get_movement(movement_id)?
            .ok_or(LedgerError::MovementNotFound(movement_id))?;

        let _gate = self.restore_gate.read().await;
        let _lock = self.lock_product(peek.product_id).await;

        let txn = self.storage.begin_write()?;

        let movement = self
            .storage
            .get_movement_txn(&txn, movement_id)?
            .ok_or(LedgerError::MovementNotFound(movement_id))?;
        let mut product = self
            .storage
            .get_product_txn(&txn, movement.product_id)?
            .ok_or(LedgerError::ProductNotFound(movement.product_id))?;

        let stock_before = product.stock;
        let new_stock = movement
            .movement_type
            .sign()
            .checked_mul(movement.quantity)
            .and_then(|delta| stock_before.checked_sub(delta))
            .ok_or(LedgerError::InvalidQuantity(movement.quantity))?;
        if new_stock < 0 {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "cannot revert movement {}: {} unit(s) of product {} already consumed (stock {})",
                movement_id, movement.quantity, product.id, stock_before
            )));
        }

        self.storage.remove_movement(&txn, movement_id)?;

        product.stock = new_stock;
        product.updated_at = now_millis();
        self.storage.put_product(&txn, &product)?;

        txn.commit().map_err(StorageError::from)?;

        tracing::debug!(
            movement_id,
            product_id = product.id,
            stock = product.stock,
            "Movement reverted"
        );

        self.notify_audit(
            AuditAction::MovementReverted,
            movement_id.to_string(),
            actor_id,
            serde_json::json!({
                "product_id": product.id,
                "movement_type": movement.movement_type,
                "quantity": movement.quantity,
                "stock_before": stock_before,
                "stock_after": product.stock,
                "description": format!(
                    "revert movement {} (stock {} -> {})",
                    movement_id, stock_before, product.stock
                ),
            }),
        )
        .await;

        Ok(product)
    }

    // ========== Sale Operations ==========

    /// Sell a single product: thin wrapper over an OUT movement
    pub async fn sell_single(&self, req: SaleRequest) -> LedgerResult<(Movement, Product)> {
        self.apply_movement(MovementCreate {
            movement_type: MovementType::Out,
            product_id: req.product_id,
            quantity: req.quantity,
            actor_id: req.actor_id,
            note: req.note,
            reference_doc: None,
        })
        .await
    }

    /// Sell a batch of items with all-or-nothing semantics
    ///
    /// Line items are aggregated per product, every aggregated quantity is
    /// validated against current stock, and only if all pass is one OUT
    /// movement per distinct product committed - in a single transaction,
    /// holding every involved product lock (acquired in ascending id order
    /// so overlapping batches cannot deadlock).
    pub async fn sell_batch(&self, req: BatchSaleRequest) -> LedgerResult<Vec<Movement>> {
        let aggregated = aggregate_items(&req.items)?;

        let _gate = self.restore_gate.read().await;
        let mut locks = Vec::with_capacity(aggregated.len());
        for product_id in aggregated.keys() {
            locks.push(self.lock_product(*product_id).await);
        }

        let txn = self.storage.begin_write()?;

        // Phase 1 - validate every product before touching anything
        let mut products = Vec::with_capacity(aggregated.len());
        let mut failures = Vec::new();
        for (&product_id, &quantity) in &aggregated {
            let product = self
                .storage
                .get_product_txn(&txn, product_id)?
                .ok_or(LedgerError::ProductNotFound(product_id))?;
            if quantity > product.stock {
                failures.push(BatchFailure {
                    product_id,
                    available: product.stock,
                    requested: quantity,
                });
            }
            products.push((product, quantity));
        }
        if !failures.is_empty() {
            // Transaction dropped without commit - no stock mutated, no rows written
            return Err(LedgerError::BatchValidation(failures));
        }

        // Phase 2 - commit one OUT movement per distinct product
        let date = now_millis();
        let mut movements = Vec::with_capacity(products.len());
        let mut audit_entries = Vec::with_capacity(products.len());
        for (mut product, quantity) in products {
            let movement = Movement {
                id: self.storage.next_movement_id(&txn)?,
                movement_type: MovementType::Out,
                product_id: product.id,
                quantity,
                date,
                actor_id: req.actor_id.clone(),
                note: req.note.clone(),
                reference_doc: None,
            };
            self.storage.put_movement(&txn, &movement)?;

            let stock_before = product.stock;
            product.stock -= quantity;
            product.updated_at = date;
            self.storage.put_product(&txn, &product)?;

            audit_entries.push((movement.id, product.id, quantity, stock_before, product.stock));
            movements.push(movement);
        }

        txn.commit().map_err(StorageError::from)?;

        tracing::debug!(
            line_items = req.items.len(),
            movements = movements.len(),
            "Batch sale committed"
        );

        for (movement_id, product_id, quantity, stock_before, stock_after) in audit_entries {
            self.notify_audit(
                AuditAction::MovementCreated,
                movement_id.to_string(),
                req.actor_id.clone(),
                serde_json::json!({
                    "product_id": product_id,
                    "movement_type": MovementType::Out,
                    "quantity": quantity,
                    "stock_before": stock_before,
                    "stock_after": stock_after,
                    "description": format!(
                        "OUT {} x product {} ({} -> {}) [batch]",
                        quantity, product_id, stock_before, stock_after
                    ),
                }),
            )
            .await;
        }
        self.notify_audit(
            AuditAction::BatchSaleCompleted,
            movements
                .first()
                .map(|m| m.id.to_string())
                .unwrap_or_default(),
            req.actor_id.clone(),
            serde_json::json!({
                "line_items": req.items.len(),
                "movements": movements.len(),
                "description": format!(
                    "batch sale: {} line item(s) -> {} movement(s)",
                    req.items.len(), movements.len()
                ),
            }),
        )
        .await;

        Ok(movements)
    }

    // ========== Product Operations ==========

    /// Create a product; opening stock is recorded as an initial IN movement
    pub async fn create_product(
        &self,
        input: ProductCreate,
        actor_id: Option<String>,
    ) -> LedgerResult<Product> {
        let initial_stock = input.initial_stock.unwrap_or(0);
        if initial_stock < 0 {
            return Err(LedgerError::InvalidQuantity(initial_stock));
        }
        if self.storage.find_product_by_sku(&input.sku)?.is_some() {
            return Err(LedgerError::DuplicateSku(input.sku));
        }

        let _gate = self.restore_gate.read().await;

        let txn = self.storage.begin_write()?;

        let now = now_millis();
        let product = Product {
            id: self.storage.next_product_id(&txn)?,
            sku: input.sku,
            name: input.name,
            category: input.category.unwrap_or_default(),
            price: input.price,
            cost: input.cost.unwrap_or_default(),
            stock: initial_stock,
            min_stock: input.min_stock.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        match self.storage.claim_sku(&txn, &product.sku, product.id) {
            Ok(()) => {}
            Err(StorageError::DuplicateSku(sku)) => return Err(LedgerError::DuplicateSku(sku)),
            Err(e) => return Err(e.into()),
        }
        self.storage.put_product(&txn, &product)?;

        if initial_stock > 0 {
            let movement = Movement {
                id: self.storage.next_movement_id(&txn)?,
                movement_type: MovementType::In,
                product_id: product.id,
                quantity: initial_stock,
                date: now,
                actor_id: actor_id.clone(),
                note: Some("initial stock".to_string()),
                reference_doc: None,
            };
            self.storage.put_movement(&txn, &movement)?;
        }

        txn.commit().map_err(StorageError::from)?;

        self.notify_audit(
            AuditAction::ProductCreated,
            product.id.to_string(),
            actor_id,
            serde_json::json!({
                "sku": product.sku,
                "name": product.name,
                "initial_stock": initial_stock,
            }),
        )
        .await;

        Ok(product)
    }

    /// Delete a product with no referencing movements
    pub async fn delete_product(&self, product_id: u64, actor_id: Option<String>) -> LedgerResult<()> {
        let _gate = self.restore_gate.read().await;
        let _lock = self.lock_product(product_id).await;

        let txn = self.storage.begin_write()?;

        if self.storage.product_has_movements(&txn, product_id)? {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "product {} still has movements referencing it",
                product_id
            )));
        }
        let removed = match self.storage.remove_product(&txn, product_id) {
            Ok(p) => p,
            Err(StorageError::ProductNotFound(id)) => return Err(LedgerError::ProductNotFound(id)),
            Err(e) => return Err(e.into()),
        };

        txn.commit().map_err(StorageError::from)?;

        self.notify_audit(
            AuditAction::ProductDeleted,
            product_id.to_string(),
            actor_id,
            serde_json::json!({ "sku": removed.sku, "name": removed.name }),
        )
        .await;

        Ok(())
    }

    /// Get a product by id
    pub fn get_product(&self, product_id: u64) -> LedgerResult<Product> {
        self.storage
            .get_product(product_id)?
            .ok_or(LedgerError::ProductNotFound(product_id))
    }

    /// List all products
    pub fn list_products(&self) -> LedgerResult<Vec<Product>> {
        Ok(self.storage.get_all_products()?)
    }

    /// List products at or below their low-stock threshold
    pub fn list_low_stock(&self) -> LedgerResult<Vec<Product>> {
        Ok(self
            .storage
            .get_all_products()?
            .into_iter()
            .filter(|p| p.stock <= p.min_stock)
            .collect())
    }

    /// Get a movement by id
    pub fn get_movement(&self, movement_id: u64) -> LedgerResult<Movement> {
        self.storage
            .get_movement(movement_id)?
            .ok_or(LedgerError::MovementNotFound(movement_id))
    }

    /// List movements, optionally restricted to one product
    pub fn list_movements(&self, product_id: Option<u64>) -> LedgerResult<Vec<Movement>> {
        let movements = match product_id {
            Some(id) => self.storage.get_movements_for_product(id)?,
            None => self.storage.get_all_movements()?,
        };
        Ok(movements)
    }

    // ========== Customer Operations ==========

    /// Create a customer
    pub async fn create_customer(&self, input: CustomerCreate) -> LedgerResult<Customer> {
        let _gate = self.restore_gate.read().await;

        let txn = self.storage.begin_write()?;
        let customer = Customer {
            id: self.storage.next_customer_id(&txn)?,
            name: input.name,
            phone: input.phone,
            email: input.email,
            created_at: now_millis(),
        };
        self.storage.put_customer(&txn, &customer)?;
        txn.commit().map_err(StorageError::from)?;

        Ok(customer)
    }

    /// Get a customer by id
    pub fn get_customer(&self, customer_id: u64) -> LedgerResult<Customer> {
        self.storage
            .get_customer(customer_id)?
            .ok_or(LedgerError::CustomerNotFound(customer_id))
    }

    /// List all customers
    pub fn list_customers(&self) -> LedgerResult<Vec<Customer>> {
        Ok(self.storage.get_all_customers()?)
    }

    // ========== Snapshot Operations ==========

    /// Export a point-in-time copy of the full data set
    pub async fn export_snapshot(&self, actor_id: Option<String>) -> LedgerResult<DataSnapshot> {
        let snapshot = self.storage.export_snapshot()?;

        self.notify_audit(
            AuditAction::SnapshotExported,
            "snapshot".to_string(),
            actor_id,
            serde_json::json!({
                "products": snapshot.products.len(),
                "movements": snapshot.movements.len(),
                "customers": snapshot.customers.len(),
            }),
        )
        .await;

        Ok(snapshot)
    }

    /// Validate and import a snapshot, replacing the data set wholesale
    ///
    /// Takes the restore gate exclusively, so no ledger operation ever
    /// interleaves with the swap.
    pub async fn import_snapshot(
        &self,
        snapshot: DataSnapshot,
        actor_id: Option<String>,
    ) -> LedgerResult<()> {
        validate_snapshot(&snapshot)?;

        let _gate = self.restore_gate.write().await;
        self.storage.import_snapshot(&snapshot)?;
        drop(_gate);

        tracing::info!(
            products = snapshot.products.len(),
            movements = snapshot.movements.len(),
            customers = snapshot.customers.len(),
            "Snapshot imported"
        );

        self.notify_audit(
            AuditAction::SnapshotImported,
            "snapshot".to_string(),
            actor_id,
            serde_json::json!({
                "products": snapshot.products.len(),
                "movements": snapshot.movements.len(),
                "customers": snapshot.customers.len(),
            }),
        )
        .await;

        Ok(())
    }
}

/// Signed stock total of a movement list
pub fn stock_from_movements(movements: &[Movement]) -> i64 {
    movements
        .iter()
        .map(|m| m.movement_type.sign() * m.quantity)
        .sum()
}

/// Check a snapshot before it replaces live data
///
/// Rejects unknown versions, non-positive quantities, movements referencing
/// missing products, negative stock, and product rows whose stock disagrees
/// with their movement history.
fn validate_snapshot(snapshot: &DataSnapshot) -> LedgerResult<()> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(LedgerError::InvalidSnapshot(format!(
            "unsupported version {}",
            snapshot.version
        )));
    }

    let mut ledger_totals: std::collections::HashMap<u64, i64> = std::collections::HashMap::new();
    for movement in &snapshot.movements {
        if movement.quantity <= 0 {
            return Err(LedgerError::InvalidSnapshot(format!(
                "movement {} has non-positive quantity {}",
                movement.id, movement.quantity
            )));
        }
        let total = ledger_totals.entry(movement.product_id).or_insert(0);
        *total = movement
            .movement_type
            .sign()
            .checked_mul(movement.quantity)
            .and_then(|delta| total.checked_add(delta))
            .ok_or_else(|| {
                LedgerError::InvalidSnapshot(format!(
                    "movement totals overflow for product {}",
                    movement.product_id
                ))
            })?;
    }

    let product_ids: std::collections::HashSet<u64> =
        snapshot.products.iter().map(|p| p.id).collect();
    for product in &snapshot.products {
        if product.stock < 0 {
            return Err(LedgerError::InvalidSnapshot(format!(
                "product {} has negative stock {}",
                product.id, product.stock
            )));
        }
        let expected = ledger_totals.get(&product.id).copied().unwrap_or(0);
        if product.stock != expected {
            return Err(LedgerError::InvalidSnapshot(format!(
                "product {} stock {} disagrees with its movement history ({})",
                product.id, product.stock, expected
            )));
        }
    }
    for (product_id, _) in ledger_totals {
        if !product_ids.contains(&product_id) {
            return Err(LedgerError::InvalidSnapshot(format!(
                "movements reference missing product {}",
                product_id
            )));
        }
    }

    Ok(())
}
