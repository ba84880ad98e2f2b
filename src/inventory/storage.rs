//! redb-based storage layer for the inventory ledger
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `Product` | Authoritative product rows |
//! | `movements` | `movement_id` | `Movement` | Stock movement ledger |
//! | `customers` | `customer_id` | `Customer` | Customer registry |
//! | `sku_index` | `sku` | `product_id` | Unique SKU constraint |
//! | `counters` | name | `u64` | Monotonic id sequences |
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), so a movement row and its product row either
//! both survive a crash or neither does. Readers use `begin_read` MVCC
//! snapshots and never observe a half-applied movement.

use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use thiserror::Error;

use super::types::{Customer, DataSnapshot, Movement, Product};

/// Product rows: key = product_id, value = JSON-serialized Product
const PRODUCTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

/// Movement ledger: key = movement_id, value = JSON-serialized Movement
const MOVEMENTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("movements");

/// Customer rows: key = customer_id, value = JSON-serialized Customer
const CUSTOMERS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("customers");

/// Unique SKU index: key = sku, value = product_id
const SKU_INDEX_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sku_index");

/// Id sequences: key = counter name, value = last assigned id
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const PRODUCT_SEQ_KEY: &str = "product_seq";
const MOVEMENT_SEQ_KEY: &str = "movement_seq";
const CUSTOMER_SEQ_KEY: &str = "customer_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
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

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error("Movement not found: {0}")]
    MovementNotFound(u64),

    #[error("Customer not found: {0}")]
    CustomerNotFound(u64),

    #[error("Duplicate SKU: {0}")]
    DuplicateSku(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Inventory storage backed by redb
#[derive(Clone)]
pub struct InventoryStorage {
    db: Arc<Database>,
}

impl InventoryStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(MOVEMENTS_TABLE)?;
            let _ = write_txn.open_table(CUSTOMERS_TABLE)?;
            let _ = write_txn.open_table(SKU_INDEX_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Id Sequences ==========

    fn next_id(&self, txn: &WriteTransaction, key: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(key)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key, next)?;
        Ok(next)
    }

    /// Allocate the next product id (within transaction)
    pub fn next_product_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        self.next_id(txn, PRODUCT_SEQ_KEY)
    }

    /// Allocate the next movement id (within transaction)
    pub fn next_movement_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        self.next_id(txn, MOVEMENT_SEQ_KEY)
    }

    /// Allocate the next customer id (within transaction)
    pub fn next_customer_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        self.next_id(txn, CUSTOMER_SEQ_KEY)
    }

    // ========== Product Operations ==========

    /// Insert or overwrite a product row (within transaction)
    pub fn put_product(&self, txn: &WriteTransaction, product: &Product) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let value = serde_json::to_vec(product)?;
        table.insert(product.id, value.as_slice())?;
        Ok(())
    }

    /// Register a product's SKU, failing on duplicates (within transaction)
    pub fn claim_sku(&self, txn: &WriteTransaction, sku: &str, product_id: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SKU_INDEX_TABLE)?;
        if let Some(existing) = table.get(sku)? {
            if existing.value() != product_id {
                return Err(StorageError::DuplicateSku(sku.to_string()));
            }
        }
        table.insert(sku, product_id)?;
        Ok(())
    }

    /// Get a product by id (read-only)
    pub fn get_product(&self, id: u64) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a product by id (within transaction)
    pub fn get_product_txn(&self, txn: &WriteTransaction, id: u64) -> StorageResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Find a product by SKU
    pub fn find_product_by_sku(&self, sku: &str) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(SKU_INDEX_TABLE)?;
        let Some(id) = index.get(sku)?.map(|g| g.value()) else {
            return Ok(None);
        };
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all products ordered by id
    pub fn get_all_products(&self) -> StorageResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        Ok(products)
    }

    /// Remove a product row and its SKU index entry (within transaction)
    pub fn remove_product(&self, txn: &WriteTransaction, id: u64) -> StorageResult<Product> {
        let removed = {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            match table.remove(id)? {
                Some(value) => serde_json::from_slice::<Product>(value.value())?,
                None => return Err(StorageError::ProductNotFound(id)),
            }
        };
        let mut index = txn.open_table(SKU_INDEX_TABLE)?;
        index.remove(removed.sku.as_str())?;
        Ok(removed)
    }

    // ========== Movement Operations ==========

    /// Insert or overwrite a movement row (within transaction)
    pub fn put_movement(&self, txn: &WriteTransaction, movement: &Movement) -> StorageResult<()> {
        let mut table = txn.open_table(MOVEMENTS_TABLE)?;
        let value = serde_json::to_vec(movement)?;
        table.insert(movement.id, value.as_slice())?;
        Ok(())
    }

    /// Remove a movement row (within transaction)
    pub fn remove_movement(&self, txn: &WriteTransaction, id: u64) -> StorageResult<Movement> {
        let mut table = txn.open_table(MOVEMENTS_TABLE)?;
        match table.remove(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::MovementNotFound(id)),
        }
    }

    /// Get a movement by id (read-only)
    pub fn get_movement(&self, id: u64) -> StorageResult<Option<Movement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a movement by id (within transaction)
    pub fn get_movement_txn(
        &self,
        txn: &WriteTransaction,
        id: u64,
    ) -> StorageResult<Option<Movement>> {
        let table = txn.open_table(MOVEMENTS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all movements ordered by id (commit order)
    pub fn get_all_movements(&self) -> StorageResult<Vec<Movement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;

        let mut movements = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            movements.push(serde_json::from_slice(value.value())?);
        }
        Ok(movements)
    }

    /// Get all movements for one product, in commit order
    pub fn get_movements_for_product(&self, product_id: u64) -> StorageResult<Vec<Movement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;

        let mut movements = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let movement: Movement = serde_json::from_slice(value.value())?;
            if movement.product_id == product_id {
                movements.push(movement);
            }
        }
        Ok(movements)
    }

    /// Check whether any movement references the product (within transaction)
    pub fn product_has_movements(
        &self,
        txn: &WriteTransaction,
        product_id: u64,
    ) -> StorageResult<bool> {
        let table = txn.open_table(MOVEMENTS_TABLE)?;
        for result in table.iter()? {
            let (_key, value) = result?;
            let movement: Movement = serde_json::from_slice(value.value())?;
            if movement.product_id == product_id {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ========== Customer Operations ==========

    /// Insert or overwrite a customer row (within transaction)
    pub fn put_customer(&self, txn: &WriteTransaction, customer: &Customer) -> StorageResult<()> {
        let mut table = txn.open_table(CUSTOMERS_TABLE)?;
        let value = serde_json::to_vec(customer)?;
        table.insert(customer.id, value.as_slice())?;
        Ok(())
    }

    /// Get a customer by id
    pub fn get_customer(&self, id: u64) -> StorageResult<Option<Customer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CUSTOMERS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all customers ordered by id
    pub fn get_all_customers(&self) -> StorageResult<Vec<Customer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CUSTOMERS_TABLE)?;

        let mut customers = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            customers.push(serde_json::from_slice(value.value())?);
        }
        Ok(customers)
    }

    // ========== Snapshot Operations ==========

    /// Read a point-in-time copy of the full data set
    ///
    /// A single read transaction covers all three tables, so the copy is
    /// consistent even while ledger commits are in flight.
    pub fn export_snapshot(&self) -> StorageResult<DataSnapshot> {
        let read_txn = self.db.begin_read()?;

        let mut products: Vec<Product> = Vec::new();
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }

        let mut movements: Vec<Movement> = Vec::new();
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;
        for result in table.iter()? {
            let (_key, value) = result?;
            movements.push(serde_json::from_slice(value.value())?);
        }

        let mut customers: Vec<Customer> = Vec::new();
        let table = read_txn.open_table(CUSTOMERS_TABLE)?;
        for result in table.iter()? {
            let (_key, value) = result?;
            customers.push(serde_json::from_slice(value.value())?);
        }

        Ok(DataSnapshot {
            version: super::types::SNAPSHOT_VERSION,
            exported_at: crate::utils::now_millis(),
            products,
            movements,
            customers,
        })
    }

    /// Replace the full data set wholesale in one transaction
    ///
    /// Id counters are reset just above the imported maxima so future
    /// allocations never collide with restored rows. The caller is
    /// responsible for excluding concurrent ledger operations.
    pub fn import_snapshot(&self, snapshot: &DataSnapshot) -> StorageResult<()> {
        let txn = self.db.begin_write()?;

        txn.delete_table(PRODUCTS_TABLE)?;
        txn.delete_table(MOVEMENTS_TABLE)?;
        txn.delete_table(CUSTOMERS_TABLE)?;
        txn.delete_table(SKU_INDEX_TABLE)?;

        {
            let mut products = txn.open_table(PRODUCTS_TABLE)?;
            let mut index = txn.open_table(SKU_INDEX_TABLE)?;
            for product in &snapshot.products {
                let value = serde_json::to_vec(product)?;
                products.insert(product.id, value.as_slice())?;
                index.insert(product.sku.as_str(), product.id)?;
            }

            let mut movements = txn.open_table(MOVEMENTS_TABLE)?;
            for movement in &snapshot.movements {
                let value = serde_json::to_vec(movement)?;
                movements.insert(movement.id, value.as_slice())?;
            }

            let mut customers = txn.open_table(CUSTOMERS_TABLE)?;
            for customer in &snapshot.customers {
                let value = serde_json::to_vec(customer)?;
                customers.insert(customer.id, value.as_slice())?;
            }

            let mut counters = txn.open_table(COUNTERS_TABLE)?;
            let max_product = snapshot.products.iter().map(|p| p.id).max().unwrap_or(0);
            let max_movement = snapshot.movements.iter().map(|m| m.id).max().unwrap_or(0);
            let max_customer = snapshot.customers.iter().map(|c| c.id).max().unwrap_or(0);
            counters.insert(PRODUCT_SEQ_KEY, max_product)?;
            counters.insert(MOVEMENT_SEQ_KEY, max_movement)?;
            counters.insert(CUSTOMER_SEQ_KEY, max_customer)?;
        }

        txn.commit()?;
        Ok(())
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let products_table = read_txn.open_table(PRODUCTS_TABLE)?;
        let movements_table = read_txn.open_table(MOVEMENTS_TABLE)?;
        let customers_table = read_txn.open_table(CUSTOMERS_TABLE)?;

        Ok(StorageStats {
            product_count: products_table.len()?,
            movement_count: movements_table.len()?,
            customer_count: customers_table.len()?,
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub product_count: u64,
    pub movement_count: u64,
    pub customer_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::types::MovementType;
    use rust_decimal::Decimal;

    fn test_product(id: u64, sku: &str, stock: i64) -> Product {
        Product {
            id,
            sku: sku.to_string(),
            name: format!("Product {}", id),
            category: "test".to_string(),
            price: Decimal::new(995, 2),
            cost: Decimal::new(450, 2),
            stock,
            min_stock: 2,
            created_at: crate::utils::now_millis(),
            updated_at: crate::utils::now_millis(),
        }
    }

    fn test_movement(id: u64, product_id: u64, quantity: i64) -> Movement {
        Movement {
            id,
            movement_type: MovementType::In,
            product_id,
            quantity,
            date: crate::utils::now_millis(),
            actor_id: Some("test_op".to_string()),
            note: None,
            reference_doc: None,
        }
    }

    #[test]
    fn test_reopen_preserves_data_and_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.redb");

        {
            let storage = InventoryStorage::open(&path).unwrap();
            let txn = storage.begin_write().unwrap();
            let id = storage.next_product_id(&txn).unwrap();
            storage.put_product(&txn, &test_product(id, "SKU-DISK", 7)).unwrap();
            storage.claim_sku(&txn, "SKU-DISK", id).unwrap();
            txn.commit().unwrap();
        }

        let storage = InventoryStorage::open(&path).unwrap();
        let loaded = storage.find_product_by_sku("SKU-DISK").unwrap().unwrap();
        assert_eq!(loaded.stock, 7);

        // Sequence continues instead of restarting
        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_product_id(&txn).unwrap(), 2);
        txn.commit().unwrap();
    }

    #[test]
    fn test_id_sequences() {
        let storage = InventoryStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        let id1 = storage.next_movement_id(&txn).unwrap();
        let id2 = storage.next_movement_id(&txn).unwrap();
        txn.commit().unwrap();

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);

        // Product and movement sequences are independent
        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_product_id(&txn).unwrap(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn test_product_roundtrip() {
        let storage = InventoryStorage::open_in_memory().unwrap();
        let product = test_product(1, "SKU-001", 10);

        let txn = storage.begin_write().unwrap();
        storage.put_product(&txn, &product).unwrap();
        storage.claim_sku(&txn, &product.sku, product.id).unwrap();
        txn.commit().unwrap();

        let loaded = storage.get_product(1).unwrap().unwrap();
        assert_eq!(loaded.sku, "SKU-001");
        assert_eq!(loaded.stock, 10);

        let by_sku = storage.find_product_by_sku("SKU-001").unwrap().unwrap();
        assert_eq!(by_sku.id, 1);
    }

    #[test]
    fn test_duplicate_sku_rejected() {
        let storage = InventoryStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.put_product(&txn, &test_product(1, "SKU-DUP", 0)).unwrap();
        storage.claim_sku(&txn, "SKU-DUP", 1).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        let err = storage.claim_sku(&txn, "SKU-DUP", 2).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateSku(_)));
    }

    #[test]
    fn test_movement_storage() {
        let storage = InventoryStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.put_movement(&txn, &test_movement(1, 7, 5)).unwrap();
        storage.put_movement(&txn, &test_movement(2, 7, 3)).unwrap();
        storage.put_movement(&txn, &test_movement(3, 8, 1)).unwrap();
        txn.commit().unwrap();

        let all = storage.get_all_movements().unwrap();
        assert_eq!(all.len(), 3);

        let for_product = storage.get_movements_for_product(7).unwrap();
        assert_eq!(for_product.len(), 2);
        assert!(for_product.iter().all(|m| m.product_id == 7));
    }

    #[test]
    fn test_remove_movement() {
        let storage = InventoryStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.put_movement(&txn, &test_movement(1, 7, 5)).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        let removed = storage.remove_movement(&txn, 1).unwrap();
        txn.commit().unwrap();
        assert_eq!(removed.quantity, 5);

        assert!(storage.get_movement(1).unwrap().is_none());

        // Removing again reports MovementNotFound
        let txn = storage.begin_write().unwrap();
        let err = storage.remove_movement(&txn, 1).unwrap_err();
        assert!(matches!(err, StorageError::MovementNotFound(1)));
    }

    #[test]
    fn test_remove_product_cleans_sku_index() {
        let storage = InventoryStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.put_product(&txn, &test_product(1, "SKU-GONE", 0)).unwrap();
        storage.claim_sku(&txn, "SKU-GONE", 1).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.remove_product(&txn, 1).unwrap();
        txn.commit().unwrap();

        assert!(storage.get_product(1).unwrap().is_none());
        assert!(storage.find_product_by_sku("SKU-GONE").unwrap().is_none());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let storage = InventoryStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.put_product(&txn, &test_product(1, "SKU-A", 4)).unwrap();
        storage.claim_sku(&txn, "SKU-A", 1).unwrap();
        storage.put_movement(&txn, &test_movement(1, 1, 4)).unwrap();
        txn.commit().unwrap();

        let snapshot = storage.export_snapshot().unwrap();
        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.movements.len(), 1);

        // Import into a fresh store
        let restored = InventoryStorage::open_in_memory().unwrap();
        restored.import_snapshot(&snapshot).unwrap();

        let product = restored.get_product(1).unwrap().unwrap();
        assert_eq!(product.stock, 4);
        assert_eq!(restored.get_all_movements().unwrap().len(), 1);

        // Counters must continue above the imported maxima
        let txn = restored.begin_write().unwrap();
        assert_eq!(restored.next_product_id(&txn).unwrap(), 2);
        assert_eq!(restored.next_movement_id(&txn).unwrap(), 2);
        txn.commit().unwrap();
    }

    #[test]
    fn test_import_replaces_wholesale() {
        let storage = InventoryStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.put_product(&txn, &test_product(9, "SKU-OLD", 1)).unwrap();
        storage.claim_sku(&txn, "SKU-OLD", 9).unwrap();
        txn.commit().unwrap();

        let snapshot = DataSnapshot {
            version: crate::inventory::types::SNAPSHOT_VERSION,
            exported_at: crate::utils::now_millis(),
            products: vec![test_product(1, "SKU-NEW", 3)],
            movements: vec![],
            customers: vec![],
        };
        storage.import_snapshot(&snapshot).unwrap();

        assert!(storage.get_product(9).unwrap().is_none());
        assert!(storage.find_product_by_sku("SKU-OLD").unwrap().is_none());
        assert_eq!(storage.get_all_products().unwrap().len(), 1);
    }
}
