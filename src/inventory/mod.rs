//! Inventory core - product store, movement ledger, sale orchestration
//!
//! # Structure
//!
//! - [`types`] - Product / Movement / Customer models
//! - [`storage`] - redb-backed persistence
//! - [`ledger`] - the stock consistency engine
//! - [`sales`] - sale request types and batch aggregation

pub mod ledger;
pub mod sales;
pub mod storage;
pub mod types;

pub use ledger::{BatchFailure, LedgerError, LedgerResult, MovementLedger, stock_from_movements};
pub use sales::{BatchSaleRequest, SaleItem, SaleRequest};
pub use storage::{InventoryStorage, StorageError, StorageResult};
pub use types::{
    Customer, CustomerCreate, DataSnapshot, Movement, MovementCreate, MovementType, Product,
    ProductCreate,
};
