//! Inventory data models
//!
//! Products, stock movements and customers. `stock` is the only product field
//! the ledger mutates; everything else is catalog data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type ProductId = u64;
pub type MovementId = u64;
pub type CustomerId = u64;

/// Movement type - closed variant, invalid strings are rejected at the
/// serde boundary instead of being silently mis-accounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Inbound stock (purchase, return)
    In,
    /// Outbound stock (sale, loss)
    Out,
    /// Inbound correction (count adjustment); always added to stock
    Adjustment,
}

impl MovementType {
    /// Signed effect of one unit of this movement on stock
    pub fn sign(self) -> i64 {
        match self {
            MovementType::In | MovementType::Adjustment => 1,
            MovementType::Out => -1,
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementType::In => write!(f, "IN"),
            MovementType::Out => write!(f, "OUT"),
            MovementType::Adjustment => write!(f, "ADJUSTMENT"),
        }
    }
}

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Unique SKU
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    pub cost: Decimal,
    /// Current stock quantity, invariant: >= 0
    pub stock: i64,
    /// Low-stock reporting threshold (not enforced by the ledger)
    #[serde(default)]
    pub min_stock: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Product creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    /// Opening stock, recorded as an initial IN movement when > 0
    pub initial_stock: Option<i64>,
    pub min_stock: Option<i64>,
}

/// Stock movement - one recorded stock-affecting event
///
/// Invariant: for every product,
/// `stock == Σ IN.quantity + Σ ADJUSTMENT.quantity − Σ OUT.quantity`
/// over all non-deleted movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Monotonic id, assigned at commit
    pub id: MovementId,
    pub movement_type: MovementType,
    /// Weak reference to the product
    pub product_id: ProductId,
    /// Magnitude, always > 0; sign derives from `movement_type`
    pub quantity: i64,
    /// Commit timestamp (Unix millis)
    pub date: i64,
    /// Operator who triggered it; None for system actions
    pub actor_id: Option<String>,
    pub note: Option<String>,
    pub reference_doc: Option<String>,
}

/// Movement creation payload (direct stock adjustment call)
#[derive(Debug, Clone, Deserialize)]
pub struct MovementCreate {
    pub movement_type: MovementType,
    pub product_id: ProductId,
    pub quantity: i64,
    pub actor_id: Option<String>,
    pub note: Option<String>,
    pub reference_doc: Option<String>,
}

/// Customer model (snapshot payload + thin CRUD)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: i64,
}

/// Customer creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerCreate {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Point-in-time copy of the full data set, for backup/restore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSnapshot {
    pub version: u32,
    pub exported_at: i64,
    pub products: Vec<Product>,
    pub movements: Vec<Movement>,
    pub customers: Vec<Customer>,
}

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;
