//! Sale request shaping
//!
//! A batch sale is aggregated per product before anything is validated:
//! two line items for the same product must be checked as one combined
//! quantity, otherwise each could individually pass while the combined total
//! exceeds stock. The `BTreeMap` keeps the aggregated set in ascending
//! product-id order, which doubles as the deterministic lock order for the
//! commit phase.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::ledger::{LedgerError, LedgerResult};

/// One line item of a sale request
#[derive(Debug, Clone, Deserialize)]
pub struct SaleItem {
    pub product_id: u64,
    pub quantity: i64,
}

/// Single-product sale request
#[derive(Debug, Clone, Deserialize)]
pub struct SaleRequest {
    pub product_id: u64,
    pub quantity: i64,
    pub actor_id: Option<String>,
    pub note: Option<String>,
}

/// Multi-item batch sale request
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSaleRequest {
    pub items: Vec<SaleItem>,
    pub actor_id: Option<String>,
    pub note: Option<String>,
}

/// Fold line items into one quantity per product
///
/// Rejects empty batches and non-positive quantities up front, before any
/// lock is taken.
pub fn aggregate_items(items: &[SaleItem]) -> LedgerResult<BTreeMap<u64, i64>> {
    if items.is_empty() {
        return Err(LedgerError::InvalidQuantity(0));
    }

    let mut aggregated: BTreeMap<u64, i64> = BTreeMap::new();
    for item in items {
        if item.quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(item.quantity));
        }
        let total = aggregated.entry(item.product_id).or_insert(0);
        // Each line is positive, but the combined total can still overflow
        *total = total
            .checked_add(item.quantity)
            .ok_or(LedgerError::InvalidQuantity(item.quantity))?;
    }
    Ok(aggregated)
}
