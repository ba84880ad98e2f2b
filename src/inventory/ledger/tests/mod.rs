use super::*;
use crate::inventory::sales::{BatchSaleRequest, SaleItem, SaleRequest};
use crate::inventory::storage::InventoryStorage;
use crate::inventory::types::{MovementCreate, MovementType, Product, ProductCreate};
use rust_decimal::Decimal;

mod test_batch;
mod test_snapshot;

fn create_test_ledger() -> MovementLedger {
    let storage = InventoryStorage::open_in_memory().unwrap();
    MovementLedger::new(storage)
}

/// Create a product with the given opening stock
async fn seed_product(ledger: &MovementLedger, sku: &str, stock: i64) -> Product {
    ledger
        .create_product(
            ProductCreate {
                sku: sku.to_string(),
                name: format!("Product {}", sku),
                category: Some("test".to_string()),
                price: Decimal::new(990, 2),
                cost: Some(Decimal::new(450, 2)),
                initial_stock: Some(stock),
                min_stock: Some(0),
            },
            None,
        )
        .await
        .unwrap()
}

fn movement(movement_type: MovementType, product_id: u64, quantity: i64) -> MovementCreate {
    MovementCreate {
        movement_type,
        product_id,
        quantity,
        actor_id: Some("tester".to_string()),
        note: None,
        reference_doc: None,
    }
}

/// Assert the ledger invariant for one product:
/// stored stock equals the signed sum of its movement history
fn assert_ledger_invariant(ledger: &MovementLedger, product_id: u64) {
    let product = ledger.get_product(product_id).unwrap();
    let movements = ledger.list_movements(Some(product_id)).unwrap();
    assert_eq!(
        product.stock,
        stock_from_movements(&movements),
        "stock of product {} disagrees with its movement history",
        product_id
    );
}
