//! Snapshot export / import: point-in-time copy and wholesale restore

use super::*;
use crate::inventory::types::{DataSnapshot, Movement, SNAPSHOT_VERSION};
use crate::utils::now_millis;

#[tokio::test]
async fn test_export_import_roundtrip() {
    let ledger = create_test_ledger();
    let product = seed_product(&ledger, "SKU-1", 10).await;
    ledger
        .apply_movement(movement(MovementType::Out, product.id, 4))
        .await
        .unwrap();

    let snapshot = ledger.export_snapshot(None).await.unwrap();
    assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    assert_eq!(snapshot.products.len(), 1);
    assert_eq!(snapshot.movements.len(), 2); // initial IN + OUT

    // Mutate past the export point
    ledger
        .apply_movement(movement(MovementType::Out, product.id, 6))
        .await
        .unwrap();
    assert_eq!(ledger.get_product(product.id).unwrap().stock, 0);

    // Restore rolls everything back to the export point
    ledger.import_snapshot(snapshot, None).await.unwrap();
    assert_eq!(ledger.get_product(product.id).unwrap().stock, 6);
    assert_eq!(ledger.list_movements(None).unwrap().len(), 2);
    assert_ledger_invariant(&ledger, product.id);
}

#[tokio::test]
async fn test_import_into_fresh_ledger() {
    let source = create_test_ledger();
    let product = seed_product(&source, "SKU-1", 10).await;
    source
        .apply_movement(movement(MovementType::Out, product.id, 3))
        .await
        .unwrap();
    let snapshot = source.export_snapshot(None).await.unwrap();

    let target = create_test_ledger();
    seed_product(&target, "DOOMED", 99).await;
    target.import_snapshot(snapshot, None).await.unwrap();

    // Wholesale replacement: pre-existing data is gone
    let products = target.list_products().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].sku, "SKU-1");
    assert_eq!(products[0].stock, 7);
}

#[tokio::test]
async fn test_sequences_continue_past_imported_ids() {
    let ledger = create_test_ledger();
    let product = seed_product(&ledger, "SKU-1", 10).await;
    ledger
        .apply_movement(movement(MovementType::Out, product.id, 1))
        .await
        .unwrap();

    let snapshot = ledger.export_snapshot(None).await.unwrap();
    let max_movement_id = snapshot.movements.iter().map(|m| m.id).max().unwrap();

    let target = create_test_ledger();
    target.import_snapshot(snapshot, None).await.unwrap();

    let (next, _) = target
        .apply_movement(movement(MovementType::Out, product.id, 1))
        .await
        .unwrap();
    assert!(next.id > max_movement_id);
}

#[tokio::test]
async fn test_import_rejects_unknown_version() {
    let ledger = create_test_ledger();
    let snapshot = DataSnapshot {
        version: SNAPSHOT_VERSION + 1,
        exported_at: now_millis(),
        products: vec![],
        movements: vec![],
        customers: vec![],
    };
    assert!(matches!(
        ledger.import_snapshot(snapshot, None).await.unwrap_err(),
        LedgerError::InvalidSnapshot(_)
    ));
}

#[tokio::test]
async fn test_import_rejects_inconsistent_stock() {
    let source = create_test_ledger();
    let product = seed_product(&source, "SKU-1", 10).await;
    let mut snapshot = source.export_snapshot(None).await.unwrap();

    // Tamper: stock no longer matches the movement history
    snapshot.products[0].stock = 99;

    let err = source.import_snapshot(snapshot, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidSnapshot(_)));

    // Live data untouched
    assert_eq!(source.get_product(product.id).unwrap().stock, 10);
}

#[tokio::test]
async fn test_import_rejects_bad_movements() {
    let source = create_test_ledger();
    seed_product(&source, "SKU-1", 10).await;
    let good = source.export_snapshot(None).await.unwrap();

    // Non-positive quantity
    let mut tampered = source.export_snapshot(None).await.unwrap();
    tampered.movements[0].quantity = 0;
    tampered.products[0].stock = 0;
    assert!(matches!(
        source.import_snapshot(tampered, None).await.unwrap_err(),
        LedgerError::InvalidSnapshot(_)
    ));

    // Movement referencing a product that is not in the snapshot
    let mut orphaned = good.clone();
    orphaned.movements.push(Movement {
        id: 999,
        movement_type: MovementType::In,
        product_id: 12345,
        quantity: 1,
        date: now_millis(),
        actor_id: None,
        note: None,
        reference_doc: None,
    });
    assert!(matches!(
        source.import_snapshot(orphaned, None).await.unwrap_err(),
        LedgerError::InvalidSnapshot(_)
    ));
}
