//! sell_single / sell_batch: aggregation and all-or-nothing semantics

use super::*;

fn batch(items: Vec<(u64, i64)>) -> BatchSaleRequest {
    BatchSaleRequest {
        items: items
            .into_iter()
            .map(|(product_id, quantity)| SaleItem {
                product_id,
                quantity,
            })
            .collect(),
        actor_id: Some("cashier".to_string()),
        note: None,
    }
}

#[tokio::test]
async fn test_sell_single_is_an_out_movement() {
    let ledger = create_test_ledger();
    let product = seed_product(&ledger, "SKU-1", 10).await;

    let (movement, updated) = ledger
        .sell_single(SaleRequest {
            product_id: product.id,
            quantity: 3,
            actor_id: Some("cashier".to_string()),
            note: None,
        })
        .await
        .unwrap();

    assert_eq!(movement.movement_type, MovementType::Out);
    assert_eq!(updated.stock, 7);
    assert_ledger_invariant(&ledger, product.id);
}

#[tokio::test]
async fn test_sell_single_insufficient_stock() {
    let ledger = create_test_ledger();
    let product = seed_product(&ledger, "SKU-1", 2).await;

    let err = ledger
        .sell_single(SaleRequest {
            product_id: product.id,
            quantity: 3,
            actor_id: None,
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock { .. }));
}

#[tokio::test]
async fn test_batch_aggregates_lines_into_one_movement() {
    let ledger = create_test_ledger();
    let product = seed_product(&ledger, "SKU-1", 10).await;

    // Two lines of 4 for the same product: validated and persisted as 8
    let movements = ledger
        .sell_batch(batch(vec![(product.id, 4), (product.id, 4)]))
        .await
        .unwrap();

    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity, 8);
    assert_eq!(ledger.get_product(product.id).unwrap().stock, 2);
    assert_ledger_invariant(&ledger, product.id);
}

#[tokio::test]
async fn test_batch_aggregate_exceeding_stock_fails_whole() {
    let ledger = create_test_ledger();
    let product = seed_product(&ledger, "SKU-1", 10).await;

    // 6 + 6 = 12 > 10, even though each line alone would pass
    let err = ledger
        .sell_batch(batch(vec![(product.id, 6), (product.id, 6)]))
        .await
        .unwrap_err();

    match err {
        LedgerError::BatchValidation(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].product_id, product.id);
            assert_eq!(failures[0].available, 10);
            assert_eq!(failures[0].requested, 12);
        }
        other => panic!("expected BatchValidation, got {:?}", other),
    }

    // No movement written, stock untouched
    assert_eq!(ledger.get_product(product.id).unwrap().stock, 10);
    assert_eq!(ledger.list_movements(Some(product.id)).unwrap().len(), 1);
}

#[tokio::test]
async fn test_batch_multi_product_all_or_nothing() {
    let ledger = create_test_ledger();
    let rich = seed_product(&ledger, "RICH", 100).await;
    let poor = seed_product(&ledger, "POOR", 1).await;

    let err = ledger
        .sell_batch(batch(vec![(rich.id, 5), (poor.id, 3)]))
        .await
        .unwrap_err();

    match err {
        LedgerError::BatchValidation(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].product_id, poor.id);
        }
        other => panic!("expected BatchValidation, got {:?}", other),
    }

    // The rich product was not sold either
    assert_eq!(ledger.get_product(rich.id).unwrap().stock, 100);
    assert_eq!(ledger.get_product(poor.id).unwrap().stock, 1);
}

#[tokio::test]
async fn test_batch_multi_product_success() {
    let ledger = create_test_ledger();
    let a = seed_product(&ledger, "A", 10).await;
    let b = seed_product(&ledger, "B", 20).await;

    let movements = ledger
        .sell_batch(batch(vec![(b.id, 5), (a.id, 2), (b.id, 1)]))
        .await
        .unwrap();

    // One movement per distinct product, in ascending product id order
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].product_id, a.id);
    assert_eq!(movements[0].quantity, 2);
    assert_eq!(movements[1].product_id, b.id);
    assert_eq!(movements[1].quantity, 6);

    assert_eq!(ledger.get_product(a.id).unwrap().stock, 8);
    assert_eq!(ledger.get_product(b.id).unwrap().stock, 14);
    assert_ledger_invariant(&ledger, a.id);
    assert_ledger_invariant(&ledger, b.id);
}

#[tokio::test]
async fn test_batch_rejects_empty_and_bad_lines() {
    let ledger = create_test_ledger();
    let product = seed_product(&ledger, "SKU-1", 10).await;

    assert!(matches!(
        ledger.sell_batch(batch(vec![])).await.unwrap_err(),
        LedgerError::InvalidQuantity(_)
    ));
    assert!(matches!(
        ledger
            .sell_batch(batch(vec![(product.id, 0)]))
            .await
            .unwrap_err(),
        LedgerError::InvalidQuantity(0)
    ));
    assert!(matches!(
        ledger
            .sell_batch(batch(vec![(product.id, 1), (999, 1)]))
            .await
            .unwrap_err(),
        LedgerError::ProductNotFound(999)
    ));
}

#[tokio::test]
async fn test_batch_overflowing_aggregate_is_rejected() {
    let ledger = create_test_ledger();
    let product = seed_product(&ledger, "SKU-1", 10).await;

    // Each line passes the per-item check; the sum would wrap negative and
    // a wrapped aggregate must never reach the stock comparison
    let err = ledger
        .sell_batch(batch(vec![(product.id, i64::MAX), (product.id, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidQuantity(_)));

    // No movement written, stock untouched
    assert_eq!(ledger.get_product(product.id).unwrap().stock, 10);
    assert_eq!(ledger.list_movements(Some(product.id)).unwrap().len(), 1);
}

#[tokio::test]
async fn test_batch_collects_every_shortfall() {
    let ledger = create_test_ledger();
    let a = seed_product(&ledger, "A", 1).await;
    let b = seed_product(&ledger, "B", 2).await;

    let err = ledger
        .sell_batch(batch(vec![(a.id, 5), (b.id, 5)]))
        .await
        .unwrap_err();

    match err {
        LedgerError::BatchValidation(failures) => {
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected BatchValidation, got {:?}", other),
    }
}
