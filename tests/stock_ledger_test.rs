mod common;

use assert_matches::assert_matches;
use cellstock_api::{
    entities::stock_movement::MovementType,
    errors::ServiceError,
    services::stock::{StockBucket, StockListQuery},
};
use common::{admin, product_request, seed_store, setup, vendor};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn physical_recount_writes_the_delta_to_the_ledger() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();
    let product = services
        .products
        .create_product(&ctx, product_request("Funda iPhone 13"))
        .await
        .unwrap();

    services
        .stock
        .add_stock(&ctx, product.id, store, 4, Some(dec!(8)), "Compra inicial")
        .await
        .unwrap();

    // Recount finds 10 on the shelf.
    let level = services
        .stock
        .adjust_stock(&ctx, product.id, store, 10, "Inventario físico")
        .await
        .unwrap();
    assert_eq!(level.quantity, 10);

    let movements = services
        .stock
        .list_movements(&ctx, product.id, store)
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    // Newest first: the adjustment recorded +6, not the absolute 10.
    assert_eq!(movements[0].movement_type, MovementType::In);
    assert_eq!(movements[0].quantity, 6);
    assert_eq!(movements[0].reason, "Inventario físico");

    services
        .stock
        .reconcile(product.id, store)
        .await
        .expect("ledger sum equals the counter");
}

#[tokio::test]
async fn ledger_reconciles_after_a_mixed_series() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();
    let product = services
        .products
        .create_product(&ctx, product_request("Mica templada"))
        .await
        .unwrap();

    services
        .stock
        .add_stock(&ctx, product.id, store, 12, Some(dec!(3.50)), "Compra")
        .await
        .unwrap();
    services
        .stock
        .remove_stock(&ctx, product.id, store, 5, "Venta de accesorio")
        .await
        .unwrap();
    services
        .stock
        .adjust_stock(&ctx, product.id, store, 4, "Merma detectada")
        .await
        .unwrap();
    let level = services
        .stock
        .add_stock(&ctx, product.id, store, 3, None, "Resurtido")
        .await
        .unwrap();
    assert_eq!(level.quantity, 7);

    services.stock.reconcile(product.id, store).await.unwrap();

    let movements = services
        .stock
        .list_movements(&ctx, product.id, store)
        .await
        .unwrap();
    assert_eq!(movements.len(), 4);
    let signed: i64 = movements
        .iter()
        .map(|m| m.movement_type.signed(m.quantity))
        .sum();
    assert_eq!(signed, 7);
}

#[tokio::test]
async fn rejected_writes_leave_counter_and_ledger_untouched() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();
    let product = services
        .products
        .create_product(&ctx, product_request("Cargador USB-C"))
        .await
        .unwrap();

    services
        .stock
        .add_stock(&ctx, product.id, store, 2, None, "Compra")
        .await
        .unwrap();

    // Negative absolute quantity.
    let err = services
        .stock
        .adjust_stock(&ctx, product.id, store, -1, "typo")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));

    // More out than on hand.
    let err = services
        .stock
        .remove_stock(&ctx, product.id, store, 5, "Venta")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // Blank reason.
    let err = services
        .stock
        .adjust_stock(&ctx, product.id, store, 9, "   ")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));

    let level = services.stock.get_stock(&ctx, product.id, store).await.unwrap();
    assert_eq!(level.quantity, 2);
    let movements = services
        .stock
        .list_movements(&ctx, product.id, store)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    services.stock.reconcile(product.id, store).await.unwrap();
}

#[tokio::test]
async fn zero_delta_adjustment_writes_no_movement() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();
    let product = services
        .products
        .create_product(&ctx, product_request("Audífonos"))
        .await
        .unwrap();

    services
        .stock
        .add_stock(&ctx, product.id, store, 5, None, "Compra")
        .await
        .unwrap();

    // Recount confirms the counter; nothing to record.
    let level = services
        .stock
        .adjust_stock(&ctx, product.id, store, 5, "Inventario físico")
        .await
        .unwrap();
    assert_eq!(level.quantity, 5);

    let movements = services
        .stock
        .list_movements(&ctx, product.id, store)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
}

#[tokio::test]
async fn intake_records_unit_cost_and_creates_the_counter_row() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();
    let product = services
        .products
        .create_product(&ctx, product_request("Batería S23"))
        .await
        .unwrap();

    // No counter row exists yet; reads say zero.
    let before = services.stock.get_stock(&ctx, product.id, store).await.unwrap();
    assert_eq!(before.quantity, 0);

    let level = services
        .stock
        .add_stock(&ctx, product.id, store, 8, Some(dec!(12.75)), "Compra a proveedor")
        .await
        .unwrap();
    assert_eq!(level.quantity, 8);

    let movements = services
        .stock
        .list_movements(&ctx, product.id, store)
        .await
        .unwrap();
    assert_eq!(movements[0].unit_price, Some(dec!(12.75)));

    // Intake into an unknown product is NotFound.
    let err = services
        .stock
        .add_stock(&ctx, Uuid::new_v4(), store, 1, None, "Compra")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn stock_listing_buckets_by_minimum_threshold() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();

    // min_stock is 3 in the fixture.
    let low = services
        .products
        .create_product(&ctx, product_request("Cable Lightning"))
        .await
        .unwrap();
    let normal = services
        .products
        .create_product(&ctx, product_request("Cable USB-C"))
        .await
        .unwrap();

    services
        .stock
        .add_stock(&ctx, low.id, store, 2, None, "Compra")
        .await
        .unwrap();
    services
        .stock
        .add_stock(&ctx, normal.id, store, 9, None, "Compra")
        .await
        .unwrap();

    let rows = services
        .stock
        .list_stock(
            &ctx,
            StockListQuery {
                bucket: Some(StockBucket::Low),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_id, low.id);
    assert_eq!(rows[0].bucket, StockBucket::Low);

    let all = services
        .stock
        .list_stock(&ctx, StockListQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

/// Two clerks receive stock for the same (product, store) pair at once.
/// The counter mutations serialize on the level row, so both deltas land
/// and the ledger still sums to the counter.
#[tokio::test]
async fn concurrent_intakes_keep_counter_and_ledger_consistent() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();
    let product = services
        .products
        .create_product(&ctx, product_request("Soporte de auto"))
        .await
        .unwrap();

    services
        .stock
        .add_stock(&ctx, product.id, store, 4, None, "Compra inicial")
        .await
        .unwrap();

    let first = {
        let services = services.clone();
        let id = product.id;
        tokio::spawn(async move {
            services
                .stock
                .add_stock(&admin(), id, store, 5, None, "Resurtido A")
                .await
        })
    };
    let second = {
        let services = services.clone();
        let id = product.id;
        tokio::spawn(async move {
            services
                .stock
                .add_stock(&admin(), id, store, 7, None, "Resurtido B")
                .await
        })
    };
    first.await.expect("task panicked").expect("first intake");
    second.await.expect("task panicked").expect("second intake");

    let level = services.stock.get_stock(&ctx, product.id, store).await.unwrap();
    assert_eq!(level.quantity, 16);

    let movements = services
        .stock
        .list_movements(&ctx, product.id, store)
        .await
        .unwrap();
    assert_eq!(movements.len(), 3);
    services.stock.reconcile(product.id, store).await.unwrap();
}

#[tokio::test]
async fn stock_writes_are_store_scoped() {
    let (_db, services) = setup().await;
    let home = seed_store(&services, "Centro").await;
    let foreign = seed_store(&services, "Norte").await;
    let ctx = admin();
    let product = services
        .products
        .create_product(&ctx, product_request("Popsocket"))
        .await
        .unwrap();

    let clerk = vendor(home);
    let err = services
        .stock
        .adjust_stock(&clerk, product.id, foreign, 5, "Inventario físico")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    let err = services
        .stock
        .list_movements(&clerk, product.id, foreign)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    // The same operations at the home store succeed.
    services
        .stock
        .adjust_stock(&clerk, product.id, home, 5, "Inventario físico")
        .await
        .unwrap();
    let rows = services
        .stock
        .list_stock(&clerk, StockListQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].store_id, home);
}

#[tokio::test]
async fn inactive_products_cannot_receive_stock() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();
    let product = services
        .products
        .create_product(&ctx, product_request("Funda descontinuada"))
        .await
        .unwrap();

    // Movement history forces deactivation instead of deletion.
    services
        .stock
        .add_stock(&ctx, product.id, store, 1, None, "Compra")
        .await
        .unwrap();
    services
        .stock
        .remove_stock(&ctx, product.id, store, 1, "Venta")
        .await
        .unwrap();
    services.products.delete_product(&ctx, product.id).await.unwrap();

    let err = services
        .stock
        .add_stock(&ctx, product.id, store, 5, None, "Compra")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}
