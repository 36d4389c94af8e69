mod common;

use common::{admin, device_request, imei, product_request, seed_store, setup};
use rust_decimal_macros::dec;

/// Applies the embedded migrations on SQLite and round-trips a row through
/// every table carrying a money column. Guards the schema against DDL the
/// SQLite backend cannot render (decimal precision is capped at 16 there).
#[tokio::test]
async fn schema_applies_and_money_columns_round_trip() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();

    let mut req = device_request(store, &imei(1));
    req.price = dec!(12345.67);
    req.purchase_price = Some(dec!(9999.99));
    let device = services.devices.register_device(&ctx, req).await.unwrap();
    assert_eq!(device.price, dec!(12345.67));
    assert_eq!(device.purchase_price, Some(dec!(9999.99)));

    let mut prod = product_request("Funda de prueba");
    prod.price = dec!(249.5);
    let product = services.products.create_product(&ctx, prod).await.unwrap();
    assert_eq!(product.price, dec!(249.5));

    let level = services
        .stock
        .add_stock(&ctx, product.id, store, 3, Some(dec!(87.25)), "Compra")
        .await
        .unwrap();
    assert_eq!(level.quantity, 3);

    let movements = services
        .stock
        .list_movements(&ctx, product.id, store)
        .await
        .unwrap();
    assert_eq!(movements[0].unit_price, Some(dec!(87.25)));
}
