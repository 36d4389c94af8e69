mod common;

use assert_matches::assert_matches;
use cellstock_api::{
    entities::{
        device::{DeviceStatus, Entity as DeviceEntity},
        sale::{Entity as SaleEntity, PaymentMethod},
    },
    errors::ServiceError,
    services::sales::{RegisterSaleRequest, SaleListQuery},
};
use common::{admin, device_request, imei, seed_store, setup, vendor};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

fn sale_request(device_id: Uuid) -> RegisterSaleRequest {
    RegisterSaleRequest {
        device_id,
        customer_name: "María López".to_string(),
        customer_phone: Some("5551234567".to_string()),
        customer_email: None,
        price: dec!(480),
        payment_method: PaymentMethod::Card,
        notes: None,
    }
}

#[tokio::test]
async fn selling_a_device_transitions_it_exactly_once() {
    let (db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();

    let device = services
        .devices
        .register_device(&ctx, device_request(store, &imei(1)))
        .await
        .unwrap();

    let sale = services
        .sales
        .register_sale(&ctx, sale_request(device.id))
        .await
        .expect("first sale");
    assert_eq!(sale.device_id, device.id);
    assert_eq!(sale.store_id, store);
    assert_eq!(sale.price, dec!(480));

    let after = DeviceEntity::find_by_id(device.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status, DeviceStatus::Sold);
    assert!(after.sold_at.is_some());

    // Second attempt on the now-sold device is refused.
    let err = services
        .sales
        .register_sale(&ctx, sale_request(device.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    let count = SaleEntity::find()
        .filter(cellstock_api::entities::sale::Column::DeviceId.eq(device.id))
        .count(&*db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn failed_validation_rolls_back_the_whole_sale() {
    let (db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();

    let device = services
        .devices
        .register_device(&ctx, device_request(store, &imei(2)))
        .await
        .unwrap();

    let mut bad = sale_request(device.id);
    bad.customer_name = String::new();
    let err = services.sales.register_sale(&ctx, bad).await.unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));

    // Whitespace-only names are empty after trimming and must not commit.
    let mut blank = sale_request(device.id);
    blank.customer_name = "   ".to_string();
    let err = services.sales.register_sale(&ctx, blank).await.unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));

    let mut free = sale_request(device.id);
    free.price = dec!(0);
    let err = services.sales.register_sale(&ctx, free).await.unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));

    // Device remains sellable and no sale row leaked out.
    let after = DeviceEntity::find_by_id(device.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status, DeviceStatus::Available);
    assert!(after.sold_at.is_none());
    assert_eq!(SaleEntity::find().count(&*db).await.unwrap(), 0);

    services
        .sales
        .register_sale(&ctx, sale_request(device.id))
        .await
        .expect("device is still sellable after the failed attempts");
}

#[tokio::test]
async fn unknown_and_reserved_devices_report_the_same_conflict() {
    let (_db, services) = setup().await;
    let store = seed_store(&services, "Centro").await;
    let ctx = admin();

    // Nonexistent device: same message as an already-sold one, so the
    // endpoint cannot be used to probe IMEIs.
    let err = services
        .sales
        .register_sale(&ctx, sale_request(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(ref msg) if msg == "device is not available");

    let device = services
        .devices
        .register_device(&ctx, device_request(store, &imei(3)))
        .await
        .unwrap();
    let reserved = cellstock_api::services::devices::UpdateDeviceRequest {
        model: device.model.clone(),
        brand: device.brand.clone(),
        capacity: device.capacity.clone(),
        color: device.color.clone(),
        condition: device.condition,
        price: device.price,
        purchase_price: device.purchase_price,
        imei1: device.imei1.clone(),
        imei2: None,
        barcode: None,
        status: DeviceStatus::Reserved,
        notes: None,
    };
    services
        .devices
        .update_device(&ctx, device.id, reserved)
        .await
        .unwrap();

    let err = services
        .sales
        .register_sale(&ctx, sale_request(device.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(ref msg) if msg == "device is not available");
}

#[tokio::test]
async fn vendors_sell_only_in_their_own_store() {
    let (db, services) = setup().await;
    let home = seed_store(&services, "Centro").await;
    let foreign = seed_store(&services, "Norte").await;
    let ctx = admin();

    let home_device = services
        .devices
        .register_device(&ctx, device_request(home, &imei(4)))
        .await
        .unwrap();
    let foreign_device = services
        .devices
        .register_device(&ctx, device_request(foreign, &imei(5)))
        .await
        .unwrap();

    let seller = vendor(home);
    let err = services
        .sales
        .register_sale(&seller, sale_request(foreign_device.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    // The refused attempt must not touch the device.
    let untouched = DeviceEntity::find_by_id(foreign_device.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.status, DeviceStatus::Available);

    let sale = services
        .sales
        .register_sale(&seller, sale_request(home_device.id))
        .await
        .expect("home-store sale");
    assert_eq!(sale.store_id, home);
    assert_eq!(sale.sold_by, seller.user_id);
}

#[tokio::test]
async fn sale_store_follows_the_device_not_the_caller() {
    let (_db, services) = setup().await;
    let store_a = seed_store(&services, "Centro").await;
    let store_b = seed_store(&services, "Norte").await;
    let ctx = admin();

    let device = services
        .devices
        .register_device(&ctx, device_request(store_b, &imei(6)))
        .await
        .unwrap();

    // Admin has no home store; the sale is attributed to the device's store.
    let sale = services
        .sales
        .register_sale(&ctx, sale_request(device.id))
        .await
        .unwrap();
    assert_eq!(sale.store_id, store_b);
    assert_ne!(sale.store_id, store_a);
}

#[tokio::test]
async fn sale_reads_are_store_scoped() {
    let (_db, services) = setup().await;
    let home = seed_store(&services, "Centro").await;
    let other = seed_store(&services, "Norte").await;
    let ctx = admin();

    let device = services
        .devices
        .register_device(&ctx, device_request(home, &imei(7)))
        .await
        .unwrap();
    let sale = services
        .sales
        .register_sale(&ctx, sale_request(device.id))
        .await
        .unwrap();

    services
        .sales
        .get_sale(&vendor(home), sale.id)
        .await
        .expect("own-store read");

    // A vendor elsewhere sees NotFound, not Forbidden, to avoid leaking
    // that the sale exists.
    let err = services
        .sales
        .get_sale(&vendor(other), sale.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let listed = services
        .sales
        .list_sales(&vendor(other), SaleListQuery::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 0);

    let listed = services
        .sales
        .list_sales(&ctx, SaleListQuery::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
}
