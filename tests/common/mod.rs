#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cellstock_api::{
    auth::CallerContext,
    db::{self, DbPool},
    entities::device::DeviceCondition,
    events::EventSender,
    services::{
        devices::RegisterDeviceRequest, products::CreateProductRequest,
        stores::CreateStoreRequest, AppServices,
    },
};
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database};
use uuid::Uuid;

/// Connects to an in-memory SQLite database with the embedded migrations
/// applied. A single pooled connection keeps the in-memory database alive
/// for the whole test.
pub async fn setup() -> (Arc<DbPool>, AppServices) {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let pool = Database::connect(opt).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");

    let db = Arc::new(pool);
    let services = AppServices::new(db.clone(), EventSender::spawn_default());
    (db, services)
}

pub fn admin() -> CallerContext {
    CallerContext::admin(Uuid::new_v4())
}

pub fn vendor(store_id: Uuid) -> CallerContext {
    CallerContext::vendor(Uuid::new_v4(), store_id)
}

pub async fn seed_store(services: &AppServices, name: &str) -> Uuid {
    services
        .stores
        .create_store(
            &admin(),
            CreateStoreRequest {
                name: name.to_string(),
                address: None,
                phone: None,
            },
        )
        .await
        .expect("seed store")
        .id
}

pub fn device_request(store_id: Uuid, imei1: &str) -> RegisterDeviceRequest {
    RegisterDeviceRequest {
        model: "Galaxy S23".to_string(),
        brand: "Samsung".to_string(),
        capacity: "128GB".to_string(),
        color: Some("black".to_string()),
        condition: DeviceCondition::New,
        price: dec!(500),
        purchase_price: Some(dec!(350)),
        imei1: imei1.to_string(),
        imei2: None,
        barcode: None,
        store_id: Some(store_id),
        notes: None,
    }
}

pub fn product_request(name: &str) -> CreateProductRequest {
    CreateProductRequest {
        code: None,
        name: name.to_string(),
        description: None,
        category_id: None,
        product_type: cellstock_api::entities::product::ProductType::Accessory,
        brand: None,
        compatible_model: None,
        price: dec!(19.99),
        purchase_price: Some(dec!(8)),
        min_stock: 3,
    }
}

/// 15-digit IMEI with a deterministic suffix, handy for uniqueness tests.
pub fn imei(suffix: u32) -> String {
    format!("{:015}", suffix)
}
