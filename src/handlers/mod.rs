pub mod common;
pub mod devices;
pub mod health;
pub mod products;
pub mod sales;
pub mod stock;
pub mod stores;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Assembles the versioned API router.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/devices", devices::routes())
        .nest("/sales", sales::routes())
        .nest("/products", products::routes())
        .nest("/stock", stock::routes())
        .nest("/stores", stores::routes())
}
