pub mod devices;
pub mod products;
pub mod sales;
pub mod stock;
pub mod stores;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub devices: Arc<devices::DeviceService>,
    pub sales: Arc<sales::SaleService>,
    pub stock: Arc<stock::StockService>,
    pub products: Arc<products::ProductService>,
    pub stores: Arc<stores::StoreService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            devices: Arc::new(devices::DeviceService::new(
                db.clone(),
                event_sender.clone(),
            )),
            sales: Arc::new(sales::SaleService::new(db.clone(), event_sender.clone())),
            stock: Arc::new(stock::StockService::new(db.clone(), event_sender.clone())),
            products: Arc::new(products::ProductService::new(
                db.clone(),
                event_sender.clone(),
            )),
            stores: Arc::new(stores::StoreService::new(db, event_sender)),
        }
    }
}
