pub mod category;
pub mod device;
pub mod product;
pub mod sale;
pub mod stock_level;
pub mod stock_movement;
pub mod store;
