use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Device entity: one row per physical phone unit.
///
/// `imei1` is globally unique; `imei2` (dual-SIM) must collide with no other
/// row's `imei1` or `imei2`. The cross-column part of that check lives in
/// the device service; the per-column unique indexes are the DB backstop.
/// `barcode` deliberately carries no uniqueness constraint: several units of
/// the same model may share one catalog barcode.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub model: String,
    pub brand: String,
    /// Storage capacity as displayed (e.g. "128GB").
    pub capacity: String,
    #[sea_orm(nullable)]
    pub color: Option<String>,
    pub condition: DeviceCondition,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub purchase_price: Option<Decimal>,
    #[sea_orm(unique)]
    pub imei1: String,
    #[sea_orm(unique, nullable)]
    pub imei2: Option<String>,
    #[sea_orm(nullable)]
    pub barcode: Option<String>,
    pub status: DeviceStatus,
    pub store_id: Uuid,
    pub registered_by: Uuid,
    #[sea_orm(nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, on the transition to `sold`.
    #[sea_orm(nullable)]
    pub sold_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Device lifecycle state. `available -> sold` is the sale path and is
/// terminal; `reserved` and `in_repair` are reachable only via privileged
/// edit, never via sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "sold")]
    Sold,
    #[sea_orm(string_value = "reserved")]
    Reserved,
    #[sea_orm(string_value = "in_repair")]
    InRepair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DeviceCondition {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "used")]
    Used,
    #[sea_orm(string_value = "refurbished")]
    Refurbished,
}
