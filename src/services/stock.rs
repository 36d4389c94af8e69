use crate::{
    auth::CallerContext,
    db::DbPool,
    entities::{
        product::{self, Entity as ProductEntity},
        stock_level::{self, Entity as StockLevelEntity},
        stock_movement::{self, Entity as StockMovementEntity, MovementType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Stock-level bucket used by the catalog's equality filter, computed from
/// the counter against the product's minimum-stock threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBucket {
    OutOfStock,
    Low,
    Normal,
}

impl StockBucket {
    pub fn classify(quantity: i32, min_stock: i32) -> Self {
        if quantity <= 0 {
            StockBucket::OutOfStock
        } else if quantity <= min_stock {
            StockBucket::Low
        } else {
            StockBucket::Normal
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockListQuery {
    pub store_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub bucket: Option<StockBucket>,
}

#[derive(Debug, Serialize)]
pub struct StockRow {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub reserved: i32,
    pub min_stock: i32,
    pub bucket: StockBucket,
    pub shelf_location: Option<String>,
}

/// Accessory Stock Ledger.
///
/// Every counter change pairs with exactly one append-only movement row in
/// the same transaction; the signed sum of a pair's movements always equals
/// its counter. `reconcile` verifies that invariant.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl StockService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Sets the counter to an absolute quantity (physical recount). The
    /// movement records the delta; a zero delta writes nothing.
    #[instrument(skip(self, ctx), fields(actor = %ctx.user_id, product_id = %product_id, store_id = %store_id))]
    pub async fn adjust_stock(
        &self,
        ctx: &CallerContext,
        product_id: Uuid,
        store_id: Uuid,
        new_quantity: i32,
        reason: &str,
    ) -> Result<stock_level::Model, ServiceError> {
        if new_quantity < 0 {
            return Err(ServiceError::Validation(
                "stock quantity cannot be negative".to_string(),
            ));
        }
        let reason = non_empty_reason(reason)?;

        let db = &*self.db;
        let txn = db.begin().await?;

        ctx.authorize_store(store_id)?;
        require_product(&txn, product_id).await?;

        let existing = load_level_for_update(&txn, product_id, store_id).await?;
        let current = existing.as_ref().map(|s| s.quantity).unwrap_or(0);
        let delta = new_quantity - current;

        if delta == 0 {
            txn.commit().await?;
            return Ok(existing.unwrap_or_else(|| empty_level(product_id, store_id)));
        }

        let level = upsert_level(&txn, existing, product_id, store_id, new_quantity).await?;
        append_movement(
            &txn,
            product_id,
            store_id,
            if delta > 0 {
                MovementType::In
            } else {
                MovementType::Out
            },
            delta.abs(),
            None,
            &reason,
            ctx.user_id,
        )
        .await?;

        txn.commit().await?;

        info!(old = current, new = new_quantity, "stock adjusted");
        self.event_sender
            .emit(Event::StockAdjusted {
                product_id,
                store_id,
                old_quantity: current,
                new_quantity,
                reason,
                actor: ctx.user_id,
            })
            .await;

        Ok(level)
    }

    /// Intake path: increments the counter and records an `in` movement
    /// carrying the unit cost for later margin reporting.
    #[instrument(skip(self, ctx), fields(actor = %ctx.user_id, product_id = %product_id, store_id = %store_id))]
    pub async fn add_stock(
        &self,
        ctx: &CallerContext,
        product_id: Uuid,
        store_id: Uuid,
        quantity: i32,
        unit_price: Option<Decimal>,
        reason: &str,
    ) -> Result<stock_level::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::Validation(
                "intake quantity must be greater than zero".to_string(),
            ));
        }
        let reason = non_empty_reason(reason)?;

        let db = &*self.db;
        let txn = db.begin().await?;

        ctx.authorize_store(store_id)?;
        let product = require_product(&txn, product_id).await?;
        if !product.is_active {
            return Err(ServiceError::Conflict(
                "product is inactive and cannot receive stock".to_string(),
            ));
        }

        let existing = load_level_for_update(&txn, product_id, store_id).await?;
        let current = existing.as_ref().map(|s| s.quantity).unwrap_or(0);
        let level = upsert_level(&txn, existing, product_id, store_id, current + quantity).await?;
        append_movement(
            &txn,
            product_id,
            store_id,
            MovementType::In,
            quantity,
            unit_price,
            &reason,
            ctx.user_id,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .emit(Event::StockReceived {
                product_id,
                store_id,
                quantity,
                actor: ctx.user_id,
            })
            .await;

        Ok(level)
    }

    /// Outbound path (accessory sale, breakage, transfer out). Fails with
    /// Conflict when the counter would go negative; counter and ledger stay
    /// untouched in that case.
    #[instrument(skip(self, ctx), fields(actor = %ctx.user_id, product_id = %product_id, store_id = %store_id))]
    pub async fn remove_stock(
        &self,
        ctx: &CallerContext,
        product_id: Uuid,
        store_id: Uuid,
        quantity: i32,
        reason: &str,
    ) -> Result<stock_level::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::Validation(
                "outbound quantity must be greater than zero".to_string(),
            ));
        }
        let reason = non_empty_reason(reason)?;

        let db = &*self.db;
        let txn = db.begin().await?;

        ctx.authorize_store(store_id)?;
        require_product(&txn, product_id).await?;

        let existing = load_level_for_update(&txn, product_id, store_id).await?;
        let current = existing.as_ref().map(|s| s.quantity).unwrap_or(0);
        if current < quantity {
            return Err(ServiceError::Conflict(format!(
                "insufficient stock: {} available, {} requested",
                current, quantity
            )));
        }

        let level = upsert_level(&txn, existing, product_id, store_id, current - quantity).await?;
        append_movement(
            &txn,
            product_id,
            store_id,
            MovementType::Out,
            quantity,
            None,
            &reason,
            ctx.user_id,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .emit(Event::StockRemoved {
                product_id,
                store_id,
                quantity,
                reason,
                actor: ctx.user_id,
            })
            .await;

        Ok(level)
    }

    /// Store-scoped counter read; absent rows read as zero stock.
    #[instrument(skip(self, ctx))]
    pub async fn get_stock(
        &self,
        ctx: &CallerContext,
        product_id: Uuid,
        store_id: Uuid,
    ) -> Result<stock_level::Model, ServiceError> {
        ctx.authorize_store(store_id)?;
        let level = load_level(&*self.db, product_id, store_id).await?;
        Ok(level.unwrap_or_else(|| empty_level(product_id, store_id)))
    }

    /// Joined stock listing with the computed level bucket, scoped like
    /// every other read.
    #[instrument(skip(self, ctx, query))]
    pub async fn list_stock(
        &self,
        ctx: &CallerContext,
        query: StockListQuery,
    ) -> Result<Vec<StockRow>, ServiceError> {
        let scope = ctx.scope_store(query.store_id)?;

        let mut select = StockLevelEntity::find().find_also_related(ProductEntity);
        if let Some(store_id) = scope {
            select = select.filter(stock_level::Column::StoreId.eq(store_id));
        }
        if let Some(product_id) = query.product_id {
            select = select.filter(stock_level::Column::ProductId.eq(product_id));
        }

        let rows = select
            .order_by_asc(stock_level::Column::ProductId)
            .all(&*self.db)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (level, product) in rows {
            let product = product.ok_or_else(|| {
                ServiceError::Integrity(format!(
                    "stock row references missing product {}",
                    level.product_id
                ))
            })?;
            let bucket = StockBucket::classify(level.quantity, product.min_stock);
            if let Some(wanted) = query.bucket {
                if bucket != wanted {
                    continue;
                }
            }
            out.push(StockRow {
                product_id: level.product_id,
                store_id: level.store_id,
                product_name: product.name,
                product_code: product.code,
                quantity: level.quantity,
                reserved: level.reserved,
                min_stock: product.min_stock,
                bucket,
                shelf_location: level.shelf_location,
            });
        }
        Ok(out)
    }

    /// Ledger audit read, newest first.
    #[instrument(skip(self, ctx))]
    pub async fn list_movements(
        &self,
        ctx: &CallerContext,
        product_id: Uuid,
        store_id: Uuid,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        ctx.authorize_store(store_id)?;
        let movements = StockMovementEntity::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .filter(stock_movement::Column::StoreId.eq(store_id))
            .order_by_desc(stock_movement::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(movements)
    }

    /// Verifies the reconciliation invariant for one (product, store) pair:
    /// the signed movement sum must equal the counter. A mismatch is an
    /// Integrity error, i.e. an engine bug, never user error.
    pub async fn reconcile(&self, product_id: Uuid, store_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let movements = StockMovementEntity::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .filter(stock_movement::Column::StoreId.eq(store_id))
            .all(db)
            .await?;
        let ledger_sum: i64 = movements
            .iter()
            .map(|m| m.movement_type.signed(m.quantity))
            .sum();

        let counter = load_level(db, product_id, store_id)
            .await?
            .map(|s| s.quantity as i64)
            .unwrap_or(0);

        if ledger_sum != counter {
            return Err(ServiceError::Integrity(format!(
                "ledger sum {} does not match counter {} for product {} at store {}",
                ledger_sum, counter, product_id, store_id
            )));
        }
        Ok(())
    }
}

fn non_empty_reason(reason: &str) -> Result<String, ServiceError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(
            "a reason is required for stock movements".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn empty_level(product_id: Uuid, store_id: Uuid) -> stock_level::Model {
    stock_level::Model {
        product_id,
        store_id,
        quantity: 0,
        reserved: 0,
        shelf_location: None,
        updated_at: Utc::now(),
    }
}

async fn require_product<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<product::Model, ServiceError> {
    ProductEntity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("product not found".to_string()))
}

async fn load_level<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    store_id: Uuid,
) -> Result<Option<stock_level::Model>, ServiceError> {
    StockLevelEntity::find_by_id((product_id, store_id))
        .one(conn)
        .await
        .map_err(ServiceError::Database)
}

/// Locked counter read for the mutation paths. The counter update is a
/// read-compute-write, so the read takes `FOR UPDATE` on backends that
/// support it; SQLite's single-writer model serializes the transaction
/// on its own.
async fn load_level_for_update<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    store_id: Uuid,
) -> Result<Option<stock_level::Model>, ServiceError> {
    let mut select = StockLevelEntity::find_by_id((product_id, store_id));
    if conn.get_database_backend() != DbBackend::Sqlite {
        select = select.lock_exclusive();
    }
    select.one(conn).await.map_err(ServiceError::Database)
}

async fn upsert_level<C: ConnectionTrait>(
    conn: &C,
    existing: Option<stock_level::Model>,
    product_id: Uuid,
    store_id: Uuid,
    quantity: i32,
) -> Result<stock_level::Model, ServiceError> {
    let now = Utc::now();
    let model = match existing {
        Some(level) => {
            let mut active: stock_level::ActiveModel = level.into();
            active.quantity = Set(quantity);
            active.updated_at = Set(now);
            active.update(conn).await?
        }
        None => {
            stock_level::ActiveModel {
                product_id: Set(product_id),
                store_id: Set(store_id),
                quantity: Set(quantity),
                reserved: Set(0),
                shelf_location: Set(None),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?
        }
    };
    Ok(model)
}

#[allow(clippy::too_many_arguments)]
async fn append_movement<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    store_id: Uuid,
    movement_type: MovementType,
    quantity: i32,
    unit_price: Option<Decimal>,
    reason: &str,
    performed_by: Uuid,
) -> Result<stock_movement::Model, ServiceError> {
    stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        store_id: Set(store_id),
        movement_type: Set(movement_type),
        quantity: Set(quantity),
        unit_price: Set(unit_price),
        reason: Set(reason.to_string()),
        performed_by: Set(performed_by),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
    .map_err(ServiceError::Database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_classification() {
        assert_eq!(StockBucket::classify(0, 5), StockBucket::OutOfStock);
        assert_eq!(StockBucket::classify(3, 5), StockBucket::Low);
        assert_eq!(StockBucket::classify(5, 5), StockBucket::Low);
        assert_eq!(StockBucket::classify(6, 5), StockBucket::Normal);
        assert_eq!(StockBucket::classify(1, 0), StockBucket::Normal);
    }

    #[test]
    fn reason_is_required() {
        assert!(non_empty_reason("Inventario físico").is_ok());
        assert!(non_empty_reason("   ").is_err());
    }
}
