use crate::{
    auth::CallerContext,
    db::DbPool,
    entities::{
        device::{self, DeviceStatus, Entity as DeviceEntity},
        sale::{self, Entity as SaleEntity, PaymentMethod},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use sea_orm::sea_query::Expr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterSaleRequest {
    pub device_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Customer name is required"))]
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub price: Decimal,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleListQuery {
    pub store_id: Option<Uuid>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SaleListResponse {
    pub sales: Vec<sale::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Sale Transaction Coordinator.
///
/// Serializes concurrent sales of the same device through the database:
/// on Postgres the availability read takes a `FOR UPDATE` row lock, and on
/// every backend the final conditional `available -> sold` update is the
/// compare-and-swap that leaves exactly one winner. The loser observes the
/// committed state and fails with Conflict; no automatic retry.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl SaleService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Sells a device. The sale row insert and the device state transition
    /// commit atomically or not at all; the transaction rolls back on every
    /// error exit (drop of an uncommitted transaction is a rollback).
    #[instrument(skip(self, ctx, req), fields(actor = %ctx.user_id, device_id = %req.device_id))]
    pub async fn register_sale(
        &self,
        ctx: &CallerContext,
        req: RegisterSaleRequest,
    ) -> Result<sale::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        // Availability read doubles as the lock acquisition on Postgres.
        // Zero rows is one deliberate signal for already-sold, reserved and
        // nonexistent alike: callers cannot probe device existence here.
        let mut select = DeviceEntity::find()
            .filter(device::Column::Id.eq(req.device_id))
            .filter(device::Column::Status.eq(DeviceStatus::Available));
        if txn.get_database_backend() != DbBackend::Sqlite {
            select = select.lock_exclusive();
        }
        let locked = select
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::Conflict("device is not available".to_string()))?;

        // Authorization happens inside the transaction, against the locked
        // row, so the check cannot race the mutation.
        ctx.authorize_store(locked.store_id)?;

        req.validate()?;
        if req.price <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "sale price must be greater than zero".to_string(),
            ));
        }
        // Trim before checking: the length validator alone would let a
        // whitespace-only name through as an empty string.
        let customer_name = req.customer_name.trim();
        if customer_name.is_empty() {
            return Err(ServiceError::Validation(
                "customer name is required".to_string(),
            ));
        }

        let now = Utc::now();
        let sale_row = sale::ActiveModel {
            id: Set(Uuid::new_v4()),
            device_id: Set(locked.id),
            customer_name: Set(customer_name.to_string()),
            customer_phone: Set(req.customer_phone),
            customer_email: Set(req.customer_email),
            price: Set(req.price),
            payment_method: Set(req.payment_method),
            notes: Set(req.notes),
            sold_by: Set(ctx.user_id),
            // Copied from the device, not the caller, so the sale record
            // stays with the selling store if the device is later moved.
            store_id: Set(locked.store_id),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        // Compare-and-swap transition. With the row lock held this can only
        // lose on backends without FOR UPDATE, where it carries the race.
        let transition = DeviceEntity::update_many()
            .col_expr(device::Column::Status, Expr::value(DeviceStatus::Sold))
            .col_expr(device::Column::SoldAt, Expr::value(Some(now)))
            .filter(device::Column::Id.eq(locked.id))
            .filter(device::Column::Status.eq(DeviceStatus::Available))
            .exec(&txn)
            .await?;
        if transition.rows_affected != 1 {
            return Err(ServiceError::Conflict(
                "device is not available".to_string(),
            ));
        }

        txn.commit().await?;

        info!(sale_id = %sale_row.id, device_id = %locked.id, "device sold");
        self.event_sender
            .emit(Event::SaleCompleted {
                sale_id: sale_row.id,
                device_id: locked.id,
                store_id: locked.store_id,
                actor: ctx.user_id,
            })
            .await;

        Ok(sale_row)
    }

    /// Store-scoped single read; no existence leak across stores.
    #[instrument(skip(self, ctx), fields(sale_id = %sale_id))]
    pub async fn get_sale(
        &self,
        ctx: &CallerContext,
        sale_id: Uuid,
    ) -> Result<sale::Model, ServiceError> {
        let sale_row = SaleEntity::find_by_id(sale_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("sale not found".to_string()))?;

        if let Some(scope) = ctx.scope_store(None)? {
            if sale_row.store_id != scope {
                return Err(ServiceError::NotFound("sale not found".to_string()));
            }
        }
        Ok(sale_row)
    }

    #[instrument(skip(self, ctx, query))]
    pub async fn list_sales(
        &self,
        ctx: &CallerContext,
        query: SaleListQuery,
    ) -> Result<SaleListResponse, ServiceError> {
        let scope = ctx.scope_store(query.store_id)?;
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(20).clamp(1, 100);

        let mut select = SaleEntity::find();
        if let Some(store_id) = scope {
            select = select.filter(sale::Column::StoreId.eq(store_id));
        }

        let paginator = select
            .order_by_desc(sale::Column::CreatedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let sales = paginator.fetch_page(page - 1).await?;

        Ok(SaleListResponse {
            sales,
            total,
            page,
            per_page,
        })
    }
}
