use crate::{
    auth::CallerContext,
    db::DbPool,
    entities::{
        device::{self, DeviceCondition, DeviceStatus, Entity as DeviceEntity},
        sale,
        store::Entity as StoreEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterDeviceRequest {
    #[validate(length(min = 1, max = 120, message = "Model is required"))]
    pub model: String,
    #[validate(length(min = 1, max = 120, message = "Brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, max = 40, message = "Capacity is required"))]
    pub capacity: String,
    pub color: Option<String>,
    pub condition: DeviceCondition,
    pub price: Decimal,
    pub purchase_price: Option<Decimal>,
    pub imei1: String,
    pub imei2: Option<String>,
    pub barcode: Option<String>,
    /// Required for admins; vendors default to their home store.
    pub store_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Full field rewrite used by the privileged edit path. Unlike sale, edit
/// may set any lifecycle status, including `reserved` and `in_repair`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateDeviceRequest {
    #[validate(length(min = 1, max = 120, message = "Model is required"))]
    pub model: String,
    #[validate(length(min = 1, max = 120, message = "Brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, max = 40, message = "Capacity is required"))]
    pub capacity: String,
    pub color: Option<String>,
    pub condition: DeviceCondition,
    pub price: Decimal,
    pub purchase_price: Option<Decimal>,
    pub imei1: String,
    pub imei2: Option<String>,
    pub barcode: Option<String>,
    pub status: DeviceStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceSearchQuery {
    /// Substring matched against model, brand, capacity, IMEIs, barcode
    /// and color.
    pub q: Option<String>,
    pub status: Option<DeviceStatus>,
    pub store_id: Option<Uuid>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub devices: Vec<device::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Device catalog: registration, privileged edit, store moves, guarded
/// deletion and store-scoped search.
#[derive(Clone)]
pub struct DeviceService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl DeviceService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Registers a new device with state `available`.
    #[instrument(skip(self, ctx, req), fields(actor = %ctx.user_id))]
    pub async fn register_device(
        &self,
        ctx: &CallerContext,
        req: RegisterDeviceRequest,
    ) -> Result<device::Model, ServiceError> {
        req.validate()?;
        validate_price(req.price)?;
        validate_imei(&req.imei1)?;
        if let Some(imei2) = req.imei2.as_deref() {
            validate_imei(imei2)?;
        }

        let store_id = ctx.require_store(req.store_id)?;
        let db = &*self.db;
        let txn = db.begin().await?;

        let store = StoreEntity::find_by_id(store_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("store not found".to_string()))?;
        if !store.is_active {
            return Err(ServiceError::NotFound("store is not active".to_string()));
        }

        lock_imei_registry(&txn).await?;
        assert_imei_free(&txn, &req.imei1, req.imei2.as_deref(), None).await?;

        let device = device::ActiveModel {
            id: Set(Uuid::new_v4()),
            model: Set(req.model),
            brand: Set(req.brand),
            capacity: Set(req.capacity),
            color: Set(req.color),
            condition: Set(req.condition),
            price: Set(req.price),
            purchase_price: Set(req.purchase_price),
            imei1: Set(req.imei1),
            imei2: Set(req.imei2),
            barcode: Set(req.barcode),
            status: Set(DeviceStatus::Available),
            store_id: Set(store_id),
            registered_by: Set(ctx.user_id),
            notes: Set(req.notes),
            created_at: Set(Utc::now()),
            sold_at: Set(None),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(device_id = %device.id, store_id = %store_id, "device registered");
        self.event_sender
            .emit(Event::DeviceRegistered {
                device_id: device.id,
                store_id,
                actor: ctx.user_id,
            })
            .await;

        Ok(device)
    }

    /// Privileged full-field rewrite. Re-validates IMEI uniqueness
    /// excluding the row itself.
    #[instrument(skip(self, ctx, req), fields(actor = %ctx.user_id, device_id = %device_id))]
    pub async fn update_device(
        &self,
        ctx: &CallerContext,
        device_id: Uuid,
        req: UpdateDeviceRequest,
    ) -> Result<device::Model, ServiceError> {
        if !ctx.can_edit_device() {
            return Err(ServiceError::Forbidden(
                "editing devices requires admin rights".to_string(),
            ));
        }
        req.validate()?;
        validate_price(req.price)?;
        validate_imei(&req.imei1)?;
        if let Some(imei2) = req.imei2.as_deref() {
            validate_imei(imei2)?;
        }

        let db = &*self.db;
        let txn = db.begin().await?;

        let existing = DeviceEntity::find_by_id(device_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("device not found".to_string()))?;

        lock_imei_registry(&txn).await?;
        assert_imei_free(&txn, &req.imei1, req.imei2.as_deref(), Some(device_id)).await?;

        let mut active: device::ActiveModel = existing.into();
        active.model = Set(req.model);
        active.brand = Set(req.brand);
        active.capacity = Set(req.capacity);
        active.color = Set(req.color);
        active.condition = Set(req.condition);
        active.price = Set(req.price);
        active.purchase_price = Set(req.purchase_price);
        active.imei1 = Set(req.imei1);
        active.imei2 = Set(req.imei2);
        active.barcode = Set(req.barcode);
        active.status = Set(req.status);
        active.notes = Set(req.notes);

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .emit(Event::DeviceUpdated {
                device_id,
                actor: ctx.user_id,
            })
            .await;

        Ok(updated)
    }

    /// Reassigns a device to another store. The audit event carries the
    /// human-readable before/after store names.
    #[instrument(skip(self, ctx), fields(actor = %ctx.user_id, device_id = %device_id, new_store_id = %new_store_id))]
    pub async fn move_device(
        &self,
        ctx: &CallerContext,
        device_id: Uuid,
        new_store_id: Uuid,
    ) -> Result<device::Model, ServiceError> {
        if !ctx.can_move_device() {
            return Err(ServiceError::Forbidden(
                "moving devices requires admin rights".to_string(),
            ));
        }

        let db = &*self.db;
        let existing = DeviceEntity::find_by_id(device_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("device not found".to_string()))?;

        let destination = StoreEntity::find_by_id(new_store_id)
            .one(db)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| {
                ServiceError::NotFound("destination store not found or inactive".to_string())
            })?;

        let origin_name = StoreEntity::find_by_id(existing.store_id)
            .one(db)
            .await?
            .map(|s| s.name)
            .unwrap_or_else(|| existing.store_id.to_string());

        let mut active: device::ActiveModel = existing.into();
        active.store_id = Set(new_store_id);
        let updated = active.update(db).await?;

        info!(from = %origin_name, to = %destination.name, "device moved");
        self.event_sender
            .emit(Event::DeviceMoved {
                device_id,
                from_store: origin_name,
                to_store: destination.name,
                actor: ctx.user_id,
            })
            .await;

        Ok(updated)
    }

    /// Hard delete, refused while a sale row references the device. The
    /// original system deleted unconditionally; the guard is a deliberate
    /// tightening and is exercised by the integration tests.
    #[instrument(skip(self, ctx), fields(actor = %ctx.user_id, device_id = %device_id))]
    pub async fn delete_device(
        &self,
        ctx: &CallerContext,
        device_id: Uuid,
    ) -> Result<(), ServiceError> {
        if !ctx.can_edit_device() {
            return Err(ServiceError::Forbidden(
                "deleting devices requires admin rights".to_string(),
            ));
        }

        let db = &*self.db;
        DeviceEntity::find_by_id(device_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("device not found".to_string()))?;

        let sale_count = sale::Entity::find()
            .filter(sale::Column::DeviceId.eq(device_id))
            .count(db)
            .await?;
        if sale_count > 0 {
            return Err(ServiceError::Conflict(
                "device has sales history and cannot be deleted".to_string(),
            ));
        }

        DeviceEntity::delete_by_id(device_id).exec(db).await?;

        self.event_sender
            .emit(Event::DeviceDeleted {
                device_id,
                actor: ctx.user_id,
            })
            .await;

        Ok(())
    }

    /// Store-scoped single read. A vendor probing another store's device
    /// gets NotFound rather than Forbidden: no existence leak.
    #[instrument(skip(self, ctx), fields(device_id = %device_id))]
    pub async fn get_device(
        &self,
        ctx: &CallerContext,
        device_id: Uuid,
    ) -> Result<device::Model, ServiceError> {
        let device = DeviceEntity::find_by_id(device_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("device not found".to_string()))?;

        if let Some(scope) = ctx.scope_store(None)? {
            if device.store_id != scope {
                return Err(ServiceError::NotFound("device not found".to_string()));
            }
        }
        Ok(device)
    }

    /// Substring search over display fields plus equality filters, always
    /// intersected with the caller's store scope.
    #[instrument(skip(self, ctx, query))]
    pub async fn search_devices(
        &self,
        ctx: &CallerContext,
        query: DeviceSearchQuery,
    ) -> Result<DeviceListResponse, ServiceError> {
        let scope = ctx.scope_store(query.store_id)?;
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(20).clamp(1, 100);

        let mut select = DeviceEntity::find();
        if let Some(store_id) = scope {
            select = select.filter(device::Column::StoreId.eq(store_id));
        }
        if let Some(status) = query.status {
            select = select.filter(device::Column::Status.eq(status));
        }
        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(device::Column::Model.contains(q))
                    .add(device::Column::Brand.contains(q))
                    .add(device::Column::Capacity.contains(q))
                    .add(device::Column::Imei1.contains(q))
                    .add(device::Column::Imei2.contains(q))
                    .add(device::Column::Barcode.contains(q))
                    .add(device::Column::Color.contains(q)),
            );
        }

        let paginator = select
            .order_by_desc(device::Column::CreatedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let devices = paginator.fetch_page(page - 1).await?;

        Ok(DeviceListResponse {
            devices,
            total,
            page,
            per_page,
        })
    }
}

fn validate_price(price: Decimal) -> Result<(), ServiceError> {
    if price <= Decimal::ZERO {
        return Err(ServiceError::Validation(
            "price must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_imei(imei: &str) -> Result<(), ServiceError> {
    if imei.len() != 15 || !imei.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::Validation(
            "IMEI must be exactly 15 digits".to_string(),
        ));
    }
    Ok(())
}

/// Serializes the IMEI check-and-write against concurrent writers.
///
/// Cross-column uniqueness (a new `imei1` colliding with an existing row's
/// `imei2`) cannot be expressed as an index, and a `FOR UPDATE` read locks
/// nothing when the check finds zero rows. On Postgres the registration
/// transaction therefore takes a table lock that admits concurrent reads
/// but excludes other registrations. SQLite's single-writer model already
/// serializes the transaction.
async fn lock_imei_registry<C: ConnectionTrait>(conn: &C) -> Result<(), ServiceError> {
    if conn.get_database_backend() == DbBackend::Postgres {
        conn.execute_unprepared("LOCK TABLE devices IN SHARE ROW EXCLUSIVE MODE")
            .await?;
    }
    Ok(())
}

/// Checks that neither IMEI collides with any other device's primary or
/// secondary IMEI. The per-column unique indexes are only a backstop; this
/// query is the authoritative cross-column check.
async fn assert_imei_free<C: ConnectionTrait>(
    conn: &C,
    imei1: &str,
    imei2: Option<&str>,
    exclude: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut imeis = vec![imei1.to_string()];
    if let Some(i2) = imei2 {
        if i2 == imei1 {
            return Err(ServiceError::Validation(
                "primary and secondary IMEI must differ".to_string(),
            ));
        }
        imeis.push(i2.to_string());
    }

    let mut select = DeviceEntity::find().filter(
        Condition::any()
            .add(device::Column::Imei1.is_in(imeis.clone()))
            .add(device::Column::Imei2.is_in(imeis)),
    );
    if let Some(id) = exclude {
        select = select.filter(device::Column::Id.ne(id));
    }

    if select.count(conn).await? > 0 {
        return Err(ServiceError::Conflict(
            "IMEI already registered to another device".to_string(),
        ));
    }
    Ok(())
}
