use crate::{
    auth::CallerContext,
    db::DbPool,
    entities::store::{self, Entity as StoreEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStoreRequest {
    #[validate(length(min = 1, max = 120, message = "Store name is required"))]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Minimal tenant administration. Stores are the scoping boundary for
/// devices, sales and stock.
#[derive(Clone)]
pub struct StoreService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl StoreService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, ctx, req), fields(actor = %ctx.user_id))]
    pub async fn create_store(
        &self,
        ctx: &CallerContext,
        req: CreateStoreRequest,
    ) -> Result<store::Model, ServiceError> {
        if !ctx.is_admin() {
            return Err(ServiceError::Forbidden(
                "creating stores requires admin rights".to_string(),
            ));
        }
        req.validate()?;
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "store name is required".to_string(),
            ));
        }

        let created = store::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            address: Set(req.address),
            phone: Set(req.phone),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .emit(Event::StoreCreated {
                store_id: created.id,
                name: created.name.clone(),
                actor: ctx.user_id,
            })
            .await;

        Ok(created)
    }

    /// Admins see every store; vendors only their own.
    #[instrument(skip(self, ctx))]
    pub async fn list_stores(&self, ctx: &CallerContext) -> Result<Vec<store::Model>, ServiceError> {
        let mut select = StoreEntity::find();
        if !ctx.can_list_all_stores() {
            let home = ctx.store_id.ok_or_else(|| {
                ServiceError::Unauthorized("vendor account has no store assigned".to_string())
            })?;
            select = select.filter(store::Column::Id.eq(home));
        }
        let stores = select.order_by_asc(store::Column::Name).all(&*self.db).await?;
        Ok(stores)
    }

    #[instrument(skip(self, ctx), fields(store_id = %store_id))]
    pub async fn get_store(
        &self,
        ctx: &CallerContext,
        store_id: Uuid,
    ) -> Result<store::Model, ServiceError> {
        if let Some(scope) = ctx.scope_store(None)? {
            if scope != store_id {
                return Err(ServiceError::NotFound("store not found".to_string()));
            }
        }
        StoreEntity::find_by_id(store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("store not found".to_string()))
    }
}
