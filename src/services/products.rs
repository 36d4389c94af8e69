use crate::{
    auth::CallerContext,
    db::DbPool,
    entities::{
        category::Entity as CategoryEntity,
        product::{self, Entity as ProductEntity, ProductType},
        stock_level::{self, Entity as StockLevelEntity},
        stock_movement::{self, Entity as StockMovementEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Attempts before the code generator gives up. The original system looped
/// without bound; exhaustion here is surfaced as an Integrity error.
const CODE_GENERATION_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    /// Optional explicit code; left empty, a unique one is generated.
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub product_type: ProductType,
    pub brand: Option<String>,
    pub compatible_model: Option<String>,
    pub price: Decimal,
    pub purchase_price: Option<Decimal>,
    #[serde(default)]
    pub min_stock: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 50, message = "Product code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub product_type: ProductType,
    pub brand: Option<String>,
    pub compatible_model: Option<String>,
    pub price: Decimal,
    pub purchase_price: Option<Decimal>,
    pub min_stock: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductSearchQuery {
    /// Substring matched against name, code, brand, compatible model and
    /// description.
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    pub product_type: Option<ProductType>,
    pub active: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<product::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// How a delete request was resolved: hard removal, or deactivation when
/// ledger history must be preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductDeleteOutcome {
    Deleted,
    Deactivated,
}

/// Accessory/part catalog. Writes are admin-only; the catalog itself is
/// global, not store-bound.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, ctx, req), fields(actor = %ctx.user_id))]
    pub async fn create_product(
        &self,
        ctx: &CallerContext,
        req: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        if !ctx.can_manage_products() {
            return Err(ServiceError::Forbidden(
                "managing products requires admin rights".to_string(),
            ));
        }
        req.validate()?;
        validate_price(req.price)?;
        if req.min_stock < 0 {
            return Err(ServiceError::Validation(
                "minimum stock cannot be negative".to_string(),
            ));
        }

        let db = &*self.db;
        if let Some(category_id) = req.category_id {
            CategoryEntity::find_by_id(category_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound("category not found".to_string()))?;
        }

        let code = match req.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(explicit) => {
                assert_code_free(db, explicit, None).await?;
                explicit.to_string()
            }
            None => {
                generate_unique_code(db, req.product_type, Utc::now().date_naive()).await?
            }
        };

        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.clone()),
            name: Set(req.name),
            description: Set(req.description),
            category_id: Set(req.category_id),
            product_type: Set(req.product_type),
            brand: Set(req.brand),
            compatible_model: Set(req.compatible_model),
            price: Set(req.price),
            purchase_price: Set(req.purchase_price),
            min_stock: Set(req.min_stock),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(db)
        .await?;

        info!(product_id = %created.id, code = %code, "product created");
        self.event_sender
            .emit(Event::ProductCreated {
                product_id: created.id,
                code,
                actor: ctx.user_id,
            })
            .await;

        Ok(created)
    }

    #[instrument(skip(self, ctx, req), fields(actor = %ctx.user_id, product_id = %product_id))]
    pub async fn update_product(
        &self,
        ctx: &CallerContext,
        product_id: Uuid,
        req: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        if !ctx.can_manage_products() {
            return Err(ServiceError::Forbidden(
                "managing products requires admin rights".to_string(),
            ));
        }
        req.validate()?;
        validate_price(req.price)?;
        if req.min_stock < 0 {
            return Err(ServiceError::Validation(
                "minimum stock cannot be negative".to_string(),
            ));
        }

        let db = &*self.db;
        let existing = ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("product not found".to_string()))?;

        if let Some(category_id) = req.category_id {
            CategoryEntity::find_by_id(category_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound("category not found".to_string()))?;
        }

        let code = req.code.trim().to_string();
        assert_code_free(db, &code, Some(product_id)).await?;

        let mut active: product::ActiveModel = existing.into();
        active.code = Set(code);
        active.name = Set(req.name);
        active.description = Set(req.description);
        active.category_id = Set(req.category_id);
        active.product_type = Set(req.product_type);
        active.brand = Set(req.brand);
        active.compatible_model = Set(req.compatible_model);
        active.price = Set(req.price);
        active.purchase_price = Set(req.purchase_price);
        active.min_stock = Set(req.min_stock);
        active.is_active = Set(req.is_active);
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(db).await?;

        self.event_sender
            .emit(Event::ProductUpdated {
                product_id,
                actor: ctx.user_id,
            })
            .await;

        Ok(updated)
    }

    /// Deletion policy: refused while any store holds nonzero stock;
    /// deactivated instead of deleted when ledger history references the
    /// product; hard-deleted otherwise.
    #[instrument(skip(self, ctx), fields(actor = %ctx.user_id, product_id = %product_id))]
    pub async fn delete_product(
        &self,
        ctx: &CallerContext,
        product_id: Uuid,
    ) -> Result<ProductDeleteOutcome, ServiceError> {
        if !ctx.can_manage_products() {
            return Err(ServiceError::Forbidden(
                "managing products requires admin rights".to_string(),
            ));
        }

        let db = &*self.db;
        let existing = ProductEntity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("product not found".to_string()))?;

        let held = StockLevelEntity::find()
            .filter(stock_level::Column::ProductId.eq(product_id))
            .filter(stock_level::Column::Quantity.ne(0))
            .count(db)
            .await?;
        if held > 0 {
            return Err(ServiceError::Conflict(
                "product still has stock on hand and cannot be deleted".to_string(),
            ));
        }

        let history = StockMovementEntity::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .count(db)
            .await?;

        if history > 0 {
            let mut active: product::ActiveModel = existing.into();
            active.is_active = Set(false);
            active.updated_at = Set(Some(Utc::now()));
            active.update(db).await?;

            self.event_sender
                .emit(Event::ProductDeactivated {
                    product_id,
                    actor: ctx.user_id,
                })
                .await;
            return Ok(ProductDeleteOutcome::Deactivated);
        }

        // No stock anywhere and no ledger history: the zero-quantity
        // counter rows are the only remnants, drop them with the product.
        StockLevelEntity::delete_many()
            .filter(stock_level::Column::ProductId.eq(product_id))
            .exec(db)
            .await?;
        ProductEntity::delete_by_id(product_id).exec(db).await?;

        self.event_sender
            .emit(Event::ProductDeleted {
                product_id,
                actor: ctx.user_id,
            })
            .await;
        Ok(ProductDeleteOutcome::Deleted)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("product not found".to_string()))
    }

    /// Catalog search; the catalog is global, so both roles see it all.
    #[instrument(skip(self, query))]
    pub async fn search_products(
        &self,
        query: ProductSearchQuery,
    ) -> Result<ProductListResponse, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.limit.unwrap_or(20).clamp(1, 100);

        let mut select = ProductEntity::find();
        if let Some(category_id) = query.category_id {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(product_type) = query.product_type {
            select = select.filter(product::Column::ProductType.eq(product_type));
        }
        if let Some(active) = query.active {
            select = select.filter(product::Column::IsActive.eq(active));
        }
        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(product::Column::Name.contains(q))
                    .add(product::Column::Code.contains(q))
                    .add(product::Column::Brand.contains(q))
                    .add(product::Column::CompatibleModel.contains(q))
                    .add(product::Column::Description.contains(q)),
            );
        }

        let paginator = select
            .order_by_asc(product::Column::Name)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(ProductListResponse {
            products,
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

async fn assert_code_free<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    exclude: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut select = ProductEntity::find().filter(product::Column::Code.eq(code));
    if let Some(id) = exclude {
        select = select.filter(product::Column::Id.ne(id));
    }
    if select.count(conn).await? > 0 {
        return Err(ServiceError::Conflict(format!(
            "product code '{}' is already in use",
            code
        )));
    }
    Ok(())
}

/// Renders one candidate code: type prefix, date salt, 4 random digits.
/// Accessories produce e.g. `ACC202405010042`, parts `REP...`.
fn format_code(product_type: ProductType, date: NaiveDate, suffix: u16) -> String {
    format!(
        "{}{}{:04}",
        product_type.code_prefix(),
        date.format("%Y%m%d"),
        suffix
    )
}

/// Synthesizes a unique code, retrying the random suffix a bounded number
/// of times against the uniqueness check.
async fn generate_unique_code<C: ConnectionTrait>(
    conn: &C,
    product_type: ProductType,
    date: NaiveDate,
) -> Result<String, ServiceError> {
    for _ in 0..CODE_GENERATION_ATTEMPTS {
        let suffix = rand::thread_rng().gen_range(0..10_000u16);
        let candidate = format_code(product_type, date, suffix);
        let taken = ProductEntity::find()
            .filter(product::Column::Code.eq(candidate.as_str()))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
    Err(ServiceError::Integrity(format!(
        "could not generate a unique product code after {} attempts",
        CODE_GENERATION_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn code_format_matches_scheme() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            format_code(ProductType::Accessory, date, 42),
            "ACC202405010042"
        );
        assert_eq!(format_code(ProductType::Part, date, 9999), "REP202405019999");
    }

    proptest! {
        #[test]
        fn generated_codes_are_well_formed(suffix in 0u16..10_000, year in 2000i32..2100, month in 1u32..=12, day in 1u32..=28) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let code = format_code(ProductType::Accessory, date, suffix);
            prop_assert!(code.starts_with("ACC"));
            prop_assert_eq!(code.len(), 3 + 8 + 4);
            prop_assert!(code[3..].bytes().all(|b| b.is_ascii_digit()));
        }
    }
}
