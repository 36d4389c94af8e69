use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CallerContext,
    errors::ServiceError,
    handlers::common::{ok_response, validate_input},
    services::stock::StockListQuery,
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
struct AdjustStockRequest {
    product_id: Uuid,
    store_id: Uuid,
    new_quantity: i32,
    #[validate(length(min = 1, message = "A reason is required"))]
    reason: String,
}

#[derive(Debug, Deserialize, Validate)]
struct AddStockRequest {
    product_id: Uuid,
    store_id: Uuid,
    quantity: i32,
    unit_price: Option<Decimal>,
    #[validate(length(min = 1, message = "A reason is required"))]
    reason: String,
}

#[derive(Debug, Deserialize, Validate)]
struct RemoveStockRequest {
    product_id: Uuid,
    store_id: Uuid,
    quantity: i32,
    #[validate(length(min = 1, message = "A reason is required"))]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct MovementsQuery {
    product_id: Uuid,
    store_id: Uuid,
}

async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let level = state
        .services
        .stock
        .adjust_stock(
            &ctx,
            payload.product_id,
            payload.store_id,
            payload.new_quantity,
            &payload.reason,
        )
        .await?;
    Ok(ok_response("Stock adjusted", level))
}

async fn add_stock(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Json(payload): Json<AddStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let level = state
        .services
        .stock
        .add_stock(
            &ctx,
            payload.product_id,
            payload.store_id,
            payload.quantity,
            payload.unit_price,
            &payload.reason,
        )
        .await?;
    Ok(ok_response("Stock received", level))
}

async fn remove_stock(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Json(payload): Json<RemoveStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let level = state
        .services
        .stock
        .remove_stock(
            &ctx,
            payload.product_id,
            payload.store_id,
            payload.quantity,
            &payload.reason,
        )
        .await?;
    Ok(ok_response("Stock removed", level))
}

async fn list_stock(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Query(query): Query<StockListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.services.stock.list_stock(&ctx, query).await?;
    Ok(ok_response("Stock", rows))
}

async fn list_movements(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Query(query): Query<MovementsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements = state
        .services
        .stock
        .list_movements(&ctx, query.product_id, query.store_id)
        .await?;
    Ok(ok_response("Stock movements", movements))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_stock))
        .route("/movements", get(list_movements))
        .route("/adjust", post(adjust_stock))
        .route("/intake", post(add_stock))
        .route("/remove", post(remove_stock))
}
