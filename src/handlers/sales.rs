use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::CallerContext,
    errors::ServiceError,
    handlers::common::{created_response, ok_response, validate_input},
    services::sales::{RegisterSaleRequest, SaleListQuery},
    AppState,
};

async fn register_sale(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Json(payload): Json<RegisterSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let sale = state.services.sales.register_sale(&ctx, payload).await?;
    Ok(created_response("Sale completed", sale))
}

async fn list_sales(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Query(query): Query<SaleListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.services.sales.list_sales(&ctx, query).await?;
    Ok(ok_response("Sales", result))
}

async fn get_sale(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.services.sales.get_sale(&ctx, id).await?;
    Ok(ok_response("Sale", sale))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(register_sale).get(list_sales))
        .route("/:id", get(get_sale))
}
