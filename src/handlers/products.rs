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
    services::products::{CreateProductRequest, ProductSearchQuery, UpdateProductRequest},
    AppState,
};

async fn create_product(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let product = state.services.products.create_product(&ctx, payload).await?;
    Ok(created_response("Product created", product))
}

async fn search_products(
    State(state): State<Arc<AppState>>,
    _ctx: CallerContext,
    Query(query): Query<ProductSearchQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.services.products.search_products(query).await?;
    Ok(ok_response("Products", result))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    _ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.get_product(id).await?;
    Ok(ok_response("Product", product))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let product = state
        .services
        .products
        .update_product(&ctx, id, payload)
        .await?;
    Ok(ok_response("Product updated", product))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.services.products.delete_product(&ctx, id).await?;
    Ok(ok_response("Product removed", outcome))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_product).get(search_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}
