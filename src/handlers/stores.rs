use axum::{
    extract::{Path, State},
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
    services::stores::CreateStoreRequest,
    AppState,
};

async fn create_store(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Json(payload): Json<CreateStoreRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let store = state.services.stores.create_store(&ctx, payload).await?;
    Ok(created_response("Store created", store))
}

async fn list_stores(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
) -> Result<impl IntoResponse, ServiceError> {
    let stores = state.services.stores.list_stores(&ctx).await?;
    Ok(ok_response("Stores", stores))
}

async fn get_store(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let store = state.services.stores.get_store(&ctx, id).await?;
    Ok(ok_response("Store", store))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_store).get(list_stores))
        .route("/:id", get(get_store))
}
