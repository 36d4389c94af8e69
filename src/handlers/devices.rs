use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::CallerContext,
    errors::ServiceError,
    handlers::common::{created_response, ok_response, validate_input},
    services::devices::{DeviceSearchQuery, RegisterDeviceRequest, UpdateDeviceRequest},
    AppState,
};

async fn register_device(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Json(payload): Json<RegisterDeviceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let device = state.services.devices.register_device(&ctx, payload).await?;
    Ok(created_response("Device registered", device))
}

async fn search_devices(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Query(query): Query<DeviceSearchQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state.services.devices.search_devices(&ctx, query).await?;
    Ok(ok_response("Devices", result))
}

async fn get_device(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let device = state.services.devices.get_device(&ctx, id).await?;
    Ok(ok_response("Device", device))
}

async fn update_device(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeviceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let device = state
        .services
        .devices
        .update_device(&ctx, id, payload)
        .await?;
    Ok(ok_response("Device updated", device))
}

async fn delete_device(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.devices.delete_device(&ctx, id).await?;
    Ok(ok_response("Device deleted", ()))
}

#[derive(Debug, Deserialize)]
struct MoveDeviceRequest {
    store_id: Uuid,
}

async fn move_device(
    State(state): State<Arc<AppState>>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveDeviceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let device = state
        .services
        .devices
        .move_device(&ctx, id, payload.store_id)
        .await?;
    Ok(ok_response("Device moved", device))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(register_device).get(search_devices))
        .route(
            "/:id",
            get(get_device).put(update_device).delete(delete_device),
        )
        .route("/:id/move", post(move_device))
}
