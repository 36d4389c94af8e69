//! Cellstock API Library
//!
//! Multi-store inventory and sales backend for mobile phones, accessories
//! and repair parts. The transactional core guarantees that a device is
//! sold at most once, that IMEIs stay globally unique, and that per-store
//! stock counters always reconcile against the append-only movement ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::extract::FromRef;
use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: auth::AuthConfig,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let auth = auth::AuthConfig::new(config.jwt_secret.clone(), config.token_ttl_secs);
        let services = services::AppServices::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            auth,
            event_sender,
            services,
        }
    }
}

impl FromRef<Arc<AppState>> for auth::AuthConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.auth.clone()
    }
}

/// Builds the application router with the standard middleware stack.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", handlers::api_routes())
        .merge(handlers::health::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
