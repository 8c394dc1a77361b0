//! worksign API Library
//!
//! Maintenance work-order tracking with share-link signature capture, plus a
//! PDF signature module: upload a PDF, lay out fields, publish, and collect
//! one signature per document through a token-addressed public page.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod storage;

use std::sync::Arc;

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tower_http::services::ServeDir;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Build the state container from an established pool and loaded config.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Result<Self, errors::ServiceError> {
        let services = handlers::AppServices::new(db.clone(), &config)?;
        Ok(Self {
            db,
            config,
            services,
        })
    }
}

/// The JSON API and the public token-addressed routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/api/work-orders",
            handlers::work_orders::work_orders_router(),
        )
        .nest("/api/documents", handlers::documents::documents_router())
        .merge(handlers::public::public_router())
}

/// The full application router: API routes, uploaded-photo static serving,
/// and the Swagger UI. Transport-level layers (tracing, CORS, compression,
/// body limits) are applied by the binary on top of this.
pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .merge(api_routes())
        .route("/health", get(health))
        .nest_service("/uploads", uploads)
        .merge(openapi::swagger_ui())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "up" }))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded" })),
        ),
    }
}
