use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::workers::WorkerInput;
use crate::AppState;

use super::common::{created_response, message_response, success_response};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct WorkerRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
}

impl WorkerRequest {
    fn into_input(self) -> WorkerInput {
        WorkerInput {
            name: self.name.trim().to_string(),
            phone: self.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            email: self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkerSearchQuery {
    /// Substring matched against name, phone and email
    pub q: Option<String>,
}

/// Worker roster routes, nested under the work-orders namespace.
pub fn workers_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_worker))
        .route("/all", get(list_workers))
        .route("/search", get(search_workers))
        .route("/:id", put(update_worker).delete(delete_worker))
}

/// Create a worker
#[utoipa::path(
    post,
    path = "/api/work-orders/workers",
    request_body = WorkerRequest,
    responses(
        (status = 201, description = "Worker created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "workers"
)]
pub async fn create_worker(
    State(state): State<AppState>,
    Json(payload): Json<WorkerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state.services.workers.create(payload.into_input()).await?;
    Ok(created_response(created))
}

/// List the whole roster, alphabetically
#[utoipa::path(
    get,
    path = "/api/work-orders/workers/all",
    responses((status = 200, description = "All workers ordered by name")),
    tag = "workers"
)]
pub async fn list_workers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let workers = state.services.workers.list().await?;
    Ok(success_response(workers))
}

/// Substring search across name, phone and email
#[utoipa::path(
    get,
    path = "/api/work-orders/workers/search",
    params(WorkerSearchQuery),
    responses((status = 200, description = "Matching workers ordered by name")),
    tag = "workers"
)]
pub async fn search_workers(
    State(state): State<AppState>,
    Query(query): Query<WorkerSearchQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let workers = state
        .services
        .workers
        .search(query.q.as_deref().unwrap_or(""))
        .await?;
    Ok(success_response(workers))
}

/// Update a worker
#[utoipa::path(
    put,
    path = "/api/work-orders/workers/{id}",
    params(("id" = i32, Path, description = "Worker ID")),
    request_body = WorkerRequest,
    responses(
        (status = 200, description = "Worker updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "workers"
)]
pub async fn update_worker(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<WorkerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    state
        .services
        .workers
        .update(id, payload.into_input())
        .await?;
    Ok(message_response("Worker updated successfully"))
}

/// Delete a worker; historical work orders keep the name string
#[utoipa::path(
    delete,
    path = "/api/work-orders/workers/{id}",
    params(("id" = i32, Path, description = "Worker ID")),
    responses(
        (status = 200, description = "Worker deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "workers"
)]
pub async fn delete_worker(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.workers.delete(id).await?;
    Ok(message_response("Worker deleted successfully"))
}
