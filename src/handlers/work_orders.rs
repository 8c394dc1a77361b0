use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::errors::ServiceError;
use crate::services::export::work_orders_to_csv;
use crate::services::work_orders::{NewPhoto, NewSignature, NewWorkOrder, WorkOrderFilters};
use crate::storage::UploadStore;
use crate::AppState;

use super::common::{message_response, success_response};

/// Query-string filters accepted by the list and export endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WorkOrderListQuery {
    /// Site name substring
    pub site_name: Option<String>,
    /// Building substring
    pub building: Option<String>,
    /// Exact status: "pending" or "confirmed"
    pub status: Option<String>,
    /// Inclusive lower bound on the ticket date (YYYY-MM-DD)
    pub date_from: Option<String>,
    /// Inclusive upper bound on the ticket date (YYYY-MM-DD)
    pub date_to: Option<String>,
}

impl WorkOrderListQuery {
    fn into_filters(self) -> Result<WorkOrderFilters, ServiceError> {
        let status = match self.status.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some("pending") => Some(crate::entities::WorkOrderStatus::Pending),
            Some("confirmed") => Some(crate::entities::WorkOrderStatus::Confirmed),
            Some(other) => {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid status: {}",
                    other
                )))
            }
        };
        Ok(WorkOrderFilters {
            site_name: self.site_name,
            building: self.building,
            status,
            date_from: self.date_from,
            date_to: self.date_to,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    /// Data-URL encoded signature image drawn on the pad
    pub signature_data: String,
    pub signer_name: Option<String>,
    pub signer_email: Option<String>,
}

/// Create the work orders router
pub fn work_orders_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_work_orders).post(create_work_order))
        .route("/export", get(export_work_orders))
        .route("/sites/recent", get(recent_sites))
        .route(
            "/:id",
            get(get_work_order).delete(delete_work_order),
        )
        .route("/:id/signature", post(add_signature))
        .nest("/workers", super::workers::workers_router())
}

/// Create a new work order from a multipart form with up to ten photo
/// attachments.
#[utoipa::path(
    post,
    path = "/api/work-orders",
    responses(
        (status = 201, description = "Work order created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 413, description = "Attachment too large", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn create_work_order(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServiceError> {
    let mut input = NewWorkOrder::default();
    let mut photos: Vec<NewPhoto> = Vec::new();

    let result = async {
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ServiceError::InvalidInput(format!("Malformed multipart request: {}", e))
        })? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "photos" {
                if photos.len() >= state.config.max_upload_files {
                    return Err(ServiceError::ValidationError(format!(
                        "At most {} photos are allowed",
                        state.config.max_upload_files
                    )));
                }

                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.starts_with("image/") {
                    return Err(ServiceError::ValidationError(
                        "Only image files are allowed".to_string(),
                    ));
                }

                let original_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    ServiceError::InvalidInput(format!("Failed to read photo upload: {}", e))
                })?;
                if data.len() > state.config.max_upload_bytes {
                    return Err(ServiceError::PayloadTooLarge(
                        "Photo exceeds the upload size limit".to_string(),
                    ));
                }

                let stored_name = UploadStore::random_name(
                    "photos",
                    original_name.as_deref().unwrap_or("photo"),
                );
                state.services.photo_store.save(&stored_name, &data).await?;

                photos.push(NewPhoto {
                    stored_name,
                    original_name,
                    file_size: data.len() as i64,
                });
                continue;
            }

            let value = field.text().await.map_err(|e| {
                ServiceError::InvalidInput(format!("Malformed multipart request: {}", e))
            })?;

            match name.as_str() {
                "date" => input.date = Some(value),
                "siteName" => input.site_name = Some(value),
                "building" => input.building = Some(value),
                "floor" => input.floor = Some(value),
                "unit" => input.unit = Some(value),
                "reason" => input.reason = Some(value),
                "workerName" => input.worker_name = Some(value),
                "amount" => {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        input.amount = Some(trimmed.parse::<f64>().map_err(|_| {
                            ServiceError::ValidationError("Amount must be a number".to_string())
                        })?);
                    }
                }
                _ => {}
            }
        }

        state.services.work_orders.create(input, photos.clone()).await
    }
    .await;

    match result {
        Ok(detail) => {
            let share_url = format!("/work-order/{}", detail.order.unique_link);
            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "success": true,
                    "data": detail,
                    "shareUrl": share_url,
                })),
            ))
        }
        Err(err) => {
            // The order never materialized; drop any photos already written.
            for photo in &photos {
                state.services.photo_store.remove_quiet(&photo.stored_name).await;
            }
            Err(err)
        }
    }
}

/// List work orders with optional filtering
#[utoipa::path(
    get,
    path = "/api/work-orders",
    params(WorkOrderListQuery),
    responses(
        (status = 200, description = "Filtered work orders, newest first"),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn list_work_orders(
    State(state): State<AppState>,
    Query(query): Query<WorkOrderListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filters = query.into_filters()?;
    let orders = state.services.work_orders.list(&filters).await?;

    Ok(Json(json!({
        "success": true,
        "data": orders,
        "total": orders.len(),
    })))
}

/// Export the filtered work orders as CSV
#[utoipa::path(
    get,
    path = "/api/work-orders/export",
    params(WorkOrderListQuery),
    responses(
        (status = 200, description = "CSV export, UTF-8 with byte-order mark")
    ),
    tag = "work-orders"
)]
pub async fn export_work_orders(
    State(state): State<AppState>,
    Query(query): Query<WorkOrderListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filters = query.into_filters()?;
    let orders = state.services.work_orders.list(&filters).await?;
    let csv = work_orders_to_csv(&orders);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"work-orders.csv\"",
            ),
        ],
        csv,
    ))
}

/// Get a specific work order by ID
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}",
    params(("id" = i32, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order with photos and signature"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .work_orders
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Work order not found".to_string()))?;

    Ok(success_response(detail))
}

/// Delete a work order together with its photos and signature
#[utoipa::path(
    delete,
    path = "/api/work-orders/{id}",
    params(("id" = i32, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn delete_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let photo_paths = state.services.work_orders.delete(id).await?;

    for stored_name in &photo_paths {
        state.services.photo_store.remove_quiet(stored_name).await;
    }

    Ok(message_response("Work order deleted successfully"))
}

/// Attach the signature, confirming the work order. Sends the confirmation
/// email best-effort when the signer left an address.
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/signature",
    params(("id" = i32, Path, description = "Work order ID")),
    request_body = SignatureRequest,
    responses(
        (status = 200, description = "Work order signed"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already signed", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn add_signature(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SignatureRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let saved = state
        .services
        .work_orders
        .add_signature(
            id,
            NewSignature {
                data: payload.signature_data,
                signer_name: payload.signer_name.clone(),
                signer_email: payload.signer_email.clone(),
            },
        )
        .await?;

    // The signature is durable at this point; mail failure must not undo it.
    if let Some(signer_email) = saved.signer_email.clone() {
        let order = state.services.work_orders.get(id).await?;
        if let Some(detail) = order {
            if let Err(err) = state
                .services
                .mailer
                .send_confirmation(&detail.order, saved.signer_name.as_deref(), &signer_email)
                .await
            {
                warn!(work_order_id = id, error = %err, "confirmation email failed");
            }
        }
    }

    Ok(Json(json!({
        "success": true,
        "data": saved,
        "message": "Work order signed successfully",
    })))
}

/// Recently used site names for autocomplete
#[utoipa::path(
    get,
    path = "/api/work-orders/sites/recent",
    responses((status = 200, description = "Up to ten most recently used site names")),
    tag = "work-orders"
)]
pub async fn recent_sites(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let sites = state.services.work_orders.recent_sites(10).await?;
    Ok(success_response(sites))
}
