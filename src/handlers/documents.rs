use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::services::documents::{is_pdf_payload, NewDocument, NewField};
use crate::storage::UploadStore;
use crate::AppState;

use super::common::{created_response, message_response, success_response};

/// One field placement, as posted by the layout editor. Coordinates are
/// pixel values in the editor's rendering space.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub field_type: crate::entities::FieldKind,
    pub name: String,
    pub label: Option<String>,
    #[serde(default = "default_page")]
    pub page_number: i32,
    pub pos_x: f64,
    pub pos_y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub required: bool,
}

fn default_page() -> i32 {
    1
}

impl FieldSpec {
    fn into_new_field(self) -> NewField {
        NewField {
            field_type: self.field_type,
            name: self.name,
            label: self.label,
            page_number: self.page_number,
            pos_x: self.pos_x,
            pos_y: self.pos_y,
            width: self.width,
            height: self.height,
            required: self.required,
        }
    }
}

/// Create the documents router
pub fn documents_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents).post(upload_document))
        .route("/:id", get(get_document).delete(delete_document))
        .route("/:id/fields", put(save_fields).get(list_fields))
        .route("/:id/publish", post(publish_document))
}

/// Upload a PDF document. The payload is validated by extension, declared
/// MIME type and the PDF magic bytes before anything touches disk.
#[utoipa::path(
    post,
    path = "/api/documents",
    responses(
        (status = 201, description = "Document stored with a fresh share token"),
        (status = 400, description = "Not a PDF", body = crate::errors::ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServiceError> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ServiceError::InvalidInput(format!("Malformed multipart request: {}", e))
    })? {
        match field.name() {
            Some("file") => {
                let original_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ServiceError::ValidationError("A PDF file is required".to_string())
                    })?;
                if !original_name.to_ascii_lowercase().ends_with(".pdf") {
                    return Err(ServiceError::ValidationError(
                        "Only PDF files are allowed".to_string(),
                    ));
                }
                if field.content_type() != Some("application/pdf") {
                    return Err(ServiceError::ValidationError(
                        "Only PDF files are allowed".to_string(),
                    ));
                }

                let data = field.bytes().await.map_err(|e| {
                    ServiceError::InvalidInput(format!("Failed to read document upload: {}", e))
                })?;
                if data.len() > state.config.max_upload_bytes {
                    return Err(ServiceError::PayloadTooLarge(
                        "Document exceeds the upload size limit".to_string(),
                    ));
                }
                if !is_pdf_payload(&data) {
                    return Err(ServiceError::ValidationError(
                        "File content is not a valid PDF".to_string(),
                    ));
                }

                file = Some((original_name, data.to_vec()));
            }
            Some("title") => {
                title = Some(field.text().await.map_err(|e| {
                    ServiceError::InvalidInput(format!("Malformed multipart request: {}", e))
                })?)
            }
            Some("description") => {
                description = Some(field.text().await.map_err(|e| {
                    ServiceError::InvalidInput(format!("Malformed multipart request: {}", e))
                })?)
            }
            _ => {}
        }
    }

    let (original_name, data) =
        file.ok_or_else(|| ServiceError::ValidationError("A PDF file is required".to_string()))?;

    let stored_name = UploadStore::random_name("document", &original_name);
    state.services.document_store.save(&stored_name, &data).await?;

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| original_name.trim_end_matches(".pdf").to_string());

    let created = state
        .services
        .documents
        .create(NewDocument {
            title,
            description: description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            stored_name: stored_name.clone(),
            original_name,
            file_size: data.len() as i64,
        })
        .await;

    match created {
        Ok(doc) => Ok(created_response(doc)),
        Err(err) => {
            state.services.document_store.remove_quiet(&stored_name).await;
            Err(err)
        }
    }
}

/// List documents, newest first
#[utoipa::path(
    get,
    path = "/api/documents",
    responses((status = 200, description = "All documents, newest first")),
    tag = "documents"
)]
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let documents = state.services.documents.list().await?;
    Ok(success_response(documents))
}

/// Get a document with its field layout and signature
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document detail"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let doc = state
        .services
        .documents
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Document not found".to_string()))?;
    let fields = state.services.documents.fields(id).await?;
    let signature = state.services.documents.signature(id).await?;

    Ok(success_response(serde_json::json!({
        "document": doc,
        "fields": fields,
        "signature": signature,
    })))
}

/// Replace the document's field layout
#[utoipa::path(
    put,
    path = "/api/documents/{id}/fields",
    params(("id" = i32, Path, description = "Document ID")),
    request_body = Vec<FieldSpec>,
    responses(
        (status = 200, description = "Layout saved"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Document no longer editable", body = crate::errors::ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn save_fields(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    axum::Json(fields): axum::Json<Vec<FieldSpec>>,
) -> Result<impl IntoResponse, ServiceError> {
    let saved = state
        .services
        .documents
        .replace_fields(id, fields.into_iter().map(FieldSpec::into_new_field).collect())
        .await?;
    Ok(success_response(saved))
}

/// List the document's fields in layout order
#[utoipa::path(
    get,
    path = "/api/documents/{id}/fields",
    params(("id" = i32, Path, description = "Document ID")),
    responses((status = 200, description = "Fields in layout order")),
    tag = "documents"
)]
pub async fn list_fields(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    // 404 for unknown documents rather than an empty list
    state
        .services
        .documents
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Document not found".to_string()))?;

    let fields = state.services.documents.fields(id).await?;
    Ok(success_response(fields))
}

/// Publish the document, making its share link signable
#[utoipa::path(
    post,
    path = "/api/documents/{id}/publish",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document is ready for signing"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already signed or expired", body = crate::errors::ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn publish_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let doc = state.services.documents.publish(id).await?;
    Ok(success_response(doc))
}

/// Delete a document with its fields and signature
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let stored_name = state.services.documents.delete(id).await?;
    state.services.document_store.remove_quiet(&stored_name).await;
    Ok(message_response("Document deleted successfully"))
}
