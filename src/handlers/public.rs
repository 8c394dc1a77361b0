use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use utoipa::ToSchema;

use crate::entities::DocumentStatus;
use crate::errors::ServiceError;
use crate::services::documents::NewDocumentSignature;
use crate::services::notifications::escape_html;
use crate::AppState;

use super::common::success_response;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSignRequest {
    pub signature_data: String,
    pub signer_name: String,
    pub signer_email: Option<String>,
    #[serde(default)]
    pub field_values: JsonValue,
}

/// Routes reachable with nothing but a share token.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/work-order/:token", get(work_order_page))
        .route("/api/work-order-data/:token", get(work_order_data))
        .route("/sign/:token", get(document_page))
        .route("/api/document-data/:token", get(document_data))
        .route("/api/sign/:token", post(sign_document))
}

/// Public work-order view: the signature page while pending, the
/// confirmation page once a signature exists.
pub async fn work_order_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let Some(detail) = state.services.work_orders.get_by_token(&token).await? else {
        return Ok((StatusCode::NOT_FOUND, Html(not_found_page("找不到維修單"))));
    };

    let order = &detail.order;
    let body = if let Some(signature) = &detail.signature {
        page(
            &format!("維修單確認 - {}", order.work_order_number),
            &format!(
                "<h1>維修單已確認</h1>\
                 <p>維修單號：<strong>{}</strong></p>\
                 <p>簽名人員:{}</p>\
                 <p>確認時間:{}</p>",
                escape_html(&order.work_order_number),
                escape_html(signature.signer_name.as_deref().unwrap_or("未提供")),
                signature.signed_at.format("%Y-%m-%d %H:%M:%S"),
            ),
        )
    } else {
        let location: Vec<&str> = [
            order.building.as_deref(),
            order.floor.as_deref(),
            order.unit.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        page(
            &format!("維修單簽名 - {}", order.work_order_number),
            &format!(
                "<h1>維修單簽名確認</h1>\
                 <p>維修單號：<strong>{}</strong></p>\
                 <p>日期:{}</p>\
                 <p>案場:{}</p>\
                 <p>位置:{}</p>\
                 <p>維修原因:{}</p>\
                 <div id=\"signature-pad\" data-token=\"{}\"></div>",
                escape_html(&order.work_order_number),
                escape_html(&order.date),
                escape_html(order.site_name.as_deref().unwrap_or("-")),
                escape_html(&location.join(" / ")),
                escape_html(order.reason.as_deref().unwrap_or("-")),
                escape_html(&order.unique_link),
            ),
        )
    };

    Ok((StatusCode::OK, Html(body)))
}

/// JSON data behind the public work-order view
#[utoipa::path(
    get,
    path = "/api/work-order-data/{token}",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Work order with photos and signature"),
        (status = 404, description = "Unknown token", body = crate::errors::ErrorResponse)
    ),
    tag = "public"
)]
pub async fn work_order_data(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .work_orders
        .get_by_token(&token)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Work order not found".to_string()))?;

    Ok(success_response(detail))
}

/// Public document signing page
pub async fn document_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let Some(doc) = state.services.documents.get_by_token(&token).await? else {
        return Ok((StatusCode::NOT_FOUND, Html(not_found_page("找不到指定的文件"))));
    };

    let body = match doc.status {
        DocumentStatus::Signed => {
            let signature = state.services.documents.signature(doc.id).await?;
            let (signer, signed_at) = signature
                .map(|s| (s.signer_name, s.signed_at.format("%Y-%m-%d %H:%M:%S").to_string()))
                .unwrap_or_else(|| ("未提供".to_string(), String::new()));
            page(
                &doc.title,
                &format!(
                    "<h1>文件已簽名</h1>\
                     <p>此文件已於 {} 完成簽名。</p>\
                     <p>簽名者：{}</p>",
                    escape_html(&signed_at),
                    escape_html(&signer),
                ),
            )
        }
        DocumentStatus::Expired => page(
            &doc.title,
            "<h1>連結已過期</h1><p>此文件的簽名連結已過期，請聯繫文件提供者。</p>",
        ),
        DocumentStatus::Pending => page(
            &doc.title,
            "<h1>文件尚未開放簽名</h1><p>此文件尚未完成設定，請稍後再試。</p>",
        ),
        DocumentStatus::Ready => page(
            &doc.title,
            &format!(
                "<h1>{}</h1>\
                 {}\
                 <div id=\"pdf-viewer\" data-token=\"{}\"></div>\
                 <div id=\"signature-pad\"></div>",
                escape_html(&doc.title),
                doc.description
                    .as_deref()
                    .map(|d| format!("<p>{}</p>", escape_html(d)))
                    .unwrap_or_default(),
                escape_html(&doc.unique_id),
            ),
        ),
    };

    Ok((StatusCode::OK, Html(body)))
}

/// JSON data behind the public document view: the document, its field
/// layout, and the signature once present.
#[utoipa::path(
    get,
    path = "/api/document-data/{token}",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Document with fields and signature"),
        (status = 404, description = "Unknown token", body = crate::errors::ErrorResponse)
    ),
    tag = "public"
)]
pub async fn document_data(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let doc = state
        .services
        .documents
        .get_by_token(&token)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Document not found".to_string()))?;

    let fields = state.services.documents.fields(doc.id).await?;
    let signature = state.services.documents.signature(doc.id).await?;

    Ok(success_response(json!({
        "document": doc,
        "fields": fields,
        "signature": signature,
    })))
}

/// Submit the signature for a published document
#[utoipa::path(
    post,
    path = "/api/sign/{token}",
    params(("token" = String, Path, description = "Share token")),
    request_body = DocumentSignRequest,
    responses(
        (status = 200, description = "Document signed"),
        (status = 404, description = "Unknown token", body = crate::errors::ErrorResponse),
        (status = 409, description = "Not signable in its current state", body = crate::errors::ErrorResponse)
    ),
    tag = "public"
)]
pub async fn sign_document(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<DocumentSignRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let saved = state
        .services
        .documents
        .sign(
            &token,
            NewDocumentSignature {
                data: payload.signature_data,
                signer_name: payload.signer_name,
                signer_email: payload.signer_email,
                field_values: if payload.field_values.is_null() {
                    json!({})
                } else {
                    payload.field_values
                },
            },
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": saved,
        "message": "Document signed successfully",
    })))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"zh-TW\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{}</title>\n</head>\n<body>\n<div class=\"container\">{}</div>\n</body>\n</html>\n",
        escape_html(title),
        body
    )
}

fn not_found_page(message: &str) -> String {
    page("找不到頁面", &format!("<h1>{}</h1>", escape_html(message)))
}
