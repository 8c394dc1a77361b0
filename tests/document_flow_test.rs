//! The PDF signature module: upload validation, field layout, the
//! pending → ready → signed lifecycle, and share-link expiry.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{json_body, signature_data_url, tiny_pdf, MultipartBody, TestApp};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use serde_json::json;
use worksign_api::entities::document;

async fn upload_document(app: &TestApp) -> (i64, String) {
    let form = MultipartBody::new()
        .text("title", "租賃契約")
        .text("description", "請於期限內完成簽名")
        .file("file", "contract.pdf", "application/pdf", &tiny_pdf());
    let response = app.request_multipart("/api/documents", &form).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    (
        body["data"]["id"].as_i64().unwrap(),
        body["data"]["uniqueId"].as_str().unwrap().to_string(),
    )
}

fn field_layout() -> serde_json::Value {
    json!([
        {
            "fieldType": "signature",
            "name": "tenant_signature",
            "label": "承租人簽名",
            "pageNumber": 1,
            "posX": 100.0,
            "posY": 500.0,
            "width": 200.0,
            "height": 80.0,
            "required": true
        },
        {
            "fieldType": "date",
            "name": "sign_date",
            "pageNumber": 1,
            "posX": 320.0,
            "posY": 500.0,
            "width": 120.0,
            "height": 40.0,
            "required": true
        }
    ])
}

#[tokio::test]
async fn upload_validates_the_payload() {
    let app = TestApp::new().await;

    // Wrong extension
    let form = MultipartBody::new().file("file", "contract.docx", "application/pdf", &tiny_pdf());
    let response = app.request_multipart("/api/documents", &form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Wrong declared MIME type
    let form = MultipartBody::new().file("file", "contract.pdf", "text/plain", &tiny_pdf());
    let response = app.request_multipart("/api/documents", &form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Right name and MIME, but not actually a PDF
    let form = MultipartBody::new().file(
        "file",
        "contract.pdf",
        "application/pdf",
        b"PK\x03\x04 this is a zip",
    );
    let response = app.request_multipart("/api/documents", &form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "File content is not a valid PDF");

    // Missing file entirely
    let form = MultipartBody::new().text("title", "空的");
    let response = app.request_multipart("/api/documents", &form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_stores_the_document_as_pending() {
    let app = TestApp::new().await;
    let (id, token) = upload_document(&app).await;

    let body = json_body(
        app.request(Method::GET, &format!("/api/documents/{}", id), None)
            .await,
    )
    .await;
    let doc = &body["data"]["document"];
    assert_eq!(doc["status"], "pending");
    assert_eq!(doc["title"], "租賃契約");
    assert_eq!(doc["originalName"], "contract.pdf");
    assert!(uuid::Uuid::parse_str(&token).is_ok());

    let stored = doc["filePath"].as_str().unwrap();
    assert!(std::path::Path::new(&app.state.config.document_dir)
        .join(stored)
        .exists());
}

#[tokio::test]
async fn field_layout_is_replaced_wholesale() {
    let app = TestApp::new().await;
    let (id, _) = upload_document(&app).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/documents/{}/fields", id),
            Some(field_layout()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Saving a new layout replaces the old one
    let response = app
        .request(
            Method::PUT,
            &format!("/api/documents/{}/fields", id),
            Some(json!([{
                "fieldType": "text",
                "name": "note",
                "posX": 10.0, "posY": 10.0, "width": 50.0, "height": 20.0
            }])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(
        app.request(Method::GET, &format!("/api/documents/{}/fields", id), None)
            .await,
    )
    .await;
    let fields = body["data"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["name"], "note");

    // Geometry is validated
    let response = app
        .request(
            Method::PUT,
            &format!("/api/documents/{}/fields", id),
            Some(json!([{
                "fieldType": "text",
                "name": "bad",
                "posX": 0.0, "posY": 0.0, "width": 0.0, "height": 20.0
            }])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signing_requires_publish_and_is_terminal() {
    let app = TestApp::new().await;
    let (id, token) = upload_document(&app).await;

    app.request(
        Method::PUT,
        &format!("/api/documents/{}/fields", id),
        Some(field_layout()),
    )
    .await;

    let sign_payload = json!({
        "signatureData": signature_data_url(),
        "signerName": "陳先生",
        "signerEmail": "chen@example.com",
        "fieldValues": { "sign_date": "2024-01-01" }
    });

    // Unpublished documents are not signable
    let response = app
        .request(
            Method::POST,
            &format!("/api/sign/{}", token),
            Some(sign_payload.clone()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Document is not ready for signing");

    // Publish, then signing without the required date field fails
    let response = app
        .request(Method::POST, &format!("/api/documents/{}/publish", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["status"], "ready");

    let response = app
        .request(
            Method::POST,
            &format!("/api/sign/{}", token),
            Some(json!({
                "signatureData": signature_data_url(),
                "signerName": "陳先生"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A complete submission succeeds
    let response = app
        .request(
            Method::POST,
            &format!("/api/sign/{}", token),
            Some(sign_payload.clone()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["signerName"], "陳先生");

    // The status flipped and never reverts; a second signature is rejected
    let body = json_body(
        app.request(Method::GET, &format!("/api/document-data/{}", token), None)
            .await,
    )
    .await;
    assert_eq!(body["data"]["document"]["status"], "signed");
    assert_eq!(body["data"]["signature"]["fieldValues"]["sign_date"], "2024-01-01");

    let response = app
        .request(
            Method::POST,
            &format!("/api/sign/{}", token),
            Some(sign_payload),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "Document already signed");
}

#[tokio::test]
async fn expired_share_links_are_refused() {
    let app = TestApp::new().await;
    let (id, token) = upload_document(&app).await;

    app.request(Method::POST, &format!("/api/documents/{}/publish", id), None)
        .await;

    // Age the document past the expiry window
    let doc = document::Entity::find_by_id(id as i32)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let mut model: document::ActiveModel = doc.into();
    model.created_at = Set(Utc::now() - Duration::days(40));
    model.update(app.state.db.as_ref()).await.unwrap();

    // Public access marks it expired
    let body = json_body(
        app.request(Method::GET, &format!("/api/document-data/{}", token), None)
            .await,
    )
    .await;
    assert_eq!(body["data"]["document"]["status"], "expired");

    let response = app
        .request(
            Method::POST,
            &format!("/api/sign/{}", token),
            Some(json!({
                "signatureData": signature_data_url(),
                "signerName": "陳先生"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(response).await["error"],
        "Document link has expired"
    );
}

#[tokio::test]
async fn unknown_tokens_and_ids_return_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/document-data/unknown", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Document not found");

    let response = app.request(Method::GET, "/api/documents/999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::POST, "/api/documents/999/publish", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_rows_and_file() {
    let app = TestApp::new().await;
    let (id, token) = upload_document(&app).await;

    let body = json_body(
        app.request(Method::GET, &format!("/api/documents/{}", id), None)
            .await,
    )
    .await;
    let stored = body["data"]["document"]["filePath"].as_str().unwrap().to_string();
    let file = std::path::Path::new(&app.state.config.document_dir).join(&stored);
    assert!(file.exists());

    let response = app
        .request(Method::DELETE, &format!("/api/documents/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(!file.exists());
    let response = app
        .request(Method::GET, &format!("/api/document-data/{}", token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
