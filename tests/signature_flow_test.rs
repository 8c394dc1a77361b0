//! The signature capture flow: the pending → confirmed transition, the
//! explicit re-sign policy, email best-effort behavior, and the public
//! token-addressed endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{json_body, signature_data_url, text_body, MultipartBody, TestApp};
use serde_json::json;

async fn create_order(app: &TestApp) -> (i64, String) {
    let form = MultipartBody::new()
        .text("date", "2024-01-01")
        .text("siteName", "Site A")
        .text("reason", "漏水")
        .text("amount", "500");
    let body = json_body(app.request_multipart("/api/work-orders", &form).await).await;
    (
        body["data"]["id"].as_i64().unwrap(),
        body["data"]["uniqueLink"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn signing_confirms_the_order_without_an_email() {
    let app = TestApp::new().await;
    let (id, _) = create_order(&app).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/work-orders/{}/signature", id),
            Some(json!({
                "signatureData": signature_data_url(),
                "signerName": "陳先生",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Work order signed successfully");
    assert_eq!(body["data"]["signerName"], "陳先生");

    let order = json_body(
        app.request(Method::GET, &format!("/api/work-orders/{}", id), None)
            .await,
    )
    .await;
    assert_eq!(order["data"]["status"], "confirmed");
    assert_eq!(order["data"]["signature"]["signerName"], "陳先生");
}

#[tokio::test]
async fn second_signature_is_rejected_and_nothing_changes() {
    let app = TestApp::new().await;
    let (id, _) = create_order(&app).await;

    let sign = |name: &str| {
        json!({
            "signatureData": signature_data_url(),
            "signerName": name,
        })
    };

    let response = app
        .request(
            Method::POST,
            &format!("/api/work-orders/{}/signature", id),
            Some(sign("第一位")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            &format!("/api/work-orders/{}/signature", id),
            Some(sign("第二位")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Work order already signed");

    // Still exactly the first signature
    let order = json_body(
        app.request(Method::GET, &format!("/api/work-orders/{}", id), None)
            .await,
    )
    .await;
    assert_eq!(order["data"]["status"], "confirmed");
    assert_eq!(order["data"]["signature"]["signerName"], "第一位");
}

#[tokio::test]
async fn mail_failure_never_rejects_the_signature() {
    let app = TestApp::new().await;
    let (id, _) = create_order(&app).await;

    // The test SMTP endpoint is unreachable; the send fails and is swallowed.
    let response = app
        .request(
            Method::POST,
            &format!("/api/work-orders/{}/signature", id),
            Some(json!({
                "signatureData": signature_data_url(),
                "signerName": "陳先生",
                "signerEmail": "chen@example.com",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let order = json_body(
        app.request(Method::GET, &format!("/api/work-orders/{}", id), None)
            .await,
    )
    .await;
    assert_eq!(order["data"]["status"], "confirmed");
}

#[tokio::test]
async fn signature_payload_is_validated() {
    let app = TestApp::new().await;
    let (id, _) = create_order(&app).await;

    for bad in [
        json!({ "signatureData": "not a data url" }),
        json!({ "signatureData": "data:text/plain;base64,aGk=" }),
        json!({ "signatureData": "data:image/png;base64,%%%" }),
    ] {
        let response = app
            .request(
                Method::POST,
                &format!("/api/work-orders/{}/signature", id),
                Some(bad),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // Unknown order
    let response = app
        .request(
            Method::POST,
            "/api/work-orders/99999/signature",
            Some(json!({ "signatureData": signature_data_url() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_data_endpoint_uses_the_token() {
    let app = TestApp::new().await;
    let (_, token) = create_order(&app).await;

    let response = app
        .request(Method::GET, &format!("/api/work-order-data/{}", token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["uniqueLink"], token.as_str());

    let response = app
        .request(
            Method::GET,
            "/api/work-order-data/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body, json!({ "success": false, "error": "Work order not found" }));
}

#[tokio::test]
async fn public_page_switches_to_confirmation_after_signing() {
    let app = TestApp::new().await;
    let (id, token) = create_order(&app).await;

    let page = text_body(
        app.request(Method::GET, &format!("/work-order/{}", token), None)
            .await,
    )
    .await;
    assert!(page.contains("維修單簽名確認"));

    app.request(
        Method::POST,
        &format!("/api/work-orders/{}/signature", id),
        Some(json!({ "signatureData": signature_data_url(), "signerName": "陳先生" })),
    )
    .await;

    let page = text_body(
        app.request(Method::GET, &format!("/work-order/{}", token), None)
            .await,
    )
    .await;
    assert!(page.contains("維修單已確認"));
    assert!(page.contains("陳先生"));

    // Unknown token renders the 404 page
    let response = app
        .request(Method::GET, "/work-order/unknown-token", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
