//! Integration tests for the work-order API: creation with photos, ticket
//! number allocation, filtering, CSV export and delete cascade.

mod common;

use axum::http::{Method, StatusCode};
use common::{json_body, text_body, tiny_png, MultipartBody, TestApp};
use uuid::Uuid;

fn create_form(date: &str, site: &str, amount: &str) -> MultipartBody {
    MultipartBody::new()
        .text("date", date)
        .text("siteName", site)
        .text("building", "A棟")
        .text("floor", "3F")
        .text("unit", "301")
        .text("reason", "漏水")
        .text("workerName", "王小明")
        .text("amount", amount)
}

#[tokio::test]
async fn create_with_photos_returns_ticket_and_share_link() {
    let app = TestApp::new().await;

    let form = create_form("2024-01-01", "Site A", "500")
        .file("photos", "before.png", "image/png", &tiny_png())
        .file("photos", "after.png", "image/png", &tiny_png());

    let response = app.request_multipart("/api/work-orders", &form).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);

    let data = &body["data"];
    let number = data["workOrderNumber"].as_str().unwrap();
    assert!(number.starts_with("WO20240101"));
    assert_eq!(number.len(), "WO20240101".len() + 3);
    assert!(number["WO20240101".len()..].chars().all(|c| c.is_ascii_digit()));

    let link = data["uniqueLink"].as_str().unwrap();
    assert!(Uuid::parse_str(link).is_ok());
    assert_eq!(
        body["shareUrl"].as_str().unwrap(),
        format!("/work-order/{}", link)
    );

    assert_eq!(data["status"], "pending");
    assert_eq!(data["amount"], 500.0);
    assert_eq!(data["photos"].as_array().unwrap().len(), 2);
    assert!(data["signature"].is_null());

    // The photos landed on disk under their randomized names
    for photo in data["photos"].as_array().unwrap() {
        let stored = photo["photoPath"].as_str().unwrap();
        assert_ne!(stored, "before.png");
        let path = std::path::Path::new(&app.state.config.upload_dir).join(stored);
        assert!(path.exists());
    }
}

#[tokio::test]
async fn ticket_numbers_are_sequential_per_date_and_unique() {
    let app = TestApp::new().await;

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let response = app
            .request_multipart("/api/work-orders", &create_form("2024-01-01", "Site A", "0"))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        numbers.push(body["data"]["workOrderNumber"].as_str().unwrap().to_string());
    }

    assert_eq!(
        numbers,
        vec!["WO20240101001", "WO20240101002", "WO20240101003"]
    );

    // A different date starts its own sequence
    let response = app
        .request_multipart("/api/work-orders", &create_form("2024-02-01", "Site B", "0"))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["workOrderNumber"], "WO20240201001");
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let app = TestApp::new().await;

    // Non-image attachment
    let form = create_form("2024-01-01", "Site A", "0").file(
        "photos",
        "notes.txt",
        "text/plain",
        b"not an image",
    );
    let response = app.request_multipart("/api/work-orders", &form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed amount
    let response = app
        .request_multipart(
            "/api/work-orders",
            &create_form("2024-01-01", "Site A", "five hundred"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed date
    let response = app
        .request_multipart(
            "/api/work-orders",
            &create_form("01/02/2024", "Site A", "0"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn list_applies_filters_and_orders_newest_first() {
    let app = TestApp::new().await;

    for (date, site) in [
        ("2024-01-01", "Riverside"),
        ("2024-01-15", "Hilltop"),
        ("2024-02-01", "Riverside West"),
    ] {
        let response = app
            .request_multipart("/api/work-orders", &create_form(date, site, "100"))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Unfiltered, newest created first
    let response = app.request(Method::GET, "/api/work-orders", None).await;
    let body = json_body(response).await;
    assert_eq!(body["total"], 3);
    let dates: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-02-01", "2024-01-15", "2024-01-01"]);

    // Site substring filter matches both Riverside sites
    let response = app
        .request(Method::GET, "/api/work-orders?siteName=Riverside", None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);

    // Inclusive date range
    let response = app
        .request(
            Method::GET,
            "/api/work-orders?dateFrom=2024-01-01&dateTo=2024-01-31",
            None,
        )
        .await;
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);

    // Status filter
    let response = app
        .request(Method::GET, "/api/work-orders?status=confirmed", None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["total"], 0);

    // Unknown status is a validation error
    let response = app
        .request(Method::GET, "/api/work-orders?status=bogus", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_by_id_and_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request_multipart("/api/work-orders", &create_form("2024-01-01", "Site A", "0"))
        .await;
    let created = json_body(response).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .request(Method::GET, &format!("/api/work-orders/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["id"], id);

    let response = app.request(Method::GET, "/api/work-orders/99999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Work order not found");
}

#[tokio::test]
async fn delete_cascades_photos_and_signature() {
    let app = TestApp::new().await;

    let form = create_form("2024-01-01", "Site A", "0").file(
        "photos",
        "before.png",
        "image/png",
        &tiny_png(),
    );
    let created = json_body(app.request_multipart("/api/work-orders", &form).await).await;
    let id = created["data"]["id"].as_i64().unwrap();
    let stored = created["data"]["photos"][0]["photoPath"]
        .as_str()
        .unwrap()
        .to_string();
    let photo_file = std::path::Path::new(&app.state.config.upload_dir).join(&stored);
    assert!(photo_file.exists());

    // Sign it so there is a signature row to cascade
    let response = app
        .request(
            Method::POST,
            &format!("/api/work-orders/{}/signature", id),
            Some(serde_json::json!({ "signatureData": common::signature_data_url() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::DELETE, &format!("/api/work-orders/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Gone from the API and from disk
    let response = app
        .request(Method::GET, &format!("/api/work-orders/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!photo_file.exists());

    // Deleting again is a 404
    let response = app
        .request(Method::DELETE, &format!("/api/work-orders/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn csv_export_matches_filtered_list() {
    let app = TestApp::new().await;

    for (date, site) in [("2024-01-01", "Site A"), ("2024-01-02", "Site B")] {
        app.request_multipart("/api/work-orders", &create_form(date, site, "500"))
            .await;
    }

    let response = app.request(Method::GET, "/api/work-orders/export", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let csv = text_body(response).await;
    assert!(csv.starts_with('\u{feff}'));
    // Header plus one row per record
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("\"WO20240101001\""));
    assert!(csv.contains("\"500\""));
    assert!(csv.contains("\"待確認\""));

    // Filtered export row count equals filtered list count
    let response = app
        .request(Method::GET, "/api/work-orders/export?siteName=Site+A", None)
        .await;
    let csv = text_body(response).await;
    assert_eq!(csv.lines().count(), 2);
}

#[tokio::test]
async fn recent_sites_are_most_recently_used_first() {
    let app = TestApp::new().await;

    for site in ["First", "Second", "Third"] {
        app.request_multipart("/api/work-orders", &create_form("2024-01-01", site, "0"))
            .await;
    }
    // Reusing an old site moves it to the front
    app.request_multipart("/api/work-orders", &create_form("2024-01-02", "First", "0"))
        .await;

    let response = app
        .request(Method::GET, "/api/work-orders/sites/recent", None)
        .await;
    let body = json_body(response).await;
    let sites: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(sites, vec!["First", "Third", "Second"]);
}
