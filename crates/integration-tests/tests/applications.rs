//! End-to-end tests for merchant application submission and catalog reads.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, StatusCode};
use serde_json::json;

use rock_skimmer_integration_tests::TestApp;

#[tokio::test]
async fn test_submission_creates_merchant_rock_and_review() {
    let app = TestApp::new();
    let submitted = app.submit_application("  Pebble Co ", "Pebble@Rocks.example").await;

    assert_eq!(submitted["merchant"]["name"], "Pebble Co");
    assert_eq!(submitted["merchant"]["email"], "pebble@rocks.example");
    assert_eq!(submitted["merchant"]["is_approved"], false);
    assert_eq!(submitted["rock"]["name"], "Pebble Co's Default Rock");
    assert_eq!(submitted["rock"]["is_greenlisted"], false);
    assert_eq!(submitted["review"]["status"], "pending");
    assert_eq!(submitted["review"]["rock_id"], submitted["rock"]["id"]);
    assert_eq!(
        submitted["review"]["merchant_application_id"],
        submitted["merchant"]["id"]
    );

    let merchants = app.get("/api/merchants").await.json();
    assert_eq!(merchants.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let app = TestApp::new();
    app.submit_application("Original", "dupe@rocks.example").await;

    let response = app
        .post_json(
            "/api/applications",
            &json!({
                "name": "Copycat",
                "email": "DUPE@rocks.example",
                "website": "https://copycat.example",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response.json()["error"]
            .as_str()
            .unwrap()
            .contains("already exists")
    );
    assert_eq!(app.get("/api/merchants").await.json().as_array().unwrap().len(), 1);
    assert_eq!(app.get("/api/rocks").await.json().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_submissions_rejected() {
    let app = TestApp::new();

    for body in [
        json!({ "name": "", "email": "a@rocks.example", "website": "https://a.example" }),
        json!({ "name": "A", "email": "not-an-email", "website": "https://a.example" }),
        json!({ "name": "A", "email": "a@rocks.example", "website": "ftp://a.example" }),
    ] {
        let response = app.post_json("/api/applications", &body).await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    }

    assert!(app.get("/api/merchants").await.json().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreadable_bodies_get_json_errors() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/applications",
            &json!({ "name": "A", "email": "a@rocks.example" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.json()["error"].as_str().unwrap().contains("website"));

    let response = app
        .send(
            Method::POST,
            "/api/applications",
            "application/json",
            Body::from("{not json"),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["error"].is_string());

    let response = app
        .send(Method::POST, "/api/applications", "text/plain", Body::from("{}"))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["error"].is_string());

    assert!(app.get("/api/merchants").await.json().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_filtered_lists_are_subsets() {
    let app = TestApp::new();
    let approved = app.submit_application("Approved", "yes@rocks.example").await;
    app.submit_application("Pending", "maybe@rocks.example").await;
    app.login_as_admin().await;

    let review_id = approved["review"]["id"].as_i64().unwrap();
    let response = app
        .post_json(
            &format!("/api/admin/applications/{review_id}/status"),
            &json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let all_rocks = app.get("/api/rocks").await.json();
    let green_rocks = app.get("/api/rocks?greenlisted_only=true").await.json();
    let all_rocks = all_rocks.as_array().unwrap();
    let green_rocks = green_rocks.as_array().unwrap();
    assert_eq!(all_rocks.len(), 2);
    assert_eq!(green_rocks.len(), 1);
    assert!(green_rocks.iter().all(|rock| all_rocks.contains(rock)));

    let all_merchants = app.get("/api/merchants").await.json();
    let approved_merchants = app.get("/api/merchants?approved_only=true").await.json();
    let all_merchants = all_merchants.as_array().unwrap();
    let approved_merchants = approved_merchants.as_array().unwrap();
    assert_eq!(approved_merchants.len(), 1);
    assert!(approved_merchants.iter().all(|m| all_merchants.contains(m)));
    assert!(approved_merchants.iter().all(|m| m["is_approved"] == true));
}

#[tokio::test]
async fn test_admin_can_add_rock_that_mirrors_approval() {
    let app = TestApp::new();
    let submitted = app.submit_application("Quarry", "quarry@rocks.example").await;
    let merchant_id = submitted["merchant"]["id"].as_i64().unwrap();
    app.login_as_admin().await;

    let response = app
        .post_json(
            &format!("/api/admin/merchants/{merchant_id}/rocks"),
            &json!({ "name": "River Pebble", "description": "Polished by water" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["is_greenlisted"], false);

    let response = app
        .post_json("/api/admin/merchants/999/rocks", &json!({ "name": "Ghost" }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let detail = app
        .get(&format!(
            "/api/admin/applications/{}",
            submitted["review"]["id"]
        ))
        .await
        .json();
    assert_eq!(detail["rocks"].as_array().unwrap().len(), 2);

    let page = app.get("/rocks?all=true").await.text();
    assert!(page.contains("River Pebble"));
    assert!(!page.contains(r#"src="""#));
}

#[tokio::test]
async fn test_apply_form_redirects_or_rerenders() {
    let app = TestApp::new();

    let page = app.get("/apply").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.text().contains("Merchant Application"));

    let response = app
        .post_form(
            "/apply",
            "name=Skimmers&email=skim%40rocks.example&website=https%3A%2F%2Fskim.example",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/apply?submitted=true"));

    let response = app
        .post_form(
            "/apply",
            "name=Skimmers+Again&email=skim%40rocks.example&website=https%3A%2F%2Fskim.example",
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(html.contains("notice error"));
    assert!(html.contains("Skimmers Again"), "entered values are kept");
}

#[tokio::test]
async fn test_catalog_pages_toggle_visibility() {
    let app = TestApp::new();
    app.submit_application("Hidden Quarry", "hidden@rocks.example").await;

    let page = app.get("/rocks").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(!page.text().contains("Hidden Quarry"));

    let page = app.get("/rocks?all=true").await;
    assert!(page.text().contains("Hidden Quarry"));

    let page = app.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.text().contains("Rock Skimmer"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ok");

    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}
