//! End-to-end tests for sessions, roles, and the developer admin toggle.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use rock_skimmer_core::{AdminRole, UserId};
use rock_skimmer_integration_tests::{TEST_PASSWORD, TestApp, test_config};
use rock_skimmer_server::db::{FailurePoint, Store};

const ADMIN_ENDPOINTS: [&str; 2] = ["/api/admin/applications", "/api/admin/applications/1"];

#[tokio::test]
async fn test_anonymous_requests_are_unauthorized() {
    let app = TestApp::new();
    app.submit_application("Anon", "anon@rocks.example").await;

    for uri in ADMIN_ENDPOINTS {
        assert_eq!(app.get(uri).await.status, StatusCode::UNAUTHORIZED, "{uri}");
    }
    let response = app
        .post_json(
            "/api/admin/applications/1/status",
            &json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["error"], "Authentication required");
    assert!(!app.merchant_approved("anon@rocks.example").await);

    let page = app.get("/admin").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_users_without_admin_role_are_forbidden() {
    let app = TestApp::new();
    app.create_user("plain@rocks.example", None).await;
    app.create_user("viewer@rocks.example", Some(AdminRole::Viewer)).await;

    for email in ["plain@rocks.example", "viewer@rocks.example"] {
        app.forget_session();
        assert_eq!(app.login(email).await.status, StatusCode::OK);
        for uri in ADMIN_ENDPOINTS {
            assert_eq!(app.get(uri).await.status, StatusCode::FORBIDDEN, "{email} {uri}");
        }
        assert_eq!(app.get("/admin").await.status, StatusCode::FORBIDDEN);
        let response = app.get("/api/admin/applications").await;
        assert_eq!(response.json()["error"], "Administrator access required");
    }
}

#[tokio::test]
async fn test_session_reports_role_and_revocation_applies_immediately() {
    let app = TestApp::new();

    let session = app.get("/api/session").await.json();
    assert!(session["user"].is_null());
    assert_eq!(session["is_admin"], false);
    assert_eq!(session["admin_source"], "none");

    app.login_as_admin().await;
    let session = app.get("/api/session").await.json();
    assert_eq!(session["user"]["email"], "moderator@rocks.example");
    assert_eq!(session["is_admin"], true);
    assert_eq!(session["admin_source"], "role");
    assert_eq!(
        app.get("/api/admin/applications").await.status,
        StatusCode::OK
    );

    let user_id = session["user"]["id"].as_i64().unwrap();
    let user_id = UserId::new(i32::try_from(user_id).unwrap());
    assert!(app.store.revoke_role(user_id).await.unwrap());

    assert_eq!(
        app.get("/api/admin/applications").await.status,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_role_lookup_failure_means_not_admin() {
    let app = TestApp::new();
    app.login_as_admin().await;

    app.store.fail_on(FailurePoint::RoleLookup);
    let session = app.get("/api/session").await.json();
    assert_eq!(session["is_admin"], false);
    assert_eq!(
        app.get("/api/admin/applications").await.status,
        StatusCode::FORBIDDEN
    );

    app.store.clear_failures();
    assert_eq!(
        app.get("/api/admin/applications").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = TestApp::new();
    app.create_user("someone@rocks.example", None).await;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "email": "someone@rocks.example", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "email": "not an email", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.login("someone@rocks.example").await.status, StatusCode::OK);
    assert!(!app.get("/api/session").await.json()["user"].is_null());

    let response = app.post_json("/api/auth/logout", &json!({})).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(app.get("/api/session").await.json()["user"].is_null());
}

#[tokio::test]
async fn test_register_validates_and_rejects_duplicates() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({ "email": "new@rocks.example", "password": "short" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({ "email": "new@rocks.example", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        app.get("/api/session").await.json()["user"]["email"],
        "new@rocks.example"
    );

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({ "email": "NEW@rocks.example", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_html_login_redirects() {
    let app = TestApp::new();
    app.create_user("html@rocks.example", Some(AdminRole::Admin)).await;

    let response = app
        .post_form("/auth/login", "email=html%40rocks.example&password=nope-nope")
        .await;
    assert_eq!(response.location(), Some("/auth/login?error=credentials"));

    let page = app.get("/auth/login?error=credentials").await;
    assert!(page.text().contains("Invalid email or password"));

    let response = app
        .post_form(
            "/auth/login",
            &format!("email=html%40rocks.example&password={TEST_PASSWORD}"),
        )
        .await;
    assert_eq!(response.location(), Some("/admin"));
    assert_eq!(app.get("/admin").await.status, StatusCode::OK);

    let response = app.post_form("/auth/logout", "").await;
    assert_eq!(response.location(), Some("/"));
    assert_eq!(app.get("/admin").await.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_dev_override_ignored_unless_enabled() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/session/admin-override", &json!({ "is_admin": true }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.post_form("/dev/admin-toggle", "admin=on").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    assert_eq!(app.get("/api/session").await.json()["is_admin"], false);
    assert_eq!(
        app.get("/api/admin/applications").await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_dev_override_toggles_admin_when_enabled() {
    let app = TestApp::with_config({
        let mut config = test_config();
        config.dev_controls = true;
        config
    });

    let response = app
        .post_json("/api/session/admin-override", &json!({ "is_admin": true }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let viewer = response.json();
    assert_eq!(viewer["is_admin"], true);
    assert_eq!(viewer["admin_source"], "dev_override");
    assert_eq!(
        app.get("/api/admin/applications").await.status,
        StatusCode::OK
    );

    // Forcing it off wins over a real role too.
    app.forget_session();
    app.login_as_admin().await;
    let response = app.post_form("/dev/admin-toggle", "admin=off").await;
    assert_eq!(response.location(), Some("/"));
    assert_eq!(
        app.get("/api/admin/applications").await.status,
        StatusCode::FORBIDDEN
    );

    let response = app.post_form("/dev/admin-toggle", "admin=clear").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let session = app.get("/api/session").await.json();
    assert_eq!(session["is_admin"], true);
    assert_eq!(session["admin_source"], "role");
}
