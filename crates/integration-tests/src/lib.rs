//! End-to-end test harness for Rock Skimmer.
//!
//! [`TestApp`] builds the real router over a [`MemoryStore`] and the
//! in-memory session store, and drives it with `tower::ServiceExt::oneshot`.
//! It keeps the session cookie between requests like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rock-skimmer-integration-tests
//!
//! # Including the PostgreSQL-backed tests
//! ROCK_SKIMMER_DATABASE_URL=postgres://... cargo test -p rock-skimmer-integration-tests -- --ignored
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use rock_skimmer_core::{AdminRole, CascadeMode, Email};
use rock_skimmer_server::config::ServerConfig;
use rock_skimmer_server::db::{MemoryStore, Store};
use rock_skimmer_server::middleware::session;
use rock_skimmer_server::routes;
use rock_skimmer_server::services::AuthService;
use rock_skimmer_server::state::AppState;

/// Password used for every account the harness creates.
pub const TEST_PASSWORD: &str = "skipping-stones-42";

/// Configuration for tests: strict cascade, no dev controls, 60 s cache.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"),
        cascade_mode: CascadeMode::Strict,
        dev_controls: false,
        cache_ttl: Duration::from_secs(60),
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    /// The body as UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("response body is not UTF-8")
    }

    /// The `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// The router plus a handle on its store and a one-session cookie jar.
pub struct TestApp {
    pub store: MemoryStore,
    pub state: AppState,
    router: Router,
    cookie: Mutex<Option<String>>,
}

impl TestApp {
    /// App with [`test_config`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// App with a custom configuration.
    #[must_use]
    pub fn with_config(config: ServerConfig) -> Self {
        let store = MemoryStore::new();
        let session_layer = session::configure(
            tower_sessions::SessionManagerLayer::new(tower_sessions::MemoryStore::default()),
            &config,
        );
        let state = AppState::new(config, Arc::new(store.clone()));
        let router = routes::routes()
            .layer(session_layer)
            .with_state(state.clone());

        Self {
            store,
            state,
            router,
            cookie: Mutex::new(None),
        }
    }

    /// Send a request, carrying and updating the session cookie.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        content_type: &str,
        body: Body,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if !content_type.is_empty() {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookie) = self.cookie.lock().expect("cookie lock").clone() {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(body).expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default().to_string();
            let cleared = pair.ends_with('=');
            *self.cookie.lock().expect("cookie lock") = (!cleared).then_some(pair);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, "", Body::empty()).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            "application/json",
            Body::from(body.to_string()),
        )
        .await
    }

    /// Post an already-encoded `application/x-www-form-urlencoded` body.
    pub async fn post_form(&self, uri: &str, body: &str) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            "application/x-www-form-urlencoded",
            Body::from(body.to_owned()),
        )
        .await
    }

    /// Drop the session cookie.
    pub fn forget_session(&self) {
        *self.cookie.lock().expect("cookie lock") = None;
    }

    /// Create an account directly in the store, optionally with a role.
    pub async fn create_user(&self, email: &str, role: Option<AdminRole>) {
        let user = AuthService::new(&self.store)
            .register(email, TEST_PASSWORD)
            .await
            .expect("register user");
        if let Some(role) = role {
            self.store
                .grant_role(user.id, role)
                .await
                .expect("grant role");
        }
    }

    /// Log in through the API.
    pub async fn login(&self, email: &str) -> TestResponse {
        self.post_json(
            "/api/auth/login",
            &serde_json::json!({ "email": email, "password": TEST_PASSWORD }),
        )
        .await
    }

    /// Create an admin account and log in as it.
    pub async fn login_as_admin(&self) {
        let email = "moderator@rocks.example";
        self.create_user(email, Some(AdminRole::Admin)).await;
        let response = self.login(email).await;
        assert_eq!(response.status, StatusCode::OK, "admin login failed");
    }

    /// Submit an application through the API and return its JSON body.
    pub async fn submit_application(&self, name: &str, email: &str) -> Value {
        let response = self
            .post_json(
                "/api/applications",
                &serde_json::json!({
                    "name": name,
                    "email": email,
                    "website": "https://rocks.example",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()
    }

    /// Look up a merchant's approval flag straight from the store.
    pub async fn merchant_approved(&self, email: &str) -> bool {
        let email = Email::parse(email).expect("valid email");
        self.store
            .find_merchant_by_email(&email)
            .await
            .expect("store read")
            .expect("merchant exists")
            .is_approved
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
