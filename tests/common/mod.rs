// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use honn_training::config::Config;
use honn_training::db::{DocumentStore, FirestoreDb, MemoryStore};
use honn_training::middleware::auth::create_jwt;
use honn_training::models::{NewProfile, Role};
use honn_training::routes::create_router;
use honn_training::services::{IdentityProvider, MemoryIdentity};
use honn_training::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Router plus handles on its in-memory backends.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: MemoryStore,
    pub identity: MemoryIdentity,
}

/// Create a test app with in-memory store and identity provider.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_frontend_url("http://localhost:5173")
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> TestApp {
    let config = Config {
        frontend_url: frontend_url.to_string(),
        ..Config::test_default()
    };
    let store = MemoryStore::new();
    let identity = MemoryIdentity::new(b"test-identity-secret");

    let shared_store: Arc<dyn DocumentStore> = Arc::new(store.clone());
    let shared_identity: Arc<dyn IdentityProvider> = Arc::new(identity.clone());
    let state = Arc::new(AppState::new(config, shared_store, shared_identity));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        identity,
    }
}

/// A response with its body collected.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {:?}", self.text()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `details` of an error body.
    pub fn details(&self) -> String {
        self.json()["details"].as_str().unwrap_or_default().to_string()
    }
}

impl TestApp {
    /// Send a request, optionally authenticated with a bearer token and a JSON body.
    #[allow(dead_code)]
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sign up through the API and return the session token and user id.
    #[allow(dead_code)]
    pub async fn sign_up(&self, name: &str, role: &str) -> (String, String) {
        let response = self
            .send(
                "POST",
                "/auth/signup",
                None,
                Some(json!({
                    "email": format!("{name}@example.com"),
                    "password": "secret1",
                    "name": name,
                    "phone": "010-1234-5678",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());

        let token = session_token(&response.headers)
            .unwrap_or_else(|| panic!("missing session cookie: {:?}", response.headers));
        let id = response.json()["id"].as_str().unwrap().to_string();
        (token, id)
    }

    /// Admins cannot sign up; provision one directly.
    #[allow(dead_code)]
    pub async fn create_admin(&self) -> (String, String) {
        let principal = self
            .identity
            .sign_up("admin@example.com", "secret1")
            .await
            .unwrap();
        self.state
            .users
            .create_user_profile(
                &principal.uid,
                NewProfile {
                    name: "관리자".to_string(),
                    phone: "010-0000-0000".to_string(),
                    email: principal.email,
                    role: Role::Admin,
                },
            )
            .await
            .unwrap();

        let token = create_jwt(&principal.uid, &self.state.config.jwt_signing_key).unwrap();
        (token, principal.uid)
    }

    /// Record a log through the API.
    #[allow(dead_code)]
    pub async fn put_log(&self, token: &str, date: &str, trainings: Value) -> TestResponse {
        self.send(
            "PUT",
            &format!("/api/logs/{date}"),
            Some(token),
            Some(json!({ "trainings": trainings })),
        )
        .await
    }
}

/// Value of the `honn_token` cookie set by a response, if any.
#[allow(dead_code)]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("honn_token="))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}
