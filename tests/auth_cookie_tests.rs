// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! These tests verify the session cookie set at login and its removal on
//! logout carry matching attributes for localhost and production-style
//! frontends.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn set_cookie_headers(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn login_cookie(app: &common::TestApp) -> String {
    app.sign_up("kim", "athlete").await;
    let response = app
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "kim@example.com", "password": "secret1"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    find_cookie(&set_cookie_headers(&response.headers), "honn_token")
}

async fn logout_cookie(app: &common::TestApp) -> String {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, "honn_token=test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    find_cookie(&set_cookie_headers(response.headers()), "honn_token")
}

#[tokio::test]
async fn test_login_cookie_localhost_attributes() {
    let app = common::create_test_app_with_frontend_url("http://localhost:5173");
    let cookie = login_cookie(&app).await;

    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(!cookie.contains("Secure"));
    assert!(!cookie.contains("Domain="));
}

#[tokio::test]
async fn test_login_cookie_production_attributes() {
    let app = common::create_test_app_with_frontend_url("https://honn.example.com");
    let cookie = login_cookie(&app).await;

    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let app = common::create_test_app_with_frontend_url("http://localhost:5173");
    let cookie = logout_cookie(&app).await;

    assert!(cookie.starts_with("honn_token=;"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(!cookie.contains("Secure"));
    assert!(!cookie.contains("Domain="));
}

#[tokio::test]
async fn test_logout_cookie_removal_production_attributes() {
    let app = common::create_test_app_with_frontend_url("https://honn.example.com");
    let cookie = logout_cookie(&app).await;

    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_needs_no_session() {
    let app = common::create_test_app();
    let response = app.send("POST", "/auth/logout", Some("not-a-jwt"), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(set_cookie_headers(&response.headers).is_empty());
}
