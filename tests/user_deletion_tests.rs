// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for user deletion.
//!
//! Deletion removes the profile first and then the user's logs, with no
//! rollback.

use axum::http::StatusCode;
use serde_json::json;
use std::collections::HashSet;

mod common;

#[tokio::test]
async fn test_admin_delete_cascades_to_logs() {
    let app = common::create_test_app();
    let (admin, _) = app.create_admin().await;
    let (kim, kim_id) = app.sign_up("kim", "athlete").await;
    let (lee, lee_id) = app.sign_up("lee", "athlete").await;

    for date in ["2024-06-01", "2024-06-02", "2024-06-03"] {
        app.put_log(&kim, date, json!({"cardio": 10})).await;
    }
    app.put_log(&lee, "2024-06-01", json!({"skill": 5})).await;

    let response = app
        .send("DELETE", &format!("/api/admin/users/{kim_id}"), Some(&admin), None)
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());

    let body = response.json();
    assert_eq!(body["user_id"], kim_id.as_str());
    assert_eq!(body["deleted_logs"], 3);

    assert!(app.state.users.get_user(&kim_id).await.unwrap().is_none());
    assert_eq!(app.store.log_owners(), HashSet::from([lee_id]));
}

#[tokio::test]
async fn test_deleted_user_is_signed_out() {
    let app = common::create_test_app();
    let (admin, _) = app.create_admin().await;
    let (kim, kim_id) = app.sign_up("kim", "athlete").await;

    app.send("DELETE", &format!("/api/admin/users/{kim_id}"), Some(&admin), None)
        .await;

    let response = app.send("GET", "/api/me", Some(&kim), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // The identity account survives, but without a profile it cannot sign in.
    let response = app
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "kim@example.com", "password": "secret1"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_partial_cascade_failure_leaves_orphans() {
    let app = common::create_test_app();
    let (admin, _) = app.create_admin().await;
    let (kim, kim_id) = app.sign_up("kim", "athlete").await;

    for date in ["2024-06-01", "2024-06-02", "2024-06-03"] {
        app.put_log(&kim, date, json!({"cardio": 10})).await;
    }
    app.store.fail_log_deletes([format!("{kim_id}_2024-06-02")]);

    let response = app
        .send("DELETE", &format!("/api/admin/users/{kim_id}"), Some(&admin), None)
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

    // Profile is gone; only the failing log remains.
    assert!(app.state.users.get_user(&kim_id).await.unwrap().is_none());
    let remaining: Vec<String> = app
        .state
        .logs
        .fetch_logs_for_user(&kim_id)
        .await
        .unwrap()
        .into_iter()
        .map(|log| log.id)
        .collect();
    assert_eq!(remaining, [format!("{kim_id}_2024-06-02")]);

    // Orphans can be cleaned up once the store recovers.
    app.store.clear_failures();
    let deleted = app.state.logs.delete_all_logs_for_user(&kim_id).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(app.store.log_count(), 0);
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = common::create_test_app();
    let (admin, admin_id) = app.create_admin().await;

    let response = app
        .send("DELETE", &format!("/api/admin/users/{admin_id}"), Some(&admin), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.state.users.get_user(&admin_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_unknown_user() {
    let app = common::create_test_app();
    let (admin, _) = app.create_admin().await;

    let response = app
        .send("DELETE", "/api/admin/users/no-such-user", Some(&admin), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
