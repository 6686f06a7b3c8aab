// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel: all users grouped by role, and account deletion.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Extension, Json, Router,
};
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::models::{Role, User};
use crate::routes::snapshot_events;
use crate::services::users::{group_by_role, RoleGroup};
use crate::services::Session;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/stream", get(stream_users))
        .route("/api/admin/users/{id}", delete(delete_user))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<RoleGroup>>> {
    session.require_role(&[Role::Admin])?;
    let users = state.users.list_all_users().await?;
    Ok(Json(group_by_role(&users)))
}

/// Live grouped user list over SSE.
async fn stream_users(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    session.require_role(&[Role::Admin])?;

    let subscription = state.users.subscribe_all_users(|err| {
        tracing::error!(error = %err, "Admin user stream ended");
    });
    let grouped = subscription
        .into_stream()
        .map(|users: Vec<User>| group_by_role(&users));

    Ok(snapshot_events(grouped).into_response())
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteUserResponse {
    pub user_id: String,
    pub deleted_logs: usize,
}

/// Delete a profile and cascade to its logs.
///
/// The identity-service account is left in place; without a profile it can
/// no longer sign in.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<String>,
) -> Result<Json<DeleteUserResponse>> {
    session.require_role(&[Role::Admin])?;

    if user_id == session.user_id() {
        return Err(AppError::BadRequest(
            "cannot delete the signed-in admin account".to_string(),
        ));
    }

    if state.users.get_user(&user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("user {}", user_id)));
    }

    tracing::info!(admin = %session.user_id(), user_id = %user_id, "Deleting user");
    let deleted_logs = state.users.delete_user(&user_id).await?;

    Ok(Json(DeleteUserResponse {
        user_id,
        deleted_logs,
    }))
}
