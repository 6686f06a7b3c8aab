// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coach dashboard: athlete list and per-athlete logs.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Role, TrainingLog, User};
use crate::routes::logs::{week_response, WeekParams, WeekResponse, NOTHING_TO_EXPORT};
use crate::routes::{csv_response, snapshot_events};
use crate::services::export::{export_filename, to_csv};
use crate::services::logs::sort_by_date_asc;
use crate::services::Session;
use crate::AppState;

const VIEWERS: &[Role] = &[Role::Coach, Role::Admin];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/athletes", get(list_athletes))
        .route("/api/athletes/stream", get(stream_athletes))
        .route("/api/athletes/{id}/week", get(athlete_week))
        .route("/api/athletes/{id}/export", get(export_athlete))
}

async fn list_athletes(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<User>>> {
    session.require_role(VIEWERS)?;
    let mut athletes = state.users.list_athletes().await?;
    athletes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(athletes))
}

async fn stream_athletes(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    session.require_role(VIEWERS)?;

    let viewer = session.user_id().to_string();
    let subscription = state.users.subscribe_athletes(move |err| {
        tracing::error!(viewer = %viewer, error = %err, "Athlete stream ended");
    });

    Ok(snapshot_events(subscription.into_stream()).into_response())
}

/// Profile and ascending logs of an athlete, or `NotFound`.
async fn athlete_logs(state: &AppState, athlete_id: &str) -> Result<(User, Vec<TrainingLog>)> {
    let athlete = state
        .users
        .get_user(athlete_id)
        .await?
        .filter(|user| user.role == Role::Athlete)
        .ok_or_else(|| AppError::NotFound(format!("athlete {}", athlete_id)))?;

    let mut logs = state.logs.fetch_logs_for_user(athlete_id).await?;
    sort_by_date_asc(&mut logs);
    Ok((athlete, logs))
}

/// The selected athlete's week, oldest day first.
async fn athlete_week(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(athlete_id): Path<String>,
    Query(params): Query<WeekParams>,
) -> Result<Json<WeekResponse>> {
    session.require_role(VIEWERS)?;
    let (_, logs) = athlete_logs(&state, &athlete_id).await?;
    Ok(Json(week_response(&logs, params.today.as_deref())?))
}

/// The selected athlete's full history as CSV, oldest first.
async fn export_athlete(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(athlete_id): Path<String>,
) -> Result<Response> {
    session.require_role(VIEWERS)?;
    let (athlete, logs) = athlete_logs(&state, &athlete_id).await?;
    if logs.is_empty() {
        return Err(AppError::NotFound(NOTHING_TO_EXPORT.to_string()));
    }

    tracing::info!(
        viewer = %session.user_id(),
        athlete_id = %athlete.id,
        rows = logs.len(),
        "Exporting athlete logs"
    );
    Ok(csv_response(&export_filename(&athlete.name), to_csv(&logs)))
}
