// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The signed-in athlete's own training logs.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::models::{Category, Role, TrainingLog};
use crate::routes::{csv_response, resolve_today, snapshot_events};
use crate::services::export::{export_filename, to_csv};
use crate::services::logs::sort_by_date_desc;
use crate::services::week::{filter_and_sum, format_minutes, week_days, week_range, WeekDay};
use crate::services::Session;
use crate::time_utils::parse_iso_date;
use crate::AppState;

pub(crate) const NOTHING_TO_EXPORT: &str = "내보낼 데이터가 없습니다.";

/// Upper bound for one category on one day.
pub const MAX_MINUTES_PER_CATEGORY: u32 = 24 * 60;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/logs", get(get_logs))
        .route("/api/logs/stream", get(stream_logs))
        .route("/api/logs/week", get(get_week))
        .route("/api/logs/export", get(export_logs))
        .route("/api/logs/{date}", put(put_log))
}

// ─── Reading ─────────────────────────────────────────────────

/// Own logs, newest first.
async fn get_logs(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<TrainingLog>>> {
    let mut logs = state.logs.fetch_logs_for_user(session.user_id()).await?;
    sort_by_date_desc(&mut logs);
    Ok(Json(logs))
}

/// Live own logs over SSE.
async fn stream_logs(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    session.require_role(&[Role::Athlete])?;

    let user_id = session.user_id().to_string();
    let subscription = state.logs.subscribe_own_logs(session.user_id(), move |err| {
        tracing::error!(user_id = %user_id, error = %err, "Own-log stream ended");
    });

    Ok(snapshot_events(subscription.into_stream()).into_response())
}

#[derive(Debug, Deserialize)]
pub struct WeekParams {
    /// Client's local date (`YYYY-MM-DD`)
    #[serde(default)]
    pub today: Option<String>,
}

/// One Monday–Sunday week of logs.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeekResponse {
    pub start: String,
    pub end: String,
    pub days: Vec<WeekDay>,
    pub logs: Vec<TrainingLog>,
    pub total_minutes: u64,
    /// e.g. "2시간 30분"
    pub total_display: String,
}

/// Bucket `logs` into the week containing `today`.
pub(crate) fn week_response(logs: &[TrainingLog], today: Option<&str>) -> Result<WeekResponse> {
    let range = week_range(resolve_today(today)?);
    let (start, end) = (range.start_iso(), range.end_iso());
    let summary = filter_and_sum(logs, &start, &end);

    Ok(WeekResponse {
        days: week_days(&range),
        total_display: format_minutes(summary.total_minutes),
        total_minutes: summary.total_minutes,
        logs: summary.logs,
        start,
        end,
    })
}

/// This week's own logs.
async fn get_week(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(params): Query<WeekParams>,
) -> Result<Json<WeekResponse>> {
    let mut logs = state.logs.fetch_logs_for_user(session.user_id()).await?;
    sort_by_date_desc(&mut logs);
    Ok(Json(week_response(&logs, params.today.as_deref())?))
}

/// Own logs as a CSV download, newest first.
async fn export_logs(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    let mut logs = state.logs.fetch_logs_for_user(session.user_id()).await?;
    if logs.is_empty() {
        return Err(AppError::NotFound(NOTHING_TO_EXPORT.to_string()));
    }
    sort_by_date_desc(&mut logs);

    tracing::info!(user_id = %session.user_id(), rows = logs.len(), "Exporting own logs");
    Ok(csv_response(&export_filename(&session.profile.name), to_csv(&logs)))
}

// ─── Writing ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PutLogRequest {
    /// Minutes per category; omitted categories are stored as 0
    pub trainings: HashMap<Category, u32>,
}

/// Record (or overwrite) the athlete's log for `date`.
async fn put_log(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(date): Path<String>,
    body: std::result::Result<Json<PutLogRequest>, JsonRejection>,
) -> Result<Json<TrainingLog>> {
    session.require_role(&[Role::Athlete])?;
    let Json(body) = body?;

    let date = parse_iso_date(&date)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid date '{}'", date)))?;

    if body
        .trainings
        .values()
        .any(|&minutes| minutes > MAX_MINUTES_PER_CATEGORY)
    {
        return Err(AppError::BadRequest(format!(
            "훈련 시간은 {}분을 넘을 수 없습니다.",
            MAX_MINUTES_PER_CATEGORY
        )));
    }

    if !body.trainings.values().any(|&minutes| minutes > 0) {
        return Err(AppError::BadRequest(
            "하나 이상의 훈련 시간을 입력하세요.".to_string(),
        ));
    }

    let log = state
        .logs
        .upsert_log(&session.profile, date, &body.trainings)
        .await?;

    Ok(Json(log))
}
