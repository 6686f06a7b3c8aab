// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod athletes;
pub mod auth;
pub mod logs;

use crate::error::{AppError, Result};
use crate::middleware::auth::require_auth;
use crate::services::export::{content_disposition, CSV_CONTENT_TYPE};
use crate::time_utils::{parse_iso_date, today_local};
use crate::AppState;
use axum::http::{header, Method};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{middleware, routing::get, Json, Router};
use chrono::NaiveDate;
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(auth::session_routes())
        .merge(logs::routes())
        .merge(athletes::routes())
        .merge(admin::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// ─── Shared helpers ──────────────────────────────────────────

/// The reference date for weekly views: the client's date if given, else the server's.
pub(crate) fn resolve_today(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(raw) => parse_iso_date(raw).ok_or_else(|| {
            AppError::BadRequest("Invalid 'today' parameter: expected YYYY-MM-DD".to_string())
        }),
        None => Ok(today_local()),
    }
}

/// CSV attachment response.
pub(crate) fn csv_response(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        body,
    )
        .into_response()
}

/// Serve a stream of snapshots as Server-Sent Events, one `snapshot` event each.
///
/// The stream (and any subscription behind it) is dropped when the client
/// disconnects.
pub(crate) fn snapshot_events<S, T>(
    snapshots: S,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + 'static,
{
    let stream = snapshots.map(|snapshot| {
        let event = Event::default()
            .event("snapshot")
            .json_data(&snapshot)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to encode snapshot");
                Event::default().event("error").data("encoding failed")
            });
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
