// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password sign-up, login and logout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Result};
use crate::middleware::auth::{SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::{Role, User};
use crate::services::{Session, SignUp};
use crate::AppState;

const CREDENTIALS_MESSAGE: &str = "유효한 이메일과 6자 이상의 비밀번호를 입력하세요.";
const PROFILE_MESSAGE: &str = "이름과 전화번호를 모두 입력하세요.";

/// Routes that create or end a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Routes that read the current session (mounted behind the auth middleware).
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Athlete
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Create an account and sign in.
async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<User>)> {
    let Json(body) = body?;
    let body = SignUpRequest {
        email: body.email.trim().to_string(),
        name: body.name.trim().to_string(),
        phone: body.phone.trim().to_string(),
        ..body
    };
    body.validate().map_err(validation_error)?;

    let (session, token) = state
        .sessions
        .sign_up(SignUp {
            email: body.email,
            password: body.password,
            name: body.name,
            phone: body.phone,
            role: body.role,
        })
        .await?;

    tracing::info!(user_id = %session.user_id(), role = session.role().as_str(), "Account created");

    let jar = jar.add(session_cookie(&state, token));
    Ok((StatusCode::CREATED, jar, Json(session.profile)))
}

/// Sign in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<User>)> {
    let Json(body) = body?;
    let body = LoginRequest {
        email: body.email.trim().to_string(),
        ..body
    };
    body.validate().map_err(validation_error)?;

    let (session, token) = state.sessions.sign_in(&body.email, &body.password).await?;

    let jar = jar.add(session_cookie(&state, token));
    Ok((jar, Json(session.profile)))
}

/// Clear the session cookie. Always succeeds.
///
/// The removal cookie carries the same attributes as the one set at login.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(session_cookie_base(&state, String::new()));
    (jar, StatusCode::NO_CONTENT)
}

/// The signed-in user's profile.
async fn get_me(Extension(session): Extension<Session>) -> Json<User> {
    Json(session.profile)
}

fn session_cookie_base(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.frontend_url.starts_with("https://"))
        .build()
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let mut cookie = session_cookie_base(state, token);
    cookie.set_max_age(time::Duration::seconds(SESSION_TTL_SECS as i64));
    cookie
}

/// Reduce validation failures to the single form message shown to the user.
///
/// Credential problems take precedence over missing profile fields.
fn validation_error(errors: ValidationErrors) -> AppError {
    let fields = errors.field_errors();
    let message = if fields.contains_key("email") || fields.contains_key("password") {
        CREDENTIALS_MESSAGE
    } else {
        PROFILE_MESSAGE
    };
    tracing::debug!(fields = ?fields.keys().collect::<Vec<_>>(), "Form validation failed");
    AppError::BadRequest(message.to_string())
}
