// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Identity-service failures, reduced to the cases the client distinguishes.
///
/// `Display` yields the user-facing (Korean) message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("이메일 또는 비밀번호가 올바르지 않습니다.")]
    InvalidCredential,

    #[error("이미 가입된 이메일입니다.")]
    EmailAlreadyInUse,

    #[error("오류: 이메일 로그인이 활성화되지 않았습니다. Firebase 콘솔 설정을 확인하세요.")]
    OperationNotAllowed,

    #[error("오류가 발생했습니다. 잠시 후 다시 시도해주세요.")]
    Other(String),
}

impl AuthError {
    /// Map an Identity Toolkit error message (e.g. `EMAIL_EXISTS`) to an `AuthError`.
    ///
    /// Messages may carry a suffix such as `WEAK_PASSWORD : Password should be ...`,
    /// so only the leading code is matched.
    pub fn from_code(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or("").trim();
        match code {
            "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
                AuthError::InvalidCredential
            }
            "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
            "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => AuthError::OperationNotAllowed,
            _ => AuthError::Other(message.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Auth(err) => {
                if let AuthError::Other(code) = err {
                    tracing::warn!(code = %code, "Unmapped identity service error");
                }
                let status = match err {
                    AuthError::InvalidCredential => StatusCode::UNAUTHORIZED,
                    AuthError::EmailAlreadyInUse => StatusCode::CONFLICT,
                    AuthError::OperationNotAllowed => StatusCode::FORBIDDEN,
                    AuthError::Other(_) => StatusCode::BAD_GATEWAY,
                };
                (status, "auth_error", Some(err.to_string()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
