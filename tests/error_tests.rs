// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use honn_training::error::{AppError, AuthError};

#[test]
fn test_auth_error_codes_map_to_kinds() {
    for code in ["INVALID_LOGIN_CREDENTIALS", "INVALID_PASSWORD", "EMAIL_NOT_FOUND"] {
        assert_eq!(AuthError::from_code(code), AuthError::InvalidCredential);
    }
    assert_eq!(AuthError::from_code("EMAIL_EXISTS"), AuthError::EmailAlreadyInUse);
    assert_eq!(
        AuthError::from_code("OPERATION_NOT_ALLOWED"),
        AuthError::OperationNotAllowed
    );
}

#[test]
fn test_auth_error_code_with_suffix() {
    assert_eq!(
        AuthError::from_code("INVALID_PASSWORD : The password is invalid."),
        AuthError::InvalidCredential
    );
}

#[test]
fn test_unknown_auth_codes_collapse_to_generic_message() {
    for code in ["WEAK_PASSWORD : Password should be at least 6 characters", "TOO_MANY_ATTEMPTS_TRY_LATER", ""] {
        let err = AuthError::from_code(code);
        assert!(matches!(err, AuthError::Other(_)), "{code}");
        assert_eq!(err.to_string(), "오류가 발생했습니다. 잠시 후 다시 시도해주세요.");
    }
}

#[test]
fn test_error_statuses() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
        (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        (AuthError::InvalidCredential.into(), StatusCode::UNAUTHORIZED),
        (AuthError::EmailAlreadyInUse.into(), StatusCode::CONFLICT),
        (AuthError::OperationNotAllowed.into(), StatusCode::FORBIDDEN),
        (AuthError::Other("X".into()).into(), StatusCode::BAD_GATEWAY),
        (AppError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (
            AppError::Internal(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, expected) in cases {
        let label = format!("{err:?}");
        assert_eq!(err.into_response().status(), expected, "{label}");
    }
}
