// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in sessions.
//!
//! A session pairs an identity-service principal with its profile record.
//! The profile is reloaded on every resolve, so a deleted account is signed
//! out on its next request.

use crate::error::AppError;
use crate::middleware::auth::{create_jwt, decode_jwt};
use crate::models::{NewProfile, Role, User};
use crate::services::identity::IdentityProvider;
use crate::services::UserRepository;
use std::sync::Arc;

/// The signed-in principal and its profile.
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: User,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.profile.id
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    /// Fail with `Forbidden` unless the session has one of `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.profile.role) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.profile.id,
                role = self.profile.role.as_str(),
                "Role not permitted for this operation"
            );
            Err(AppError::Forbidden(format!(
                "role '{}' not permitted",
                self.profile.role.as_str()
            )))
        }
    }
}

/// Sign-up form after validation.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
    pub role: Role,
}

/// Issues and resolves sessions.
#[derive(Clone)]
pub struct SessionStore {
    identity: Arc<dyn IdentityProvider>,
    users: UserRepository,
    signing_key: Vec<u8>,
}

impl SessionStore {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        users: UserRepository,
        signing_key: Vec<u8>,
    ) -> Self {
        Self {
            identity,
            users,
            signing_key,
        }
    }

    /// Create the account and its profile, and sign in.
    ///
    /// Returns the session and its token.
    pub async fn sign_up(&self, form: SignUp) -> Result<(Session, String), AppError> {
        if form.role == Role::Admin {
            return Err(AppError::BadRequest(
                "admin accounts cannot be created by sign-up".to_string(),
            ));
        }

        let principal = self.identity.sign_up(&form.email, &form.password).await?;

        let profile = self
            .users
            .create_user_profile(
                &principal.uid,
                NewProfile {
                    name: form.name,
                    phone: form.phone,
                    email: principal.email.clone(),
                    role: form.role,
                },
            )
            .await?;

        let token = self.issue(&principal.uid)?;
        Ok((Session { profile }, token))
    }

    /// Verify credentials and sign in.
    ///
    /// A principal without a profile record is refused.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(Session, String), AppError> {
        let principal = self.identity.sign_in(email, password).await?;

        let profile = self.users.get_user(&principal.uid).await?.ok_or_else(|| {
            tracing::warn!(uid = %principal.uid, "Principal has no profile, refusing sign-in");
            AppError::Unauthorized
        })?;

        tracing::info!(user_id = %profile.id, role = profile.role.as_str(), "Signed in");

        let token = self.issue(&principal.uid)?;
        Ok((Session { profile }, token))
    }

    /// Resolve a session token to the current session.
    pub async fn resolve(&self, token: &str) -> Result<Session, AppError> {
        let uid = decode_jwt(token, &self.signing_key).map_err(|_| AppError::InvalidToken)?;

        match self.users.get_user(&uid).await? {
            Some(profile) => Ok(Session { profile }),
            None => {
                tracing::info!(uid = %uid, "Profile gone, treating session as signed out");
                Err(AppError::Unauthorized)
            }
        }
    }

    fn issue(&self, uid: &str) -> Result<String, AppError> {
        create_jwt(uid, &self.signing_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }
}
