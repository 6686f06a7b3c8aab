// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password identity providers.
//!
//! Production uses the Firebase Auth (Identity Toolkit) REST API. Tests and
//! memory-backed local runs use [`MemoryIdentity`].

use crate::error::{AppError, AuthError};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// An authenticated identity-service account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    pub email: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and return its principal.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AppError>;

    /// Verify credentials and return the principal.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AppError>;
}

// ─── Firebase Auth ───────────────────────────────────────────────

/// Firebase Auth REST client.
#[derive(Clone)]
pub struct FirebaseIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentity {
    /// Create a client for the given web API key.
    ///
    /// For local development with emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(api_key: String) -> Self {
        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                format!("http://{}/identitytoolkit.googleapis.com/v1", host)
            }
            Err(_) => "https://identitytoolkit.googleapis.com/v1".to_string(),
        };

        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<Principal, AppError> {
        let url = format!("{}/accounts:{}", self.base_url, method);
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Other(format!("request failed: {}", e)))?;

        self.check_response(response, email).await
    }

    /// Check response status and map Identity Toolkit error codes.
    async fn check_response(
        &self,
        response: reqwest::Response,
        email: &str,
    ) -> Result<Principal, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            let code = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

            tracing::warn!(status = %status, code = %code, "Identity service rejected request");
            return Err(AuthError::from_code(&code).into());
        }

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Other(format!("JSON parse error: {}", e)))?;

        Ok(Principal {
            uid: account.local_id,
            email: account.email.unwrap_or_else(|| email.to_string()),
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AppError> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AppError> {
        self.password_call("signInWithPassword", email, password)
            .await
    }
}

// ─── In-memory ───────────────────────────────────────────────────

struct Account {
    uid: String,
    password_mac: Vec<u8>,
}

/// In-process identity provider.
///
/// Passwords are stored as HMAC-SHA256 over `email:password`, keyed by the
/// instance secret.
#[derive(Clone)]
pub struct MemoryIdentity {
    secret: Arc<Vec<u8>>,
    accounts: Arc<DashMap<String, Account>>,
    password_sign_in: Arc<AtomicBool>,
}

impl MemoryIdentity {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: Arc::new(secret.to_vec()),
            accounts: Arc::new(DashMap::new()),
            password_sign_in: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Toggle the email/password provider, like the Firebase console switch.
    pub fn set_password_sign_in(&self, enabled: bool) {
        self.password_sign_in.store(enabled, Ordering::SeqCst);
    }

    fn ensure_enabled(&self) -> Result<(), AuthError> {
        if self.password_sign_in.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthError::OperationNotAllowed)
        }
    }

    fn password_mac(&self, email: &str, password: &str) -> Result<Vec<u8>, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(email.as_bytes());
        mac.update(b":");
        mac.update(password.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Firebase-style 28-character uid derived from the normalized email.
fn uid_for(email: &str) -> String {
    let digest = Sha256::digest(email.as_bytes());
    hex::encode(digest)[..28].to_string()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AppError> {
        self.ensure_enabled()?;
        let email = normalize_email(email);
        let password_mac = self.password_mac(&email, password)?;
        let uid = uid_for(&email);

        match self.accounts.entry(email.clone()) {
            Entry::Occupied(_) => Err(AuthError::EmailAlreadyInUse.into()),
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    uid: uid.clone(),
                    password_mac,
                });
                Ok(Principal { uid, email })
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AppError> {
        self.ensure_enabled()?;
        let email = normalize_email(email);
        let candidate = self.password_mac(&email, password)?;

        let account = self
            .accounts
            .get(&email)
            .ok_or(AuthError::InvalidCredential)?;

        if !bool::from(account.password_mac.as_slice().ct_eq(candidate.as_slice())) {
            return Err(AuthError::InvalidCredential.into());
        }

        Ok(Principal {
            uid: account.uid.clone(),
            email,
        })
    }
}
