// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role. Stored lowercase (`"athlete"`, `"coach"`, `"admin"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Athlete,
    Coach,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Athlete => "athlete",
            Role::Coach => "coach",
            Role::Admin => "admin",
        }
    }

    /// Korean display label used by the admin panel.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Athlete => "선수",
            Role::Coach => "코치",
            Role::Admin => "관리자",
        }
    }
}

/// User profile stored in the `users` collection.
///
/// Field names are camelCase to match documents written by the web client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity-service principal id (also used as document ID)
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub role: Role,
    /// When the profile was created (RFC3339)
    pub created_at: String,
}

/// Profile fields supplied at sign-up.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub role: Role,
}
