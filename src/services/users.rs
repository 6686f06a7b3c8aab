// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile repository.

use crate::db::{DocumentStore, WatchTarget};
use crate::error::AppError;
use crate::models::{NewProfile, Role, User};
use crate::services::{LogRepository, Subscription};
use crate::time_utils::format_utc_rfc3339;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Reads and writes `users`; deletion cascades to the user's logs.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
    logs: LogRepository,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>, logs: LogRepository) -> Self {
        Self { store, logs }
    }

    /// Write the profile for a newly created principal.
    pub async fn create_user_profile(
        &self,
        uid: &str,
        profile: NewProfile,
    ) -> Result<User, AppError> {
        let user = User {
            id: uid.to_string(),
            name: profile.name,
            phone: profile.phone,
            email: profile.email,
            role: profile.role,
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        self.store.set_user(&user).await?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User profile created");

        Ok(user)
    }

    pub async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        self.store.get_user(uid).await
    }

    /// One-shot list of athletes.
    pub async fn list_athletes(&self) -> Result<Vec<User>, AppError> {
        self.store.query_users(Some(Role::Athlete)).await
    }

    /// One-shot list of every user.
    pub async fn list_all_users(&self) -> Result<Vec<User>, AppError> {
        self.store.query_users(None).await
    }

    /// Live view of every user.
    pub fn subscribe_all_users<E>(&self, on_error: E) -> Subscription<Vec<User>>
    where
        E: FnOnce(AppError) + Send + 'static,
    {
        self.subscribe_role(None, on_error)
    }

    /// Live view of users with the athlete role.
    pub fn subscribe_athletes<E>(&self, on_error: E) -> Subscription<Vec<User>>
    where
        E: FnOnce(AppError) + Send + 'static,
    {
        self.subscribe_role(Some(Role::Athlete), on_error)
    }

    fn subscribe_role<E>(&self, role: Option<Role>, on_error: E) -> Subscription<Vec<User>>
    where
        E: FnOnce(AppError) + Send + 'static,
    {
        let store = self.store.clone();
        Subscription::spawn(
            self.store.clone(),
            WatchTarget::Users(role),
            move || {
                let store = store.clone();
                async move { store.query_users(role).await }
            },
            on_error,
        )
    }

    /// Delete the profile, then every log the user owns.
    ///
    /// The profile goes first. Logs whose deletion fails are left without an
    /// owner; nothing reconciles them.
    pub async fn delete_user(&self, user_id: &str) -> Result<usize, AppError> {
        self.store.delete_user(user_id).await?;
        tracing::info!(user_id, "User profile deleted");

        let deleted = self.logs.delete_all_logs_for_user(user_id).await?;
        tracing::info!(user_id, deleted_logs = deleted, "User deletion complete");

        Ok(deleted)
    }
}

/// Users of one role, for the admin panel.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RoleGroup {
    pub role: Role,
    pub label: String,
    pub count: usize,
    pub users: Vec<User>,
}

/// Group users into admin, coach, athlete sections (always all three).
pub fn group_by_role(users: &[User]) -> Vec<RoleGroup> {
    [Role::Admin, Role::Coach, Role::Athlete]
        .into_iter()
        .map(|role| {
            let users: Vec<User> = users.iter().filter(|u| u.role == role).cloned().collect();
            RoleGroup {
                role,
                label: role.label().to_string(),
                count: users.len(),
                users,
            }
        })
        .collect()
}
