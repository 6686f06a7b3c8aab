// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! HONN training log: daily training minutes for athletes and coaches.
//!
//! This crate provides the backend API: athletes record minutes per training
//! category, coaches review and export athlete logs, and an admin manages
//! accounts.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::{IdentityProvider, LogRepository, SessionStore, UserRepository};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub logs: LogRepository,
    pub users: UserRepository,
    pub sessions: SessionStore,
}

impl AppState {
    /// Wire repositories and sessions around an explicit store and identity provider.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let logs = LogRepository::new(store.clone());
        let users = UserRepository::new(store, logs.clone());
        let sessions = SessionStore::new(identity, users.clone(), config.jwt_signing_key.clone());

        Self {
            config,
            logs,
            users,
            sessions,
        }
    }
}
