// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HONN Training Log API Server

use honn_training::{
    config::{Config, StoreBackend},
    db::{DocumentStore, FirestoreDb, MemoryStore},
    services::{FirebaseIdentity, IdentityProvider, MemoryIdentity},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Backend configuration is missing or invalid");
            return Err(e.into());
        }
    };
    tracing::info!(port = config.port, "Starting HONN training log API");

    let (store, identity): (Arc<dyn DocumentStore>, Arc<dyn IdentityProvider>) =
        match config.store_backend {
            StoreBackend::Firestore => (
                Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
                Arc::new(FirebaseIdentity::new(config.firebase_api_key.clone())),
            ),
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store and accounts; data will not survive a restart");
                (
                    Arc::new(MemoryStore::new()),
                    Arc::new(MemoryIdentity::new(&config.jwt_signing_key)),
                )
            }
        };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, identity));

    // Build router
    let app = honn_training::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("honn_training=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
