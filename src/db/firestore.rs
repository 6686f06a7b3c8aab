// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Training logs (one document per user per day)
//! - Live watches backed by Firestore listen streams

use crate::db::{collections, ChangeFeed, DocumentStore, WatchTarget};
use crate::error::AppError;
use crate::models::{Role, TrainingLog, User};
use async_trait::async_trait;
use firestore::{
    FirestoreListenEvent, FirestoreListener, FirestoreListenerTarget,
    FirestoreMemListenStateStorage,
};
use futures_util::{stream, StreamExt};
use tokio::sync::mpsc;

/// Each watch opens its own listen stream, so one target ID is enough.
const WATCH_TARGET_ID: u32 = 1;

type Listener = FirestoreListener<firestore::FirestoreDb, FirestoreMemListenStateStorage>;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::from_client(client))
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self::from_client(client))
    }

    fn from_client(client: firestore::FirestoreDb) -> Self {
        Self { client }
    }

    /// Register `target` as the listener's query.
    fn add_watch_target(&self, target: &WatchTarget, listener: &mut Listener) -> Result<(), AppError> {
        let select = self.client.fluent().select();
        let target_id = FirestoreListenerTarget::new(WATCH_TARGET_ID);

        match target {
            WatchTarget::Users(None) => select
                .from(collections::USERS)
                .listen()
                .add_target(target_id, listener),
            WatchTarget::Users(Some(role)) => {
                let role = role.as_str();
                select
                    .from(collections::USERS)
                    .filter(move |q| q.field("role").eq(role))
                    .listen()
                    .add_target(target_id, listener)
            }
            WatchTarget::Logs(user_id) => select
                .from(collections::TRAINING_LOGS)
                .filter(|q| q.for_all([q.field("userId").eq(user_id.as_str())]))
                .listen()
                .add_target(target_id, listener),
        }
        .map_err(|e| AppError::Database(format!("Failed to add listen target: {}", e)))
    }
}

/// Shuts the listener down when its feed is dropped.
struct ListenerGuard(Option<Listener>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let Some(mut listener) = self.0.take() else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = listener.shutdown().await {
                    tracing::warn!(error = %e, "Firestore listener shutdown failed");
                }
            });
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj::<User>()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn query_users(&self, role: Option<Role>) -> Result<Vec<User>, AppError> {
        let query = self.client.fluent().select().from(collections::USERS);

        let query = match role {
            Some(role) => query.filter(move |q| q.field("role").eq(role.as_str())),
            None => query,
        };

        query
            .obj::<User>()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Training Log Operations ─────────────────────────────────

    async fn get_log(&self, log_id: &str) -> Result<Option<TrainingLog>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::TRAINING_LOGS)
            .obj::<TrainingLog>()
            .one(log_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_log(&self, log: &TrainingLog) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::TRAINING_LOGS)
            .document_id(&log.id)
            .object(log)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_log(&self, log_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::TRAINING_LOGS)
            .document_id(log_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn query_logs(&self, user_id: &str) -> Result<Vec<TrainingLog>, AppError> {
        // Equality filter only: a date range here would need a composite index.
        self.client
            .fluent()
            .select()
            .from(collections::TRAINING_LOGS)
            .filter(|q| q.for_all([q.field("userId").eq(user_id)]))
            .obj::<TrainingLog>()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn watch(&self, target: &WatchTarget) -> Result<ChangeFeed, AppError> {
        let mut listener = self
            .client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create listener: {}", e)))?;
        self.add_watch_target(target, &mut listener)?;

        // Capacity 1: a pending wake-up already covers any later change.
        let (tx, rx) = mpsc::channel::<()>(1);
        listener
            .start(move |event| {
                let tx = tx.clone();
                async move {
                    match event {
                        FirestoreListenEvent::DocumentChange(_)
                        | FirestoreListenEvent::DocumentDelete(_)
                        | FirestoreListenEvent::DocumentRemove(_)
                        | FirestoreListenEvent::Filter(_) => {
                            let _ = tx.try_send(());
                        }
                        FirestoreListenEvent::TargetChange(_) => {}
                    }
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start listener: {}", e)))?;

        tracing::debug!(?target, "Firestore watch started");

        let guard = ListenerGuard(Some(listener));
        Ok(stream::unfold((rx, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|()| ((), (rx, guard)))
        })
        .boxed())
    }
}
