//! In-process document store.
//!
//! Mirrors the Firestore semantics the repositories rely on: keyed
//! documents, whole-document overwrite, equality queries. Used by tests and
//! by `STORE_BACKEND=memory` for local runs without GCP credentials.

use crate::db::{ChangeFeed, Collection, DocumentStore, WatchTarget};
use crate::error::AppError;
use crate::models::{Role, TrainingLog, User};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// Capacity of the change-notification channel.
/// Lagged receivers resync by re-querying.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Shared, cloneable in-memory store.
#[derive(Clone)]
pub struct MemoryStore {
    users: Arc<DashMap<String, User>>,
    logs: Arc<DashMap<String, TrainingLog>>,
    /// Log IDs whose deletion should fail (simulated partial failure).
    failing_log_deletes: Arc<DashMap<String, ()>>,
    changes: broadcast::Sender<Collection>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            users: Arc::new(DashMap::new()),
            logs: Arc::new(DashMap::new()),
            failing_log_deletes: Arc::new(DashMap::new()),
            changes,
        }
    }

    /// Make every future `delete_log` for these IDs fail.
    pub fn fail_log_deletes<I, S>(&self, log_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in log_ids {
            self.failing_log_deletes.insert(id.into(), ());
        }
    }

    /// Clear injected failures.
    pub fn clear_failures(&self) {
        self.failing_log_deletes.clear();
    }

    /// Number of stored log documents, across all users.
    pub fn log_count(&self) -> usize {
        self.logs.len()
    }

    /// Distinct owners of stored logs.
    pub fn log_owners(&self) -> HashSet<String> {
        self.logs.iter().map(|e| e.value().user_id.clone()).collect()
    }

    fn notify(&self, collection: Collection) {
        let _ = self.changes.send(collection);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn set_user(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.id.clone(), user.clone());
        self.notify(Collection::Users);
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.users.remove(user_id);
        self.notify(Collection::Users);
        Ok(())
    }

    async fn query_users(&self, role: Option<Role>) -> Result<Vec<User>, AppError> {
        Ok(self
            .users
            .iter()
            .filter(|e| role.map_or(true, |r| e.value().role == r))
            .map(|e| e.value().clone())
            .collect())
    }

    async fn get_log(&self, log_id: &str) -> Result<Option<TrainingLog>, AppError> {
        Ok(self.logs.get(log_id).map(|l| l.value().clone()))
    }

    async fn set_log(&self, log: &TrainingLog) -> Result<(), AppError> {
        self.logs.insert(log.id.clone(), log.clone());
        self.notify(Collection::TrainingLogs);
        Ok(())
    }

    async fn delete_log(&self, log_id: &str) -> Result<(), AppError> {
        if self.failing_log_deletes.contains_key(log_id) {
            return Err(AppError::Database(format!(
                "Simulated failure deleting {}",
                log_id
            )));
        }
        self.logs.remove(log_id);
        self.notify(Collection::TrainingLogs);
        Ok(())
    }

    async fn query_logs(&self, user_id: &str) -> Result<Vec<TrainingLog>, AppError> {
        Ok(self
            .logs
            .iter()
            .filter(|e| e.value().user_id == user_id)
            .map(|e| e.value().clone())
            .collect())
    }

    /// Every write to the target's collection wakes the watcher; the
    /// caller's re-query does the filtering.
    async fn watch(&self, target: &WatchTarget) -> Result<ChangeFeed, AppError> {
        let collection = target.collection();
        let rx = self.changes.subscribe();

        Ok(stream::unfold(rx, move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(changed) if changed == collection => return Some(((), rx)),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, ?collection, "Change feed lagged, reloading");
                        return Some(((), rx));
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed())
    }
}
