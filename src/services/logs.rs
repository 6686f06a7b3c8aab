// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Training log repository.
//!
//! One document per (user, date). Writes are whole-document overwrites with
//! no concurrency check: the last write for a given day wins.

use crate::db::{DocumentStore, WatchTarget};
use crate::error::AppError;
use crate::models::training::stored_trainings;
use crate::models::{log_id, Category, TrainingLog, User};
use crate::services::Subscription;
use crate::time_utils::format_utc_rfc3339;
use chrono::NaiveDate;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;

const MAX_CONCURRENT_DELETES: usize = 50;

/// Reads and writes `trainingLogs`.
#[derive(Clone)]
pub struct LogRepository {
    store: Arc<dyn DocumentStore>,
}

impl LogRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Live view of a user's logs, newest date first.
    pub fn subscribe_own_logs<E>(&self, user_id: &str, on_error: E) -> Subscription<Vec<TrainingLog>>
    where
        E: FnOnce(AppError) + Send + 'static,
    {
        let store = self.store.clone();
        let user_id = user_id.to_string();

        Subscription::spawn(
            self.store.clone(),
            WatchTarget::Logs(user_id.clone()),
            move || {
                let store = store.clone();
                let user_id = user_id.clone();
                async move {
                    let mut logs = store.query_logs(&user_id).await?;
                    sort_by_date_desc(&mut logs);
                    Ok(logs)
                }
            },
            on_error,
        )
    }

    /// All logs for a user, unsorted.
    pub async fn fetch_logs_for_user(&self, user_id: &str) -> Result<Vec<TrainingLog>, AppError> {
        self.store.query_logs(user_id).await
    }

    /// The log for `user_id` on `date`, if recorded.
    pub async fn get_log(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<TrainingLog>, AppError> {
        let date = date.format("%Y-%m-%d").to_string();
        self.store.get_log(&log_id(user_id, &date)).await
    }

    /// Write `owner`'s log for `date`, replacing any existing record.
    ///
    /// All categories are stored; those absent from `trainings` are 0.
    pub async fn upsert_log(
        &self,
        owner: &User,
        date: NaiveDate,
        trainings: &HashMap<Category, u32>,
    ) -> Result<TrainingLog, AppError> {
        let date = date.format("%Y-%m-%d").to_string();
        let (trainings, total_duration) = stored_trainings(trainings);

        let log = TrainingLog {
            id: log_id(&owner.id, &date),
            user_id: owner.id.clone(),
            user_name: owner.name.clone(),
            date,
            trainings,
            total_duration,
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        self.store.set_log(&log).await?;

        tracing::info!(
            user_id = %log.user_id,
            date = %log.date,
            total_duration,
            "Training log saved"
        );

        Ok(log)
    }

    /// Delete every log owned by `user_id`.
    ///
    /// Not atomic. Every deletion is attempted even after one fails; logs
    /// that failed stay behind and the first error is returned. Returns the
    /// number deleted.
    pub async fn delete_all_logs_for_user(&self, user_id: &str) -> Result<usize, AppError> {
        let logs = self.store.query_logs(user_id).await?;
        let store = &self.store;

        let results: Vec<Result<(), AppError>> = stream::iter(logs.iter().map(|log| log.id.clone()).collect::<Vec<String>>())
            .map(|log_id| async move {
                store.delete_log(&log_id).await.map_err(|e| {
                    tracing::error!(user_id, log_id = %log_id, error = %e, "Log deletion failed");
                    e
                })
            })
            .buffer_unordered(MAX_CONCURRENT_DELETES)
            .collect()
            .await;

        let deleted = results.iter().filter(|r| r.is_ok()).count();
        if let Some(err) = results.into_iter().find_map(|r| r.err()) {
            tracing::warn!(
                user_id,
                deleted,
                remaining = logs.len() - deleted,
                "Log cascade left orphans"
            );
            return Err(err);
        }

        tracing::debug!(user_id, deleted, "Deleted training logs");
        Ok(deleted)
    }
}

/// Newest first.
pub fn sort_by_date_desc(logs: &mut [TrainingLog]) {
    logs.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Oldest first.
pub fn sort_by_date_asc(logs: &mut [TrainingLog]) {
    logs.sort_by(|a, b| a.date.cmp(&b.date));
}
