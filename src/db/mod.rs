//! Database layer.
//!
//! Repositories talk to a [`DocumentStore`]; production uses Firestore and
//! tests use the in-process [`MemoryStore`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Role, TrainingLog, User};
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TRAINING_LOGS: &str = "trainingLogs";
}

/// Collection a document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    TrainingLogs,
}

/// Query watched by a live subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    /// All users, or only those with the given role.
    Users(Option<Role>),
    /// Logs with `userId == ` the given user.
    Logs(String),
}

impl WatchTarget {
    pub fn collection(&self) -> Collection {
        match self {
            WatchTarget::Users(_) => Collection::Users,
            WatchTarget::Logs(_) => Collection::TrainingLogs,
        }
    }
}

/// Wake-ups for a watched query.
///
/// Each item means the query result may have changed. The stream ends when
/// the watch is lost.
pub type ChangeFeed = BoxStream<'static, ()>;

/// Typed access to the `users` and `trainingLogs` collections.
///
/// Queries are equality filters only; date ranges are filtered by callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;
    async fn set_user(&self, user: &User) -> Result<(), AppError>;
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError>;
    /// All users, or only those with the given role.
    async fn query_users(&self, role: Option<Role>) -> Result<Vec<User>, AppError>;

    // ─── Training Logs ───────────────────────────────────────────
    async fn get_log(&self, log_id: &str) -> Result<Option<TrainingLog>, AppError>;
    /// Create or overwrite the log stored under `log.id`.
    async fn set_log(&self, log: &TrainingLog) -> Result<(), AppError>;
    async fn delete_log(&self, log_id: &str) -> Result<(), AppError>;
    /// All logs with `userId == user_id`, in no particular order.
    async fn query_logs(&self, user_id: &str) -> Result<Vec<TrainingLog>, AppError>;

    /// Start watching `target`. Changes made by any writer are reported,
    /// not only those made through this store.
    async fn watch(&self, target: &WatchTarget) -> Result<ChangeFeed, AppError>;
}
