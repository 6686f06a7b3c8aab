//! Live query subscriptions.
//!
//! A [`Subscription`] owns a background task that re-runs a query whenever
//! the store reports that its watched target may have changed, and
//! publishes the full result set. Delivery is latest-value only: a slow
//! consumer skips intermediate snapshots rather than buffering them.

use crate::db::{ChangeFeed, DocumentStore, WatchTarget};
use crate::error::AppError;
use futures_util::stream::Fuse;
use futures_util::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a running live query. Dropping it cancels the query.
pub struct Subscription<T> {
    rx: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T> Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start a live query over `target`.
    ///
    /// `load` runs once immediately and again after every change the store
    /// reports. The first error, from the watch or from `load`, is handed
    /// to `on_error` and ends the subscription; there is no retry.
    pub fn spawn<F, Fut, E>(
        store: Arc<dyn DocumentStore>,
        target: WatchTarget,
        load: F,
        on_error: E,
    ) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
        E: FnOnce(AppError) + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            // Watch before the first load so no write falls in between.
            let mut feed = match store.watch(&target).await {
                Ok(feed) => feed.fuse(),
                Err(err) => {
                    tracing::warn!(error = %err, ?target, "Watch failed");
                    on_error(err);
                    return;
                }
            };

            loop {
                match load().await {
                    Ok(snapshot) => {
                        if tx.send(Some(snapshot)).is_err() {
                            return; // every receiver is gone
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, ?target, "Live query failed");
                        on_error(err);
                        return;
                    }
                }

                if !wait_for_change(&mut feed).await {
                    tracing::debug!(?target, "Watch ended");
                    return;
                }
            }
        });

        Self { rx, task }
    }

    /// Wait for the next snapshot. Returns `None` once the query has ended.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(snapshot) = self.rx.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }

    /// Most recent snapshot, if one has been delivered.
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Stop the query.
    pub fn close(self) {
        drop(self);
    }

    /// Adapt into a stream of snapshots, ending when the query ends.
    pub fn into_stream(self) -> impl Stream<Item = T> + Send {
        futures_util::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|snapshot| (snapshot, sub))
        })
    }
}

/// Wait for a wake-up, absorbing any others already queued so a burst of
/// changes costs one reload. Returns `false` once the feed has ended.
async fn wait_for_change(feed: &mut Fuse<ChangeFeed>) -> bool {
    if feed.next().await.is_none() {
        return false;
    }
    while let Some(Some(())) = feed.next().now_or_never() {}
    true
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{Role, User};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: id.to_string(),
            phone: String::new(),
            email: format!("{}@example.com", id),
            role: Role::Athlete,
            created_at: String::new(),
        }
    }

    fn count_users(store: &MemoryStore) -> Subscription<usize> {
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let query_store = shared.clone();
        Subscription::spawn(
            shared,
            WatchTarget::Users(None),
            move || {
                let store = query_store.clone();
                async move { Ok(store.query_users(None).await?.len()) }
            },
            |_| {},
        )
    }

    #[tokio::test]
    async fn test_delivers_initial_and_updated_snapshots() {
        let store = MemoryStore::new();
        let mut sub = count_users(&store);

        assert_eq!(sub.next().await, Some(0));

        store.set_user(&user("a")).await.unwrap();
        assert_eq!(sub.next().await, Some(1));
        assert_eq!(sub.latest(), Some(1));
    }

    #[tokio::test]
    async fn test_burst_of_writes_settles_on_latest() {
        let store = MemoryStore::new();
        let mut sub = count_users(&store);
        assert_eq!(sub.next().await, Some(0));

        for id in ["a", "b", "c", "d", "e"] {
            store.set_user(&user(id)).await.unwrap();
        }

        let settled = tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(count) = sub.next().await {
                if count == 5 {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap();
        assert!(settled);
    }

    #[tokio::test]
    async fn test_ignores_other_collections() {
        let store = MemoryStore::new();
        let loads = Arc::new(AtomicUsize::new(0));
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let counter = loads.clone();

        let mut sub = Subscription::spawn(
            shared,
            WatchTarget::Users(None),
            move || {
                let counter = counter.clone();
                async move { Ok(counter.fetch_add(1, Ordering::SeqCst)) }
            },
            |_| {},
        );
        assert_eq!(sub.next().await, Some(0));

        store.delete_log("whatever").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_reaches_handler_and_ends_subscription() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let (err_tx, err_rx) = tokio::sync::oneshot::channel();

        let mut sub: Subscription<usize> = Subscription::spawn(
            store,
            WatchTarget::Logs("u1".to_string()),
            || async { Err(AppError::Database("connection reset".to_string())) },
            move |err| {
                let _ = err_tx.send(err.to_string());
            },
        );

        assert_eq!(sub.next().await, None);
        let message = err_rx.await.unwrap();
        assert!(message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_stream_ends_after_close() {
        let store = MemoryStore::new();
        let sub = count_users(&store);
        let mut stream = Box::pin(sub.into_stream());

        assert_eq!(stream.next().await, Some(0));
        drop(stream);

        // Writes after cancellation must not panic or block.
        store.set_user(&user("b")).await.unwrap();
    }
}
