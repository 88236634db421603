//! Live bookmark feed for Smartmarks.
//!
//! Owns the reconciler plus exactly one change-stream subscription for one
//! user. Loads the initial snapshot, applies streamed changes, listens for
//! the editor's same-process fallback events, and drives the reconnection
//! policy through the connection monitor. Closing the feed (or switching
//! user) releases the subscription so no notifications arrive for a user no
//! longer displayed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::managers::connection_monitor::{ConnectionMonitor, RETRY_DELAY};
use crate::managers::editor::LocalEvent;
use crate::managers::reconciler::Reconciler;
use crate::services::change_stream::{ChangeStreamTrait, StreamNotice};
use crate::services::record_store::RecordStoreTrait;
use crate::types::bookmark::Bookmark;
use crate::types::change::ConnectionState;
use crate::types::errors::StoreError;

/// Live view of one user's bookmarks.
pub struct LiveFeed {
    store: Arc<dyn RecordStoreTrait>,
    stream: Arc<dyn ChangeStreamTrait>,
    user_id: String,
    reconciler: Arc<Mutex<Reconciler>>,
    monitor: Arc<Mutex<ConnectionMonitor>>,
    last_error: Arc<Mutex<Option<String>>>,
    closed: Arc<AtomicBool>,
    nudge: Arc<Notify>,
    retry_delay: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl LiveFeed {
    pub fn new(
        store: Arc<dyn RecordStoreTrait>,
        stream: Arc<dyn ChangeStreamTrait>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            stream,
            user_id: user_id.into(),
            reconciler: Arc::new(Mutex::new(Reconciler::new())),
            monitor: Arc::new(Mutex::new(ConnectionMonitor::new())),
            last_error: Arc::new(Mutex::new(None)),
            closed: Arc::new(AtomicBool::new(false)),
            nudge: Arc::new(Notify::new()),
            retry_delay: RETRY_DELAY,
            tasks: Vec::new(),
        }
    }

    /// Overrides the fixed retry delay (tests).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Loads the snapshot: all of the user's records, ordered by
    /// `created_at` descending. The loading flag clears whether the request
    /// succeeds or fails; a failure leaves the sequence empty or stale and
    /// is surfaced through the returned error and `last_error`.
    pub async fn load(&self) -> Result<usize, StoreError> {
        match self.store.list_for_user(&self.user_id).await {
            Ok(rows) => {
                let count = rows.len();
                self.reconciler.lock().await.replace_all(rows);
                debug!(user_id = %self.user_id, count, "snapshot loaded");
                Ok(count)
            }
            Err(e) => {
                self.reconciler.lock().await.mark_load_failed();
                let message = format!("Failed to fetch bookmarks: {}", e);
                warn!(user_id = %self.user_id, error = %e, "snapshot load failed");
                *self.last_error.lock().await = Some(message);
                Err(e)
            }
        }
    }

    /// Starts the subscription loop. Attempts are serialized: each tears
    /// down the previous subscription handle before opening a new one, and
    /// a failed attempt schedules a single retry after the fixed delay.
    pub fn start(&mut self) {
        let task = tokio::spawn(run_subscription(
            self.stream.clone(),
            self.user_id.clone(),
            self.reconciler.clone(),
            self.monitor.clone(),
            self.closed.clone(),
            self.nudge.clone(),
            self.retry_delay,
        ));
        self.tasks.push(task);
    }

    /// Listens for the editor's same-process events and refreshes the
    /// snapshot on each one. Covers the race where a create lands before
    /// the change-stream subscription is established.
    pub fn listen_local(&mut self, mut events: broadcast::Receiver<LocalEvent>) {
        let store = self.store.clone();
        let reconciler = self.reconciler.clone();
        let user_id = self.user_id.clone();
        let closed = self.closed.clone();

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(LocalEvent::BookmarkAdded) => {
                        if closed.load(Ordering::SeqCst) {
                            break;
                        }
                        match store.list_for_user(&user_id).await {
                            Ok(rows) => {
                                if closed.load(Ordering::SeqCst) {
                                    break;
                                }
                                reconciler.lock().await.replace_all(rows);
                                debug!(user_id = %user_id, "refreshed after local event");
                            }
                            Err(e) => {
                                warn!(user_id = %user_id, error = %e, "local refresh failed");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.tasks.push(task);
    }

    /// Deletes a bookmark by id, scoped to this feed's user.
    ///
    /// While the request is outstanding, the deletion is tracked in the
    /// in-flight set so only that record's control is disabled; a duplicate
    /// delete for the same id is suppressed. On success the record is
    /// removed by the resulting stream notification; on failure the record
    /// stays and the store's message is surfaced.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if !self.reconciler.lock().await.begin_delete(id) {
            debug!(id, "delete already in flight, suppressed");
            return Ok(());
        }

        let result = self.store.delete(id, &self.user_id).await;
        self.reconciler.lock().await.finish_delete(id);

        if let Err(e) = &result {
            warn!(id, error = %e, "delete failed");
        }
        result
    }

    /// Manual retry action from the connection indicator.
    pub async fn retry(&self) {
        if self.monitor.lock().await.retry() {
            info!(user_id = %self.user_id, "manual retry requested");
            self.nudge.notify_one();
        }
    }

    /// The environment regained network connectivity; re-attempt while
    /// disconnected.
    pub async fn notify_online(&self) {
        if self.monitor.lock().await.notify_online() {
            self.nudge.notify_one();
        }
    }

    /// The browsing context became visible again; re-attempt while
    /// disconnected.
    pub async fn notify_visible(&self) {
        if self.monitor.lock().await.notify_visible() {
            self.nudge.notify_one();
        }
    }

    /// The environment reports the network is gone.
    pub async fn notify_offline(&self) {
        self.monitor.lock().await.on_offline();
    }

    pub async fn snapshot(&self) -> Vec<Bookmark> {
        self.reconciler.lock().await.records().to_vec()
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.monitor.lock().await.state()
    }

    pub async fn is_loading(&self) -> bool {
        self.reconciler.lock().await.is_loading()
    }

    pub async fn is_deleting(&self, id: &str) -> bool {
        self.reconciler.lock().await.is_deleting(id)
    }

    pub async fn deleting_ids(&self) -> Vec<String> {
        self.reconciler.lock().await.deleting_ids()
    }

    /// Most recent surfaced error, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.lock().await.clone()
    }

    /// Closes the feed: releases the subscription and stops all tasks. No
    /// state updates are applied after this returns.
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.nudge.notify_one();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        debug!(user_id = %self.user_id, "feed closed");
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.close();
    }
}

/// Subscription loop: one attempt at a time, retrying after `retry_delay`
/// (or sooner on a nudge) until the feed closes.
async fn run_subscription(
    stream: Arc<dyn ChangeStreamTrait>,
    user_id: String,
    reconciler: Arc<Mutex<Reconciler>>,
    monitor: Arc<Mutex<ConnectionMonitor>>,
    closed: Arc<AtomicBool>,
    nudge: Arc<Notify>,
    retry_delay: Duration,
) {
    loop {
        if closed.load(Ordering::SeqCst) {
            return;
        }

        match stream.subscribe(&user_id).await {
            Ok(mut subscription) => {
                while let Some(notice) = subscription.next().await {
                    if closed.load(Ordering::SeqCst) {
                        return;
                    }
                    match notice {
                        StreamNotice::Subscribed => {
                            monitor.lock().await.on_subscribed();
                            info!(user_id = %user_id, "change-stream connected");
                        }
                        StreamNotice::Change(event) => {
                            reconciler.lock().await.apply(&event);
                        }
                        StreamNotice::Error(message) => {
                            warn!(user_id = %user_id, %message, "change-stream channel error");
                            break;
                        }
                    }
                }
                // The subscription handle drops here, releasing the channel
                // before any new attempt starts.
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "change-stream subscribe failed");
            }
        }

        if closed.load(Ordering::SeqCst) {
            return;
        }
        monitor.lock().await.on_error();

        tokio::select! {
            _ = tokio::time::sleep(retry_delay) => {}
            _ = nudge.notified() => {}
        }

        if closed.load(Ordering::SeqCst) {
            return;
        }
        monitor.lock().await.begin_attempt();
    }
}
