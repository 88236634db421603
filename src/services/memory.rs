//! In-memory stand-in for the hosted service.
//!
//! Implements the identity provider, record store, and change stream against
//! a single shared state, so the demo binary and the test suites exercise
//! the full client stack without a network. Mirrors the hosted service's
//! behavior: the store assigns `id` and `created_at`, and every mutation is
//! broadcast to subscriptions filtered by `user_id`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use url::Url;
use uuid::Uuid;

use crate::services::change_stream::{ChangeStreamTrait, StreamNotice, Subscription};
use crate::services::identity_provider::IdentityProviderTrait;
use crate::services::record_store::RecordStoreTrait;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::change::ChangeEvent;
use crate::types::errors::{AuthError, StoreError, StreamError};
use crate::types::identity::Identity;

/// Failure injection slots, one per store operation.
#[derive(Debug, Default)]
struct Failures {
    create: Option<String>,
    list: Option<String>,
    delete: Option<String>,
    identity: bool,
}

/// Shared in-memory service state.
pub struct MemoryService {
    rows: Mutex<Vec<Bookmark>>,
    identity: Mutex<Option<Identity>>,
    failures: Mutex<Failures>,
    events: broadcast::Sender<(String, StreamNotice)>,
}

impl MemoryService {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            identity: Mutex::new(None),
            failures: Mutex::new(Failures::default()),
            events,
        })
    }

    /// Signs a user in on the fake provider.
    pub async fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.lock().await = identity;
    }

    /// Makes the next create call fail with the given service message.
    pub async fn fail_next_create(&self, message: &str) {
        self.failures.lock().await.create = Some(message.to_string());
    }

    /// Makes the next list call fail with the given service message.
    pub async fn fail_next_list(&self, message: &str) {
        self.failures.lock().await.list = Some(message.to_string());
    }

    /// Makes the next delete call fail with the given service message.
    pub async fn fail_next_delete(&self, message: &str) {
        self.failures.lock().await.delete = Some(message.to_string());
    }

    /// Makes the next identity lookup fail (treated as signed out).
    pub async fn fail_next_identity(&self) {
        self.failures.lock().await.identity = true;
    }

    /// Updates a row's title and broadcasts the update notification,
    /// exercising the reconciler's update path (unused by the create/delete
    /// feature set but still delivered by the service).
    pub async fn update_title(&self, id: &str, title: &str) -> Result<Bookmark, StoreError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        row.title = title.to_string();
        let updated = row.clone();
        drop(rows);

        let owner = updated.user_id.clone();
        self.broadcast(&owner, StreamNotice::Change(ChangeEvent::update(updated.clone())));
        Ok(updated)
    }

    /// Delivers an arbitrary change notification to a user's subscriptions,
    /// bypassing the store. Used to simulate duplicate or out-of-order
    /// delivery.
    pub fn emit_change(&self, user_id: &str, event: ChangeEvent) {
        self.broadcast(user_id, StreamNotice::Change(event));
    }

    /// Delivers a channel error to a user's subscriptions, killing them.
    pub fn emit_error(&self, user_id: &str, message: &str) {
        self.broadcast(user_id, StreamNotice::Error(message.to_string()));
    }

    fn broadcast(&self, user_id: &str, notice: StreamNotice) {
        // No subscribers is fine; send only fails when nobody listens.
        let _ = self.events.send((user_id.to_string(), notice));
    }
}

#[async_trait]
impl RecordStoreTrait for MemoryService {
    async fn create(&self, record: &NewBookmark) -> Result<Bookmark, StoreError> {
        if let Some(message) = self.failures.lock().await.create.take() {
            return Err(StoreError::ServiceError(message));
        }

        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            user_id: record.user_id.clone(),
            title: record.title.clone(),
            url: record.url.clone(),
            created_at: Utc::now(),
        };
        self.rows.lock().await.push(bookmark.clone());
        self.broadcast(
            &record.user_id,
            StreamNotice::Change(ChangeEvent::insert(bookmark.clone())),
        );
        Ok(bookmark)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        if let Some(message) = self.failures.lock().await.list.take() {
            return Err(StoreError::ServiceError(message));
        }

        let mut rows: Vec<Bookmark> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), StoreError> {
        if let Some(message) = self.failures.lock().await.delete.take() {
            return Err(StoreError::ServiceError(message));
        }

        let mut rows = self.rows.lock().await;
        let position = rows
            .iter()
            .position(|b| b.id == id && b.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        rows.remove(position);
        drop(rows);

        self.broadcast(user_id, StreamNotice::Change(ChangeEvent::delete(id)));
        Ok(())
    }
}

#[async_trait]
impl IdentityProviderTrait for MemoryService {
    async fn current_identity(&self) -> Option<Identity> {
        let mut failures = self.failures.lock().await;
        if failures.identity {
            // A failed lookup is indistinguishable from "signed out".
            failures.identity = false;
            return None;
        }
        drop(failures);
        self.identity.lock().await.clone()
    }

    fn sign_in_url(&self, provider: &str) -> Result<Url, AuthError> {
        Url::parse(&format!("memory://sign-in?provider={}", provider))
            .map_err(|e| AuthError::InvalidRedirect(e.to_string()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.identity.lock().await = None;
        Ok(())
    }
}

#[async_trait]
impl ChangeStreamTrait for MemoryService {
    async fn subscribe(&self, user_id: &str) -> Result<Subscription, StreamError> {
        let mut events = self.events.subscribe();
        let (tx, notices) = mpsc::channel(64);
        let (close_tx, mut close_rx) = oneshot::channel();
        let uid = user_id.to_string();

        tokio::spawn(async move {
            if tx.send(StreamNotice::Subscribed).await.is_err() {
                return;
            }
            loop {
                tokio::select! {
                    _ = &mut close_rx => break,
                    received = events.recv() => match received {
                        Ok((user, notice)) if user == uid => {
                            let fatal = matches!(notice, StreamNotice::Error(_));
                            if tx.send(notice).await.is_err() || fatal {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });

        Ok(Subscription::new(notices, close_tx))
    }
}
