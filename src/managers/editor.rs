//! Bookmark editor for Smartmarks.
//!
//! Holds the two input fields, validates them locally before any network
//! call, and submits create requests to the record store. A successful
//! submission also publishes a same-process `BookmarkAdded` event so a feed
//! that has not finished subscribing to the change stream can refresh
//! immediately.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;
use url::Url;

use crate::services::record_store::RecordStoreTrait;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::{EditorError, ValidationError};

/// Same-process events published by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEvent {
    /// A bookmark was created in this process.
    BookmarkAdded,
}

/// Editor for one signed-in user.
pub struct Editor {
    store: Arc<dyn RecordStoreTrait>,
    user_id: String,
    title: String,
    url: String,
    in_flight: bool,
    local_events: broadcast::Sender<LocalEvent>,
}

impl Editor {
    pub fn new(store: Arc<dyn RecordStoreTrait>, user_id: impl Into<String>) -> Self {
        let (local_events, _) = broadcast::channel(16);
        Self {
            store,
            user_id: user_id.into(),
            title: String::new(),
            url: String::new(),
            in_flight: false,
            local_events,
        }
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether the submit control should be disabled: a request is
    /// outstanding, or either field is empty after trimming.
    pub fn submit_disabled(&self) -> bool {
        self.in_flight || self.title.trim().is_empty() || self.url.trim().is_empty()
    }

    /// Subscribes to this editor's same-process events.
    pub fn subscribe_local(&self) -> broadcast::Receiver<LocalEvent> {
        self.local_events.subscribe()
    }

    /// Validates the current fields without touching the network.
    ///
    /// Both fields are trimmed; empty fields and URLs that do not parse as
    /// absolute URLs are rejected with a user-visible message.
    pub fn validate(&self) -> Result<NewBookmark, ValidationError> {
        let title = self.title.trim();
        let url = self.url.trim();

        if title.is_empty() || url.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if Url::parse(url).is_err() {
            return Err(ValidationError::InvalidUrl(url.to_string()));
        }

        Ok(NewBookmark {
            title: title.to_string(),
            url: url.to_string(),
            user_id: self.user_id.clone(),
        })
    }

    /// Submits the current fields as a create request.
    ///
    /// On success the fields are cleared and `BookmarkAdded` is published.
    /// On failure the store's message is surfaced verbatim and the fields
    /// retain their values so the user can resubmit. A submission already in
    /// flight suppresses the duplicate.
    pub async fn submit(&mut self) -> Result<Bookmark, EditorError> {
        if self.in_flight {
            return Err(EditorError::Busy);
        }
        let payload = self.validate().map_err(EditorError::Validation)?;

        self.in_flight = true;
        let result = self.store.create(&payload).await;
        self.in_flight = false;

        match result {
            Ok(bookmark) => {
                self.title.clear();
                self.url.clear();
                // Same-tab fallback for feeds not yet subscribed; no
                // subscribers is fine.
                let _ = self.local_events.send(LocalEvent::BookmarkAdded);
                info!(id = %bookmark.id, "bookmark created");
                Ok(bookmark)
            }
            Err(e) => Err(EditorError::Store(e)),
        }
    }
}
