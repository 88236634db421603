//! App core for Smartmarks.
//!
//! Central struct holding the service clients and the per-session managers.
//! The clients are constructed explicitly from a validated [`AppConfig`]
//! and injected into each component; there is no module-level client handle
//! and no ambient configuration lookup past startup.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::managers::editor::Editor;
use crate::managers::live_feed::LiveFeed;
use crate::managers::session_gate::{Route, SessionGate, View};
use crate::services::change_stream::{ChangeStreamTrait, WsChangeStream};
use crate::services::identity_provider::{HttpIdentityProvider, IdentityProviderTrait};
use crate::services::record_store::{HttpRecordStore, RecordStoreTrait};
use crate::types::errors::AuthError;
use crate::types::identity::Identity;

/// Central application struct.
///
/// The editor and feed are created per signed-in user when the dashboard
/// opens and torn down when the user signs out or changes, so exactly one
/// subscription is held per displayed user.
pub struct App {
    pub identity: Arc<dyn IdentityProviderTrait>,
    pub store: Arc<dyn RecordStoreTrait>,
    pub stream: Arc<dyn ChangeStreamTrait>,
    pub session_gate: SessionGate,
    pub editor: Option<Editor>,
    pub feed: Option<LiveFeed>,
    current_user: Option<Identity>,
}

impl App {
    /// Builds an App against the hosted service described by `config`.
    ///
    /// `access_token` is the signed-in session's bearer token, when the UI
    /// shell has completed the sign-in flow.
    pub fn new(
        config: AppConfig,
        access_token: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("smartmarks/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let config = Arc::new(config);

        let identity: Arc<dyn IdentityProviderTrait> = Arc::new(HttpIdentityProvider::new(
            http.clone(),
            config.clone(),
            access_token.clone(),
        ));
        let store: Arc<dyn RecordStoreTrait> = Arc::new(HttpRecordStore::new(
            http,
            config.clone(),
            access_token,
        ));
        let stream: Arc<dyn ChangeStreamTrait> = Arc::new(WsChangeStream::new(config));

        Ok(Self::with_clients(identity, store, stream))
    }

    /// Builds an App from explicit client implementations. Used by the demo
    /// binary and the test suites with the in-memory service.
    pub fn with_clients(
        identity: Arc<dyn IdentityProviderTrait>,
        store: Arc<dyn RecordStoreTrait>,
        stream: Arc<dyn ChangeStreamTrait>,
    ) -> Self {
        let session_gate = SessionGate::new(identity.clone());
        Self {
            identity,
            store,
            stream,
            session_gate,
            editor: None,
            feed: None,
            current_user: None,
        }
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.current_user.as_ref()
    }

    /// Opens the dashboard: resolves the identity through the session gate
    /// and, when a user is present, constructs that user's editor and feed.
    ///
    /// A feed already running for a different user is closed first. A
    /// failed snapshot load is surfaced through the feed's `last_error`; the
    /// dashboard still opens with an empty list.
    pub async fn open_dashboard(&mut self) -> (Option<Identity>, Route) {
        let (identity, route) = self.session_gate.resolve(View::Dashboard).await;

        let user = match (&identity, route) {
            (Some(user), Route::Stay) => user.clone(),
            _ => return (identity, route),
        };

        let same_user = self
            .current_user
            .as_ref()
            .map(|u| u.id == user.id)
            .unwrap_or(false);
        if !same_user {
            self.close_session();
        }

        if self.feed.is_none() {
            info!(user_id = %user.id, "opening dashboard feed");
            let editor = Editor::new(self.store.clone(), user.id.clone());
            let mut feed = LiveFeed::new(self.store.clone(), self.stream.clone(), user.id.clone());

            if let Err(e) = feed.load().await {
                warn!(error = %e, "initial bookmark load failed");
            }
            feed.listen_local(editor.subscribe_local());
            feed.start();

            self.editor = Some(editor);
            self.feed = Some(feed);
            self.current_user = Some(user);
        }

        (identity, route)
    }

    /// Signs out at the identity provider and tears down the session state.
    pub async fn sign_out(&mut self) -> Result<Route, AuthError> {
        self.session_gate.sign_out().await?;
        self.close_session();
        Ok(Route::RedirectTo(View::Landing))
    }

    /// Tears down the per-user editor and feed, releasing the subscription.
    pub fn close_session(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.close();
        }
        self.editor = None;
        self.current_user = None;
    }
}
