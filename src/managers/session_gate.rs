//! Session gate for Smartmarks.
//!
//! Resolves the current identity and decides routing between the public
//! landing view and the protected dashboard. A failed identity lookup is
//! treated as "no identity"; the gate never retries.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::services::identity_provider::IdentityProviderTrait;
use crate::types::errors::AuthError;
use crate::types::identity::Identity;

/// The two navigable views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    Dashboard,
}

/// Routing decision for a requested view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Stay,
    RedirectTo(View),
}

/// Gate in front of the two views, backed by the identity provider.
pub struct SessionGate {
    identity: Arc<dyn IdentityProviderTrait>,
}

impl SessionGate {
    pub fn new(identity: Arc<dyn IdentityProviderTrait>) -> Self {
        Self { identity }
    }

    /// Resolves the identity and decides where the requested view leads:
    /// the dashboard redirects signed-out users to the landing view, and
    /// the landing view redirects signed-in users to the dashboard.
    pub async fn resolve(&self, requested: View) -> (Option<Identity>, Route) {
        let identity = self.identity.current_identity().await;

        let route = match (requested, identity.is_some()) {
            (View::Dashboard, false) => Route::RedirectTo(View::Landing),
            (View::Landing, true) => Route::RedirectTo(View::Dashboard),
            _ => Route::Stay,
        };

        debug!(?requested, ?route, signed_in = identity.is_some(), "session gate resolved");
        (identity, route)
    }

    /// URL starting the federated sign-in flow for the given provider.
    pub fn sign_in_url(&self, provider: &str) -> Result<Url, AuthError> {
        self.identity.sign_in_url(provider)
    }

    /// Signs the current user out. The caller routes back to the landing
    /// view afterwards.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.identity.sign_out().await
    }
}
