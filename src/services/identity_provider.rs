//! Identity provider client for Smartmarks.
//!
//! Wraps the hosted service's `/auth/v1` endpoints: resolving the current
//! identity, building the federated sign-in URL, and signing out.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::AppConfig;
use crate::types::errors::AuthError;
use crate::types::identity::Identity;

/// Trait defining identity provider operations.
///
/// A failed identity lookup is treated as "no identity" — the session gate
/// never retries and never blocks on the provider.
#[async_trait]
pub trait IdentityProviderTrait: Send + Sync {
    /// Resolves the currently authenticated identity, or `None`.
    async fn current_identity(&self) -> Option<Identity>;
    /// Builds the URL starting the federated sign-in flow for `provider`,
    /// redirecting back to the configured callback path.
    fn sign_in_url(&self, provider: &str) -> Result<Url, AuthError>;
    /// Revokes the current session at the provider.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Identity provider backed by the hosted service's auth API.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    config: Arc<AppConfig>,
    access_token: Option<String>,
}

/// Wire shape of the provider's "current user" response.
#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
}

impl HttpIdentityProvider {
    pub fn new(
        http: reqwest::Client,
        config: Arc<AppConfig>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            http,
            config,
            access_token,
        }
    }

    /// Bearer token sent on authenticated calls: the user's access token
    /// when present, the public API key otherwise.
    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.config.api_key)
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.config
            .service_url
            .join(path)
            .map_err(|e| AuthError::InvalidRedirect(e.to_string()))
    }
}

#[async_trait]
impl IdentityProviderTrait for HttpIdentityProvider {
    async fn current_identity(&self) -> Option<Identity> {
        let endpoint = self.endpoint("/auth/v1/user").ok()?;

        let response = self
            .http
            .get(endpoint)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "identity lookup failed, treating as signed out");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "no authenticated identity");
            return None;
        }

        let payload: UserPayload = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "identity payload unreadable, treating as signed out");
                return None;
            }
        };

        Some(Identity {
            id: payload.id,
            email: payload.email,
            full_name: payload.user_metadata.full_name,
        })
    }

    fn sign_in_url(&self, provider: &str) -> Result<Url, AuthError> {
        let mut url = self.endpoint("/auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", self.config.callback_url().as_str());
        Ok(url)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let endpoint = self.endpoint("/auth/v1/logout")?;

        let response = self
            .http
            .post(endpoint)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::ProviderError(format!(
                "sign-out failed with status {}: {}",
                status, body
            )))
        }
    }
}
