//! Record store client for Smartmarks.
//!
//! CRUD surface over the hosted service's `/rest/v1/bookmarks` table:
//! create, list-filtered-and-sorted, and delete-by-id. The service owns
//! persistence, uniqueness of `id`, and `user_id` authorization; this client
//! only shapes requests and surfaces the service's error messages verbatim.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::config::AppConfig;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::StoreError;

/// Trait defining record store operations over the Bookmark entity.
#[async_trait]
pub trait RecordStoreTrait: Send + Sync {
    /// Creates a bookmark. The store assigns `id` and `created_at` and
    /// returns the full row.
    async fn create(&self, record: &NewBookmark) -> Result<Bookmark, StoreError>;
    /// Lists all of a user's bookmarks, ordered by `created_at` descending.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Bookmark>, StoreError>;
    /// Deletes a bookmark by id, additionally scoped to `user_id`.
    ///
    /// Server-side authorization remains the trust boundary; the `user_id`
    /// scope here only guards against deleting a row that no longer belongs
    /// to the displayed user.
    async fn delete(&self, id: &str, user_id: &str) -> Result<(), StoreError>;
}

/// Record store backed by the hosted service's REST API.
pub struct HttpRecordStore {
    http: reqwest::Client,
    config: Arc<AppConfig>,
    access_token: Option<String>,
}

impl HttpRecordStore {
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

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.config.api_key)
    }

    fn table_url(&self) -> Result<Url, StoreError> {
        self.config
            .service_url
            .join("/rest/v1/bookmarks")
            .map_err(|e| StoreError::NetworkError(e.to_string()))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
    }

    /// Extracts the service's error message from a failed response,
    /// preferring the JSON `message` field and falling back to the raw body.
    async fn service_error(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| format!("store request failed with status {}", status));
        StoreError::ServiceError(message)
    }
}

#[async_trait]
impl RecordStoreTrait for HttpRecordStore {
    async fn create(&self, record: &NewBookmark) -> Result<Bookmark, StoreError> {
        let response = self
            .request(self.http.post(self.table_url()?))
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        // return=representation yields the created rows as an array
        let mut rows: Vec<Bookmark> = response
            .json()
            .await
            .map_err(|e| StoreError::ServiceError(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| StoreError::ServiceError("store returned no created row".to_string()))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        let user_filter = format!("eq.{}", user_id);
        let response = self
            .request(self.http.get(self.table_url()?))
            .query(&[
                ("user_id", user_filter.as_str()),
                ("order", "created_at.desc"),
                ("select", "*"),
            ])
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::ServiceError(e.to_string()))
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), StoreError> {
        let id_filter = format!("eq.{}", id);
        let user_filter = format!("eq.{}", user_id);
        let response = self
            .request(self.http.delete(self.table_url()?))
            .header("Prefer", "return=representation")
            .query(&[
                ("id", id_filter.as_str()),
                ("user_id", user_filter.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        let removed: Vec<Bookmark> = response
            .json()
            .await
            .map_err(|e| StoreError::ServiceError(e.to_string()))?;

        if removed.is_empty() {
            debug!(id, "delete matched no row");
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
