use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved bookmark as the record store reports it.
///
/// `id` and `created_at` are assigned by the store on creation and never
/// change afterwards; `id` is the merge key for the live-change stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a bookmark. The store fills in `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub user_id: String,
}
