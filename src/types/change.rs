use serde::{Deserialize, Serialize};

use crate::types::bookmark::Bookmark;

/// Kind of change reported by the change-stream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Reference to a removed row. The stream only guarantees the `id` field on
/// delete notifications, so nothing else is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: String,
}

/// One change notification from the stream.
///
/// Inserts and updates carry the new row in `new`; deletes carry the removed
/// row's reference in `old`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    #[serde(default)]
    pub new: Option<Bookmark>,
    #[serde(default)]
    pub old: Option<RecordRef>,
}

impl ChangeEvent {
    pub fn insert(record: Bookmark) -> Self {
        Self {
            kind: ChangeKind::Insert,
            new: Some(record),
            old: None,
        }
    }

    pub fn update(record: Bookmark) -> Self {
        Self {
            kind: ChangeKind::Update,
            new: Some(record),
            old: None,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            new: None,
            old: Some(RecordRef { id: id.into() }),
        }
    }
}

/// Health of the live-change subscription as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}
