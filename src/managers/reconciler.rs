//! Record reconciler for Smartmarks.
//!
//! Merges a snapshot load with streamed change notifications into one
//! ordered in-memory view of a single user's bookmarks. Tolerates duplicate
//! delivery, unknown ids, and the race between a local create's success
//! callback and the corresponding stream notification.

use std::collections::HashSet;

use crate::types::bookmark::Bookmark;
use crate::types::change::{ChangeEvent, ChangeKind};

/// In-memory reconciler for one user's bookmark list.
pub struct Reconciler {
    records: Vec<Bookmark>,
    loading: bool,
    deleting: HashSet<String>,
}

impl Reconciler {
    /// Creates an empty reconciler in the loading state.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            loading: true,
            deleting: HashSet::new(),
        }
    }

    /// Replaces the sequence with a snapshot load result and clears the
    /// loading flag. The snapshot is trusted to be ordered by `created_at`
    /// descending; it is not re-sorted here.
    pub fn replace_all(&mut self, records: Vec<Bookmark>) {
        self.records = records;
        self.loading = false;
    }

    /// Clears the loading flag after a failed snapshot load, leaving the
    /// sequence empty or stale.
    pub fn mark_load_failed(&mut self) {
        self.loading = false;
    }

    /// Applies one change notification.
    ///
    /// - insert: prepend unless the id is already present (duplicate
    ///   delivery). Prepending assumes newest-first; a record delivered out
    ///   of timestamp order can sit out of position until the next full
    ///   reload.
    /// - update: replace the matching record in place, position preserved.
    /// - delete: remove the matching record; an unknown id is a no-op.
    pub fn apply(&mut self, event: &ChangeEvent) {
        match event.kind {
            ChangeKind::Insert => {
                if let Some(record) = &event.new {
                    if !self.contains(&record.id) {
                        self.records.insert(0, record.clone());
                    }
                }
            }
            ChangeKind::Update => {
                if let Some(record) = &event.new {
                    if let Some(position) = self.position(&record.id) {
                        self.records[position] = record.clone();
                    }
                }
            }
            ChangeKind::Delete => {
                if let Some(removed) = &event.old {
                    self.records.retain(|b| b.id != removed.id);
                }
            }
        }
    }

    /// Marks a deletion as in flight. Returns false if one is already in
    /// flight for this id, so the duplicate is suppressed. Deletions of
    /// different records are tracked independently.
    pub fn begin_delete(&mut self, id: &str) -> bool {
        self.deleting.insert(id.to_string())
    }

    /// Clears the in-flight marker for a deletion, whatever its outcome.
    pub fn finish_delete(&mut self, id: &str) {
        self.deleting.remove(id);
    }

    /// Whether a deletion is currently in flight for this id.
    pub fn is_deleting(&self, id: &str) -> bool {
        self.deleting.contains(id)
    }

    /// Ids with a deletion currently in flight.
    pub fn deleting_ids(&self) -> Vec<String> {
        self.deleting.iter().cloned().collect()
    }

    pub fn records(&self) -> &[Bookmark] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|b| b.id == id)
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}
