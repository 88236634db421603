//! Unit tests for the record reconciler.
//!
//! These tests exercise snapshot replacement and the insert/update/delete
//! merge rules, including duplicate delivery and unknown ids.

use chrono::{Duration, TimeZone, Utc};

use smartmarks::managers::reconciler::Reconciler;
use smartmarks::types::bookmark::Bookmark;
use smartmarks::types::change::{ChangeEvent, ChangeKind};

/// Helper: a bookmark with a deterministic timestamp derived from `n`.
fn bookmark(n: i64) -> Bookmark {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Bookmark {
        id: format!("b-{}", n),
        user_id: "user-1".to_string(),
        title: format!("Bookmark {}", n),
        url: format!("https://example.com/{}", n),
        created_at: base + Duration::seconds(n),
    }
}

/// Helper: snapshot of ids currently in the sequence.
fn ids(reconciler: &Reconciler) -> Vec<&str> {
    reconciler.records().iter().map(|b| b.id.as_str()).collect()
}

#[test]
fn test_new_reconciler_is_loading_and_empty() {
    let reconciler = Reconciler::new();
    assert!(reconciler.is_loading());
    assert!(reconciler.is_empty());
}

#[test]
fn test_replace_all_installs_snapshot_and_clears_loading() {
    let mut reconciler = Reconciler::new();
    reconciler.replace_all(vec![bookmark(2), bookmark(1)]);

    assert!(!reconciler.is_loading());
    assert_eq!(ids(&reconciler), vec!["b-2", "b-1"]);
}

#[test]
fn test_mark_load_failed_clears_loading_only() {
    let mut reconciler = Reconciler::new();
    reconciler.mark_load_failed();

    assert!(!reconciler.is_loading());
    assert!(reconciler.is_empty());
}

#[test]
fn test_insert_prepends_new_record() {
    let mut reconciler = Reconciler::new();
    reconciler.replace_all(vec![bookmark(1)]);

    reconciler.apply(&ChangeEvent::insert(bookmark(2)));
    assert_eq!(ids(&reconciler), vec!["b-2", "b-1"]);
}

#[test]
fn test_duplicate_insert_is_ignored() {
    let mut reconciler = Reconciler::new();
    reconciler.replace_all(vec![bookmark(1)]);

    reconciler.apply(&ChangeEvent::insert(bookmark(2)));
    reconciler.apply(&ChangeEvent::insert(bookmark(2)));

    assert_eq!(reconciler.len(), 2);
    assert_eq!(ids(&reconciler), vec!["b-2", "b-1"]);
}

#[test]
fn test_insert_without_payload_is_ignored() {
    let mut reconciler = Reconciler::new();
    reconciler.replace_all(vec![bookmark(1)]);

    // A malformed insert notification carries no new row
    reconciler.apply(&ChangeEvent {
        kind: ChangeKind::Insert,
        new: None,
        old: None,
    });
    assert_eq!(reconciler.len(), 1);
}

#[test]
fn test_update_replaces_in_place_preserving_position() {
    let mut reconciler = Reconciler::new();
    reconciler.replace_all(vec![bookmark(3), bookmark(2), bookmark(1)]);

    let mut updated = bookmark(2);
    updated.title = "Renamed".to_string();
    reconciler.apply(&ChangeEvent::update(updated));

    assert_eq!(ids(&reconciler), vec!["b-3", "b-2", "b-1"]);
    assert_eq!(reconciler.records()[1].title, "Renamed");
}

#[test]
fn test_update_for_unknown_id_is_noop() {
    let mut reconciler = Reconciler::new();
    reconciler.replace_all(vec![bookmark(1)]);

    reconciler.apply(&ChangeEvent::update(bookmark(9)));
    assert_eq!(ids(&reconciler), vec!["b-1"]);
}

#[test]
fn test_delete_removes_matching_record() {
    let mut reconciler = Reconciler::new();
    reconciler.replace_all(vec![bookmark(2), bookmark(1)]);

    reconciler.apply(&ChangeEvent::delete("b-1"));
    assert_eq!(ids(&reconciler), vec!["b-2"]);
}

#[test]
fn test_delete_of_unknown_id_is_silent_noop() {
    let mut reconciler = Reconciler::new();
    reconciler.replace_all(vec![bookmark(1)]);

    reconciler.apply(&ChangeEvent::delete("missing"));
    assert_eq!(ids(&reconciler), vec!["b-1"]);
}

/// Scenario from the product flow: snapshot with one record, a second
/// arrives via the stream, then the first is deleted.
#[test]
fn test_create_stream_delete_scenario() {
    let mut reconciler = Reconciler::new();
    reconciler.replace_all(vec![bookmark(1)]);
    assert_eq!(ids(&reconciler), vec!["b-1"]);

    reconciler.apply(&ChangeEvent::insert(bookmark(2)));
    assert_eq!(ids(&reconciler), vec!["b-2", "b-1"]);

    reconciler.apply(&ChangeEvent::delete("b-1"));
    assert_eq!(ids(&reconciler), vec!["b-2"]);
}

#[test]
fn test_delete_tracking_suppresses_duplicates() {
    let mut reconciler = Reconciler::new();

    assert!(reconciler.begin_delete("b-1"));
    assert!(!reconciler.begin_delete("b-1"));
    assert!(reconciler.is_deleting("b-1"));

    reconciler.finish_delete("b-1");
    assert!(!reconciler.is_deleting("b-1"));
    assert!(reconciler.begin_delete("b-1"));
}

#[test]
fn test_delete_tracking_handles_multiple_records() {
    let mut reconciler = Reconciler::new();

    assert!(reconciler.begin_delete("b-1"));
    assert!(reconciler.begin_delete("b-2"));
    assert!(reconciler.is_deleting("b-1"));
    assert!(reconciler.is_deleting("b-2"));

    reconciler.finish_delete("b-1");
    assert!(!reconciler.is_deleting("b-1"));
    assert!(reconciler.is_deleting("b-2"));
}
