//! Unit tests for the bookmark editor.
//!
//! These tests exercise local validation (no network call for invalid
//! input), successful submission, verbatim store errors, and the
//! same-process fallback event, using the in-memory service.

use rstest::rstest;

use smartmarks::managers::editor::{Editor, LocalEvent};
use smartmarks::services::memory::MemoryService;
use smartmarks::services::record_store::RecordStoreTrait;
use smartmarks::types::errors::{EditorError, ValidationError};

#[rstest]
#[case("", "https://example.com")]
#[case("   ", "https://example.com")]
#[case("Example", "")]
#[case("Example", "   ")]
#[case("", "")]
fn test_empty_fields_rejected(#[case] title: &str, #[case] url: &str) {
    let service = MemoryService::new();
    let mut editor = Editor::new(service, "user-1");
    editor.set_title(title);
    editor.set_url(url);

    assert_eq!(editor.validate(), Err(ValidationError::MissingFields));
}

#[rstest]
#[case("example.com")]
#[case("not a url")]
#[case("/relative/path")]
#[case("://missing-scheme")]
fn test_non_absolute_url_rejected(#[case] url: &str) {
    let service = MemoryService::new();
    let mut editor = Editor::new(service, "user-1");
    editor.set_title("Example");
    editor.set_url(url);

    assert!(matches!(
        editor.validate(),
        Err(ValidationError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn test_invalid_input_issues_no_network_request() {
    let service = MemoryService::new();
    let mut editor = Editor::new(service.clone(), "user-1");
    editor.set_title("   ");
    editor.set_url("https://example.com");

    let result = editor.submit().await;
    assert!(matches!(
        result,
        Err(EditorError::Validation(ValidationError::MissingFields))
    ));
    // Nothing reached the store
    assert!(service.list_for_user("user-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_successful_submit_trims_and_clears_fields() {
    let service = MemoryService::new();
    let mut editor = Editor::new(service.clone(), "user-1");
    editor.set_title("  Example  ");
    editor.set_url("  https://example.com  ");

    let bookmark = editor.submit().await.unwrap();
    assert_eq!(bookmark.title, "Example");
    assert_eq!(bookmark.url, "https://example.com");
    assert_eq!(bookmark.user_id, "user-1");
    assert!(!bookmark.id.is_empty());

    // Fields clear so the next entry starts fresh
    assert_eq!(editor.title(), "");
    assert_eq!(editor.url(), "");
    assert!(!editor.is_in_flight());

    let rows = service.list_for_user("user-1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, bookmark.id);
}

#[tokio::test]
async fn test_store_failure_surfaces_message_and_retains_fields() {
    let service = MemoryService::new();
    service.fail_next_create("duplicate key value").await;

    let mut editor = Editor::new(service.clone(), "user-1");
    editor.set_title("Example");
    editor.set_url("https://example.com");

    let error = editor.submit().await.unwrap_err();
    // The service's message comes through verbatim
    assert!(error.to_string().contains("duplicate key value"));

    // Fields retain their values so the user can resubmit
    assert_eq!(editor.title(), "Example");
    assert_eq!(editor.url(), "https://example.com");
    assert!(!editor.is_in_flight());

    // Resubmission succeeds once the store recovers
    assert!(editor.submit().await.is_ok());
}

#[tokio::test]
async fn test_successful_submit_publishes_local_event() {
    let service = MemoryService::new();
    let mut editor = Editor::new(service, "user-1");
    let mut events = editor.subscribe_local();

    editor.set_title("Example");
    editor.set_url("https://example.com");
    editor.submit().await.unwrap();

    assert!(matches!(events.try_recv(), Ok(LocalEvent::BookmarkAdded)));
}

#[tokio::test]
async fn test_failed_submit_publishes_no_local_event() {
    let service = MemoryService::new();
    service.fail_next_create("boom").await;

    let mut editor = Editor::new(service, "user-1");
    let mut events = editor.subscribe_local();

    editor.set_title("Example");
    editor.set_url("https://example.com");
    let _ = editor.submit().await;

    assert!(events.try_recv().is_err());
}

#[test]
fn test_submit_disabled_follows_field_state() {
    let service = MemoryService::new();
    let mut editor = Editor::new(service, "user-1");

    assert!(editor.submit_disabled());

    editor.set_title("Example");
    assert!(editor.submit_disabled());

    editor.set_url("https://example.com");
    assert!(!editor.submit_disabled());

    editor.set_title("   ");
    assert!(editor.submit_disabled());
}
