//! Property-based tests for editor input validation.
//!
//! These tests verify that, for arbitrary inputs, validation decides
//! purely on the trimmed fields: blank fields and non-absolute URLs are
//! always rejected before any network call, and well-formed inputs always
//! produce a trimmed create payload.

use proptest::prelude::*;

use smartmarks::managers::editor::Editor;
use smartmarks::services::memory::MemoryService;
use smartmarks::types::errors::ValidationError;

/// Strategy for generating valid URL strings.
/// Produces URLs with http/https scheme, alphanumeric host, and optional path.
fn arb_url() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("https"), Just("http")],
        "[a-z][a-z0-9]{2,15}",
        prop_oneof![Just(".com"), Just(".org"), Just(".net"), Just(".io")],
        proptest::option::of("/[a-z0-9]{1,10}"),
    )
        .prop_map(|(scheme, host, tld, path)| {
            format!("{}://{}{}{}", scheme, host, tld, path.unwrap_or_default())
        })
}

/// Strategy for generating non-empty bookmark titles.
fn arb_title() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{1,30}"
}

/// Strategy for whitespace-only strings (including empty).
fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t]{0,8}"
}

/// Strategy for strings that cannot be absolute URLs: no scheme separator
/// is ever present.
fn arb_non_url() -> impl Strategy<Value = String> {
    "[a-z][a-z ./]{0,20}"
}

fn editor_with(title: &str, url: &str) -> Editor {
    let mut editor = Editor::new(MemoryService::new(), "user-1");
    editor.set_title(title);
    editor.set_url(url);
    editor
}

// **Property: blank fields are always rejected**
//
// *For any* whitespace-only title (or URL), validation fails with the
// missing-fields message and produces no payload.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn blank_title_always_rejected(title in arb_blank(), url in arb_url()) {
        let editor = editor_with(&title, &url);
        prop_assert_eq!(editor.validate(), Err(ValidationError::MissingFields));
    }

    #[test]
    fn blank_url_always_rejected(title in arb_title(), url in arb_blank()) {
        let editor = editor_with(&title, &url);
        prop_assert_eq!(editor.validate(), Err(ValidationError::MissingFields));
    }

    // **Property: non-absolute URLs never pass validation**
    #[test]
    fn non_absolute_url_always_rejected(title in arb_title(), url in arb_non_url()) {
        let editor = editor_with(&title, &url);
        let trimmed = url.trim();
        if trimmed.is_empty() {
            prop_assert_eq!(editor.validate(), Err(ValidationError::MissingFields));
        } else {
            prop_assert_eq!(
                editor.validate(),
                Err(ValidationError::InvalidUrl(trimmed.to_string()))
            );
        }
    }

    // **Property: well-formed input yields a trimmed payload**
    //
    // Whatever whitespace padding surrounds the fields, the payload carries
    // the trimmed title and URL and the editor's user id.
    #[test]
    fn valid_input_produces_trimmed_payload(
        title in arb_title(),
        url in arb_url(),
        pad_left in "[ ]{0,3}",
        pad_right in "[ ]{0,3}",
    ) {
        let padded_title = format!("{}{}{}", pad_left, title, pad_right);
        let padded_url = format!("{}{}{}", pad_left, url, pad_right);
        let editor = editor_with(&padded_title, &padded_url);

        let payload = editor.validate().expect("valid input must pass");
        prop_assert_eq!(payload.title, title.trim().to_string());
        prop_assert_eq!(payload.url, url);
        prop_assert_eq!(payload.user_id, "user-1".to_string());
    }
}
