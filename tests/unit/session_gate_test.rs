//! Unit tests for the session gate.
//!
//! These tests exercise the routing matrix between the landing and
//! dashboard views, the sign-in URL, and sign-out, using the in-memory
//! identity provider.

use std::sync::Arc;

use smartmarks::managers::session_gate::{Route, SessionGate, View};
use smartmarks::services::identity_provider::IdentityProviderTrait;
use smartmarks::services::memory::MemoryService;
use smartmarks::types::identity::Identity;

fn user() -> Identity {
    Identity {
        id: "user-1".to_string(),
        email: "ada@example.com".to_string(),
        full_name: Some("Ada Lovelace".to_string()),
    }
}

fn gate(service: &Arc<MemoryService>) -> SessionGate {
    SessionGate::new(service.clone())
}

#[tokio::test]
async fn test_signed_out_dashboard_redirects_to_landing() {
    let service = MemoryService::new();
    let (identity, route) = gate(&service).resolve(View::Dashboard).await;

    assert!(identity.is_none());
    assert_eq!(route, Route::RedirectTo(View::Landing));
}

#[tokio::test]
async fn test_signed_out_landing_stays() {
    let service = MemoryService::new();
    let (identity, route) = gate(&service).resolve(View::Landing).await;

    assert!(identity.is_none());
    assert_eq!(route, Route::Stay);
}

#[tokio::test]
async fn test_signed_in_landing_redirects_to_dashboard() {
    let service = MemoryService::new();
    service.set_identity(Some(user())).await;

    let (identity, route) = gate(&service).resolve(View::Landing).await;
    assert!(identity.is_some());
    assert_eq!(route, Route::RedirectTo(View::Dashboard));
}

#[tokio::test]
async fn test_signed_in_dashboard_stays() {
    let service = MemoryService::new();
    service.set_identity(Some(user())).await;

    let (identity, route) = gate(&service).resolve(View::Dashboard).await;
    assert_eq!(identity.map(|u| u.id), Some("user-1".to_string()));
    assert_eq!(route, Route::Stay);
}

#[tokio::test]
async fn test_failed_identity_lookup_treated_as_signed_out() {
    let service = MemoryService::new();
    service.set_identity(Some(user())).await;
    service.fail_next_identity().await;

    let (identity, route) = gate(&service).resolve(View::Dashboard).await;
    assert!(identity.is_none());
    assert_eq!(route, Route::RedirectTo(View::Landing));
}

#[tokio::test]
async fn test_sign_out_clears_identity() {
    let service = MemoryService::new();
    service.set_identity(Some(user())).await;

    let gate = gate(&service);
    gate.sign_out().await.unwrap();

    let (identity, route) = gate.resolve(View::Dashboard).await;
    assert!(identity.is_none());
    assert_eq!(route, Route::RedirectTo(View::Landing));
}

#[test]
fn test_sign_in_url_carries_provider() {
    let service = MemoryService::new();
    let url = service.sign_in_url("google").unwrap();
    assert!(url.as_str().contains("provider=google"));
}

#[test]
fn test_display_name_falls_back_to_email() {
    let mut identity = user();
    assert_eq!(identity.display_name(), "Ada Lovelace");

    identity.full_name = None;
    assert_eq!(identity.display_name(), "ada@example.com");

    identity.full_name = Some(String::new());
    assert_eq!(identity.display_name(), "ada@example.com");
}
