//! Smartmarks — realtime personal bookmark manager client.
//!
//! Entry point: runs an interactive console demo against the in-memory
//! service, exercising every component without a network. The hosted-service
//! path is exposed through the `smartmarks-rpc` binary.

use std::sync::Arc;
use std::time::Duration;

use smartmarks::app::App;
use smartmarks::config::AppConfig;
use smartmarks::managers::connection_monitor::ConnectionMonitor;
use smartmarks::managers::editor::Editor;
use smartmarks::managers::live_feed::LiveFeed;
use smartmarks::managers::reconciler::Reconciler;
use smartmarks::managers::session_gate::{Route, View};
use smartmarks::services::memory::MemoryService;
use smartmarks::services::record_store::RecordStoreTrait;
use smartmarks::types::bookmark::NewBookmark;
use smartmarks::types::change::ChangeEvent;
use smartmarks::types::identity::Identity;

fn demo_user() -> Identity {
    Identity {
        id: "user-1".to_string(),
        email: "ada@example.com".to_string(),
        full_name: Some("Ada Lovelace".to_string()),
    }
}

/// Give spawned feed tasks a moment to drain the stream.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║             Smartmarks v{} — Demo Mode                      ║", env!("CARGO_PKG_VERSION"));
    println!("║     Realtime bookmark manager client, in-memory service     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    demo_config();
    demo_session_gate().await;
    demo_editor().await;
    demo_reconciler();
    demo_live_feed().await;
    demo_connection_monitor().await;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ All components demonstrated successfully!");
    println!("═══════════════════════════════════════════════════════════════");
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn demo_config() {
    section("Configuration");

    let config = AppConfig::new(
        "https://svc.example.com",
        "demo-api-key",
        "https://app.example.com",
        None,
    )
    .expect("demo config is valid");
    println!("  Service URL:  {}", config.service_url);
    println!("  Callback URL: {}", config.callback_url());

    // A missing value fails fast instead of substituting a placeholder
    let missing = AppConfig::from_lookup(|_| None);
    println!("  Missing config rejected: {}", missing.is_err());
    println!("  ✓ Configuration OK");
    println!();
}

async fn demo_session_gate() {
    section("Session Gate");

    let service = MemoryService::new();
    let app = App::with_clients(service.clone(), service.clone(), service.clone());

    let (_, route) = app.session_gate.resolve(View::Dashboard).await;
    println!("  Signed out, dashboard → {:?}", route);
    assert_eq!(route, Route::RedirectTo(View::Landing));

    service.set_identity(Some(demo_user())).await;
    let (identity, route) = app.session_gate.resolve(View::Landing).await;
    println!(
        "  Signed in as {}, landing → {:?}",
        identity.as_ref().map(|u| u.display_name()).unwrap_or("?"),
        route
    );
    assert_eq!(route, Route::RedirectTo(View::Dashboard));
    println!("  ✓ Session gate OK");
    println!();
}

async fn demo_editor() {
    section("Record Editor");

    let service = MemoryService::new();
    let mut editor = Editor::new(service.clone(), "user-1");

    editor.set_title("  ");
    editor.set_url("https://example.com");
    println!("  Blank title rejected: {:?}", editor.validate().err());

    editor.set_title("Example");
    editor.set_url("not-a-url");
    println!("  Relative URL rejected: {:?}", editor.validate().err());

    editor.set_url("  https://example.com  ");
    let bookmark = editor.submit().await.expect("create succeeds");
    println!("  Created bookmark {} → {}", bookmark.title, bookmark.url);
    println!("  Fields cleared after submit: {}", editor.title().is_empty());
    println!("  ✓ Record editor OK");
    println!();
}

fn demo_reconciler() {
    section("Record Reconciler");

    let mut reconciler = Reconciler::new();
    reconciler.replace_all(Vec::new());

    let row = smartmarks::types::bookmark::Bookmark {
        id: "b-1".to_string(),
        user_id: "user-1".to_string(),
        title: "Example".to_string(),
        url: "https://example.com".to_string(),
        created_at: chrono::Utc::now(),
    };
    reconciler.apply(&ChangeEvent::insert(row.clone()));
    reconciler.apply(&ChangeEvent::insert(row));
    println!("  Duplicate insert deduplicated: {} record(s)", reconciler.len());

    reconciler.apply(&ChangeEvent::delete("missing"));
    println!("  Delete of unknown id is a no-op: {} record(s)", reconciler.len());
    println!("  ✓ Record reconciler OK");
    println!();
}

async fn demo_live_feed() {
    section("Live Feed");

    let service = MemoryService::new();
    service.set_identity(Some(demo_user())).await;

    let mut app = App::with_clients(service.clone(), service.clone(), service.clone());
    let (_, route) = app.open_dashboard().await;
    assert_eq!(route, Route::Stay);
    settle().await;

    // Create through the editor; the stream notification fills the feed
    if let Some(editor) = app.editor.as_mut() {
        editor.set_title("Example");
        editor.set_url("https://example.com");
        editor.submit().await.expect("create succeeds");
    }
    settle().await;

    // A second session's create arrives via the stream only
    service
        .create(&NewBookmark {
            title: "Other".to_string(),
            url: "https://other.com".to_string(),
            user_id: "user-1".to_string(),
        })
        .await
        .expect("create succeeds");
    settle().await;

    if let Some(feed) = app.feed.as_ref() {
        let titles: Vec<String> = feed
            .snapshot()
            .await
            .iter()
            .map(|b| b.title.clone())
            .collect();
        println!("  Feed after two creates (newest first): {:?}", titles);

        let first_id = feed.snapshot().await.last().map(|b| b.id.clone());
        if let Some(id) = first_id {
            feed.delete(&id).await.expect("delete succeeds");
            settle().await;
            println!("  Feed after delete: {} record(s)", feed.snapshot().await.len());
        }
        println!("  Connection: {:?}", feed.connection_state().await);
    }

    app.close_session();
    println!("  ✓ Live feed OK");
    println!();
}

async fn demo_connection_monitor() {
    section("Connection Monitor");

    let service = MemoryService::new();
    let mut feed = LiveFeed::new(service.clone(), service.clone(), "user-1")
        .with_retry_delay(Duration::from_millis(200));
    let _ = feed.load().await;
    feed.start();
    settle().await;
    println!("  After subscribe: {:?}", feed.connection_state().await);

    service.emit_error("user-1", "CHANNEL_ERROR");
    settle().await;
    println!("  After channel error: {:?}", feed.connection_state().await);

    tokio::time::sleep(Duration::from_millis(400)).await;
    println!("  After automatic retry: {:?}", feed.connection_state().await);

    let mut monitor = ConnectionMonitor::new();
    monitor.on_error();
    println!("  Manual retry accepted while disconnected: {}", monitor.retry());

    feed.close();
    println!("  ✓ Connection monitor OK");
    println!();
}
