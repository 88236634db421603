//! RPC method handler for the Smartmarks JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls from the
//! UI shell to the session gate, editor, and live feed via the `App`
//! struct. Error strings carry the underlying service messages verbatim.

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::app::App;
use crate::managers::session_gate::{Route, View};
use crate::services::identity_provider::IdentityProviderTrait;

fn route_json(route: Route) -> Value {
    match route {
        Route::Stay => json!({"route": "stay"}),
        Route::RedirectTo(View::Landing) => json!({"route": "redirect", "to": "landing"}),
        Route::RedirectTo(View::Dashboard) => json!({"route": "redirect", "to": "dashboard"}),
    }
}

fn parse_view(name: &str) -> Result<View, String> {
    match name {
        "landing" => Ok(View::Landing),
        "dashboard" => Ok(View::Dashboard),
        other => Err(format!("unknown view: {}", other)),
    }
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Auth / session gate ───
        "auth.status" => {
            let a = app.lock().await;
            match a.identity.current_identity().await {
                Some(user) => Ok(json!({
                    "authenticated": true,
                    "user": {
                        "id": user.id,
                        "email": user.email,
                        "display_name": user.display_name(),
                    },
                })),
                None => Ok(json!({"authenticated": false})),
            }
        }
        "auth.sign_in_url" => {
            let provider = params
                .get("provider")
                .and_then(|v| v.as_str())
                .unwrap_or("google");
            let a = app.lock().await;
            let url = a
                .session_gate
                .sign_in_url(provider)
                .map_err(|e| e.to_string())?;
            Ok(json!({"url": url.as_str()}))
        }
        "auth.sign_out" => {
            let mut a = app.lock().await;
            let route = a.sign_out().await.map_err(|e| e.to_string())?;
            Ok(route_json(route))
        }
        "view.resolve" => {
            let view = params
                .get("view")
                .and_then(|v| v.as_str())
                .ok_or("missing view")?;
            let a = app.lock().await;
            let (_, route) = a.session_gate.resolve(parse_view(view)?).await;
            Ok(route_json(route))
        }
        "dashboard.open" => {
            let mut a = app.lock().await;
            let (identity, route) = a.open_dashboard().await;
            let mut result = route_json(route);
            if let (Some(user), Value::Object(map)) = (identity, &mut result) {
                map.insert(
                    "user".to_string(),
                    json!({
                        "id": user.id,
                        "email": user.email,
                        "display_name": user.display_name(),
                    }),
                );
            }
            Ok(result)
        }

        // ─── Bookmarks ───
        "bookmark.add" => {
            let title = params
                .get("title")
                .and_then(|v| v.as_str())
                .ok_or("missing title")?;
            let url = params
                .get("url")
                .and_then(|v| v.as_str())
                .ok_or("missing url")?;
            let mut a = app.lock().await;
            let editor = a.editor.as_mut().ok_or("not signed in")?;
            editor.set_title(title);
            editor.set_url(url);
            let bookmark = editor.submit().await.map_err(|e| e.to_string())?;
            serde_json::to_value(bookmark).map_err(|e| e.to_string())
        }
        "bookmark.list" => {
            let a = app.lock().await;
            let feed = a.feed.as_ref().ok_or("not signed in")?;
            serde_json::to_value(feed.snapshot().await).map_err(|e| e.to_string())
        }
        "bookmark.delete" => {
            let id = params.get("id").and_then(|v| v.as_str()).ok_or("missing id")?;
            let a = app.lock().await;
            let feed = a.feed.as_ref().ok_or("not signed in")?;
            feed.delete(id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Feed / connection indicator ───
        "feed.status" => {
            let a = app.lock().await;
            let feed = a.feed.as_ref().ok_or("not signed in")?;
            Ok(json!({
                "connection": feed.connection_state().await,
                "loading": feed.is_loading().await,
                "count": feed.snapshot().await.len(),
                "deleting": feed.deleting_ids().await,
                "last_error": feed.last_error().await,
            }))
        }
        "feed.retry" => {
            let a = app.lock().await;
            let feed = a.feed.as_ref().ok_or("not signed in")?;
            feed.retry().await;
            Ok(json!({"ok": true}))
        }
        "feed.online" => {
            let a = app.lock().await;
            let feed = a.feed.as_ref().ok_or("not signed in")?;
            feed.notify_online().await;
            Ok(json!({"ok": true}))
        }
        "feed.offline" => {
            let a = app.lock().await;
            let feed = a.feed.as_ref().ok_or("not signed in")?;
            feed.notify_offline().await;
            Ok(json!({"ok": true}))
        }
        "feed.visible" => {
            let a = app.lock().await;
            let feed = a.feed.as_ref().ok_or("not signed in")?;
            feed.notify_visible().await;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
