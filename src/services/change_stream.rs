//! Change-stream client for Smartmarks.
//!
//! Opens one websocket subscription per user against the hosted service's
//! realtime endpoint and forwards change notifications for the bookmarks
//! table. The service owns broadcast, ordering, and durability; this client
//! only joins a channel, keeps it alive, and reports what arrives.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

use crate::config::AppConfig;
use crate::types::change::ChangeEvent;
use crate::types::errors::StreamError;

/// Heartbeat cadence; also how often the idle check runs.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// A channel that has been silent this long (no acks, events, or heartbeat
/// replies) is considered dead and surfaces an error to the subscriber.
const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// What a subscription yields to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamNotice {
    /// The service acknowledged the subscription; events will follow.
    Subscribed,
    /// A change matching the subscription's filter.
    Change(ChangeEvent),
    /// The channel failed. The subscription is dead; the consumer decides
    /// whether and when to open a new one.
    Error(String),
}

/// Handle to one open change-stream subscription.
///
/// Dropping or closing the handle releases the underlying channel. Exactly
/// one subscription is held per mounted view; acquiring a new one must
/// release the previous handle first.
pub struct Subscription {
    notices: mpsc::Receiver<StreamNotice>,
    _closer: oneshot::Sender<()>,
}

impl Subscription {
    pub fn new(notices: mpsc::Receiver<StreamNotice>, closer: oneshot::Sender<()>) -> Self {
        Self {
            notices,
            _closer: closer,
        }
    }

    /// Next notice from the service. `None` means the channel is gone.
    pub async fn next(&mut self) -> Option<StreamNotice> {
        self.notices.recv().await
    }

    /// Releases the subscription explicitly.
    pub fn close(self) {}
}

/// Trait defining change-stream operations.
#[async_trait]
pub trait ChangeStreamTrait: Send + Sync {
    /// Opens one subscription scoped to the user's bookmarks, covering
    /// insert, update, and delete notifications.
    async fn subscribe(&self, user_id: &str) -> Result<Subscription, StreamError>;
}

/// Change stream backed by the hosted service's realtime websocket.
pub struct WsChangeStream {
    config: Arc<AppConfig>,
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Wire shape of an incoming realtime frame.
#[derive(Debug, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl WsChangeStream {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    fn topic(user_id: &str) -> String {
        format!("bookmarks:user-{}", user_id)
    }

    fn websocket_url(&self) -> Result<Url, StreamError> {
        let mut url = self
            .config
            .service_url
            .join("/realtime/v1/websocket")
            .map_err(|e| StreamError::ConnectFailed(e.to_string()))?;

        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(StreamError::ConnectFailed(format!(
                    "unsupported service scheme: {}",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| StreamError::ConnectFailed("cannot derive websocket URL".to_string()))?;
        url.query_pairs_mut().append_pair("apikey", &self.config.api_key);
        Ok(url)
    }
}

#[async_trait]
impl ChangeStreamTrait for WsChangeStream {
    async fn subscribe(&self, user_id: &str) -> Result<Subscription, StreamError> {
        let url = self.websocket_url()?;
        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| StreamError::ConnectFailed(e.to_string()))?;
        let (mut sink, source) = socket.split();

        // One channel per user, all three change kinds, filtered server-side.
        let join = serde_json::json!({
            "topic": Self::topic(user_id),
            "event": "subscribe",
            "payload": {
                "table": "bookmarks",
                "filter": format!("user_id=eq.{}", user_id),
                "kinds": ["INSERT", "UPDATE", "DELETE"],
            },
        });
        sink.send(Message::text(join.to_string()))
            .await
            .map_err(|e| StreamError::SubscribeFailed(e.to_string()))?;

        let (tx, notices) = mpsc::channel(64);
        let (close_tx, close_rx) = oneshot::channel();
        tokio::spawn(pump(sink, source, tx, close_rx));

        debug!(user_id, "change-stream subscription requested");
        Ok(Subscription::new(notices, close_tx))
    }
}

/// Drives one websocket channel: forwards frames to the subscriber, sends
/// heartbeats, and reports the first failure before shutting down.
async fn pump(
    mut sink: WsSink,
    mut source: WsSource,
    tx: mpsc::Sender<StreamNotice>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            _ = &mut close_rx => break,
            _ = ticker.tick() => {
                if last_seen.elapsed() > IDLE_TIMEOUT {
                    let _ = tx.send(StreamNotice::Error("channel idle timeout".to_string())).await;
                    break;
                }
                let heartbeat = serde_json::json!({"event": "heartbeat"});
                if sink.send(Message::text(heartbeat.to_string())).await.is_err() {
                    let _ = tx.send(StreamNotice::Error("heartbeat send failed".to_string())).await;
                    break;
                }
            }
            frame = source.next() => {
                match frame {
                    Some(Ok(message)) => {
                        last_seen = Instant::now();
                        if message.is_close() {
                            let _ = tx.send(StreamNotice::Error("channel closed by service".to_string())).await;
                            break;
                        }
                        let Ok(text) = message.to_text() else { continue };
                        if let Some(notice) = parse_frame(text) {
                            let fatal = matches!(notice, StreamNotice::Error(_));
                            if tx.send(notice).await.is_err() || fatal {
                                break;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "change-stream read failed");
                        let _ = tx.send(StreamNotice::Error(e.to_string())).await;
                        break;
                    }
                    None => {
                        let _ = tx.send(StreamNotice::Error("connection closed".to_string())).await;
                        break;
                    }
                }
            }
        }
    }
}

/// Maps an incoming frame to a notice. Frames this client does not care
/// about (heartbeat replies, presence) are dropped.
fn parse_frame(text: &str) -> Option<StreamNotice> {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            debug!(error = %e, "unparseable realtime frame dropped");
            return None;
        }
    };

    match frame.event.as_str() {
        "ack" => Some(StreamNotice::Subscribed),
        "change" => match serde_json::from_value::<ChangeEvent>(frame.payload) {
            Ok(event) => Some(StreamNotice::Change(event)),
            Err(e) => {
                debug!(error = %e, "malformed change payload dropped");
                None
            }
        },
        "error" => {
            let message = frame
                .payload
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("channel error");
            Some(StreamNotice::Error(message.to_string()))
        }
        _ => None,
    }
}
