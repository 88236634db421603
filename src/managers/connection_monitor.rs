//! Connection monitor for Smartmarks.
//!
//! Tracks the health of the live-change subscription as a tri-state
//! indicator and gates when a new subscription attempt may start. Purely an
//! observability wrapper around the feed's subscription lifecycle; it owns
//! no data.

use std::time::Duration;

use tracing::debug;

use crate::types::change::ConnectionState;

/// Fixed delay before the automatic retry after a subscription failure.
pub const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Tri-state subscription health indicator.
///
/// Transitions: Connecting → Connected on subscribe acknowledgment;
/// Connecting|Connected → Disconnected on error, timeout, or offline event;
/// Disconnected → Connecting on manual retry, regained visibility, or an
/// online event. There is no terminal state.
pub struct ConnectionMonitor {
    state: ConnectionState,
}

impl ConnectionMonitor {
    /// A new monitor starts in Connecting: the first subscription attempt
    /// begins as soon as the feed starts.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// A new subscription attempt is starting.
    pub fn begin_attempt(&mut self) {
        self.transition(ConnectionState::Connecting);
    }

    /// The service acknowledged the subscription. A stale acknowledgment
    /// arriving while disconnected is ignored.
    pub fn on_subscribed(&mut self) {
        if self.state == ConnectionState::Connecting {
            self.transition(ConnectionState::Connected);
        }
    }

    /// The subscription failed or timed out.
    pub fn on_error(&mut self) {
        self.transition(ConnectionState::Disconnected);
    }

    /// The environment reports the network is gone.
    pub fn on_offline(&mut self) {
        self.transition(ConnectionState::Disconnected);
    }

    /// Manual retry action. Only acts while disconnected; returns whether a
    /// new attempt should proceed.
    pub fn retry(&mut self) -> bool {
        if self.state == ConnectionState::Disconnected {
            self.transition(ConnectionState::Connecting);
            true
        } else {
            false
        }
    }

    /// The environment regained network connectivity.
    pub fn notify_online(&mut self) -> bool {
        self.retry()
    }

    /// The browsing context became visible again.
    pub fn notify_visible(&mut self) -> bool {
        self.retry()
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "connection state changed");
            self.state = next;
        }
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}
