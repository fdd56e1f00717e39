//! Push notifications over STOMP/WebSocket.
//!
//! [`NotificationChannel`] keeps one subscription to the shipment topic
//! alive and writes every pushed record into the
//! [`ShipmentStore`](crate::store::ShipmentStore). Connection progress is
//! published as a [`ChannelState`].

mod channel;
pub mod frame;
mod payload;

pub use channel::NotificationChannel;
pub use frame::{Command, Frame, FrameError};
pub use payload::{Applied, PushPayload, apply_payload};

use serde::Serialize;
use thiserror::Error;

/// Connection lifecycle of the push channel.
///
/// `Disconnected → Connecting → Connected → Subscribed`. After a transport
/// failure it sits in `Disconnected` for the reconnect delay, then moves to
/// `Connecting` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelState {
    #[default]
    Disconnected,
    /// Attempt counter restarts at 1 after every successful subscription.
    Connecting { attempt: u32 },
    Connected,
    Subscribed,
}

impl ChannelState {
    #[must_use]
    pub const fn is_subscribed(self) -> bool {
        matches!(self, Self::Subscribed)
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting { attempt } => write!(f, "connecting (attempt {attempt})"),
            Self::Connected => f.write_str("connected"),
            Self::Subscribed => f.write_str("subscribed"),
        }
    }
}

/// Push channel failures.
///
/// Everything except `Decode` ends the current connection and triggers a
/// reconnect.
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("STOMP frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Connection closed")]
    Closed,

    #[error("Timed out waiting for CONNECTED")]
    HandshakeTimeout,

    #[error("Payload decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_state_json() {
        assert_eq!(
            serde_json::to_value(ChannelState::Connecting { attempt: 3 }).unwrap(),
            serde_json::json!({"state": "CONNECTING", "attempt": 3})
        );
        assert_eq!(
            serde_json::to_value(ChannelState::Subscribed).unwrap(),
            serde_json::json!({"state": "SUBSCRIBED"})
        );
    }

    #[test]
    fn test_channel_state_default() {
        assert_eq!(ChannelState::default(), ChannelState::Disconnected);
        assert!(!ChannelState::Connected.is_subscribed());
        assert!(ChannelState::Subscribed.is_subscribed());
    }
}
