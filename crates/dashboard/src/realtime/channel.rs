//! Reconnecting STOMP subscription.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use super::frame::{Command, Frame};
use super::payload::handle_message;
use super::{ChannelState, RealtimeError};
use crate::config::RealtimeConfig;
use crate::store::ShipmentStore;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Upper bound on the wait for CONNECTED after the socket opens.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Floor for the wait between reconnect attempts.
const MIN_RECONNECT_DELAY: Duration = Duration::from_millis(10);

const SUBSCRIPTION_ID: &str = "sub-0";

/// Push channel feeding a [`ShipmentStore`].
///
/// `connect` spawns a background task that connects, subscribes and applies
/// every MESSAGE to the store. On any transport failure it waits the
/// configured delay and tries again, indefinitely. `disconnect` stops it.
pub struct NotificationChannel {
    config: RealtimeConfig,
    store: Arc<ShipmentStore>,
    state: Arc<watch::Sender<ChannelState>>,
    task: Mutex<Option<Running>>,
}

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("config", &self.config)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl NotificationChannel {
    #[must_use]
    pub fn new(config: RealtimeConfig, store: Arc<ShipmentStore>) -> Self {
        let (state, _) = watch::channel(ChannelState::Disconnected);
        Self {
            config,
            store,
            state: Arc::new(state),
            task: Mutex::new(None),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Follow connection state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    /// Start the background subscription. No-op while already running.
    pub async fn connect(&self) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|running| !running.handle.is_finished()) {
            debug!("Push channel already running");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = Worker {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
        };
        info!(url = %self.config.ws_url, topic = %self.config.topic, "Starting push channel");
        let handle = tokio::spawn(worker.run(shutdown_rx));
        *task = Some(Running { shutdown, handle });
    }

    /// Stop the subscription and wait for the task to finish.
    ///
    /// Idempotent, and safe to call when never connected.
    pub async fn disconnect(&self) {
        let running = self.task.lock().await.take();
        if let Some(running) = running {
            let _ = running.shutdown.send(true);
            if let Err(e) = running.handle.await {
                error!(error = %e, "Push channel task failed");
            }
            info!("Push channel disconnected");
        }
        self.state.send_replace(ChannelState::Disconnected);
    }
}

struct Worker {
    config: RealtimeConfig,
    store: Arc<ShipmentStore>,
    state: Arc<watch::Sender<ChannelState>>,
}

impl Worker {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let delay = self.config.reconnect_delay.max(MIN_RECONNECT_DELAY);
        let retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        let mut attempt: u32 = 1;

        while !*shutdown.borrow() {
            self.state.send_replace(ChannelState::Connecting { attempt });

            match self.session(&mut shutdown).await {
                Ok(()) => break,
                Err(e) => warn!(error = %e, attempt, retry_in_ms, "Push channel dropped"),
            }

            attempt = if self.state.borrow().is_subscribed() {
                1
            } else {
                attempt.saturating_add(1)
            };
            self.state.send_replace(ChannelState::Disconnected);

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.state.send_replace(ChannelState::Disconnected);
    }

    /// One connection. `Ok` means shutdown was requested.
    async fn session(&self, shutdown: &mut watch::Receiver<bool>) -> Result<(), RealtimeError> {
        let connecting = tokio::select! {
            result = connect_async(self.config.ws_url.as_str()) => Some(result),
            _ = shutdown.changed() => None,
        };
        let Some(result) = connecting else {
            return Ok(());
        };
        let (stream, _) = result?;
        let (mut sink, mut source) = stream.split();

        send(&mut sink, &Frame::connect(&stomp_host(&self.config.ws_url))).await?;

        let reply = tokio::select! {
            frame = tokio::time::timeout(
                HANDSHAKE_TIMEOUT,
                next_frame(&mut source, &mut sink),
            ) => Some(frame),
            _ = shutdown.changed() => None,
        };
        let Some(reply) = reply else {
            return Ok(());
        };
        let reply = reply.map_err(|_| RealtimeError::HandshakeTimeout)??;
        match reply.command {
            Command::Connected => {}
            Command::Error => return Err(RealtimeError::Broker(error_message(&reply))),
            other => {
                return Err(RealtimeError::Broker(format!(
                    "expected CONNECTED, got {other}"
                )));
            }
        }
        self.state.send_replace(ChannelState::Connected);
        debug!(version = reply.get("version").unwrap_or("?"), "STOMP session established");

        send(&mut sink, &Frame::subscribe(SUBSCRIPTION_ID, &self.config.topic)).await?;
        self.state.send_replace(ChannelState::Subscribed);
        info!(topic = %self.config.topic, "Subscribed to shipment pushes");

        loop {
            let next = tokio::select! {
                frame = next_frame(&mut source, &mut sink) => Some(frame),
                _ = shutdown.changed() => None,
            };
            let Some(frame) = next else {
                break;
            };
            let frame = frame?;
            match frame.command {
                Command::Message => {
                    handle_message(&self.store, &frame.body, self.config.reject_stale_pushes);
                }
                Command::Error => return Err(RealtimeError::Broker(error_message(&frame))),
                other => debug!(command = %other, "Ignoring STOMP frame"),
            }
        }

        // Best effort; the socket is going away either way.
        let _ = send(&mut sink, &Frame::disconnect()).await;
        let _ = sink.close().await;
        Ok(())
    }
}

async fn send(sink: &mut WsSink, frame: &Frame) -> Result<(), RealtimeError> {
    sink.send(Message::Text(frame.encode().into())).await?;
    Ok(())
}

/// Read until a STOMP frame arrives, answering pings and skipping heart-beats.
async fn next_frame(source: &mut WsSource, sink: &mut WsSink) -> Result<Frame, RealtimeError> {
    loop {
        let message = source.next().await.ok_or(RealtimeError::Closed)??;
        let text = match message {
            Message::Text(text) => text.as_str().to_owned(),
            Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Message::Ping(data) => {
                sink.send(Message::Pong(data)).await?;
                continue;
            }
            Message::Close(_) => return Err(RealtimeError::Closed),
            Message::Pong(_) | Message::Frame(_) => continue,
        };
        if let Some(frame) = Frame::decode(&text)? {
            return Ok(frame);
        }
    }
}

fn error_message(frame: &Frame) -> String {
    frame
        .get("message")
        .map(str::to_owned)
        .unwrap_or_else(|| frame.body.trim().to_owned())
}

/// Virtual host sent in CONNECT: the host part of the endpoint.
fn stomp_host(ws_url: &str) -> String {
    url::Url::parse(ws_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stomp_host() {
        assert_eq!(stomp_host("ws://broker.internal:8080/ws"), "broker.internal");
        assert_eq!(stomp_host("garbage"), "localhost");
    }

    #[test]
    fn test_error_message_prefers_header() {
        let frame = Frame::new(Command::Error)
            .header("message", "bad destination")
            .body("details");
        assert_eq!(error_message(&frame), "bad destination");
        let frame = Frame::new(Command::Error).body(" details \n");
        assert_eq!(error_message(&frame), "details");
    }

    #[tokio::test]
    async fn test_disconnect_when_never_connected() {
        let channel = NotificationChannel::new(
            RealtimeConfig::new("ws://127.0.0.1:9/ws"),
            Arc::new(ShipmentStore::new()),
        );
        channel.disconnect().await;
        channel.disconnect().await;
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn test_unreachable_broker_keeps_connecting() {
        let mut config = RealtimeConfig::new("ws://127.0.0.1:9/ws");
        config.reconnect_delay = Duration::from_millis(20);
        let channel = NotificationChannel::new(config, Arc::new(ShipmentStore::new()));
        let mut states = channel.watch_state();

        channel.connect().await;
        let reached_second_attempt = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let ChannelState::Connecting { attempt } = *states.borrow_and_update() {
                    if attempt >= 2 {
                        return;
                    }
                }
                states.changed().await.unwrap();
            }
        })
        .await;
        assert!(reached_second_attempt.is_ok());

        channel.disconnect().await;
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn test_waits_disconnected_between_attempts() {
        let mut config = RealtimeConfig::new("ws://127.0.0.1:9/ws");
        config.reconnect_delay = Duration::from_secs(60);
        let channel = NotificationChannel::new(config, Arc::new(ShipmentStore::new()));
        let mut states = channel.watch_state();

        channel.connect().await;
        let saw_connecting = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if matches!(*states.borrow_and_update(), ChannelState::Connecting { .. }) {
                    return;
                }
                states.changed().await.unwrap();
            }
        })
        .await;
        assert!(saw_connecting.is_ok());
        let dropped = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if *states.borrow_and_update() == ChannelState::Disconnected {
                    return;
                }
                states.changed().await.unwrap();
            }
        })
        .await;
        assert!(dropped.is_ok());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(channel.state(), ChannelState::Disconnected);

        channel.disconnect().await;
    }

    #[tokio::test]
    async fn test_zero_delay_is_floored() {
        let mut config = RealtimeConfig::new("ws://127.0.0.1:9/ws");
        config.reconnect_delay = Duration::ZERO;
        let channel = NotificationChannel::new(config, Arc::new(ShipmentStore::new()));
        let mut states = channel.watch_state();
        let mut highest = 0;

        channel.connect().await;
        let _ = tokio::time::timeout(Duration::from_millis(100), async {
            loop {
                if let ChannelState::Connecting { attempt } = *states.borrow_and_update() {
                    highest = highest.max(attempt);
                }
                if states.changed().await.is_err() {
                    return;
                }
            }
        })
        .await;
        channel.disconnect().await;

        assert!(highest <= 12, "attempted {highest} times in 100ms");
    }
}
