//! Fake STOMP broker over WebSocket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use freight_tracker_dashboard::config::RealtimeConfig;
use freight_tracker_dashboard::realtime::{Command, Frame};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;

const DEFAULT_DESTINATION: &str = "/topic/shipments";

#[derive(Debug, Clone)]
enum Control {
    Push(String),
    Drop,
}

/// Accepts any number of sessions, answers CONNECT with CONNECTED and
/// delivers pushed bodies as MESSAGE frames to every open session.
#[derive(Debug, Clone)]
pub struct FakeBroker {
    addr: SocketAddr,
    control: broadcast::Sender<Control>,
    sessions: Arc<AtomicUsize>,
    subscriptions: Arc<AtomicUsize>,
}

impl FakeBroker {
    /// Start the broker on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let listener = super::bind().await?;
        let addr = listener.local_addr()?;
        let (control, _) = broadcast::channel(64);
        let broker = Self {
            addr,
            control,
            sessions: Arc::new(AtomicUsize::new(0)),
            subscriptions: Arc::new(AtomicUsize::new(0)),
        };
        tokio::spawn(broker.clone().accept_loop(listener));
        Ok(broker)
    }

    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Channel configuration with a short reconnect delay.
    #[must_use]
    pub fn config(&self) -> RealtimeConfig {
        let mut config = RealtimeConfig::new(self.ws_url());
        config.reconnect_delay = std::time::Duration::from_millis(50);
        config
    }

    /// Deliver `body` to every open session.
    pub fn push(&self, body: impl Into<String>) {
        let _ = self.control.send(Control::Push(body.into()));
    }

    /// Close every open session.
    pub fn drop_sessions(&self) {
        let _ = self.control.send(Control::Drop);
    }

    /// Sessions that completed the WebSocket handshake.
    #[must_use]
    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    /// SUBSCRIBE frames received.
    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    async fn accept_loop(self, listener: TcpListener) {
        while let Ok((stream, _)) = listener.accept().await {
            let control = self.control.subscribe();
            tokio::spawn(self.clone().session(stream, control));
        }
    }

    async fn session(self, stream: TcpStream, mut control: broadcast::Receiver<Control>) {
        let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };
        self.sessions.fetch_add(1, Ordering::SeqCst);
        let (mut sink, mut source) = ws.split();
        let mut destination = DEFAULT_DESTINATION.to_string();
        let mut subscription = "sub-0".to_string();
        let mut message_id: u64 = 0;

        loop {
            tokio::select! {
                incoming = source.next() => {
                    let Some(Ok(message)) = incoming else { break };
                    let Message::Text(text) = message else { continue };
                    let Ok(Some(frame)) = Frame::decode(text.as_str()) else { continue };
                    match frame.command {
                        Command::Connect | Command::Stomp => {
                            let reply = Frame::new(Command::Connected)
                                .header("version", "1.2")
                                .header("heart-beat", "0,0");
                            if sink.send(Message::Text(reply.encode().into())).await.is_err() {
                                break;
                            }
                        }
                        Command::Subscribe => {
                            if let Some(d) = frame.get("destination") {
                                destination = d.to_string();
                            }
                            if let Some(id) = frame.get("id") {
                                subscription = id.to_string();
                            }
                            self.subscriptions.fetch_add(1, Ordering::SeqCst);
                        }
                        Command::Disconnect => break,
                        _ => {}
                    }
                }
                command = control.recv() => match command {
                    Ok(Control::Push(body)) => {
                        message_id += 1;
                        let frame = Frame::new(Command::Message)
                            .header("destination", destination.as_str())
                            .header("subscription", subscription.as_str())
                            .header("message-id", message_id.to_string())
                            .header("content-type", "application/json")
                            .body(body);
                        if sink.send(Message::Text(frame.encode().into())).await.is_err() {
                            break;
                        }
                    }
                    Ok(Control::Drop) | Err(RecvError::Closed) => {
                        let _ = sink.close().await;
                        break;
                    }
                    Err(RecvError::Lagged(_)) => {}
                },
            }
        }
    }
}
