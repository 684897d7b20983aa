use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::connection::ConnectionState;
use super::protocol::FrameError;

/// Identifies one transport instance. Events from a superseded transport
/// carry an older generation and are ignored.
pub type Generation = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    Closed { reason: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    pub generation: Generation,
    pub event: TransportEvent,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("transport is not open ({0:?})")]
    NotOpen(ConnectionState),
    #[error("transport closed")]
    Closed,
    #[error(transparent)]
    Encode(#[from] FrameError),
}

/// Where a transport reports readiness changes and inbound frames.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: Generation,
    tx: mpsc::UnboundedSender<TransportMessage>,
}

impl EventSink {
    pub fn new(generation: Generation, tx: mpsc::UnboundedSender<TransportMessage>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns false once nobody is listening any more.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx
            .send(TransportMessage {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    pub fn opened(&self) -> bool {
        self.emit(TransportEvent::Opened)
    }

    pub fn frame(&self, text: String) -> bool {
        self.emit(TransportEvent::Frame(text))
    }

    pub fn closed(&self, reason: Option<String>) -> bool {
        self.emit(TransportEvent::Closed { reason })
    }
}

pub trait Transport: Send {
    fn send(&mut self, frame: String) -> Result<(), SendError>;
    fn close(&mut self);
}

/// Creates transports. `open` must not block: the transport reports
/// `Opened` or `Closed` through `events` once the outcome is known.
pub trait Connector: Send {
    type Transport: Transport;

    fn open(&mut self, url: &str, events: EventSink) -> Self::Transport;
}

#[derive(Debug)]
enum Outgoing {
    Text(String),
    Close,
}

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Websocket transport backed by a tokio task.
///
/// A connect attempt that has not completed the handshake within
/// `connect_timeout` is reported as closed.
#[derive(Debug, Clone, Copy)]
pub struct WebSocketConnector {
    connect_timeout: Duration,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl WebSocketConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

#[derive(Debug)]
pub struct WebSocketTransport {
    outbound: mpsc::UnboundedSender<Outgoing>,
}

impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    /// Must be called from within a tokio runtime.
    fn open(&mut self, url: &str, events: EventSink) -> WebSocketTransport {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(
            url.to_string(),
            self.connect_timeout,
            events,
            rx,
        ));
        WebSocketTransport { outbound: tx }
    }
}

impl Transport for WebSocketTransport {
    fn send(&mut self, frame: String) -> Result<(), SendError> {
        self.outbound
            .send(Outgoing::Text(frame))
            .map_err(|_| SendError::Closed)
    }

    fn close(&mut self) {
        let _ = self.outbound.send(Outgoing::Close);
    }
}

async fn run_socket(
    url: String,
    connect_timeout: Duration,
    events: EventSink,
    mut outbound: mpsc::UnboundedReceiver<Outgoing>,
) {
    let socket = match time::timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((socket, _response))) => socket,
        Ok(Err(e)) => {
            log::debug!("Connection to {} failed: {}", url, e);
            events.closed(Some(e.to_string()));
            return;
        }
        Err(_) => {
            log::debug!("Connection to {} timed out after {:?}", url, connect_timeout);
            events.closed(Some("timeout".to_string()));
            return;
        }
    };

    log::debug!("Socket {} open (generation {})", url, events.generation());
    if !events.opened() {
        return;
    }

    let (mut sink, mut stream) = socket.split();

    let reason = loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        break Some(e.to_string());
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break None;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if !events.frame(text) {
                        break None;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame.map(|f| f.reason.to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break Some(e.to_string()),
                None => break None,
            },
        }
    };

    log::debug!("Socket {} closed: {:?}", url, reason);
    events.closed(reason);
}
