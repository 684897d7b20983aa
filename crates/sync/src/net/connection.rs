use tokio::sync::{mpsc, watch};

use super::protocol::Outbound;
use super::stats::NetworkStats;
use super::transport::{
    Connector, EventSink, Generation, SendError, Transport, TransportEvent, TransportMessage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Owns the single transport to the game server.
///
/// State only changes in `connect`, `close` and `handle_event`. A transport that
/// reports `Closed` is dropped, so the state is never `Open` without a live
/// handle behind it.
pub struct ConnectionManager<C: Connector> {
    url: String,
    connector: C,
    transport: Option<C::Transport>,
    state: ConnectionState,
    generation: Generation,
    events: mpsc::UnboundedSender<TransportMessage>,
    state_tx: watch::Sender<ConnectionState>,
    stats: NetworkStats,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(
        url: impl Into<String>,
        connector: C,
        events: mpsc::UnboundedSender<TransportMessage>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Closed);
        Self {
            url: url.into(),
            connector,
            transport: None,
            state: ConnectionState::Closed,
            generation: 0,
            events,
            state_tx,
            stats: NetworkStats::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut NetworkStats {
        &mut self.stats
    }

    /// Open a new transport unless a live one already exists.
    ///
    /// Returns true when a new transport was created. The current state is
    /// published either way.
    pub fn connect(&mut self) -> bool {
        let needs_transport = match self.transport {
            None => true,
            Some(_) => self.state == ConnectionState::Closed,
        };

        if needs_transport {
            self.generation += 1;
            self.stats.connect_attempts += 1;
            log::debug!(
                "Connecting to {} (attempt {})",
                self.url,
                self.stats.connect_attempts
            );

            let sink = EventSink::new(self.generation, self.events.clone());
            self.transport = Some(self.connector.open(&self.url, sink));
            self.state = ConnectionState::Connecting;
        }

        self.publish();
        needs_transport
    }

    /// Apply a transport event. Returns the frame text for `Frame` events of the
    /// current transport.
    pub fn handle_event(&mut self, message: TransportMessage) -> Option<String> {
        if message.generation != self.generation || self.transport.is_none() {
            log::trace!(
                "Ignoring event from stale transport {} (current {})",
                message.generation,
                self.generation
            );
            return None;
        }

        match message.event {
            TransportEvent::Opened => {
                log::info!("Connected to {}", self.url);
                self.state = ConnectionState::Open;
                self.publish();
                None
            }
            TransportEvent::Frame(text) => {
                self.stats.record_received(text.len());
                Some(text)
            }
            TransportEvent::Closed { reason } => {
                if self.state == ConnectionState::Open {
                    log::info!("Connection to {} lost: {:?}", self.url, reason);
                } else {
                    log::debug!("Connection to {} failed: {:?}", self.url, reason);
                }
                self.transport = None;
                self.state = ConnectionState::Closed;
                self.publish();
                None
            }
        }
    }

    pub fn send(&mut self, frame: String) -> Result<(), SendError> {
        if self.state != ConnectionState::Open {
            return Err(SendError::NotOpen(self.state));
        }
        let transport = self.transport.as_mut().ok_or(SendError::Closed)?;

        let bytes = frame.len();
        transport.send(frame)?;
        self.stats.record_sent(bytes);
        Ok(())
    }

    pub fn send_outbound(&mut self, outbound: &Outbound) -> Result<(), SendError> {
        let text = outbound.encode()?;
        self.send(text)
    }

    /// Close the transport. Events it emits afterwards are ignored.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            self.state = ConnectionState::Closing;
            self.publish();
            transport.close();
        }

        self.generation += 1;
        self.state = ConnectionState::Closed;
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state);
    }
}

impl<C: Connector> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Recorder {
        sent: Arc<Mutex<Vec<String>>>,
        closed: Arc<Mutex<u32>>,
    }

    struct FakeTransport {
        recorder: Recorder,
    }

    impl Transport for FakeTransport {
        fn send(&mut self, frame: String) -> Result<(), SendError> {
            self.recorder.sent.lock().unwrap().push(frame);
            Ok(())
        }

        fn close(&mut self) {
            *self.recorder.closed.lock().unwrap() += 1;
        }
    }

    #[derive(Default)]
    struct FakeConnector {
        recorder: Recorder,
        opened: Vec<Generation>,
    }

    impl Connector for FakeConnector {
        type Transport = FakeTransport;

        fn open(&mut self, _url: &str, events: EventSink) -> FakeTransport {
            self.opened.push(events.generation());
            FakeTransport {
                recorder: self.recorder.clone(),
            }
        }
    }

    fn manager() -> (
        ConnectionManager<FakeConnector>,
        mpsc::UnboundedReceiver<TransportMessage>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ConnectionManager::new("ws://localhost:8000/ws", FakeConnector::default(), tx),
            rx,
        )
    }

    fn event(generation: Generation, event: TransportEvent) -> TransportMessage {
        TransportMessage { generation, event }
    }

    #[test]
    fn test_connect_is_idempotent() {
        let (mut conn, _rx) = manager();

        assert!(conn.connect());
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(!conn.connect());
        assert!(!conn.connect());

        assert_eq!(conn.connector.opened, vec![1]);
        assert_eq!(conn.stats().connect_attempts, 1);
    }

    #[test]
    fn test_reconnects_after_close_event() {
        let (mut conn, _rx) = manager();

        conn.connect();
        conn.handle_event(event(1, TransportEvent::Opened));
        assert!(conn.is_open());

        conn.handle_event(event(
            1,
            TransportEvent::Closed {
                reason: Some("reset".to_string()),
            },
        ));
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(!conn.has_transport());

        assert!(conn.connect());
        assert_eq!(conn.connector.opened, vec![1, 2]);
    }

    #[test]
    fn test_stale_events_ignored() {
        let (mut conn, _rx) = manager();

        conn.connect();
        conn.handle_event(event(1, TransportEvent::Closed { reason: None }));
        conn.connect();

        assert_eq!(conn.handle_event(event(1, TransportEvent::Opened)), None);
        assert_eq!(conn.state(), ConnectionState::Connecting);

        assert_eq!(
            conn.handle_event(event(1, TransportEvent::Frame("late".to_string()))),
            None
        );
        assert_eq!(
            conn.handle_event(event(2, TransportEvent::Frame("fresh".to_string()))),
            Some("fresh".to_string())
        );
    }

    #[test]
    fn test_send_requires_open() {
        let (mut conn, _rx) = manager();

        assert!(matches!(
            conn.send("x".to_string()),
            Err(SendError::NotOpen(ConnectionState::Closed))
        ));

        conn.connect();
        assert!(matches!(
            conn.send("x".to_string()),
            Err(SendError::NotOpen(ConnectionState::Connecting))
        ));

        conn.handle_event(event(1, TransportEvent::Opened));
        conn.send("hello".to_string()).unwrap();

        assert_eq!(
            conn.connector.recorder.sent.lock().unwrap().as_slice(),
            &["hello".to_string()]
        );
        assert_eq!(conn.stats().frames_sent, 1);
        assert_eq!(conn.stats().bytes_sent, 5);
    }

    #[test]
    fn test_close_releases_transport() {
        let (mut conn, _rx) = manager();
        let states = conn.subscribe();

        conn.connect();
        conn.handle_event(event(1, TransportEvent::Opened));
        conn.close();

        assert_eq!(*conn.connector.recorder.closed.lock().unwrap(), 1);
        assert!(!conn.has_transport());
        assert_eq!(*states.borrow(), ConnectionState::Closed);

        // late event from the transport that was just closed
        conn.handle_event(event(1, TransportEvent::Opened));
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_state_published_on_every_connect() {
        let (mut conn, _rx) = manager();
        let mut states = conn.subscribe();

        conn.connect();
        assert!(states.has_changed().unwrap());
        states.borrow_and_update();

        conn.connect();
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ConnectionState::Connecting);
    }
}
