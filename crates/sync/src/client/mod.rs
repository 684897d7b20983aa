mod config;
mod handle;

pub use config::SyncConfig;
pub use handle::{Command, SyncHandle};

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::game::{GamePhaseStore, GameSnapshot};
use crate::net::{
    ClockSyncEstimator, ConnectionManager, ConnectionState, Connector, EndpointError, Inbound,
    NetworkStats, Outbound, TransportMessage,
};
use crate::submit::{ActionSubmitter, SubmitOutcome};
use crate::time::Clock;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Coarse connection status shown to the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    #[default]
    Disconnected,
    Connecting,
    Synced,
}

impl SyncStatus {
    /// `synced` means a game state frame was accepted since the last connect.
    pub fn derive(connection: ConnectionState, synced: bool) -> Self {
        match connection {
            ConnectionState::Open if synced => SyncStatus::Synced,
            ConnectionState::Open | ConnectionState::Connecting => SyncStatus::Connecting,
            ConnectionState::Closing | ConnectionState::Closed => SyncStatus::Disconnected,
        }
    }
}

/// Everything a view needs to render one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncView {
    pub user: String,
    pub snapshot: GameSnapshot,
    pub connection: ConnectionState,
    pub status: SyncStatus,
    pub latency_ms: Option<u64>,
    pub offset_ms: i64,
    pub revision: u64,
    pub stats: NetworkStats,
}

impl Default for SyncView {
    fn default() -> Self {
        Self {
            user: String::new(),
            snapshot: GameSnapshot::default(),
            connection: ConnectionState::Closed,
            status: SyncStatus::Disconnected,
            latency_ms: None,
            offset_ms: 0,
            revision: 0,
            stats: NetworkStats::default(),
        }
    }
}

/// Ties the connection, clock sync, phase store and submitter together.
///
/// All methods are synchronous and take `&mut self`; `run` drives them from
/// one task so inbound frames are handled strictly in arrival order. After
/// `teardown` every late transport event is ignored.
pub struct SyncClient<C: Connector, K: Clock> {
    config: SyncConfig,
    clock: K,
    connection: ConnectionManager<C>,
    events: Option<mpsc::UnboundedReceiver<TransportMessage>>,
    clock_sync: ClockSyncEstimator,
    store: GamePhaseStore,
    submitter: ActionSubmitter,
    synced: bool,
    alive: bool,
    view_tx: watch::Sender<SyncView>,
}

impl<C: Connector, K: Clock> SyncClient<C, K> {
    pub fn new(config: SyncConfig, connector: C, clock: K) -> Result<Self, EndpointError> {
        config.endpoint.validate()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connection = ConnectionManager::new(config.endpoint.url(), connector, events_tx);
        let (view_tx, _) = watch::channel(SyncView {
            user: config.user.clone(),
            ..SyncView::default()
        });

        Ok(Self {
            submitter: ActionSubmitter::new(config.user.clone()),
            config,
            clock,
            connection,
            events: Some(events_rx),
            clock_sync: ClockSyncEstimator::new(),
            store: GamePhaseStore::new(),
            synced: false,
            alive: true,
            view_tx,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    pub fn store(&self) -> &GamePhaseStore {
        &self.store
    }

    pub fn snapshot(&self) -> &GameSnapshot {
        self.store.current()
    }

    pub fn clock_sync(&self) -> &ClockSyncEstimator {
        &self.clock_sync
    }

    pub fn stats(&self) -> &NetworkStats {
        self.connection.stats()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus::derive(self.connection.state(), self.synced)
    }

    pub fn view(&self) -> SyncView {
        SyncView {
            user: self.config.user.clone(),
            snapshot: self.store.current().clone(),
            connection: self.connection.state(),
            status: self.status(),
            latency_ms: self.clock_sync.latency_ms(),
            offset_ms: self.clock_sync.offset_ms(),
            revision: self.store.revision(),
            stats: self.connection.stats().clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncView> {
        self.view_tx.subscribe()
    }

    /// Register a callback invoked synchronously for every accepted snapshot.
    pub fn observe<F>(&mut self, observer: F)
    where
        F: FnMut(&GameSnapshot) + Send + 'static,
    {
        self.store.subscribe(observer);
    }

    pub fn connect(&mut self) {
        if !self.alive {
            return;
        }

        if self.connection.connect() {
            self.forget_transport_state();
        }
        self.publish();
    }

    pub fn handle_transport(&mut self, message: TransportMessage) {
        if !self.alive {
            log::trace!("Ignoring transport event after teardown");
            return;
        }

        if let Some(text) = self.connection.handle_event(message) {
            self.handle_frame(&text);
        } else if self.connection.state() == ConnectionState::Closed {
            self.forget_transport_state();
        }
        self.publish();
    }

    /// Handle every transport event already queued, without waiting.
    pub fn pump(&mut self) -> usize {
        let Some(mut events) = self.events.take() else {
            return 0;
        };

        let mut handled = 0;
        while let Ok(message) = events.try_recv() {
            self.handle_transport(message);
            handled += 1;
        }

        self.events = Some(events);
        handled
    }

    pub fn tick_time_sync(&mut self) {
        if !self.alive || !self.connection.is_open() {
            return;
        }

        let request = self.clock_sync.begin_request(self.clock.now_ms());
        if let Err(e) = self.connection.send_outbound(&Outbound::Time(request)) {
            log::debug!("Time request not sent: {}", e);
            self.clock_sync.abandon_request();
        }
    }

    pub fn submit(&mut self, action_id: &str) -> SubmitOutcome {
        let window = self.store.phase().window();
        let outcome = self.submitter.submit(
            action_id,
            self.clock.now_ms(),
            self.clock_sync.offset_ms(),
            window,
            &mut self.connection,
        );

        if outcome == SubmitOutcome::Dropped {
            self.connection.stats_mut().dropped_actions += 1;
        }
        self.publish();
        outcome
    }

    /// Close the transport and stop reacting to anything it still delivers.
    pub fn teardown(&mut self) {
        if !self.alive {
            return;
        }

        log::debug!("Tearing down sync client for {}", self.connection.url());
        self.alive = false;
        self.connection.close();
        self.forget_transport_state();
        self.publish();
    }

    /// Drive the client until a `Shutdown` command arrives or every command
    /// sender is dropped. Both timers live inside this future, so returning
    /// cancels them.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let Some(mut events) = self.events.take() else {
            return;
        };

        let mut reconnect = time::interval(self.config.reconnect_interval.max(MIN_INTERVAL));
        reconnect.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut time_sync = time::interval(self.config.time_sync_interval.max(MIN_INTERVAL));
        time_sync.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            "Sync client for {:?} targeting {}",
            self.config.user,
            self.config.endpoint
        );

        loop {
            tokio::select! {
                _ = reconnect.tick() => self.connect(),
                _ = time_sync.tick() => self.tick_time_sync(),
                Some(message) = events.recv() => self.handle_transport(message),
                command = commands.recv() => match command {
                    Some(Command::Submit(action_id)) => {
                        self.submit(&action_id);
                    }
                    Some(Command::Shutdown) | None => break,
                },
            }
        }

        self.teardown();
    }

    pub fn spawn(self) -> SyncHandle
    where
        C: 'static,
        C::Transport: 'static,
        K: 'static,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let view = self.subscribe();
        let task = tokio::spawn(self.run(commands_rx));
        SyncHandle::new(commands_tx, view, task)
    }

    fn handle_frame(&mut self, text: &str) {
        match Inbound::decode(text) {
            Ok(Inbound::GameState(frame)) => match self.store.apply(frame) {
                Ok(snapshot) => {
                    if !self.synced {
                        log::info!("Synchronised with server ({:?})", snapshot.status());
                    }
                    self.synced = true;
                }
                Err(e) => {
                    log::warn!("Rejected game state: {}", e);
                    self.connection.stats_mut().malformed_frames += 1;
                }
            },
            Ok(Inbound::Time(reply)) => {
                let sample = self.clock_sync.handle_reply(&reply, self.clock.now_ms());
                self.connection.stats_mut().latency_ms = sample.latency_ms;
            }
            Err(e) => {
                log::warn!("Discarding malformed frame: {}", e);
                self.connection.stats_mut().malformed_frames += 1;
            }
        }
    }

    /// Everything tied to one transport: sync status, the in-flight time
    /// request and the dedup key of the last sent action.
    fn forget_transport_state(&mut self) {
        self.synced = false;
        self.clock_sync.abandon_request();
        self.submitter.reset();
    }

    fn publish(&self) {
        let view = self.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_derivation() {
        use ConnectionState::*;

        assert_eq!(SyncStatus::derive(Closed, false), SyncStatus::Disconnected);
        assert_eq!(SyncStatus::derive(Closed, true), SyncStatus::Disconnected);
        assert_eq!(SyncStatus::derive(Closing, true), SyncStatus::Disconnected);
        assert_eq!(SyncStatus::derive(Connecting, false), SyncStatus::Connecting);
        assert_eq!(SyncStatus::derive(Open, false), SyncStatus::Connecting);
        assert_eq!(SyncStatus::derive(Open, true), SyncStatus::Synced);
    }

    #[test]
    fn test_default_view() {
        let view = SyncView::default();
        assert_eq!(view.status, SyncStatus::Disconnected);
        assert_eq!(view.connection, ConnectionState::Closed);
        assert_eq!(view.snapshot, GameSnapshot::default());
    }
}
