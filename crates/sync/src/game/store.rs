use super::phase::{GamePhase, GameSnapshot};
use crate::net::{FrameError, GameStateFrame};

pub type Observer = Box<dyn FnMut(&GameSnapshot) + Send>;

/// Holds the last snapshot accepted from the server.
///
/// Every accepted frame replaces the snapshot wholesale and is handed to all
/// observers before `apply` returns. A frame that fails validation leaves the
/// current snapshot untouched.
pub struct GamePhaseStore {
    current: GameSnapshot,
    observers: Vec<Observer>,
    revision: u64,
    rejected: u64,
}

impl Default for GamePhaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GamePhaseStore {
    pub fn new() -> Self {
        Self {
            current: GameSnapshot::default(),
            observers: Vec::new(),
            revision: 0,
            rejected: 0,
        }
    }

    pub fn current(&self) -> &GameSnapshot {
        &self.current
    }

    pub fn phase(&self) -> &GamePhase {
        &self.current.phase
    }

    /// Number of snapshots accepted so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&GameSnapshot) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn apply(&mut self, frame: GameStateFrame) -> Result<&GameSnapshot, FrameError> {
        match GameSnapshot::try_from(frame) {
            Ok(snapshot) => {
                self.replace(snapshot);
                Ok(&self.current)
            }
            Err(e) => {
                self.rejected += 1;
                Err(e)
            }
        }
    }

    pub fn replace(&mut self, snapshot: GameSnapshot) {
        let previous = self.current.status();
        self.current = snapshot;
        self.revision += 1;

        if previous != self.current.status() {
            log::debug!(
                "Game phase changed: {:?} -> {:?}",
                previous,
                self.current.status()
            );
        }

        for observer in &mut self.observers {
            observer(&self.current);
        }
    }
}
