use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::SyncView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Shutdown,
}

/// Owner side of a spawned `SyncClient`. Dropping it shuts the client down.
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SyncView>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub(super) fn new(
        commands: mpsc::UnboundedSender<Command>,
        view: watch::Receiver<SyncView>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            commands,
            view,
            task: Some(task),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncView> {
        self.view.clone()
    }

    pub fn view(&self) -> SyncView {
        self.view.borrow().clone()
    }

    /// Queue an answer. Returns false if the client is already gone.
    pub fn submit(&self, action_id: impl Into<String>) -> bool {
        self.commands.send(Command::Submit(action_id.into())).is_ok()
    }

    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Sync task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}
