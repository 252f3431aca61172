use super::types::SessionCommand;
use crate::error::{SimError, Result};
use crate::session::{SessionStatus, SessionView};
use chrono::Utc;
use tokio::sync::{mpsc, watch};

/// Cloneable front door to a running [`super::SessionMachine`]
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands_tx: mpsc::UnboundedSender<SessionCommand>,
    view_rx: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands_tx: mpsc::UnboundedSender<SessionCommand>,
        view_rx: watch::Receiver<SessionView>,
    ) -> Self {
        Self {
            commands_tx,
            view_rx,
        }
    }

    /// Request a new session. Ignored by the machine unless idle or in error.
    pub fn start(&self) -> Result<()> {
        self.send(SessionCommand::Start)
    }

    /// Request the running session to end. Ignored unless running.
    pub fn stop(&self) -> Result<()> {
        self.send(SessionCommand::Stop)
    }

    /// Ask the machine to end any running session and exit its loop
    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionCommand::Shutdown)
    }

    /// Latest published state. While a session is live, elapsed time is
    /// recomputed against the current clock.
    pub fn view(&self) -> SessionView {
        let mut view = self.view_rx.borrow().clone();
        if matches!(view.status, SessionStatus::Running | SessionStatus::Stopping)
            && let Some(start) = view.start_time
        {
            view.elapsed_seconds = (Utc::now() - start).num_seconds().max(0) as u64;
        }
        view
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    fn send(&self, cmd: SessionCommand) -> Result<()> {
        self.commands_tx
            .send(cmd)
            .map_err(|_| SimError::generic("session machine is not running"))
    }
}
