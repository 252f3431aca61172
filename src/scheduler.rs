//! Fixed-period tick source for the session machine

use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};

/// Runs a callback immediately and then once per period until cancelled.
///
/// Each `start` opens a new generation; the callback receives it so the
/// consumer can discard ticks from a schedule that was cancelled while one
/// of its ticks was already queued.
#[derive(Debug, Default)]
pub struct Scheduler {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `period`, replacing any active schedule.
    /// Returns the generation passed to every callback of this schedule.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(&mut self, period: Duration, mut on_tick: F) -> u64
    where
        F: FnMut(u64) -> bool + Send + 'static,
    {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately
                ticker.tick().await;
                if !on_tick(generation) {
                    break;
                }
            }
        }));
        generation
    }

    /// Stop the active schedule. Cancelling twice, or before any start, is a no-op.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a schedule is active
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Generation of the most recently started schedule (0 before any start)
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
