use crate::error::Result;
use chrono::{DateTime, Utc};

/// Requests accepted by the machine from external components (web, CLI)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Stop,
    Shutdown,
}

/// Internal messages: scheduler ticks and settled collector calls.
///
/// Every settled call carries the sequence number of the session that
/// issued it; the machine drops results that belong to another session.
#[derive(Debug)]
pub enum SessionEvent {
    StartSettled {
        seq: u64,
        started_at: DateTime<Utc>,
        result: Result<String>,
    },
    Tick {
        generation: u64,
    },
    UpdateSettled {
        seq: u64,
        tick: u64,
        result: Result<()>,
    },
    EndSettled {
        seq: u64,
        result: Result<()>,
    },
}
