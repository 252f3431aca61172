//! Remote telemetry collector
//!
//! The session machine only talks to the collector through
//! [`CollectorClient`], so tests can substitute a recording fake for the
//! HTTP implementation.

use crate::error::Result;
use crate::telemetry::TelemetryRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod http;

pub use http::HttpCollector;

/// The three calls a charging session makes against the collector
#[async_trait::async_trait]
pub trait CollectorClient: Send + Sync {
    /// Open a session; returns the collector's transaction id
    async fn start_session(&self, started_at: DateTime<Utc>, soc_start: f64) -> Result<String>;

    /// Report one telemetry sample for an open session
    async fn send_update(&self, transaction_id: &str, record: &TelemetryRecord) -> Result<()>;

    /// Close a session, optionally with the last sample taken
    async fn end_session(
        &self,
        transaction_id: &str,
        final_record: Option<&TelemetryRecord>,
    ) -> Result<()>;
}

/// Body of the start-session call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub started_at: DateTime<Utc>,
    /// Initial SOC as a fraction in 0..=1
    pub soc_start: f64,
}

/// Body of the end-session call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub final_record: Option<TelemetryRecord>,
}
