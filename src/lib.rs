//! # chargesim - DC fast-charging session simulator
//!
//! Simulates one DC fast-charging session at a time and reports its
//! telemetry to a remote collector over HTTP.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration with environment overrides and validation
//! - `logging`: Structured logging and tracing
//! - `telemetry`: Synthetic physical model, energy integration and wire records
//! - `session`: Charging session record and lifecycle status
//! - `machine`: Session state machine, run as an actor
//! - `scheduler`: Cancellable fixed-period tick source
//! - `collector`: Collector client trait and its HTTP implementation
//! - `web`: HTTP control surface

pub mod collector;
pub mod config;
pub mod error;
pub mod logging;
pub mod machine;
pub mod scheduler;
pub mod session;
pub mod telemetry;
pub mod web;


// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SimError};
pub use machine::{SessionHandle, SessionMachine};
