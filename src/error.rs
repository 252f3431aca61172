//! Error types and handling for chargesim
//!
//! This module defines the error types used throughout the simulator,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for chargesim operations
pub type Result<T> = std::result::Result<T, SimError>;

/// Main error type for chargesim
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Telemetry collector call failed (transport or non-success status)
    #[error("Collector error: {message}")]
    Collector { message: String },

    /// Telemetry generator produced or would produce an undefined value
    #[error("Generator error: {message}")]
    Generator { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// HTTP control surface errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl SimError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SimError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        SimError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new collector error
    pub fn collector<S: Into<String>>(message: S) -> Self {
        SimError::Collector {
            message: message.into(),
        }
    }

    /// Create a new generator error
    pub fn generator<S: Into<String>>(message: S) -> Self {
        SimError::Generator {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        SimError::Io {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        SimError::Web {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        SimError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for SimError {
    fn from(err: serde_yaml::Error) -> Self {
        SimError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for SimError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SimError::collector(format!("request timed out: {}", err))
        } else {
            SimError::collector(err.to_string())
        }
    }
}
