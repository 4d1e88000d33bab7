//! Error types for the sensor node.

use thiserror::Error;
use xbee_api::{EncodeError, TransportError};

/// Errors that can occur while configuring or running the node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("invalid 64-bit address {0:?}: expected 16 hex digits")]
    InvalidAddress(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to send frame: {0}")]
    Encode(#[from] EncodeError),

    #[error("sensor read failed: {0}")]
    Sensor(String),
}

/// Result type alias for node operations.
pub type NodeResult<T> = Result<T, NodeError>;
