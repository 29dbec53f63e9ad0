//! The `error` module defines the error types used within the `chanhub` relay.
//!
//! Delivery failures never reach a publisher: the broker converts them into
//! evictions. Only `RelayError::ChannelNotFound` is surfaced to callers.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single connection's transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection was already closed locally.
    #[error("connection closed")]
    Closed,

    /// A write did not complete within the configured send timeout.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    /// The underlying socket reported an error.
    #[error("transport error: {0}")]
    Io(String),
}

/// Errors surfaced by the relay's public operations.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
}

/// An inbound frame that could not be decoded as a control message.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("invalid control frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("control frames must be text")]
    NotText,
}
