//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `chanhub` application.
//!
//! It centralizes the error types shared by the broker and transport layers
//! and the tracing setup used by the binary.

pub mod error;
pub mod logging;

pub use error::{ControlError, RelayError, TransportError};
