//! # ChanHub
//!
//! `chanhub` is a real-time publish/subscribe relay. Long-lived WebSocket
//! clients join and leave named channels at will, and any payload published
//! to a channel is fanned out verbatim to every member currently joined.
//! Delivery is best effort: a member whose delivery fails is evicted from
//! the channel and its connection closed.
//!
//! ## Core Modules
//!
//! - `broker`: the channel registry, the broadcaster and the per-connection session loop.
//! - `client`: the `Member` record tying one connection to a user identifier.
//! - `config`: loading and merging server configuration.
//! - `transport`: the connection abstraction, wire shapes and the axum server.
//! - `utils`: shared error types and tracing setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod transport;
pub mod utils;

pub use broker::{DeliveryReport, Registry};
pub use utils::RelayError;
