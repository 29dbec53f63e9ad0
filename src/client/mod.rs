//! The `client` module defines the representation of a subscriber in the relay.
//!
//! It provides the `Member` struct, which ties one connection to a user
//! identifier and tracks the channels that connection has joined.

pub mod member;
pub use member::{Member, MemberId};
