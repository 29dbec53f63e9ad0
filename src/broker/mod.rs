//! The relay core: channel registry, broadcaster and per-connection sessions.
//!
//! Data flows in three ways:
//! - a publish request looks up a channel and broadcasts the raw payload;
//! - a control frame on a session subscribes or unsubscribes its member and
//!   broadcasts the channel's new membership;
//! - a closed session removes its member everywhere, notifying each channel.

pub mod broadcast;
pub mod channel;
pub mod registry;
pub mod session;

pub use broadcast::{Broadcaster, DeliveryReport};
pub use channel::Channel;
pub use registry::Registry;
pub use session::{Session, SessionState};
