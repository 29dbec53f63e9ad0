//! The `transport` module is responsible for handling network communication
//! with clients, primarily via WebSockets.
//!
//! It defines the connection abstraction the broker delivers through, the
//! wire shapes of control frames and membership events, an in-process
//! transport, and the axum-based HTTP/WebSocket server.

pub mod connection;
pub mod memory;
pub mod message;
pub mod websocket;

pub use connection::{Connection, Frame, FrameSink, FrameSource};
pub use message::{ControlMessage, MembersEvent};
