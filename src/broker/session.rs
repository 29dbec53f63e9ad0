//! Per-connection session loop
//!
//! A session starts once the transport handshake has succeeded: the member
//! is created with no channels and the loop reads control frames until the
//! peer goes away. Malformed frames are logged and skipped. On exit every
//! membership is unwound and the connection is closed exactly once.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::broker::registry::Registry;
use crate::client::Member;
use crate::transport::connection::{Frame, FrameSink, FrameSource};
use crate::transport::message::ControlMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

pub struct Session<S> {
    registry: Arc<Registry>,
    member: Arc<Member>,
    source: S,
    state: SessionState,
}

impl<S: FrameSource> Session<S> {
    /// Create the member for an accepted connection.
    pub fn new(
        registry: Arc<Registry>,
        user_id: impl Into<String>,
        sink: impl FrameSink + 'static,
        source: S,
    ) -> Self {
        let member = Arc::new(Member::new(user_id, registry.connection(sink)));
        debug!(member = %member.id(), uid = member.user_id(), "member created");

        Self {
            registry,
            member,
            source,
            state: SessionState::Connecting,
        }
    }

    /// The member this session drives.
    pub fn member(&self) -> &Arc<Member> {
        &self.member
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read frames until the connection closes or fails, then clean up.
    pub async fn run(&mut self) {
        if self.state != SessionState::Connecting {
            return;
        }
        self.state = SessionState::Active;
        info!(member = %self.member.id(), uid = self.member.user_id(), "session active");

        loop {
            match self.source.next_frame().await {
                Some(Ok(frame)) => self.handle_frame(frame).await,
                Some(Err(e)) => {
                    warn!(member = %self.member.id(), error = %e, "read error");
                    break;
                }
                None => {
                    debug!(member = %self.member.id(), "connection closed by peer");
                    break;
                }
            }
        }

        self.state = SessionState::Closing;
        self.registry.remove_member_everywhere(&self.member).await;
        self.member.close().await;
        self.state = SessionState::Closed;
        info!(member = %self.member.id(), uid = self.member.user_id(), "session closed");
    }

    async fn handle_frame(&self, frame: Frame) {
        let message = match ControlMessage::parse(&frame) {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!(member = %self.member.id(), "control frame without action");
                return;
            }
            Err(e) => {
                warn!(
                    member = %self.member.id(),
                    error = %e,
                    frame = %frame.preview(100),
                    "discarding malformed control frame"
                );
                return;
            }
        };

        if let Some(name) = message.subscribe_target() {
            self.registry.subscribe(&self.member, name).await;
        }
        if let Some(name) = message.unsubscribe_target() {
            self.registry.unsubscribe(&self.member, name).await;
        }
    }
}
