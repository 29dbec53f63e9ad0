//! Member representation
//!
//! A `Member` owns one `Connection` and the set of channel names it has
//! joined. The set is guarded by its own lock, separate from the
//! connection's send lock, so a broadcast waiting on a slow socket never
//! blocks bookkeeping on the same member.
//!
//! Lock order: a member lock is only ever taken after (never while waiting
//! for) a registry or channel lock, and is never held across an `.await`.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::transport::connection::{Connection, Frame};
use crate::utils::TransportError;

pub type MemberId = Uuid;

#[derive(Debug)]
pub struct Member {
    id: MemberId,
    user_id: String,
    connection: Connection,
    channels: Mutex<HashSet<String>>,
}

impl Member {
    /// Create a member with an empty channel set. The `id` is a UUID that
    /// distinguishes members sharing the same user identifier.
    pub fn new(user_id: impl Into<String>, connection: Connection) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            connection,
            channels: Mutex::new(HashSet::new()),
        }
    }

    /// Connection-unique identifier.
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// The user identifier supplied when the connection was opened.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Send one frame through the member's connection.
    pub async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        self.connection.send(frame).await
    }

    /// Close the member's connection. Later calls do nothing.
    pub async fn close(&self) {
        self.connection.close().await;
    }

    /// Whether the connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    /// Record `channel` in the member's channel set.
    pub(crate) fn join(&self, channel: &str) {
        self.channels.lock().insert(channel.to_string());
    }

    /// Forget `channel`. Returns `false` if it was not recorded.
    pub(crate) fn leave(&self, channel: &str) -> bool {
        self.channels.lock().remove(channel)
    }

    /// Empty the channel set, returning what it held.
    pub(crate) fn take_channels(&self) -> HashSet<String> {
        std::mem::take(&mut *self.channels.lock())
    }

    /// Copy of the channel names the member currently belongs to.
    pub fn channels(&self) -> HashSet<String> {
        self.channels.lock().clone()
    }

    /// Whether the member currently belongs to `channel`.
    pub fn is_in(&self, channel: &str) -> bool {
        self.channels.lock().contains(channel)
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
