//! Wire shapes exchanged with clients.
//!
//! Inbound control frames are JSON objects with two optional fields:
//!
//! ```json
//! {"subscribe": "general", "unsubscribe": "random"}
//! ```
//!
//! They are decoded once, at the frame boundary, into a `ControlMessage`.
//! Outbound membership events use the `MembersEvent` shape.

use serde::{Deserialize, Serialize};

use crate::transport::connection::Frame;
use crate::utils::ControlError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    Subscribe(String),
    Unsubscribe(String),
    /// Subscribe is applied before unsubscribe.
    Both {
        subscribe: String,
        unsubscribe: String,
    },
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawControl {
    #[serde(default)]
    subscribe: Option<String>,
    #[serde(default)]
    unsubscribe: Option<String>,
}

impl ControlMessage {
    /// Decode a control frame. `Ok(None)` means the frame was well formed but
    /// asked for nothing.
    pub fn parse(frame: &Frame) -> Result<Option<Self>, ControlError> {
        let text = match frame {
            Frame::Text(text) => text,
            Frame::Binary(_) => return Err(ControlError::NotText),
        };
        let raw: RawControl = serde_json::from_str(text)?;

        let subscribe = raw.subscribe.filter(|s| !s.is_empty());
        let unsubscribe = raw.unsubscribe.filter(|s| !s.is_empty());

        Ok(match (subscribe, unsubscribe) {
            (Some(subscribe), Some(unsubscribe)) => Some(ControlMessage::Both {
                subscribe,
                unsubscribe,
            }),
            (Some(name), None) => Some(ControlMessage::Subscribe(name)),
            (None, Some(name)) => Some(ControlMessage::Unsubscribe(name)),
            (None, None) => None,
        })
    }

    pub fn subscribe_target(&self) -> Option<&str> {
        match self {
            ControlMessage::Subscribe(name) | ControlMessage::Both { subscribe: name, .. } => {
                Some(name.as_str())
            }
            ControlMessage::Unsubscribe(_) => None,
        }
    }

    pub fn unsubscribe_target(&self) -> Option<&str> {
        match self {
            ControlMessage::Unsubscribe(name)
            | ControlMessage::Both {
                unsubscribe: name, ..
            } => Some(name.as_str()),
            ControlMessage::Subscribe(_) => None,
        }
    }

    /// Encode in the inbound wire shape; used by clients.
    pub fn to_json(&self) -> String {
        let raw = RawControl {
            subscribe: self.subscribe_target().map(str::to_owned),
            unsubscribe: self.unsubscribe_target().map(str::to_owned),
        };
        // A struct of two optional strings always serializes.
        serde_json::to_string(&raw).unwrap_or_default()
    }
}

/// Membership snapshot sent to a channel after any join, leave or eviction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersEvent {
    pub event: String,
    pub channel: String,
    pub data: Vec<String>,
}

impl MembersEvent {
    pub const KIND: &'static str = "members";

    pub fn new(channel: &str, data: Vec<String>) -> Self {
        Self {
            event: Self::KIND.to_string(),
            channel: channel.to_string(),
            data,
        }
    }

    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::Text)
    }
}
