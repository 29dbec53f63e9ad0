//! Channel registry
//!
//! The registry maps channel names to `Channel`s and drives every
//! membership change. It is constructed once and shared by reference
//! (`Arc<Registry>`) with the listener and every session.
//!
//! Locks are always taken in the order registry → channel → member. No
//! operation touches the registry while holding a channel or member lock,
//! and no lock is held while frames are being delivered.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::broker::broadcast::{Broadcaster, DeliveryReport};
use crate::broker::channel::Channel;
use crate::client::Member;
use crate::config::RelaySettings;
use crate::transport::connection::{Connection, Frame, FrameSink};
use crate::utils::RelayError;

#[derive(Debug, Default)]
pub struct Registry {
    channels: RwLock<HashMap<String, Arc<Channel>>>,
    broadcaster: Broadcaster,
    settings: RelaySettings,
}

impl Registry {
    /// Creates a registry with default settings.
    pub fn new() -> Self {
        Self::with_settings(RelaySettings::default())
    }

    /// Creates an empty registry using `settings` for every connection and channel.
    pub fn with_settings(settings: RelaySettings) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            broadcaster: Broadcaster::new(),
            settings,
        }
    }

    /// Settings the registry was built with.
    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Wrap a transport sink in a `Connection` using the configured send timeout.
    pub fn connection(&self, sink: impl FrameSink + 'static) -> Connection {
        Connection::new(sink, self.settings.send_timeout())
    }

    /// Return the channel for `name`, creating an empty one if needed.
    pub async fn get_or_create_channel(&self, name: &str) -> Arc<Channel> {
        if let Some(channel) = self.channels.read().await.get(name) {
            return channel.clone();
        }

        let mut channels = self.channels.write().await;
        channels
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(channel = name, "channel created");
                Arc::new(Channel::new(name))
            })
            .clone()
    }

    /// Find an existing channel. Never creates one; fails with
    /// `ChannelNotFound` for names no subscribe has created.
    pub async fn lookup(&self, name: &str) -> Result<Arc<Channel>, RelayError> {
        self.channels
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| RelayError::ChannelNotFound(name.to_string()))
    }

    /// Join `member` to `name`, creating the channel on first use, then
    /// announce the new membership to the channel.
    pub async fn subscribe(&self, member: &Arc<Member>, name: &str) {
        // The member is inserted while the registry lock is still held so a
        // concurrent reclaim cannot orphan the channel in between.
        let existing = {
            let channels = self.channels.read().await;
            match channels.get(name) {
                Some(channel) => {
                    channel.insert(member).await;
                    Some(channel.clone())
                }
                None => None,
            }
        };

        let channel = match existing {
            Some(channel) => channel,
            None => {
                let mut channels = self.channels.write().await;
                let channel = channels
                    .entry(name.to_string())
                    .or_insert_with(|| {
                        debug!(channel = name, "channel created");
                        Arc::new(Channel::new(name))
                    })
                    .clone();
                channel.insert(member).await;
                channel
            }
        };

        info!(member = %member.id(), uid = member.user_id(), channel = name, "subscribed");
        self.announce_members(&channel).await;
    }

    /// Remove `member` from `name`. Unknown channels only clear the member's
    /// own bookkeeping.
    pub async fn unsubscribe(&self, member: &Arc<Member>, name: &str) {
        let channel = match self.lookup(name).await {
            Ok(channel) => channel,
            Err(_) => {
                member.leave(name);
                debug!(member = %member.id(), channel = name, "unsubscribe from unknown channel");
                return;
            }
        };

        channel.remove(member).await;
        info!(member = %member.id(), uid = member.user_id(), channel = name, "unsubscribed");
        self.announce_members(&channel).await;
        self.reclaim_if_drained(&channel).await;
    }

    /// Remove `member` from every channel it belongs to, notifying each
    /// channel's remaining members. Runs once, at connection teardown.
    pub async fn remove_member_everywhere(&self, member: &Arc<Member>) {
        let names = member.take_channels();

        for name in &names {
            let Ok(channel) = self.lookup(name).await else {
                continue;
            };
            channel.remove(member).await;
            self.announce_members(&channel).await;
            self.reclaim_if_drained(&channel).await;
        }

        debug!(member = %member.id(), channels = names.len(), "member removed everywhere");
    }

    /// Deliver `payload` verbatim to every member of an existing channel.
    pub async fn publish(&self, name: &str, payload: Bytes) -> Result<DeliveryReport, RelayError> {
        let channel = self.lookup(name).await?;
        let report = self.broadcast(&channel, Frame::from_payload(payload)).await;
        debug!(channel = name, delivered = report.delivered, evicted = report.evicted, "published");
        Ok(report)
    }

    /// Broadcast `frame` to `channel`, reclaiming it if evictions drained it.
    pub async fn broadcast(&self, channel: &Arc<Channel>, frame: Frame) -> DeliveryReport {
        let report = self.broadcaster.send(channel, frame).await;
        if report.evicted > 0 {
            self.reclaim_if_drained(channel).await;
        }
        report
    }

    async fn announce_members(&self, channel: &Arc<Channel>) {
        match channel.members_event().await.to_frame() {
            Ok(frame) => {
                self.broadcast(channel, frame).await;
            }
            Err(e) => {
                error!(channel = channel.name(), error = %e, "failed to encode members event");
            }
        }
    }

    async fn reclaim_if_drained(&self, channel: &Arc<Channel>) {
        if self.settings.reclaim_empty_channels && channel.is_empty().await {
            self.reclaim_if_empty(channel).await;
        }
    }

    /// Drop `channel` from the registry if it is still the entry stored
    /// under its name and has no members. The check and the removal happen
    /// under the registry write lock with the channel's own lock held, so a
    /// newer channel recreated under the same name is never removed.
    pub async fn reclaim_if_empty(&self, channel: &Arc<Channel>) -> bool {
        let mut channels = self.channels.write().await;
        match channels.get(channel.name()) {
            Some(current) if Arc::ptr_eq(current, channel) => {}
            _ => return false,
        }

        let members = channel.members.write().await;
        if !members.is_empty() {
            return false;
        }
        channels.remove(channel.name());
        drop(members);

        debug!(channel = channel.name(), "empty channel reclaimed");
        true
    }

    /// Names of every channel currently in the registry.
    pub async fn channel_names(&self) -> Vec<String> {
        self.channels.read().await.keys().cloned().collect()
    }

    /// Number of channels currently in the registry.
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}
