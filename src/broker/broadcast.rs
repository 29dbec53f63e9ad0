//! Fan-out delivery with eviction of failed members.
//!
//! `send` never mutates the member set while iterating it: it copies the
//! set under the read lock, delivers with no channel lock held, then takes
//! the write lock once to evict every member whose delivery failed.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::broker::channel::Channel;
use crate::client::Member;
use crate::transport::connection::Frame;

/// Outcome of one broadcast of a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub evicted: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Broadcaster;

impl Broadcaster {
    /// Creates a broadcaster. It holds no state.
    pub fn new() -> Self {
        Self
    }

    /// Deliver `frame` to every current member of `channel`.
    ///
    /// Failed members are removed from this channel only and their
    /// connections closed; their session loops tear down the rest. Survivors
    /// then receive an updated membership event, repeated until a round
    /// completes without failures.
    pub async fn send(&self, channel: &Channel, frame: Frame) -> DeliveryReport {
        let report = self.deliver(channel, frame).await;

        let mut evicted = report.evicted;
        while evicted > 0 {
            let event = match channel.members_event().await.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    error!(channel = channel.name(), error = %e, "failed to encode members event");
                    break;
                }
            };
            evicted = self.deliver(channel, event).await.evicted;
        }

        report
    }

    async fn deliver(&self, channel: &Channel, frame: Frame) -> DeliveryReport {
        let snapshot = channel.snapshot().await;

        let attempts = snapshot.iter().map(|member| {
            let frame = frame.clone();
            async move { (member, member.send(frame).await) }
        });

        let mut failed: Vec<&Arc<Member>> = Vec::new();
        for (member, result) in join_all(attempts).await {
            if let Err(e) = result {
                warn!(
                    channel = channel.name(),
                    member = %member.id(),
                    uid = member.user_id(),
                    error = %e,
                    "delivery failed, evicting member"
                );
                failed.push(member);
            }
        }

        let delivered = snapshot.len() - failed.len();
        if failed.is_empty() {
            debug!(channel = channel.name(), delivered, "broadcast complete");
            return DeliveryReport {
                delivered,
                evicted: 0,
            };
        }

        let ids: Vec<_> = failed.iter().map(|m| m.id()).collect();
        channel.remove_all(&ids).await;
        // Each close is bounded by the member's send timeout.
        join_all(failed.iter().map(|member| member.close())).await;

        DeliveryReport {
            delivered,
            evicted: failed.len(),
        }
    }
}
