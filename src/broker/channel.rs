//! Channel management
//!
//! A `Channel` holds the members currently joined under one name. Every
//! change to the member set also updates the affected member's own channel
//! set while the channel's write lock is held, so the two views agree
//! whenever no channel lock is held.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::client::{Member, MemberId};
use crate::transport::message::MembersEvent;

#[derive(Debug)]
pub struct Channel {
    name: String,
    pub(super) members: RwLock<HashMap<MemberId, Arc<Member>>>,
}

impl Channel {
    /// Create a new, empty channel with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: RwLock::new(HashMap::new()),
        }
    }

    /// The channel's name, fixed at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a member. Returns `false` if it was already present.
    pub(crate) async fn insert(&self, member: &Arc<Member>) -> bool {
        let mut members = self.members.write().await;
        member.join(&self.name);
        members.insert(member.id(), member.clone()).is_none()
    }

    /// Remove a member. Returns `false` if it was not present.
    pub(crate) async fn remove(&self, member: &Member) -> bool {
        let mut members = self.members.write().await;
        let removed = members.remove(&member.id()).is_some();
        if removed {
            member.leave(&self.name);
        }
        removed
    }

    /// Remove several members under a single write lock, returning the ones
    /// that were actually present.
    pub(crate) async fn remove_all(&self, ids: &[MemberId]) -> Vec<Arc<Member>> {
        let mut members = self.members.write().await;
        ids.iter()
            .filter_map(|id| members.remove(id))
            .inspect(|member| {
                member.leave(&self.name);
            })
            .collect()
    }

    /// Point-in-time copy of the member set; the lock is released on return.
    pub async fn snapshot(&self) -> Vec<Arc<Member>> {
        self.members.read().await.values().cloned().collect()
    }

    /// User identifiers of the current members, in no particular order.
    pub async fn user_ids(&self) -> Vec<String> {
        self.members
            .read()
            .await
            .values()
            .map(|m| m.user_id().to_string())
            .collect()
    }

    /// Build the membership event announcing the current member list.
    pub async fn members_event(&self) -> MembersEvent {
        MembersEvent::new(&self.name, self.user_ids().await)
    }

    /// Whether the member with `id` is currently joined.
    pub async fn contains(&self, id: &MemberId) -> bool {
        self.members.read().await.contains_key(id)
    }

    /// Number of members currently joined.
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Whether the channel has no members.
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}
