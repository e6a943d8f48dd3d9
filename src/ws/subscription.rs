//! Per-connection subscription manager.
//!
//! Tracks which rooms a WebSocket client listens to and which memberships
//! it created. Each subscribed room gets a forwarding task that moves
//! envelopes from the room's broadcast channel into the connection's
//! outbound queue, so one slow socket only ever lags its own receivers.
//!
//! Memberships are counted across connections in [`MembershipHolders`]: a
//! player that reconnects holds its rooms on both sockets for a while, and
//! only the last socket to let go leaves the room.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::domain::{EventEnvelope, PlayerId, RoomId};

/// Number of live connections holding each `(room, player)` membership.
#[derive(Debug, Default)]
pub struct MembershipHolders {
    holders: DashMap<(RoomId, PlayerId), usize>,
}

impl MembershipHolders {
    /// Creates an empty holder table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one holder for the membership.
    pub fn acquire(&self, room_id: RoomId, player_id: PlayerId) {
        *self.holders.entry((room_id, player_id)).or_insert(0) += 1;
    }

    /// Drops one holder. Returns `true` if no connection holds the
    /// membership any more.
    pub fn release(&self, room_id: RoomId, player_id: PlayerId) -> bool {
        match self.holders.entry((room_id, player_id)) {
            Entry::Occupied(mut occupied) => {
                let remaining = occupied.get().saturating_sub(1);
                if remaining == 0 {
                    occupied.remove();
                    true
                } else {
                    *occupied.get_mut() = remaining;
                    false
                }
            }
            Entry::Vacant(_) => true,
        }
    }

    /// Returns how many connections hold the membership.
    #[must_use]
    pub fn holders(&self, room_id: RoomId, player_id: PlayerId) -> usize {
        self.holders
            .get(&(room_id, player_id))
            .map_or(0, |count| *count)
    }
}

/// Manages room subscriptions and joined memberships for one connection.
#[derive(Debug)]
pub struct SubscriptionManager {
    outbound: mpsc::Sender<Arc<EventEnvelope>>,
    forwarders: HashMap<RoomId, JoinHandle<()>>,
    memberships: HashSet<(RoomId, PlayerId)>,
    holders: Arc<MembershipHolders>,
}

impl SubscriptionManager {
    /// Creates a manager that forwards into `outbound` and registers its
    /// memberships in `holders`.
    #[must_use]
    pub fn new(
        outbound: mpsc::Sender<Arc<EventEnvelope>>,
        holders: Arc<MembershipHolders>,
    ) -> Self {
        Self {
            outbound,
            forwarders: HashMap::new(),
            memberships: HashSet::new(),
            holders,
        }
    }

    /// Starts forwarding envelopes from `receiver` for `room_id`.
    ///
    /// Returns `false` (and drops `receiver`) if the room is already
    /// subscribed.
    pub fn subscribe(
        &mut self,
        room_id: RoomId,
        receiver: broadcast::Receiver<Arc<EventEnvelope>>,
    ) -> bool {
        if self.forwarders.contains_key(&room_id) {
            return false;
        }
        let handle = tokio::spawn(forward(room_id, receiver, self.outbound.clone()));
        self.forwarders.insert(room_id, handle);
        true
    }

    /// Stops forwarding for `room_id`. Returns `false` if it was not
    /// subscribed.
    pub fn unsubscribe(&mut self, room_id: RoomId) -> bool {
        match self.forwarders.remove(&room_id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Returns `true` if the connection listens to `room_id`.
    #[must_use]
    pub fn is_subscribed(&self, room_id: RoomId) -> bool {
        self.forwarders.contains_key(&room_id)
    }

    /// Returns the number of subscribed rooms.
    #[must_use]
    pub fn count(&self) -> usize {
        self.forwarders.len()
    }

    /// Records that this connection joined `room_id` as `player_id`.
    /// Repeated joins hold the membership once.
    pub fn record_join(&mut self, room_id: RoomId, player_id: PlayerId) {
        if self.memberships.insert((room_id, player_id)) {
            self.holders.acquire(room_id, player_id);
        }
    }

    /// Forgets a membership after an explicit leave.
    pub fn record_leave(&mut self, room_id: RoomId, player_id: PlayerId) {
        if self.memberships.remove(&(room_id, player_id)) {
            self.holders.release(room_id, player_id);
        }
    }

    /// Lets go of every membership this connection holds and returns the
    /// ones no other connection still holds, sorted.
    pub fn release_memberships(&mut self) -> Vec<(RoomId, PlayerId)> {
        let mut released: Vec<_> = self
            .memberships
            .drain()
            .filter(|&(room_id, player_id)| self.holders.release(room_id, player_id))
            .collect();
        released.sort_unstable();
        released
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        for handle in self.forwarders.values() {
            handle.abort();
        }
        for (room_id, player_id) in self.memberships.drain() {
            self.holders.release(room_id, player_id);
        }
    }
}

async fn forward(
    room_id: RoomId,
    mut receiver: broadcast::Receiver<Arc<EventEnvelope>>,
    outbound: mpsc::Sender<Arc<EventEnvelope>>,
) {
    loop {
        match receiver.recv().await {
            Ok(envelope) => {
                if outbound.send(envelope).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(%room_id, skipped, "ws client lagged behind room channel");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
