//! Fan-out of envelopes to room subscribers.
//!
//! [`ConnectionGateway`] is the seam between the router and whatever
//! actually delivers envelopes to client sockets. [`BroadcastGateway`] is
//! the in-process implementation: one [`tokio::sync::broadcast`] channel
//! per room.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::broadcast;

use super::{EventEnvelope, RoomId};
use crate::error::RelayError;

/// Publish/subscribe transport keyed by room id.
///
/// `publish` must be a non-blocking enqueue: a slow or disconnected
/// subscriber may miss envelopes but must never stall the publisher or
/// other subscribers.
pub trait ConnectionGateway: Send + Sync + Debug {
    /// Hands `envelope` to every current subscriber of `room_id`.
    ///
    /// Returns the number of subscribers reached. A room with no
    /// subscribers yields `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::GatewayUnavailable`] if the transport cannot
    /// accept envelopes.
    fn publish(&self, room_id: RoomId, envelope: Arc<EventEnvelope>) -> Result<usize, RelayError>;

    /// Subscribes to all envelopes published to `room_id` from now on.
    ///
    /// Dropping the receiver unsubscribes.
    fn subscribe(&self, room_id: RoomId) -> broadcast::Receiver<Arc<EventEnvelope>>;
}

/// In-memory [`ConnectionGateway`] with one broadcast channel per room.
///
/// When a room's ring buffer is full, the oldest envelopes are dropped for
/// the lagging receivers only.
#[derive(Debug)]
pub struct BroadcastGateway {
    channels: DashMap<RoomId, broadcast::Sender<Arc<EventEnvelope>>>,
    capacity: usize,
    closed: AtomicBool,
}

impl BroadcastGateway {
    /// Creates a gateway whose per-room channels hold `capacity` envelopes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Stops accepting envelopes. Every later publish fails with
    /// [`RelayError::GatewayUnavailable`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.channels.clear();
    }

    /// Returns `true` once [`BroadcastGateway::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the number of live receivers for `room_id`.
    #[must_use]
    pub fn subscriber_count(&self, room_id: RoomId) -> usize {
        self.channels
            .get(&room_id)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Returns the number of rooms that currently have a channel.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl ConnectionGateway for BroadcastGateway {
    fn publish(&self, room_id: RoomId, envelope: Arc<EventEnvelope>) -> Result<usize, RelayError> {
        if self.is_closed() {
            return Err(RelayError::GatewayUnavailable(
                "broadcast gateway is closed".to_string(),
            ));
        }

        let delivered = self
            .channels
            .get(&room_id)
            .map_or(0, |sender| sender.send(envelope).unwrap_or(0));

        if delivered == 0 {
            // Reclaim channels whose subscribers have all gone.
            self.channels
                .remove_if(&room_id, |_, sender| sender.receiver_count() == 0);
        }

        Ok(delivered)
    }

    fn subscribe(&self, room_id: RoomId) -> broadcast::Receiver<Arc<EventEnvelope>> {
        self.channels
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}
