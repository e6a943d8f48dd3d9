//! Concurrent room membership with per-room fine-grained locking.
//!
//! [`RoomRegistry`] maps each [`RoomId`] to the set of players currently in
//! it. The map is a [`DashMap`], so operations on rooms in different shards
//! never contend and operations on the same room are serialized by that
//! room's shard lock.
//!
//! A room exists only while it has members: the first join creates its
//! entry and the last leave removes it. An empty room and a room that was
//! never used are indistinguishable.

use std::collections::HashSet;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use utoipa::ToSchema;

use super::{PlayerId, RoomId};

/// Room id together with its current member count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    /// Room identifier.
    pub room_id: RoomId,
    /// Number of players currently in the room.
    pub member_count: usize,
}

/// Tracks which players are present in which room.
///
/// # Concurrency
///
/// - Different rooms proceed in parallel.
/// - Joins and leaves on the same room are linearizable: no lost updates,
///   no duplicate counts.
/// - [`RoomRegistry::join_with`] and [`RoomRegistry::leave_with`] run a
///   callback while the room is still locked, which is how the router keeps
///   membership broadcasts in the same order as the membership changes.
///
/// Callbacks must not call back into the registry for the same room.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, HashSet<PlayerId>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Adds `player_id` to the room and returns the resulting room size.
    ///
    /// Re-joining a present player is a no-op.
    pub fn join(&self, room_id: RoomId, player_id: PlayerId) -> usize {
        self.join_with(room_id, player_id, |count| count)
    }

    /// Removes `player_id` from the room and returns the resulting size.
    ///
    /// Leaving a room one is not in, or a room that does not exist, is not
    /// an error. Returns 0 once the room is gone.
    pub fn leave(&self, room_id: RoomId, player_id: PlayerId) -> usize {
        self.leave_with(room_id, player_id, |count| count)
    }

    /// Like [`RoomRegistry::join`], then calls `f` with the new size before
    /// releasing the room's lock.
    pub fn join_with<F, R>(&self, room_id: RoomId, player_id: PlayerId, f: F) -> R
    where
        F: FnOnce(usize) -> R,
    {
        let mut members = self.rooms.entry(room_id).or_default();
        members.insert(player_id);
        f(members.len())
    }

    /// Like [`RoomRegistry::leave`], then calls `f` with the new size before
    /// releasing the room's lock. The room entry is dropped after `f` runs
    /// if it became empty.
    pub fn leave_with<F, R>(&self, room_id: RoomId, player_id: PlayerId, f: F) -> R
    where
        F: FnOnce(usize) -> R,
    {
        match self.rooms.entry(room_id) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().remove(&player_id);
                let count = occupied.get().len();
                let out = f(count);
                if count == 0 {
                    occupied.remove();
                }
                out
            }
            Entry::Vacant(_vacant) => f(0),
        }
    }

    /// Returns the current member count, 0 for an unknown room.
    #[must_use]
    pub fn size(&self, room_id: RoomId) -> usize {
        self.rooms.get(&room_id).map_or(0, |members| members.len())
    }

    /// Returns the players in the room, sorted by id.
    #[must_use]
    pub fn members(&self, room_id: RoomId) -> Vec<PlayerId> {
        let mut members: Vec<PlayerId> = self
            .rooms
            .get(&room_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        members.sort_unstable();
        members
    }

    /// Returns every occupied room with its size, sorted by room id.
    #[must_use]
    pub fn rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .rooms
            .iter()
            .map(|entry| RoomSummary {
                room_id: *entry.key(),
                member_count: entry.value().len(),
            })
            .collect();
        rooms.sort_unstable_by_key(|summary| summary.room_id);
        rooms
    }

    /// Returns the number of occupied rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
