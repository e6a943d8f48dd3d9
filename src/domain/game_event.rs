//! Gameplay events and the envelope they are broadcast in.
//!
//! Every accepted room action produces exactly one [`EventEnvelope`]. The
//! envelope's JSON shape is the outbound wire contract:
//!
//! ```json
//! {
//!   "roomId": 42,
//!   "senderId": 1,
//!   "type": "JOIN",
//!   "payload": { "nickname": "Alice", "memberCount": 1 },
//!   "timestamp": 1760572800000
//! }
//! ```
//!
//! Clients switch on `type` to interpret `payload`, so payload field names
//! are fixed per variant.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PlayerId, RoomId};

/// Discriminant of a [`GameEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// A player entered the room.
    Join,
    /// A player left the room.
    Leave,
    /// The host started the game.
    Start,
    /// A tagger claims to have tagged a target.
    Tag,
    /// Periodic position broadcast.
    Location,
}

impl EventType {
    /// Returns the wire name of this event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Join => "JOIN",
            Self::Leave => "LEAVE",
            Self::Start => "START",
            Self::Tag => "TAG",
            Self::Location => "LOCATION",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `JOIN` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    /// Display name of the joining player.
    pub nickname: String,
    /// Room size after the join.
    pub member_count: usize,
}

/// Payload of a `LEAVE` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeavePayload {
    /// Room size after the leave.
    pub member_count: usize,
}

/// Game status carried by a `START` event. Only one value exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// The host has started the game.
    Started,
}

/// Payload of a `START` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPayload {
    /// Always [`GameStatus::Started`].
    pub status: GameStatus,
}

impl StartPayload {
    /// The payload every `START` event carries.
    #[must_use]
    pub const fn started() -> Self {
        Self {
            status: GameStatus::Started,
        }
    }
}

/// Payload of a `TAG` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPayload {
    /// Player the tagger claims to have caught.
    pub target_id: PlayerId,
    /// Code scanned from the target's device.
    pub qr_code: String,
}

/// Payload of a `LOCATION` event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationPayload {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Horizontal accuracy radius in meters.
    pub accuracy: f64,
}

/// A gameplay event with its strongly-typed payload.
///
/// Serialized adjacently tagged: `"type"` holds the discriminant and
/// `"payload"` the variant body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    /// See [`JoinPayload`].
    Join(JoinPayload),
    /// See [`LeavePayload`].
    Leave(LeavePayload),
    /// See [`StartPayload`].
    Start(StartPayload),
    /// See [`TagPayload`].
    Tag(TagPayload),
    /// See [`LocationPayload`].
    Location(LocationPayload),
}

impl GameEvent {
    /// Returns the discriminant of this event.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Join(_) => EventType::Join,
            Self::Leave(_) => EventType::Leave,
            Self::Start(_) => EventType::Start,
            Self::Tag(_) => EventType::Tag,
            Self::Location(_) => EventType::Location,
        }
    }
}

/// Immutable, timestamped record broadcast to every subscriber of a room.
///
/// Built once by [`EventEnvelope::new`] and shared read-only afterwards
/// (subscribers receive it behind an `Arc`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    room_id: RoomId,
    sender_id: PlayerId,
    #[serde(flatten)]
    event: GameEvent,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    /// Builds an envelope stamped with the current instant.
    ///
    /// Never fails: payload shape is checked before an event is built.
    #[must_use]
    pub fn new(room_id: RoomId, sender_id: PlayerId, event: GameEvent) -> Self {
        Self {
            room_id,
            sender_id,
            event,
            timestamp: Utc::now(),
        }
    }

    /// Target room.
    #[must_use]
    pub const fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Player (or host) that triggered the event.
    #[must_use]
    pub const fn sender_id(&self) -> PlayerId {
        self.sender_id
    }

    /// The event and its payload.
    #[must_use]
    pub const fn event(&self) -> &GameEvent {
        &self.event
    }

    /// Shorthand for `self.event().event_type()`.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.event.event_type()
    }

    /// Server capture time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
