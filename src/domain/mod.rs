//! Domain layer: identifiers, room membership, events, and fan-out.
//!
//! This module contains the relay's core state (the room registry), the
//! typed event model, and the gateway seam the router publishes through.

pub mod game_event;
pub mod gateway;
pub mod ids;
pub mod room_registry;

pub use game_event::{
    EventEnvelope, EventType, GameEvent, GameStatus, JoinPayload, LeavePayload, LocationPayload,
    StartPayload, TagPayload,
};
pub use gateway::{BroadcastGateway, ConnectionGateway};
pub use ids::{PlayerId, RoomId};
pub use room_registry::{RoomRegistry, RoomSummary};
