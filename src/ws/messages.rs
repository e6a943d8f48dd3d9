//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PlayerId, RoomId};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server-originated message stamped now.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
///
/// The first two manage which rooms this connection hears; the rest are the
/// five room actions. Field names are camelCase to match the event
/// envelopes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WsCommand {
    /// Start receiving a room's events.
    Subscribe {
        /// Room to listen to.
        room_id: RoomId,
    },
    /// Stop receiving a room's events.
    Unsubscribe {
        /// Room to stop listening to.
        room_id: RoomId,
    },
    /// Enter a room.
    Join {
        /// Target room.
        room_id: RoomId,
        /// Joining player.
        player_id: PlayerId,
        /// Display name.
        nickname: String,
    },
    /// Leave a room.
    Leave {
        /// Target room.
        room_id: RoomId,
        /// Leaving player.
        player_id: PlayerId,
    },
    /// Start the game in a room.
    Start {
        /// Target room.
        room_id: RoomId,
        /// Host starting the game.
        host_id: PlayerId,
    },
    /// Claim a tag on another player.
    Tag {
        /// Target room.
        room_id: RoomId,
        /// Player making the claim.
        tagger_id: PlayerId,
        /// Player claimed to be tagged.
        target_id: PlayerId,
        /// Scanned code.
        qr_code: String,
    },
    /// Broadcast the sender's position.
    Location {
        /// Target room.
        room_id: RoomId,
        /// Reporting player.
        player_id: PlayerId,
        /// Latitude in decimal degrees.
        latitude: f64,
        /// Longitude in decimal degrees.
        longitude: f64,
        /// Accuracy radius in meters.
        accuracy: f64,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Result<WsCommand, serde_json::Error> {
        serde_json::from_value(json)
    }

    #[test]
    fn join_command_uses_camel_case_fields() {
        let Ok(cmd) = parse(serde_json::json!({
            "command": "join",
            "roomId": 42,
            "playerId": 1,
            "nickname": "Alice"
        })) else {
            panic!("join should parse");
        };
        assert_eq!(
            cmd,
            WsCommand::Join {
                room_id: RoomId::new(42),
                player_id: PlayerId::new(1),
                nickname: "Alice".to_string(),
            }
        );
    }

    #[test]
    fn missing_field_is_rejected() {
        let result = parse(serde_json::json!({
            "command": "tag",
            "roomId": 7,
            "taggerId": 10,
            "targetId": 11
        }));
        assert!(result.is_err());
    }

    #[test]
    fn ill_typed_id_is_rejected() {
        let result = parse(serde_json::json!({
            "command": "leave",
            "roomId": "seven",
            "playerId": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(parse(serde_json::json!({ "command": "swap", "roomId": 1 })).is_err());
    }

    #[test]
    fn message_defaults_id_and_timestamp() {
        let Ok(msg) = serde_json::from_str::<WsMessage>(
            r#"{"type":"command","payload":{"command":"subscribe","roomId":1}}"#,
        ) else {
            panic!("message should parse");
        };
        assert!(msg.id.is_empty());
        assert_eq!(msg.msg_type, WsMessageType::Command);
    }
}
