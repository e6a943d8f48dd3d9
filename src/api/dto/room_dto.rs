//! Room query and room action DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{PlayerId, RoomId, RoomSummary};

/// Response body for `GET /rooms`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomListResponse {
    /// Occupied rooms, sorted by id.
    pub data: Vec<RoomSummary>,
    /// Number of occupied rooms.
    pub total: usize,
}

/// Response body for `GET /rooms/{room_id}`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailResponse {
    /// Room identifier.
    pub room_id: RoomId,
    /// Current member count (0 for an unknown room).
    pub member_count: usize,
    /// Current members, sorted by id.
    pub members: Vec<PlayerId>,
}

/// Request body for `POST /rooms/{room_id}/start`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    /// Host starting the game.
    pub host_id: PlayerId,
}

/// Request body for `POST /rooms/{room_id}/tag`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagRequest {
    /// Player making the claim.
    pub tagger_id: PlayerId,
    /// Player claimed to be tagged.
    pub target_id: PlayerId,
    /// Scanned code.
    pub qr_code: String,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn room_bodies_use_camel_case() {
        let detail = RoomDetailResponse {
            room_id: RoomId::new(4),
            member_count: 1,
            members: vec![PlayerId::new(2)],
        };
        assert_eq!(
            serde_json::to_value(&detail).ok(),
            Some(serde_json::json!({ "roomId": 4, "memberCount": 1, "members": [2] }))
        );

        let list = RoomListResponse {
            data: vec![RoomSummary {
                room_id: RoomId::new(4),
                member_count: 1,
            }],
            total: 1,
        };
        assert_eq!(
            serde_json::to_value(&list).ok(),
            Some(serde_json::json!({ "data": [{ "roomId": 4, "memberCount": 1 }], "total": 1 }))
        );
    }

    #[test]
    fn tag_request_reads_camel_case() {
        let body = r#"{"taggerId": 10, "targetId": 11, "qrCode": "QR-ABC"}"#;
        let Ok(req) = serde_json::from_str::<TagRequest>(body) else {
            panic!("tag request did not parse");
        };
        assert_eq!(req.target_id, PlayerId::new(11));
        assert_eq!(req.qr_code, "QR-ABC");
    }
}
