//! Room handlers: membership queries and the start/tag actions.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{RoomDetailResponse, RoomListResponse, StartGameRequest, TagRequest};
use crate::app_state::AppState;
use crate::domain::{EventEnvelope, RoomId};
use crate::error::{ErrorResponse, RelayError};

/// `GET /rooms` — List occupied rooms with their member counts.
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    tag = "Rooms",
    summary = "List rooms",
    description = "Returns every room that currently has at least one member.",
    responses(
        (status = 200, description = "Occupied rooms", body = RoomListResponse),
    )
)]
pub async fn list_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let data = state.router.registry().rooms();
    let total = data.len();
    Json(RoomListResponse { data, total })
}

/// `GET /rooms/{room_id}` — Room size and members.
///
/// An unknown room is reported with zero members rather than 404.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}",
    tag = "Rooms",
    summary = "Get room membership",
    description = "Returns the current member count and member ids of a room.",
    params(
        ("room_id" = i64, Path, description = "Room id"),
    ),
    responses(
        (status = 200, description = "Room membership", body = RoomDetailResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> impl IntoResponse {
    let room_id = RoomId::new(room_id);
    let members = state.router.registry().members(room_id);
    Json(RoomDetailResponse {
        room_id,
        member_count: members.len(),
        members,
    })
}

/// `POST /rooms/{room_id}/start` — Start the game in a room.
///
/// # Errors
///
/// Returns [`RelayError::Validation`] for a malformed body and
/// [`RelayError::GatewayUnavailable`] if the event cannot be published.
#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room_id}/start",
    tag = "Rooms",
    summary = "Start game",
    description = "Publishes a START event to the room.",
    params(
        ("room_id" = i64, Path, description = "Room id"),
    ),
    request_body = StartGameRequest,
    responses(
        (status = 202, description = "Published START envelope", body = serde_json::Value),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 503, description = "Gateway unavailable", body = ErrorResponse),
    )
)]
pub async fn start_game(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    body: Result<Json<StartGameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let Json(req) = body.map_err(|rejection| RelayError::Validation(rejection.body_text()))?;
    let envelope = state
        .router
        .handle_start(RoomId::new(room_id), req.host_id)?;
    Ok((StatusCode::ACCEPTED, Json(EventEnvelope::clone(&envelope))))
}

/// `POST /rooms/{room_id}/tag` — Claim a tag.
///
/// # Errors
///
/// Returns [`RelayError::Validation`] for a malformed body or blank QR
/// code and [`RelayError::GatewayUnavailable`] if the event cannot be
/// published.
#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room_id}/tag",
    tag = "Rooms",
    summary = "Claim a tag",
    description = "Publishes a TAG event to the room. Game outcome is decided downstream.",
    params(
        ("room_id" = i64, Path, description = "Room id"),
    ),
    request_body = TagRequest,
    responses(
        (status = 202, description = "Published TAG envelope", body = serde_json::Value),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 503, description = "Gateway unavailable", body = ErrorResponse),
    )
)]
pub async fn tag_player(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    body: Result<Json<TagRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let Json(req) = body.map_err(|rejection| RelayError::Validation(rejection.body_text()))?;
    let envelope = state.router.handle_tag(
        RoomId::new(room_id),
        req.tagger_id,
        req.target_id,
        &req.qr_code,
    )?;
    Ok((StatusCode::ACCEPTED, Json(EventEnvelope::clone(&envelope))))
}

/// Room routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/start", post(start_game))
        .route("/rooms/{room_id}/tag", post(tag_player))
}
