//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection: commands
//! from the client are dispatched to the [`EventRouter`] one at a time in
//! arrival order, and envelopes from subscribed rooms are written back.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::app_state::AppState;
use crate::domain::{EventEnvelope, EventType, GameEvent};
use crate::error::RelayError;
use crate::service::EventRouter;

/// Runs the read/write loop for a single WebSocket connection.
///
/// When the socket closes, every subscription is dropped and, if enabled,
/// every membership created on this connection is left.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<Arc<EventEnvelope>>(state.ws.outbound_buffer.max(1));
    let mut subs = SubscriptionManager::new(out_tx, Arc::clone(&state.holders));

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &state.router);
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Envelope from a subscribed room
            envelope = out_rx.recv() => {
                let Some(envelope) = envelope else {
                    break;
                };
                let Some(json) = event_frame(&envelope) else {
                    continue;
                };
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    if state.ws.leave_on_disconnect {
        leave_released_rooms(&mut subs, &state.router);
    }

    tracing::debug!(rooms = subs.count(), "ws connection closed");
}

/// Leaves every room whose membership no other live connection holds.
fn leave_released_rooms(subs: &mut SubscriptionManager, router: &EventRouter) {
    for (room_id, player_id) in subs.release_memberships() {
        if let Err(err) = router.handle_leave(room_id, player_id) {
            tracing::warn!(%room_id, %player_id, error = %err, "leave on disconnect failed");
        }
    }
}

/// Handles a text message from the client, returning an optional JSON
/// response. Errors are answered to this connection only.
fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    router: &EventRouter,
) -> Option<String> {
    let msg = match serde_json::from_str::<WsMessage>(text) {
        Ok(msg) => msg,
        Err(err) => return error_frame(String::new(), &RelayError::from(err)),
    };

    let command = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => command,
        Err(err) => return error_frame(msg.id, &RelayError::from(err)),
    };

    match dispatch(command, subs, router) {
        Ok(Some(payload)) => {
            serde_json::to_string(&WsMessage::new(msg.id, WsMessageType::Response, payload)).ok()
        }
        Ok(None) => None,
        Err(err) => error_frame(msg.id, &err),
    }
}

/// Executes one command. Returns the response payload, or `None` when the
/// command is acknowledged silently (location updates).
fn dispatch(
    command: WsCommand,
    subs: &mut SubscriptionManager,
    router: &EventRouter,
) -> Result<Option<serde_json::Value>, RelayError> {
    let envelope = match command {
        WsCommand::Subscribe { room_id } => {
            let added = subs.subscribe(room_id, router.gateway().subscribe(room_id));
            return Ok(Some(serde_json::json!({
                "subscribed": room_id,
                "added": added,
                "count": subs.count(),
            })));
        }
        WsCommand::Unsubscribe { room_id } => {
            let removed = subs.unsubscribe(room_id);
            return Ok(Some(serde_json::json!({
                "unsubscribed": room_id,
                "removed": removed,
                "remaining_count": subs.count(),
            })));
        }
        WsCommand::Join {
            room_id,
            player_id,
            nickname,
        } => {
            let joined = router.handle_join(room_id, player_id, &nickname);
            // A failed publish still leaves the player in the room.
            if matches!(joined, Ok(_) | Err(RelayError::GatewayUnavailable(_))) {
                subs.record_join(room_id, player_id);
            }
            joined?
        }
        WsCommand::Leave { room_id, player_id } => {
            subs.record_leave(room_id, player_id);
            router.handle_leave(room_id, player_id)?
        }
        WsCommand::Start { room_id, host_id } => router.handle_start(room_id, host_id)?,
        WsCommand::Tag {
            room_id,
            tagger_id,
            target_id,
            qr_code,
        } => router.handle_tag(room_id, tagger_id, target_id, &qr_code)?,
        WsCommand::Location {
            room_id,
            player_id,
            latitude,
            longitude,
            accuracy,
        } => {
            router.handle_location_update(room_id, player_id, latitude, longitude, accuracy)?;
            return Ok(None);
        }
    };

    Ok(Some(accepted_payload(&envelope)))
}

fn accepted_payload(envelope: &EventEnvelope) -> serde_json::Value {
    let member_count = match envelope.event() {
        GameEvent::Join(payload) => Some(payload.member_count),
        GameEvent::Leave(payload) => Some(payload.member_count),
        _ => None,
    };
    let event_type: EventType = envelope.event_type();
    serde_json::json!({
        "accepted": event_type,
        "roomId": envelope.room_id(),
        "memberCount": member_count,
        "timestamp": envelope.timestamp().timestamp_millis(),
    })
}

fn event_frame(envelope: &EventEnvelope) -> Option<String> {
    let payload = serde_json::to_value(envelope).ok()?;
    let msg = WsMessage::new(uuid::Uuid::new_v4().to_string(), WsMessageType::Event, payload);
    serde_json::to_string(&msg).ok()
}

fn error_frame(id: String, err: &RelayError) -> Option<String> {
    let msg = WsMessage::new(
        id,
        WsMessageType::Error,
        serde_json::json!({
            "code": err.error_code(),
            "message": err.to_string(),
        }),
    );
    serde_json::to_string(&msg).ok()
}
