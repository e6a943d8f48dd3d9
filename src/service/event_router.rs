//! Event router: validates room actions, applies membership changes, and
//! publishes the resulting envelopes.

use std::sync::Arc;

use crate::domain::{
    ConnectionGateway, EventEnvelope, GameEvent, JoinPayload, LeavePayload, LocationPayload,
    PlayerId, RoomId, RoomRegistry, StartPayload, TagPayload,
};
use crate::error::RelayError;

/// Dispatch core for the five room actions.
///
/// Every handler follows the same pattern: validate → (for membership
/// actions) mutate the registry → build the envelope → publish. Validation
/// failures happen before any side effect. A publish failure is reported to
/// the caller but a membership change already applied is kept.
///
/// Membership envelopes are published while the room is still locked in the
/// registry, so subscribers observe member counts in commit order.
#[derive(Debug, Clone)]
pub struct EventRouter {
    registry: Arc<RoomRegistry>,
    gateway: Arc<dyn ConnectionGateway>,
}

impl EventRouter {
    /// Creates a router over the given registry and gateway.
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>, gateway: Arc<dyn ConnectionGateway>) -> Self {
        Self { registry, gateway }
    }

    /// Returns a reference to the inner [`RoomRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Returns a reference to the inner [`ConnectionGateway`].
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn ConnectionGateway> {
        &self.gateway
    }

    /// Current member count of a room; 0 if the room has no entry.
    #[must_use]
    pub fn size(&self, room_id: RoomId) -> usize {
        self.registry.size(room_id)
    }

    /// Adds the player to the room and publishes a `JOIN` envelope carrying
    /// the new member count.
    ///
    /// # Errors
    ///
    /// [`RelayError::Validation`] for a blank nickname (nothing is
    /// changed); [`RelayError::GatewayUnavailable`] if the publish fails
    /// (the join stays applied).
    pub fn handle_join(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        nickname: &str,
    ) -> Result<Arc<EventEnvelope>, RelayError> {
        require_non_blank("nickname", nickname)?;
        let nickname = nickname.to_string();

        let envelope = self.registry.join_with(room_id, player_id, |member_count| {
            self.deliver(EventEnvelope::new(
                room_id,
                player_id,
                GameEvent::Join(JoinPayload {
                    nickname,
                    member_count,
                }),
            ))
        })?;

        tracing::info!(%room_id, %player_id, "player joined room");
        Ok(envelope)
    }

    /// Removes the player from the room and publishes a `LEAVE` envelope
    /// carrying the new member count. Leaving a room one is not in still
    /// publishes.
    ///
    /// # Errors
    ///
    /// [`RelayError::GatewayUnavailable`] if the publish fails (the leave
    /// stays applied).
    pub fn handle_leave(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<Arc<EventEnvelope>, RelayError> {
        let envelope = self.registry.leave_with(room_id, player_id, |member_count| {
            self.deliver(EventEnvelope::new(
                room_id,
                player_id,
                GameEvent::Leave(LeavePayload { member_count }),
            ))
        })?;

        tracing::info!(%room_id, %player_id, "player left room");
        Ok(envelope)
    }

    /// Publishes a `START` envelope. Membership is neither read nor changed.
    ///
    /// # Errors
    ///
    /// [`RelayError::GatewayUnavailable`] if the publish fails.
    pub fn handle_start(
        &self,
        room_id: RoomId,
        host_id: PlayerId,
    ) -> Result<Arc<EventEnvelope>, RelayError> {
        let envelope = self.deliver(EventEnvelope::new(
            room_id,
            host_id,
            GameEvent::Start(StartPayload::started()),
        ))?;

        tracing::info!(%room_id, %host_id, "game started");
        Ok(envelope)
    }

    /// Publishes a `TAG` claim. Deciding what the tag means for the game is
    /// left to whoever consumes the envelope; a room with no tracked members
    /// still receives it.
    ///
    /// # Errors
    ///
    /// [`RelayError::Validation`] for a blank QR code;
    /// [`RelayError::GatewayUnavailable`] if the publish fails.
    pub fn handle_tag(
        &self,
        room_id: RoomId,
        tagger_id: PlayerId,
        target_id: PlayerId,
        qr_code: &str,
    ) -> Result<Arc<EventEnvelope>, RelayError> {
        require_non_blank("qrCode", qr_code)?;
        let qr_code = qr_code.to_string();

        let envelope = self.deliver(EventEnvelope::new(
            room_id,
            tagger_id,
            GameEvent::Tag(TagPayload { target_id, qr_code }),
        ))?;

        tracing::info!(%room_id, %tagger_id, %target_id, "tag claimed");
        Ok(envelope)
    }

    /// Publishes a `LOCATION` update.
    ///
    /// # Errors
    ///
    /// [`RelayError::Validation`] for non-finite or out-of-range
    /// coordinates or a negative accuracy;
    /// [`RelayError::GatewayUnavailable`] if the publish fails.
    pub fn handle_location_update(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        latitude: f64,
        longitude: f64,
        accuracy: f64,
    ) -> Result<Arc<EventEnvelope>, RelayError> {
        let payload = validate_location(latitude, longitude, accuracy)?;

        let envelope = self.deliver(EventEnvelope::new(
            room_id,
            player_id,
            GameEvent::Location(payload),
        ))?;

        tracing::trace!(%room_id, %player_id, "location relayed");
        Ok(envelope)
    }

    fn deliver(&self, envelope: EventEnvelope) -> Result<Arc<EventEnvelope>, RelayError> {
        let envelope = Arc::new(envelope);
        let room_id = envelope.room_id();
        let event_type = envelope.event_type();

        match self.gateway.publish(room_id, Arc::clone(&envelope)) {
            Ok(delivered) => {
                tracing::debug!(%room_id, %event_type, delivered, "envelope published");
                Ok(envelope)
            }
            Err(err) => {
                tracing::warn!(%room_id, %event_type, error = %err, "envelope publish failed");
                Err(err)
            }
        }
    }
}

/// Rejects empty or whitespace-only text. Accepted values are relayed
/// unchanged.
fn require_non_blank(field: &str, value: &str) -> Result<(), RelayError> {
    if value.trim().is_empty() {
        return Err(RelayError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

fn validate_location(
    latitude: f64,
    longitude: f64,
    accuracy: f64,
) -> Result<LocationPayload, RelayError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(RelayError::Validation(format!(
            "latitude out of range: {latitude}"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(RelayError::Validation(format!(
            "longitude out of range: {longitude}"
        )));
    }
    if !accuracy.is_finite() || accuracy < 0.0 {
        return Err(RelayError::Validation(format!(
            "accuracy must be a non-negative number: {accuracy}"
        )));
    }
    Ok(LocationPayload {
        latitude,
        longitude,
        accuracy,
    })
}
