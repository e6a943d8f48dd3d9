//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::EventRouter;
use crate::ws::subscription::MembershipHolders;

/// Per-connection WebSocket settings.
#[derive(Debug, Clone, Copy)]
pub struct WsSettings {
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
    /// Whether a closing socket leaves the rooms it joined.
    pub leave_on_disconnect: bool,
}

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event router for all room actions and membership queries.
    pub router: Arc<EventRouter>,
    /// WebSocket connection settings.
    pub ws: WsSettings,
    /// Memberships held by live WebSocket connections.
    pub holders: Arc<MembershipHolders>,
}
