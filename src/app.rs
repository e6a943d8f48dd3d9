//! Application assembly: wires the domain, service, and transport layers
//! into a single Axum [`Router`].

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::{AppState, WsSettings};
use crate::config::RelayConfig;
use crate::domain::{BroadcastGateway, RoomRegistry};
use crate::service::EventRouter;
use crate::ws::handler::ws_handler;
use crate::ws::subscription::MembershipHolders;

/// Builds application state backed by the in-memory gateway.
///
/// The gateway is returned separately so the caller can close it on
/// shutdown.
#[must_use]
pub fn build_state(config: &RelayConfig) -> (AppState, Arc<BroadcastGateway>) {
    let registry = Arc::new(RoomRegistry::new());
    let gateway = Arc::new(BroadcastGateway::new(config.room_channel_capacity));
    let router = Arc::new(EventRouter::new(registry, Arc::clone(&gateway) as _));

    let state = AppState {
        router,
        ws: WsSettings {
            outbound_buffer: config.ws_outbound_buffer,
            leave_on_disconnect: config.leave_on_disconnect,
        },
        holders: Arc::new(MembershipHolders::new()),
    };
    (state, gateway)
}

/// Builds the HTTP router: REST API, `/ws`, tracing and CORS layers.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
