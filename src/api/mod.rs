//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "thief-relay", description = "Room membership and event relay"),
    paths(
        handlers::system::health_handler,
        handlers::room::list_rooms,
        handlers::room::get_room,
        handlers::room::start_game,
        handlers::room::tag_player,
    ),
    components(schemas(
        dto::RoomListResponse,
        dto::RoomDetailResponse,
        dto::StartGameRequest,
        dto::TagRequest,
        crate::domain::RoomSummary,
        crate::domain::RoomId,
        crate::domain::PlayerId,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        handlers::system::HealthResponse,
    )),
    tags(
        (name = "Rooms", description = "Room membership and room actions"),
        (name = "System", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
