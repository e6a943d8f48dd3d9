//! Service layer: the event router that coordinates the registry and the
//! gateway.

pub mod event_router;

pub use event_router::EventRouter;
