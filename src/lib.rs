//! # thief-relay
//!
//! Room membership tracking and real-time event relay for a location-based
//! "catch the thief" game.
//!
//! Players join geographically scoped rooms; every gameplay action (join,
//! leave, start, tag, location) is validated, stamped, and fanned out to all
//! current subscribers of the room, in a consistent per-room order.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler (ws/)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── EventRouter (service/)
//!     │
//!     ├── RoomRegistry (domain/)
//!     └── ConnectionGateway → per-room broadcast channels (domain/)
//! ```

pub mod api;
pub mod app;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
