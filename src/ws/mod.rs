//! WebSocket layer: connection handling, command dispatch, subscriptions.
//!
//! The WebSocket endpoint at `/ws` is the inbound event surface: clients
//! subscribe to rooms and send the five room actions as JSON commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
