//! CommandDeck Relay Library
//!
//! Real-time relay for agent activity events: validates events published
//! over HTTP or WebSocket and fans each one out to every connected observer.

pub mod agents;
pub mod api;
pub mod config;
pub mod relay;
