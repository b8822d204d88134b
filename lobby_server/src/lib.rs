//! HTTP and WebSocket gateway for the poker lobby.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! drive [`api::create_router`] directly.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
