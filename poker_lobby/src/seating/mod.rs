//! Seat registry: per-table seat occupancy.
//!
//! This module implements:
//! - Atomic seat claims backed by the store's uniqueness constraints on
//!   `(table_id, seat_number)` and `(table_id, player_id)`
//! - Seat release with the `current_players` decrement in the same store
//!   transaction
//! - Read helpers for table details and pre-checks

pub mod errors;
pub mod models;
pub mod registry;

pub use errors::{SeatError, SeatResult};
pub use models::{Seat, SeatChange, SeatClaim, SeatId};
pub use registry::SeatRegistry;
