//! Seat data models.

use crate::{auth::PlayerId, table::TableId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seat ID type
pub type SeatId = Uuid;

/// An occupied seat at a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    pub table_id: TableId,
    pub player_id: PlayerId,
    /// 1-based position at the table
    pub seat_number: u8,
    pub chip_stack: i64,
    pub joined_at: DateTime<Utc>,
}

/// Request to occupy a seat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatClaim {
    pub table_id: TableId,
    pub seat_number: u8,
    pub player_id: PlayerId,
    pub chip_stack: i64,
}

impl SeatClaim {
    /// Materialize the seat record this claim creates
    pub fn into_seat(self) -> Seat {
        Seat {
            id: Uuid::new_v4(),
            table_id: self.table_id,
            player_id: self.player_id,
            seat_number: self.seat_number,
            chip_stack: self.chip_stack,
            joined_at: Utc::now(),
        }
    }
}

/// Result of a claim or release: the affected seat and the table's player
/// count after the change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatChange {
    pub seat: Seat,
    pub current_players: u8,
}
