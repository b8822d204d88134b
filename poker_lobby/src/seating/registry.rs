//! Seat registry: the only path through which seat occupancy changes.

use super::{
    errors::{SeatError, SeatResult},
    models::{Seat, SeatChange, SeatClaim},
};
use crate::{auth::PlayerId, db::SeatRepository, table::TableId};
use std::sync::Arc;

/// Seat registry
#[derive(Clone)]
pub struct SeatRegistry {
    repo: Arc<dyn SeatRepository>,
}

impl SeatRegistry {
    pub fn new(repo: Arc<dyn SeatRepository>) -> Self {
        Self { repo }
    }

    /// Occupy a seat.
    ///
    /// The store checks the table, bumps `current_players` and inserts the
    /// seat in one transaction. Its uniqueness constraints decide races, so a
    /// losing claim surfaces as `SeatTaken` or `AlreadySeated` and is never
    /// retried here.
    ///
    /// # Errors
    ///
    /// * `SeatError::SeatTaken` - Seat occupied by another player
    /// * `SeatError::InvalidSeatNumber` - Seat outside `[1, max_players]`
    /// * `SeatError::AlreadySeated` - Player already holds a seat here
    /// * `SeatError::TableFull` / `TableClosed` / `TableNotFound`
    pub async fn claim(
        &self,
        table_id: TableId,
        seat_number: u8,
        player_id: PlayerId,
        chip_stack: i64,
    ) -> SeatResult<SeatChange> {
        if chip_stack < 0 {
            return Err(SeatError::InvalidStack(chip_stack));
        }
        if seat_number == 0 {
            return Err(SeatError::InvalidSeatNumber {
                seat_number,
                max_players: 0,
            });
        }

        let change = self
            .repo
            .claim_seat(&SeatClaim {
                table_id,
                seat_number,
                player_id,
                chip_stack,
            })
            .await?;

        log::debug!(
            "Player {} claimed seat {} at table {} ({} seated)",
            player_id,
            seat_number,
            table_id,
            change.current_players
        );
        Ok(change)
    }

    /// Vacate the player's seat and return it with its final stack
    ///
    /// # Errors
    ///
    /// * `SeatError::NotSeated` - Player holds no seat at the table
    pub async fn release(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<SeatChange> {
        let change = self.repo.release_seat(table_id, player_id).await?;

        log::debug!(
            "Player {} released seat {} at table {} ({} seated)",
            player_id,
            change.seat.seat_number,
            table_id,
            change.current_players
        );
        Ok(change)
    }

    /// Occupied seats at a table, ordered by seat number
    pub async fn seats_at(&self, table_id: TableId) -> SeatResult<Vec<Seat>> {
        self.repo.seats_at(table_id).await
    }

    pub async fn find_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<Option<Seat>> {
        self.repo.find_seat(table_id, player_id).await
    }
}
