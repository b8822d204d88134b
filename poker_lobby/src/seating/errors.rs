//! Seat registry error types.

use crate::{auth::PlayerId, errors::ErrorKind, table::TableId};
use thiserror::Error;

/// Seat registry errors
#[derive(Debug, Error)]
pub enum SeatError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Another player already occupies the seat
    #[error("Seat {0} is already taken")]
    SeatTaken(u8),

    /// Seat number outside `[1, max_players]`
    #[error("Invalid seat number {seat_number}: table has {max_players} seats")]
    InvalidSeatNumber { seat_number: u8, max_players: u8 },

    /// Player already holds a seat at this table
    #[error("Player {0} is already seated at this table")]
    AlreadySeated(PlayerId),

    /// Player holds no seat at this table
    #[error("Player {0} is not seated at this table")]
    NotSeated(PlayerId),

    #[error("Table is full")]
    TableFull,

    #[error("Table is closed")]
    TableClosed,

    #[error("Table {0} not found")]
    TableNotFound(TableId),

    /// Negative chip stack
    #[error("Invalid chip stack: {0}")]
    InvalidStack(i64),
}

impl SeatError {
    /// Error class for this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            SeatError::Database(_) => ErrorKind::Internal,
            SeatError::SeatTaken(_)
            | SeatError::AlreadySeated(_)
            | SeatError::TableFull
            | SeatError::TableClosed => ErrorKind::Conflict,
            SeatError::InvalidSeatNumber { .. } | SeatError::InvalidStack(_) => {
                ErrorKind::Validation
            }
            SeatError::NotSeated(_) | SeatError::TableNotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            SeatError::Database(_) => "Internal server error".to_string(),
            SeatError::AlreadySeated(_) => "You are already seated at this table".to_string(),
            SeatError::NotSeated(_) => "You are not seated at this table".to_string(),
            SeatError::TableNotFound(_) => "Table not found".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for seat operations
pub type SeatResult<T> = Result<T, SeatError>;
