//! Table lifecycle error types.

use super::models::TableId;
use crate::{auth::PlayerId, errors::ErrorKind, seating::SeatError, wallet::WalletError};
use thiserror::Error;

/// Table lifecycle errors
#[derive(Debug, Error)]
pub enum TableError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Table configuration rejected at creation
    #[error("Invalid table configuration: {0}")]
    InvalidConfig(String),

    #[error("Buy-in {buy_in} outside table range [{min}, {max}]")]
    BuyInOutOfRange { buy_in: i64, min: i64, max: i64 },

    #[error("Table {0} not found")]
    TableNotFound(TableId),

    #[error("Table {0} is closed")]
    TableClosed(TableId),

    /// The task driving a join or leave died before reporting
    #[error("Table operation aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Seat(#[from] SeatError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// A compensating credit could not be made durable; the ledger needs
    /// manual reconciliation
    #[error(
        "Consistency fault during {operation}: {amount} chips owed to player {player_id} at table {table_id}: {source}"
    )]
    ConsistencyFault {
        player_id: PlayerId,
        table_id: TableId,
        amount: i64,
        operation: &'static str,
        #[source]
        source: WalletError,
    },
}

impl TableError {
    /// Error class for this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::Database(_) | TableError::Aborted(_) => ErrorKind::Internal,
            TableError::InvalidConfig(_) | TableError::BuyInOutOfRange { .. } => {
                ErrorKind::Validation
            }
            TableError::TableNotFound(_) => ErrorKind::NotFound,
            TableError::TableClosed(_) => ErrorKind::Conflict,
            TableError::Seat(err) => err.kind(),
            TableError::Wallet(err) => err.kind(),
            TableError::ConsistencyFault { .. } => ErrorKind::ConsistencyFault,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            TableError::Database(_) | TableError::Aborted(_) => {
                "Internal server error".to_string()
            }
            TableError::TableNotFound(_) => "Table not found".to_string(),
            TableError::TableClosed(_) => "Table is closed".to_string(),
            TableError::Seat(err) => err.client_message(),
            TableError::Wallet(err) => err.client_message(),
            TableError::ConsistencyFault { .. } => {
                "Your chips are safe but the transfer is delayed; support has been notified"
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
