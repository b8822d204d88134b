//! Wallet error types.

use crate::{auth::PlayerId, errors::ErrorKind};
use thiserror::Error;

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Debit would take the balance below zero
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        player_id: PlayerId,
        available: i64,
        required: i64,
    },

    /// Wallet not found
    #[error("Wallet not found for player {0}")]
    WalletNotFound(PlayerId),

    /// Duplicate transaction (idempotency key already used)
    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(String),

    /// Zero delta, or a delta whose sign contradicts its kind
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// Balance would exceed i64::MAX
    #[error("Balance overflow")]
    BalanceOverflow,
}

impl WalletError {
    /// Error class for this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Database(_) | WalletError::BalanceOverflow => ErrorKind::Internal,
            WalletError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            WalletError::WalletNotFound(_) => ErrorKind::NotFound,
            WalletError::DuplicateTransaction(_) => ErrorKind::Conflict,
            WalletError::InvalidAmount(_) => ErrorKind::Validation,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            WalletError::Database(_) => "Internal server error".to_string(),
            WalletError::WalletNotFound(_) => "Wallet not found".to_string(),
            WalletError::DuplicateTransaction(_) => "Duplicate transaction".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;
