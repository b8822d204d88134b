//! Error classification shared by every lobby component.

use serde::{Deserialize, Serialize};

/// Coarse error class used by the transport layer to pick a status code and
/// by callers to decide whether retrying with other parameters makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range input, rejected before any mutation
    Validation,
    /// Seat taken, already seated, table full or closed, duplicate transaction
    Conflict,
    /// Wallet cannot cover the requested debit
    InsufficientFunds,
    /// Missing table, seat, wallet or connection
    NotFound,
    /// A compensation step failed durably; needs manual reconciliation
    ConsistencyFault,
    /// Storage or other infrastructure failure
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::InsufficientFunds => write!(f, "insufficient_funds"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::ConsistencyFault => write!(f, "consistency_fault"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}
