//! Room coordinator error types.

use super::models::{ConnectionId, RoomName};
use crate::errors::ErrorKind;
use thiserror::Error;

/// Room coordinator errors
#[derive(Debug, Error)]
pub enum RoomError {
    /// Connection was never registered or has already disconnected
    #[error("Unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("Invalid room name: {0}")]
    InvalidRoomName(String),

    /// Connection tried to speak in a room it has not joined
    #[error("Not a member of {0}")]
    NotMember(RoomName),
}

impl RoomError {
    /// Error class for this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoomError::UnknownConnection(_) => ErrorKind::NotFound,
            RoomError::InvalidRoomName(_) | RoomError::NotMember(_) => ErrorKind::Validation,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            RoomError::UnknownConnection(_) => "Connection closed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;
