//! Room data models.

use super::errors::RoomError;
use crate::{auth::PlayerRef, table::TableId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use uuid::Uuid;

/// Connection ID type
pub type ConnectionId = Uuid;

/// Name of the lobby room
pub const LOBBY: &str = "lobby";

/// Prefix of table room names
const TABLE_PREFIX: &str = "table:";

/// A named broadcast group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RoomName {
    /// Everyone browsing the table list
    Lobby,
    /// Everyone watching or seated at one table
    Table(TableId),
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomName::Lobby => write!(f, "{}", LOBBY),
            RoomName::Table(id) => write!(f, "{}{}", TABLE_PREFIX, id),
        }
    }
}

impl FromStr for RoomName {
    type Err = RoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == LOBBY {
            return Ok(RoomName::Lobby);
        }

        s.strip_prefix(TABLE_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(RoomName::Table)
            .ok_or_else(|| RoomError::InvalidRoomName(s.to_string()))
    }
}

impl From<RoomName> for String {
    fn from(room: RoomName) -> Self {
        room.to_string()
    }
}

impl TryFrom<String> for RoomName {
    type Error = RoomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Kind of a room event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    MemberJoined,
    MemberLeft,
    MemberDisconnected,
    SeatTaken,
    SeatVacated,
    TableCreated,
    TableUpdated,
    ActionReceived,
    ChatMessage,
}

impl EventKind {
    /// Wire name, identical to the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::MemberJoined => "member-joined",
            EventKind::MemberLeft => "member-left",
            EventKind::MemberDisconnected => "member-disconnected",
            EventKind::SeatTaken => "seat-taken",
            EventKind::SeatVacated => "seat-vacated",
            EventKind::TableCreated => "table-created",
            EventKind::TableUpdated => "table-updated",
            EventKind::ActionReceived => "action-received",
            EventKind::ChatMessage => "chat-message",
        }
    }
}

/// Event delivered to every member of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub kind: EventKind,
    pub room: RoomName,
    pub actor: PlayerRef,
    pub data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl RoomEvent {
    pub fn new(kind: EventKind, room: RoomName, actor: PlayerRef, data: Map<String, Value>) -> Self {
        Self {
            kind,
            room,
            actor,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// The joining client's own confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub room: RoomName,
    /// False when the connection was already a member
    pub joined: bool,
    /// Everyone in the room after the join, including the joiner
    pub members: Vec<PlayerRef>,
}

/// What a disconnect cleaned up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectReport {
    pub connection: ConnectionId,
    pub player: PlayerRef,
    /// Rooms the connection was removed from
    pub rooms: Vec<RoomName>,
    /// `member-disconnected` events queued for other members
    pub notified: usize,
}
