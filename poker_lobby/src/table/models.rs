//! Table data models.

use super::config::TableConfig;
use crate::{auth::PlayerId, seating::Seat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table ID type
pub type TableId = Uuid;

/// Table lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Waiting,
    Playing,
    Closed,
}

impl TableStatus {
    /// Whether the table shows up in the lobby listing
    pub fn is_listed(self) -> bool {
        !matches!(self, TableStatus::Closed)
    }

    /// Parse the stored representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "WAITING" => Some(TableStatus::Waiting),
            "PLAYING" => Some(TableStatus::Playing),
            "CLOSED" => Some(TableStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Waiting => write!(f, "WAITING"),
            TableStatus::Playing => write!(f, "PLAYING"),
            TableStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Table record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    #[serde(flatten)]
    pub config: TableConfig,
    pub status: TableStatus,
    pub current_players: u8,
    pub created_by: PlayerId,
    pub created_at: DateTime<Utc>,
}

impl Table {
    /// Build a freshly created table in the WAITING state
    pub fn new(config: TableConfig, created_by: PlayerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            status: TableStatus::Waiting,
            current_players: 0,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Whether `seat_number` is a seat of this table
    pub fn has_seat(&self, seat_number: u8) -> bool {
        (1..=self.config.max_players).contains(&seat_number)
    }

    pub fn is_full(&self) -> bool {
        self.current_players >= self.config.max_players
    }
}

/// Table metadata for lobby discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub id: TableId,
    pub name: String,
    pub table_type: String,
    pub status: TableStatus,
    pub small_blind: i64,
    pub big_blind: i64,
    pub min_buy_in: i64,
    pub max_buy_in: i64,
    pub max_players: u8,
    /// Number of occupied seats
    pub current_players: u8,
    pub created_by: PlayerId,
    pub created_at: DateTime<Utc>,
}

impl From<&Table> for TableSummary {
    fn from(table: &Table) -> Self {
        Self {
            id: table.id,
            name: table.config.name.clone(),
            table_type: table.config.table_type.clone(),
            status: table.status,
            small_blind: table.config.small_blind,
            big_blind: table.config.big_blind,
            min_buy_in: table.config.min_buy_in,
            max_buy_in: table.config.max_buy_in,
            max_players: table.config.max_players,
            current_players: table.current_players,
            created_by: table.created_by,
            created_at: table.created_at,
        }
    }
}

/// Table together with its occupied seats, ordered by seat number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDetails {
    pub table: Table,
    pub seats: Vec<Seat>,
}

/// Pagination window for table listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Resolve to a concrete `(limit, offset)` pair
    ///
    /// A missing limit becomes `default_limit`; any limit is clamped to
    /// `[1, max_limit]` and a negative offset becomes zero.
    pub fn resolve(&self, default_limit: i64, max_limit: i64) -> (i64, i64) {
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_resolution() {
        assert_eq!(Page::default().resolve(20, 100), (20, 0));
        assert_eq!(Page::new(500, 40).resolve(20, 100), (100, 40));
        assert_eq!(Page::new(0, -3).resolve(20, 100), (1, 0));
    }

    #[test]
    fn test_new_table_is_waiting_and_empty() {
        let table = Table::new(TableConfig::default(), 7);
        assert_eq!(table.status, TableStatus::Waiting);
        assert_eq!(table.current_players, 0);
        assert!(table.has_seat(1));
        assert!(table.has_seat(9));
        assert!(!table.has_seat(0));
        assert!(!table.has_seat(10));
    }

    #[test]
    fn test_status_round_trips_through_storage_form() {
        for status in [TableStatus::Waiting, TableStatus::Playing, TableStatus::Closed] {
            assert_eq!(TableStatus::parse(&status.to_string()), Some(status));
        }
        assert!(!TableStatus::Closed.is_listed());
    }

    #[test]
    fn test_table_serializes_flat() {
        let table = Table::new(TableConfig::default(), 7);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["status"], "WAITING");
        assert_eq!(json["min_buy_in"], 50);
        assert_eq!(json["created_by"], 7);
    }
}
