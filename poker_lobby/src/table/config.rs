//! Table configuration supplied when a table is created.

use serde::{Deserialize, Serialize};

/// Largest seat count a table can be configured with
pub const MAX_SEATS: u8 = 9;

fn default_max_players() -> u8 {
    MAX_SEATS
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Game variant tag, e.g. "texas_holdem"
    pub table_type: String,

    /// Small blind amount
    pub small_blind: i64,

    /// Big blind amount
    pub big_blind: i64,

    /// Smallest chip stack a player may sit down with
    pub min_buy_in: i64,

    /// Largest chip stack a player may sit down with
    pub max_buy_in: i64,

    /// Maximum number of players (default: 9)
    #[serde(default = "default_max_players")]
    pub max_players: u8,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            table_type: "texas_holdem".to_string(),
            small_blind: 5,
            big_blind: 10,
            min_buy_in: 50,
            max_buy_in: 500,
            max_players: MAX_SEATS,
        }
    }
}

/// Column widths of `tables.name` and `tables.table_type`
const MAX_NAME_LEN: usize = 100;
const MAX_TYPE_LEN: usize = 50;

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Table name must not be empty".to_string());
        }

        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(format!("Table name must be at most {} characters", MAX_NAME_LEN));
        }

        if self.table_type.trim().is_empty() {
            return Err("Table type must not be empty".to_string());
        }

        if self.table_type.chars().count() > MAX_TYPE_LEN {
            return Err(format!("Table type must be at most {} characters", MAX_TYPE_LEN));
        }

        if self.small_blind <= 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.big_blind <= self.small_blind {
            return Err("Big blind must be greater than small blind".to_string());
        }

        if self.min_buy_in <= 0 {
            return Err("Min buy-in must be positive".to_string());
        }

        if self.min_buy_in > self.max_buy_in {
            return Err("Min buy-in must not exceed max buy-in".to_string());
        }

        if self.max_players == 0 || self.max_players > MAX_SEATS {
            return Err(format!("Max players must be between 1 and {}", MAX_SEATS));
        }

        Ok(())
    }

    /// Whether `amount` is an acceptable buy-in for this table
    pub fn accepts_buy_in(&self, amount: i64) -> bool {
        (self.min_buy_in..=self.max_buy_in).contains(&amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TableConfig::default().validate().is_ok());
    }

    #[test]
    fn test_blinds_must_increase() {
        let config = TableConfig {
            small_blind: 10,
            big_blind: 10,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TableConfig {
            small_blind: 10,
            big_blind: 20,
            ..TableConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_buy_in_bounds() {
        let config = TableConfig {
            min_buy_in: 600,
            max_buy_in: 500,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TableConfig {
            min_buy_in: 500,
            max_buy_in: 500,
            ..TableConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.accepts_buy_in(500));
        assert!(!config.accepts_buy_in(499));
    }

    #[test]
    fn test_seat_count_bounds() {
        for (max_players, ok) in [(0, false), (1, true), (9, true), (10, false)] {
            let config = TableConfig {
                max_players,
                ..TableConfig::default()
            };
            assert_eq!(config.validate().is_ok(), ok, "max_players = {}", max_players);
        }
    }

    #[test]
    fn test_blank_name_rejected() {
        let config = TableConfig {
            name: "   ".to_string(),
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_text_fields_fit_their_columns() {
        let at_limit = TableConfig {
            name: "é".repeat(100),
            table_type: "t".repeat(50),
            ..TableConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let long_name = TableConfig {
            name: "n".repeat(101),
            ..TableConfig::default()
        };
        assert!(long_name.validate().unwrap_err().contains("100"));

        let long_type = TableConfig {
            table_type: "t".repeat(51),
            ..TableConfig::default()
        };
        assert!(long_type.validate().unwrap_err().contains("50"));
    }

    #[test]
    fn test_max_players_defaults_when_missing() {
        let json = r#"{"name":"Main","table_type":"texas_holdem","small_blind":5,
            "big_blind":10,"min_buy_in":50,"max_buy_in":500}"#;
        let config: TableConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_players, 9);
    }
}
