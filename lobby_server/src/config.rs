//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use poker_lobby::{LobbyConfig, db::DatabaseConfig};
use std::net::SocketAddr;

const MIN_SECRET_LEN: usize = 32;

/// Where wallets, tables and seats live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(StorageBackend::Postgres),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP and WebSocket bind address
    pub bind: SocketAddr,
    /// Prometheus scrape endpoint, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    /// HS256 secret shared with the authentication service
    pub jwt_secret: String,
    pub lobby: LobbyConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Bind address from `--bind`
    /// * `database_url_override` - Database URL from `--db-url`
    /// * `memory` - `--memory` flag, forces the in-process store
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        memory: bool,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(addr) => addr,
            None => parse_addr("SERVER_BIND")?.unwrap_or(SocketAddr::from(([127, 0, 0, 1], 6969))),
        };
        let metrics_bind = parse_addr("METRICS_BIND")?;

        let storage = if memory {
            StorageBackend::Memory
        } else {
            match std::env::var("STORAGE") {
                Ok(value) => StorageBackend::parse(&value).ok_or_else(|| ConfigError::Invalid {
                    var: "STORAGE".to_string(),
                    reason: format!("Unknown backend '{}', expected postgres or memory", value),
                })?,
                Err(_) => StorageBackend::Postgres,
            }
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let config = ServerConfig {
            bind,
            metrics_bind,
            storage,
            database,
            jwt_secret,
            lobby: LobbyConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {} characters", MIN_SECRET_LEN),
            });
        }

        if self.storage == StorageBackend::Postgres && self.database.database_url.is_empty() {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.lobby.default_wallet_balance < 0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_WALLET_BALANCE".to_string(),
                reason: "Must not be negative".to_string(),
            });
        }

        if self.lobby.list_default_limit < 1 || self.lobby.list_default_limit > self.lobby.list_max_limit {
            return Err(ConfigError::Invalid {
                var: "TABLE_LIST_DEFAULT_LIMIT".to_string(),
                reason: format!(
                    "Must be between 1 and TABLE_LIST_MAX_LIMIT ({})",
                    self.lobby.list_max_limit
                ),
            });
        }

        if self.lobby.chat_max_len == 0 {
            return Err(ConfigError::Invalid {
                var: "CHAT_MAX_LEN".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Optional socket address variable; present but unparsable is an error
fn parse_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{}' is not an IP:PORT address", value),
        }),
        Err(_) => Ok(None),
    }
}
