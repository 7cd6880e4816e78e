//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use kazhutha::{
    TableConfig,
    constants::{DEFAULT_BOT_THINK_DELAY, DEFAULT_TRICK_PAUSE, MAX_PLAYERS, MIN_PLAYERS},
};
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Settings for the hosted table
    pub table: TableConfig,
}

/// Values given on the command line. They win over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub table_name: Option<String>,
    pub bot_seats: Option<usize>,
    pub trick_pause_ms: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but cannot be parsed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => match std::env::var("KZ_BIND") {
                Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                    var: "KZ_BIND".to_string(),
                    reason: format!("'{value}' is not an IP:PORT address"),
                })?,
                Err(_) => DEFAULT_BIND.parse().map_err(|_| ConfigError::Invalid {
                    var: "KZ_BIND".to_string(),
                    reason: "default address is malformed".to_string(),
                })?,
            },
        };

        let table = TableConfig {
            name: overrides
                .table_name
                .or_else(|| std::env::var("KZ_TABLE_NAME").ok())
                .unwrap_or_else(|| TableConfig::default().name),
            max_seats: parse_env_or("KZ_MAX_SEATS", MAX_PLAYERS)?,
            bot_seats: match overrides.bot_seats {
                Some(bots) => bots,
                None => parse_env_or("KZ_BOT_SEATS", 0)?,
            },
            trick_pause_ms: match overrides.trick_pause_ms {
                Some(pause) => pause,
                None => parse_env_or("KZ_TRICK_PAUSE_MS", DEFAULT_TRICK_PAUSE.as_millis() as u64)?,
            },
            bot_think_ms: parse_env_or(
                "KZ_BOT_THINK_MS",
                DEFAULT_BOT_THINK_DELAY.as_millis() as u64,
            )?,
        };

        Ok(ServerConfig { bind, table })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.table.max_seats) {
            return Err(ConfigError::Invalid {
                var: "KZ_MAX_SEATS".to_string(),
                reason: format!("Must be between {MIN_PLAYERS} and {MAX_PLAYERS}"),
            });
        }

        if self.table.bot_seats >= self.table.max_seats {
            return Err(ConfigError::Invalid {
                var: "KZ_BOT_SEATS".to_string(),
                reason: format!(
                    "Must leave a seat for a human (max seats {})",
                    self.table.max_seats
                ),
            });
        }

        if self.table.trick_pause_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "KZ_TRICK_PAUSE_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.table.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                var: "KZ_TABLE_NAME".to_string(),
                hint: "Pass --name or set a non-empty table name".to_string(),
            });
        }

        self.table.validate().map_err(|reason| ConfigError::Invalid {
            var: "table".to_string(),
            reason,
        })
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

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}' could not be parsed"),
        }),
        Err(_) => Ok(default),
    }
}
