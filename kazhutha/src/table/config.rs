//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    SetupError,
    constants::{DEFAULT_BOT_THINK_DELAY, DEFAULT_TRICK_PAUSE, MAX_PLAYERS, MIN_PLAYERS},
};

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Seats available to humans and bots combined (2 to 8)
    pub max_seats: usize,

    /// Bot seats added after the humans when the game starts
    pub bot_seats: usize,

    /// How long a finished trick stays visible before it is finalized
    pub trick_pause_ms: u64,

    /// Delay before a bot seat plays
    pub bot_think_ms: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Kazhutha".to_string(),
            max_seats: MAX_PLAYERS,
            bot_seats: 0,
            trick_pause_ms: DEFAULT_TRICK_PAUSE.as_millis() as u64,
            bot_think_ms: DEFAULT_BOT_THINK_DELAY.as_millis() as u64,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_seats) {
            return Err(format!(
                "Max seats must be between {MIN_PLAYERS} and {MAX_PLAYERS}"
            ));
        }

        if self.bot_seats >= self.max_seats {
            return Err("Bot seats must leave at least one seat for a human".to_string());
        }

        if self.trick_pause_ms == 0 {
            return Err("Trick pause must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn trick_pause(&self) -> Duration {
        Duration::from_millis(self.trick_pause_ms)
    }

    pub fn bot_think_delay(&self) -> Duration {
        Duration::from_millis(self.bot_think_ms)
    }

    /// Seats left for humans once bots are placed.
    pub fn human_seats(&self) -> usize {
        self.max_seats.saturating_sub(self.bot_seats)
    }

    /// Checks that `humans` joined players plus the bot seats make a
    /// playable table.
    pub fn check_seat_count(&self, humans: usize) -> Result<usize, SetupError> {
        let total = humans + self.bot_seats;
        if total < MIN_PLAYERS {
            return Err(SetupError::NotEnoughPlayers);
        }
        if total > self.max_seats.min(MAX_PLAYERS) {
            return Err(SetupError::TooManyPlayers);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TableConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trick_pause(), Duration::from_millis(3000));
        assert_eq!(config.bot_think_delay(), Duration::from_millis(600));
    }

    #[test]
    fn validate_rejects_bad_seat_counts() {
        let mut config = TableConfig {
            max_seats: 9,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.max_seats = 4;
        config.bot_seats = 4;
        assert!(config.validate().is_err());
        config.bot_seats = 3;
        assert!(config.validate().is_ok());
        config.trick_pause_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn seat_count_includes_bots() {
        let config = TableConfig {
            max_seats: 4,
            bot_seats: 2,
            ..Default::default()
        };
        assert_eq!(config.human_seats(), 2);
        assert_eq!(config.check_seat_count(1), Ok(3));
        assert_eq!(config.check_seat_count(3), Err(SetupError::TooManyPlayers));

        let solo = TableConfig::default();
        assert_eq!(solo.check_seat_count(1), Err(SetupError::NotEnoughPlayers));
    }
}
