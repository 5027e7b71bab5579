use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure, fixed for the duration of a run
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Grid rows
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Grid columns
    #[serde(default = "default_columns")]
    pub columns: usize,
    /// Selection size K: tokens needed to submit a selection
    #[serde(default = "default_selection_size")]
    pub selection_size: usize,
    /// Number of distinct cards in the deck
    #[serde(default = "default_deck_size")]
    pub deck_size: usize,
    /// Human players (driven externally through their key handles)
    #[serde(default)]
    pub human_players: usize,
    /// Automated players (each gets a random key-press generator)
    #[serde(default = "default_computer_players")]
    pub computer_players: usize,
    /// Round length: time until a forced reshuffle
    #[serde(default = "default_turn_timeout_ms")]
    pub turn_timeout_ms: u64,
    /// Reward cooldown after an accepted selection
    #[serde(default = "default_point_freeze_ms")]
    pub point_freeze_ms: u64,
    /// Penalty cooldown after a rejected selection
    #[serde(default = "default_penalty_freeze_ms")]
    pub penalty_freeze_ms: u64,
    /// Artificial delay before each card mutation takes visible effect
    #[serde(default)]
    pub table_delay_ms: u64,
    /// Countdown switches to urgent display inside this window
    #[serde(default = "default_countdown_warn_ms")]
    pub countdown_warn_ms: u64,
    /// Log every valid group on the table after each deal
    #[serde(default)]
    pub hints: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_rows() -> usize {
    3
}

fn default_columns() -> usize {
    4
}

fn default_selection_size() -> usize {
    3
}

fn default_deck_size() -> usize {
    81
}

fn default_computer_players() -> usize {
    2
}

fn default_turn_timeout_ms() -> u64 {
    60_000
}

fn default_point_freeze_ms() -> u64 {
    1_000
}

fn default_penalty_freeze_ms() -> u64 {
    3_000
}

fn default_countdown_warn_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GameConfig {
    /// Load configuration from an optional TOML file and environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::from(file.to_path_buf()));
        }
        // Override with environment variables (SETDEAL__TURN_TIMEOUT_MS, etc.)
        builder = builder.add_source(
            Environment::with_prefix("SETDEAL")
                .separator("__")
                .try_parsing(true),
        );
        builder.build()?.try_deserialize()
    }

    pub fn slot_count(&self) -> usize {
        self.rows * self.columns
    }

    pub fn total_players(&self) -> usize {
        self.human_players + self.computer_players
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    pub fn point_freeze(&self) -> Duration {
        Duration::from_millis(self.point_freeze_ms)
    }

    pub fn penalty_freeze(&self) -> Duration {
        Duration::from_millis(self.penalty_freeze_ms)
    }

    pub fn table_delay(&self) -> Duration {
        Duration::from_millis(self.table_delay_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.rows == 0 || self.columns == 0 {
            errors.push("grid must have at least one row and one column".to_string());
        }

        if self.selection_size == 0 {
            errors.push("selection_size must be at least 1".to_string());
        } else if self.selection_size > self.slot_count() {
            errors.push(format!(
                "selection_size {} exceeds grid capacity {}",
                self.selection_size,
                self.slot_count()
            ));
        }

        if self.deck_size < self.slot_count() {
            errors.push(format!(
                "deck_size {} is smaller than the grid ({} slots)",
                self.deck_size,
                self.slot_count()
            ));
        }

        if self.total_players() == 0 {
            errors.push("at least one player is required".to_string());
        }

        if self.turn_timeout_ms == 0 {
            errors.push("turn_timeout_ms must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            columns: default_columns(),
            selection_size: default_selection_size(),
            deck_size: default_deck_size(),
            human_players: 0,
            computer_players: default_computer_players(),
            turn_timeout_ms: default_turn_timeout_ms(),
            point_freeze_ms: default_point_freeze_ms(),
            penalty_freeze_ms: default_penalty_freeze_ms(),
            table_delay_ms: 0,
            countdown_warn_ms: default_countdown_warn_ms(),
            hints: false,
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = GameConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.slot_count(), 12);
        assert_eq!(cfg.total_players(), 2);
    }

    #[test]
    fn test_validate_rejects_oversized_selection() {
        let cfg = GameConfig {
            rows: 1,
            columns: 2,
            selection_size: 3,
            deck_size: 81,
            ..GameConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("selection_size")));
    }

    #[test]
    fn test_validate_rejects_undersized_deck() {
        let cfg = GameConfig {
            deck_size: 4,
            ..GameConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("deck_size")));
    }

    #[test]
    fn test_validate_requires_players() {
        let cfg = GameConfig {
            human_players: 0,
            computer_players: 0,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
