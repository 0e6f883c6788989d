//! # Configuration Management Module
//!
//! Game settings live in a TOML file (default `genmud.toml`) with three
//! sections:
//!
//! - [`GameConfig`] - map size, content generation switch, verbose map logging
//! - [`LoggingConfig`] - log level and optional log file
//! - [`ContentConfig`] - which content provider to use and how to reach it
//!
//! ```toml
//! [game]
//! map_size = 10
//! generate = true
//! verbose = false
//!
//! [logging]
//! level = "info"
//!
//! [content]
//! provider = "gemini"
//! api_key = ""
//! ```
//!
//! Every field has a default, so a missing file or a partial one is fine.
//! Environment variables override the file (`MAP_SIZE`, `GENERATE`, `LOG`,
//! `API_KEY`) and CLI arguments override both.

use anyhow::{anyhow, Result};
use log::info;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::map::{DEFAULT_MAX_DEAD_END_LENGTH, DEFAULT_MAX_PATH_ATTEMPTS};

pub const DEFAULT_CONFIG_PATH: &str = "genmud.toml";
pub const MAX_MAP_SIZE: usize = 64;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Side length of the square map.
    #[serde(default = "default_map_size")]
    pub map_size: usize,
    /// Ask the content provider for rooms. When false every cell stays bare.
    #[serde(default = "default_true")]
    pub generate: bool,
    /// Log the map layout and the player's trail after each move.
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_max_dead_end_length")]
    pub max_dead_end_length: usize,
    /// Random walks tried before the map falls back to a direct route.
    #[serde(default = "default_max_path_attempts")]
    pub max_path_attempts: usize,
}

fn default_map_size() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_dead_end_length() -> usize {
    DEFAULT_MAX_DEAD_END_LENGTH
}

fn default_max_path_attempts() -> usize {
    DEFAULT_MAX_PATH_ATTEMPTS
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_size: default_map_size(),
            generate: true,
            verbose: false,
            max_dead_end_length: default_max_dead_end_length(),
            max_path_attempts: default_max_path_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// "offline" or "gemini".
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    pub max_output_tokens: u32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            api_key: String::new(),
            model: "gemini-1.5-pro".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_seconds: 30,
            max_output_tokens: 2000,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Load the file when it exists, otherwise start from defaults.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            info!("No config file at {}; using defaults", path);
            Ok(Self::default())
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Apply `MAP_SIZE`, `GENERATE`, `LOG` and `API_KEY` from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; unparsable values are an error.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = lookup("MAP_SIZE") {
            self.game.map_size = size
                .trim()
                .parse()
                .map_err(|_| anyhow!("MAP_SIZE must be a number, got '{}'", size))?;
        }
        if let Some(flag) = lookup("GENERATE") {
            self.game.generate =
                parse_flag(&flag).ok_or_else(|| anyhow!("GENERATE must be true or false"))?;
        }
        if let Some(flag) = lookup("LOG") {
            self.game.verbose =
                parse_flag(&flag).ok_or_else(|| anyhow!("LOG must be true or false"))?;
        }
        if let Some(key) = lookup("API_KEY") {
            self.content.api_key = key;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.game.map_size == 0 || self.game.map_size > MAX_MAP_SIZE {
            return Err(anyhow!(
                "map_size must be between 1 and {}, got {}",
                MAX_MAP_SIZE,
                self.game.map_size
            ));
        }
        if self.content.timeout_seconds == 0 {
            return Err(anyhow!("content.timeout_seconds must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.game.map_size, 10);
        assert!(config.game.generate);
        assert!(!config.game.verbose);
        assert_eq!(config.game.max_dead_end_length, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str("[game]\nmap_size = 4\n").unwrap();
        assert_eq!(config.game.map_size, 4);
        assert!(config.game.generate);
        assert_eq!(config.content.model, "gemini-1.5-pro");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("MAP_SIZE", "5"),
            ("GENERATE", "false"),
            ("LOG", "true"),
            ("API_KEY", "secret"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.game.map_size, 5);
        assert!(!config.game.generate);
        assert!(config.game.verbose);
        assert_eq!(config.content.api_key, "secret");
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let mut config = Config::default();
        assert!(config
            .apply_overrides(|k| (k == "MAP_SIZE").then(|| "ten".to_string()))
            .is_err());
        assert!(config
            .apply_overrides(|k| (k == "GENERATE").then(|| "maybe".to_string()))
            .is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_size() {
        let mut config = Config::default();
        config.game.map_size = 0;
        assert!(config.validate().is_err());
        config.game.map_size = MAX_MAP_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_serde_round_trip_keeps_sections() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("[game]"));
        assert!(text.contains("[content]"));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.game.map_size, 10);
    }
}
