//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use talk_session::SessionConfig;

/// Server used when neither the config file nor the command line names one
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Configuration for talk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the talk server
    pub base_url: Option<String>,
    /// Color theme (dark, light)
    pub theme: Option<String>,
    /// Use the in-memory backend instead of a server
    pub offline: Option<bool>,
    /// Session texts and limits
    pub session: SessionConfig,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("talk")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("TALK_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            theme: Some("dark".to_string()),
            offline: Some(false),
            session: SessionConfig::default(),
        };

        default_config.save()?;
        Ok(path)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# talk configuration file
# Place at ~/.config/talk/config.toml (Linux/Mac) or %APPDATA%\talk\config.toml (Windows)

# Talk server
base_url = "http://127.0.0.1:5000"

# Color theme (dark, light)
theme = "dark"

# Keep talks in memory instead of using a server
offline = false

[session]
default_title = "New chat"
in_progress_text = "Just a moment..."
error_text = "An error occurred, so no reply could be produced."
# Generate a title only while a talk has at most this many messages
title_max_messages = 3
max_talks = 20
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(example_config()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(config.offline, Some(false));
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_partial_session_table() {
        let config = Config::parse("[session]\nmax_talks = 5\n").unwrap();
        assert_eq!(config.base_url, None);
        assert_eq!(config.session.max_talks, 5);
        assert_eq!(config.session.default_title, "New chat");
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config {
            theme: Some("light".to_string()),
            ..Default::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.theme.as_deref(), Some("light"));
    }
}
