// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Hosted service used for AI answers and PDF extraction.
pub const DEFAULT_SERVICE_URL: &str = "https://netra-server-nwf6.onrender.com";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,

    /// Remote assistant and extraction service.
    pub assistant: AssistantConfig,

    /// Speech input settings.
    pub speech: SpeechConfig,

    /// Message history settings.
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Transport backend: "rfcomm" or "stub".
    pub backend: String,

    /// RFCOMM channel the Braille device listens on.
    pub rfcomm_channel: u8,

    /// Appended to every outgoing payload.
    pub line_terminator: String,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            backend: "rfcomm".to_string(),
            rfcomm_channel: 1,
            line_terminator: "\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base URL serving `/ask-ai` and `/extract-text`.
    pub base_url: String,

    /// Request timeout in seconds. No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognition locale.
    pub locale: String,

    /// External speech-to-text command, one transcript per stdout line.
    /// `{locale}` in arguments is replaced. Empty uses scripted input.
    pub command: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            command: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of messages kept in memory.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 500 }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("netraa-link")
            .join("config.toml")
    }

    /// Load configuration from file or create default.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = toml::from_str(&content)?;
            info!("Configuration loaded from {:?}", path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            info!("Default configuration written to {:?}", path);
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.bluetooth.backend, "rfcomm");
        assert_eq!(config.bluetooth.line_terminator, "\n");
        assert_eq!(config.assistant.base_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.speech.locale, "en-US");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[bluetooth]\nbackend = \"stub\"\n\n[assistant]\ntimeout_secs = 30\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.bluetooth.backend, "stub");
        assert_eq!(config.bluetooth.rfcomm_channel, 1);
        assert_eq!(config.assistant.timeout_secs, Some(30));
        assert_eq!(config.assistant.base_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.history.max_entries, 500);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[bluetooth\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
