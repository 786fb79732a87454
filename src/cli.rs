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

//! Command line arguments.
//!
//! Flags override the configuration file, which overrides defaults.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Send text, speech and PDF content to a Bluetooth Braille display.
#[derive(Parser, Debug, Default)]
#[command(name = "netraa-link", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Use the in-memory transport instead of Bluetooth.
    #[arg(long = "stub")]
    pub stub: bool,

    /// Override the assistant service URL.
    #[arg(long = "service-url")]
    pub service_url: Option<String>,
}

impl CliArgs {
    /// Priority: --config flag > NETRAA_CONFIG env var > platform default.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("NETRAA_CONFIG") {
            return PathBuf::from(p);
        }
        Config::default_path()
    }

    /// Tracing directive for this crate.
    pub fn log_directive(&self) -> String {
        format!(
            "netraa_link={}",
            self.log_level.as_deref().unwrap_or("info")
        )
    }

    /// Apply flag overrides to a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if self.stub {
            config.bluetooth.backend = "stub".to_string();
        }
        if let Some(ref url) = self.service_url {
            config.assistant.base_url = url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "netraa-link",
            "--config",
            "/tmp/netraa.toml",
            "-l",
            "debug",
            "--stub",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/netraa.toml"));
        assert_eq!(args.log_directive(), "netraa_link=debug");
        assert!(args.stub);
    }

    #[test]
    fn test_apply_overrides() {
        let args = CliArgs {
            stub: true,
            service_url: Some("http://localhost:5000".to_string()),
            ..Default::default()
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.bluetooth.backend, "stub");
        assert_eq!(config.assistant.base_url, "http://localhost:5000");
        assert_eq!(CliArgs::default().log_directive(), "netraa_link=info");
    }
}
