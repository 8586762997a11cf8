//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.newseval.toml` files.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".newseval.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Display settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Evaluation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the streaming analyze endpoint.
    #[serde(default = "default_analyze_path")]
    pub analyze_path: String,

    /// Path of the historical results endpoint.
    #[serde(default = "default_results_path")]
    pub results_path: String,

    /// Connect timeout, and total timeout for the results request.
    /// The analyze stream itself is not bounded: evaluations take minutes.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            analyze_path: default_analyze_path(),
            results_path: default_results_path(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_analyze_path() -> String {
    "/analyze/stream".to_string()
}

fn default_results_path() -> String {
    "/results".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Rendering and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Most frequent historical answers shown per field.
    #[serde(default = "default_top_answers")]
    pub top_answers: usize,

    /// Pause after the final progress line before the report is shown.
    #[serde(default = "default_done_delay")]
    pub done_delay_ms: u64,

    /// Pause before the next queued URL is submitted.
    #[serde(default = "default_ready_delay")]
    pub ready_delay_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_answers: default_top_answers(),
            done_delay_ms: default_done_delay(),
            ready_delay_ms: default_ready_delay(),
        }
    }
}

fn default_top_answers() -> usize {
    crate::analysis::ranking::DEFAULT_TOP_ANSWERS
}

fn default_done_delay() -> u64 {
    crate::stream::session::DEFAULT_DONE_DELAY.as_millis() as u64
}

fn default_ready_delay() -> u64 {
    1200
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.newseval.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.backend_url {
            self.backend.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.backend.timeout_seconds = timeout;
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(top) = args.top_answers {
            self.display.top_answers = top;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.analyze_path, "/analyze/stream");
        assert_eq!(config.display.top_answers, 4);
        assert_eq!(config.display.done_delay_ms, 800);
        assert_eq!(config.general.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
format = "json"
verbose = true

[backend]
base_url = "https://eval.example.org"
timeout_seconds = 5

[display]
top_answers = 6
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert!(config.general.verbose);
        assert_eq!(config.backend.base_url, "https://eval.example.org");
        assert_eq!(config.backend.results_path, "/results");
        assert_eq!(config.backend.timeout_seconds, 5);
        assert_eq!(config.display.top_answers, 6);
        assert_eq!(config.display.ready_delay_ms, 1200);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[backend]"));
        assert!(toml_str.contains("[display]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.backend.base_url, Config::default().backend.base_url);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[backend]\nbase_url = \"http://10.0.0.2:9000\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.2:9000");

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[backend\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args::parse_from([
            "newseval",
            "--backend-url",
            "http://localhost:9999",
            "--top-answers",
            "2",
            "https://news.example.com/story",
        ]);

        let mut config = Config::default();
        config.display.done_delay_ms = 10;
        config.merge_with_args(&args);

        assert_eq!(config.backend.base_url, "http://localhost:9999");
        assert_eq!(config.display.top_answers, 2);
        assert_eq!(config.display.done_delay_ms, 10);
        assert_eq!(config.backend.timeout_seconds, 30);
    }
}
