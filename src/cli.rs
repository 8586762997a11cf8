//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// NewsEval - multi-model consensus evaluation for news articles
///
/// Submit a news article URL to the evaluation backend, follow the
/// evaluator models' progress live, and get the consensus report as
/// Markdown or JSON.
///
/// Examples:
///   newseval https://example.com/news/story
///   newseval https://example.com/a https://example.com/b --format json -o results.json
///   newseval --history
///   newseval --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Article URLs to evaluate, one submission each
    ///
    /// Must be non-paywalled English news articles (http or https).
    #[arg(
        value_name = "URL",
        required_unless_present_any = ["history", "init_config"]
    )]
    pub urls: Vec<String>,

    /// Show the historical results report instead of submitting articles
    #[arg(long, conflicts_with = "urls")]
    pub history: bool,

    /// Evaluation backend base URL
    ///
    /// Can also be set via NEWSEVAL_BACKEND_URL or .newseval.toml.
    #[arg(short, long, value_name = "URL", env = "NEWSEVAL_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Number of most frequent historical answers to show per field
    #[arg(long, value_name = "COUNT")]
    pub top_answers: Option<usize>,

    /// Connect timeout in seconds (also bounds the results request)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .newseval.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (no progress output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .newseval.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Validate article URLs
        for url in &self.urls {
            let trimmed = url.trim();
            if trimmed.is_empty() {
                return Err("Article URL must not be empty".to_string());
            }
            if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
                return Err(format!(
                    "Article URL must start with 'http://' or 'https://': {}",
                    url
                ));
            }
        }

        // Validate backend URL format
        if let Some(ref backend) = self.backend_url {
            if !backend.starts_with("http://") && !backend.starts_with("https://") {
                return Err("Backend URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.top_answers == Some(0) {
            return Err("Top answers must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            urls: vec!["https://news.example.com/story".to_string()],
            history: false,
            backend_url: None,
            output: None,
            format: None,
            top_answers: None,
            timeout: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.urls = vec!["news.example.com/story".to_string()];
        assert!(args.validate().is_err());

        args.urls = vec!["   ".to_string()];
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_backend() {
        let mut args = make_args();
        args.backend_url = Some("localhost:8000".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args();
        args.top_answers = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_history_flag() {
        let args = Args::parse_from(["newseval", "--history", "--format", "json"]);
        assert!(args.history);
        assert!(args.urls.is_empty());
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_history_conflicts_with_urls() {
        let result = Args::try_parse_from(["newseval", "--history", "https://example.com/a"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_url_required() {
        assert!(Args::try_parse_from(["newseval"]).is_err());
        assert!(Args::try_parse_from(["newseval", "--init-config"]).is_ok());
    }
}
