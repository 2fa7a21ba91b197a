//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{Component, RiskLevel};
use clap::Parser;
use std::path::PathBuf;

/// urltrust - explainable trust scores for URLs
///
/// Runs domain, content and technical heuristics against each URL
/// concurrently and combines them into a 0-100 trust score with the
/// evidence behind it. Markdown/JSON reports.
///
/// Examples:
///   urltrust https://example.com
///   urltrust https://example.com http://secure-login.example.tk --format json
///   urltrust https://example.com --disable content --timeout 10
///   urltrust https://example.com --fail-on high
///   urltrust --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// URLs to analyze (http:// or https://)
    #[arg(value_name = "URL", required_unless_present = "init_config")]
    pub urls: Vec<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .urltrust.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "URLTRUST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Components to switch on (comma-separated)
    ///
    /// Values: domain, content, technical, visual
    #[arg(long, value_name = "COMPONENTS", value_delimiter = ',')]
    pub enable: Vec<Component>,

    /// Components to switch off (comma-separated)
    ///
    /// Values: domain, content, technical, visual
    #[arg(long, value_name = "COMPONENTS", value_delimiter = ',')]
    pub disable: Vec<Component>,

    /// Upper bound on every component timeout, in seconds
    ///
    /// Components configured with a shorter timeout keep it.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fail if any URL is rated at or above this risk level
    ///
    /// Useful for CI pipelines. Exit code 2 when the threshold is reached.
    /// Values: low, medium, high, critical
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Generate a default .urltrust.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Risk level for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl From<FailOnLevel> for RiskLevel {
    fn from(level: FailOnLevel) -> Self {
        match level {
            FailOnLevel::Low => RiskLevel::Low,
            FailOnLevel::Medium => RiskLevel::Medium,
            FailOnLevel::High => RiskLevel::High,
            FailOnLevel::Critical => RiskLevel::Critical,
        }
    }
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

        if self.urls.is_empty() {
            return Err("At least one URL is required".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(component) = self.enable.iter().find(|c| self.disable.contains(c)) {
            return Err(format!(
                "Component '{}' cannot be both enabled and disabled",
                component
            ));
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file; `--quiet`
    /// still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Risk level that triggers exit code 2, if set.
    pub fn fail_threshold(&self) -> Option<RiskLevel> {
        self.fail_on.map(RiskLevel::from)
    }
}
