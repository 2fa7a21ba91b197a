//! Configuration file handling.
//!
//! This module handles loading, validating and merging configuration from
//! `.urltrust.toml` files.

use crate::models::Component;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".urltrust.toml";

/// Tolerance when checking that enabled weights sum to 1.0.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input validation settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Ensemble scoring constants.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Per-component settings.
    #[serde(default)]
    pub components: ComponentsConfig,

    /// HTTP settings for the built-in analyzers.
    #[serde(default)]
    pub http: HttpConfig,

    /// Hosts that bypass analysis.
    #[serde(default)]
    pub allowlist: AllowlistConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Default report format ("markdown" or "json").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Input validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Longest URL accepted, in characters.
    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_url_length: default_max_url_length(),
        }
    }
}

fn default_max_url_length() -> usize {
    2048
}

/// Constants used by the ensemble combiner.
///
/// None of these are load-bearing; they are the calibration the detector
/// ships with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Neutral starting point on the 0-100 scale.
    #[serde(default = "default_baseline")]
    pub baseline: f64,

    /// Scores at or above this are LOW risk.
    #[serde(default = "default_low_threshold")]
    pub low_threshold: u8,

    /// Scores at or above this (and below `low_threshold`) are MEDIUM risk.
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: u8,

    /// Scores at or above this (and below `medium_threshold`) are HIGH risk.
    #[serde(default = "default_high_threshold")]
    pub high_threshold: u8,

    /// Confidence awarded when every component succeeds.
    #[serde(default = "default_breadth_max")]
    pub confidence_breadth_max: f64,

    /// Cap on confidence from strong signals.
    #[serde(default = "default_strength_max")]
    pub confidence_strength_max: u32,

    /// Confidence per strong signal.
    #[serde(default = "default_strength_per_signal")]
    pub confidence_strength_per_signal: u32,

    /// Cap on confidence from the number of signals.
    #[serde(default = "default_count_max")]
    pub confidence_count_max: u32,

    /// Confidence per signal.
    #[serde(default = "default_count_per_signal")]
    pub confidence_count_per_signal: u32,

    /// A negative signal with at least this many points is strong.
    #[serde(default = "default_strong_negative")]
    pub strong_negative_points: u32,

    /// A positive signal with at least this many points is strong.
    #[serde(default = "default_strong_positive")]
    pub strong_positive_points: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            low_threshold: default_low_threshold(),
            medium_threshold: default_medium_threshold(),
            high_threshold: default_high_threshold(),
            confidence_breadth_max: default_breadth_max(),
            confidence_strength_max: default_strength_max(),
            confidence_strength_per_signal: default_strength_per_signal(),
            confidence_count_max: default_count_max(),
            confidence_count_per_signal: default_count_per_signal(),
            strong_negative_points: default_strong_negative(),
            strong_positive_points: default_strong_positive(),
        }
    }
}

fn default_baseline() -> f64 {
    70.0
}

fn default_low_threshold() -> u8 {
    70
}

fn default_medium_threshold() -> u8 {
    40
}

fn default_high_threshold() -> u8 {
    20
}

fn default_breadth_max() -> f64 {
    60.0
}

fn default_strength_max() -> u32 {
    30
}

fn default_strength_per_signal() -> u32 {
    8
}

fn default_count_max() -> u32 {
    10
}

fn default_count_per_signal() -> u32 {
    2
}

fn default_strong_negative() -> u32 {
    10
}

fn default_strong_positive() -> u32 {
    8
}

/// Settings for one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSettings {
    /// Whether the component takes part in analysis.
    pub enabled: bool,

    /// Share of the ensemble; enabled weights must sum to 1.0.
    pub weight: f64,

    /// Wall-clock budget for one invocation.
    pub timeout_seconds: u64,
}

impl ComponentSettings {
    fn new(enabled: bool, weight: f64, timeout_seconds: u64) -> Self {
        Self {
            enabled,
            weight,
            timeout_seconds,
        }
    }
}

/// Settings for every component, one table each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentsConfig {
    #[serde(default = "default_domain")]
    pub domain: ComponentSettings,

    #[serde(default = "default_content")]
    pub content: ComponentSettings,

    #[serde(default = "default_technical")]
    pub technical: ComponentSettings,

    #[serde(default = "default_visual")]
    pub visual: ComponentSettings,
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            content: default_content(),
            technical: default_technical(),
            visual: default_visual(),
        }
    }
}

// DNS/WHOIS-bound checks get the shortest budget, full page fetches the longest.
fn default_domain() -> ComponentSettings {
    ComponentSettings::new(true, 0.35, 15)
}

fn default_content() -> ComponentSettings {
    ComponentSettings::new(true, 0.40, 30)
}

fn default_technical() -> ComponentSettings {
    ComponentSettings::new(true, 0.25, 20)
}

fn default_visual() -> ComponentSettings {
    ComponentSettings::new(false, 0.15, 25)
}

impl ComponentsConfig {
    /// Settings for one component.
    pub fn get(&self, component: Component) -> &ComponentSettings {
        match component {
            Component::Domain => &self.domain,
            Component::Content => &self.content,
            Component::Technical => &self.technical,
            Component::Visual => &self.visual,
        }
    }

    /// Mutable settings for one component.
    pub fn get_mut(&mut self, component: Component) -> &mut ComponentSettings {
        match component {
            Component::Domain => &mut self.domain,
            Component::Content => &mut self.content,
            Component::Technical => &mut self.technical,
            Component::Visual => &mut self.visual,
        }
    }
}

/// HTTP client settings shared by the built-in analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with page fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Largest response body read, in bytes.
    #[serde(default = "default_max_content_bytes")]
    pub max_content_bytes: usize,

    /// Redirects followed before giving up.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_seconds: default_request_timeout(),
            max_content_bytes: default_max_content_bytes(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_user_agent() -> String {
    format!("urltrust/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    15
}

fn default_max_content_bytes() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

/// Domains trusted without analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllowlistConfig {
    /// Registrable domains; subdomains match too.
    #[serde(default)]
    pub domains: Vec<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check the invariants the detector relies on.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        if !(s.low_threshold <= 100
            && s.medium_threshold < s.low_threshold
            && s.high_threshold < s.medium_threshold)
        {
            bail!(
                "risk thresholds must be strictly descending within 0-100 (low {}, medium {}, high {})",
                s.low_threshold,
                s.medium_threshold,
                s.high_threshold
            );
        }
        if !s.baseline.is_finite() || !(0.0..=100.0).contains(&s.baseline) {
            bail!("baseline must be within 0-100, got {}", s.baseline);
        }

        if self.input.max_url_length == 0 {
            bail!("max_url_length must be at least 1");
        }

        let enabled = self.enabled_components();
        if enabled.is_empty() {
            bail!("at least one component must be enabled");
        }

        let mut total = 0.0;
        for component in &enabled {
            let settings = self.components.get(*component);
            if !settings.weight.is_finite() || settings.weight <= 0.0 {
                bail!(
                    "weight for {} must be a positive number, got {}",
                    component,
                    settings.weight
                );
            }
            if settings.timeout_seconds == 0 {
                bail!("timeout for {} must be at least 1 second", component);
            }
            total += settings.weight;
        }

        if (total - 1.0).abs() > WEIGHT_SUM_EPSILON {
            bail!(
                "weights of enabled components must sum to 1.0, got {:.4}",
                total
            );
        }

        Ok(())
    }

    /// Components switched on, in configured order.
    pub fn enabled_components(&self) -> BTreeSet<Component> {
        Component::ALL
            .into_iter()
            .filter(|c| self.components.get(*c).enabled)
            .collect()
    }

    /// Configured weight of every component.
    pub fn component_weights(&self) -> BTreeMap<Component, f64> {
        Component::ALL
            .into_iter()
            .map(|c| (c, self.components.get(c).weight))
            .collect()
    }

    /// Configured timeout of every component.
    pub fn component_timeouts(&self) -> BTreeMap<Component, Duration> {
        Component::ALL
            .into_iter()
            .map(|c| (c, Duration::from_secs(self.components.get(c).timeout_seconds)))
            .collect()
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        for component in &args.enable {
            self.components.get_mut(*component).enabled = true;
        }
        for component in &args.disable {
            self.components.get_mut(*component).enabled = false;
        }
        if !args.enable.is_empty() || !args.disable.is_empty() {
            self.rebalance_weights();
        }

        // Timeout caps every component, shorter budgets are kept
        if let Some(timeout) = args.timeout {
            for component in Component::ALL {
                let settings = self.components.get_mut(component);
                settings.timeout_seconds = settings.timeout_seconds.min(timeout);
            }
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Scale the enabled weights so they sum to 1.0, keeping their ratios.
    pub fn rebalance_weights(&mut self) {
        let enabled = self.enabled_components();
        let total: f64 = enabled
            .iter()
            .map(|c| self.components.get(*c).weight)
            .filter(|w| w.is_finite() && *w > 0.0)
            .sum();
        if total <= 0.0 {
            return;
        }
        for component in enabled {
            self.components.get_mut(component).weight /= total;
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
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scoring.baseline, 70.0);
        assert_eq!(config.input.max_url_length, 2048);
        assert_eq!(config.components.content.timeout_seconds, 30);
        assert!(!config.components.visual.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[scoring]
baseline = 60.0

[components.domain]
enabled = true
weight = 0.5
timeout_seconds = 5

[components.content]
enabled = false
weight = 0.4
timeout_seconds = 30

[components.technical]
enabled = true
weight = 0.5
timeout_seconds = 10

[allowlist]
domains = ["example.org"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.scoring.baseline, 60.0);
        assert_eq!(config.scoring.low_threshold, 70);
        assert_eq!(config.components.domain.weight, 0.5);
        assert!(!config.components.content.enabled);
        assert!(!config.components.visual.enabled);
        assert_eq!(config.allowlist.domains, vec!["example.org"]);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.enabled_components().into_iter().collect::<Vec<_>>(),
            vec![Component::Domain, Component::Technical]
        );
    }

    #[test]
    fn test_validate_rejects_weights_not_summing_to_one() {
        let mut config = Config::default();
        config.components.visual.enabled = true;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = Config::default();
        config.scoring.medium_threshold = 80;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_no_enabled_components() {
        let mut config = Config::default();
        for component in Component::ALL {
            config.components.get_mut(component).enabled = false;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[input]\nmax_url_length = 512\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.input.max_url_length, 512);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[components.domain]\nenabled = true\nweight = 0.9\ntimeout_seconds = 15\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_merge_with_args_rebalances_weights() {
        use clap::Parser;

        let args = crate::cli::Args::parse_from([
            "urltrust",
            "--disable",
            "content",
            "--timeout",
            "10",
            "https://example.com",
        ]);
        let mut config = Config::default();
        config.merge_with_args(&args);

        assert!(!config.components.content.enabled);
        assert!((config.components.domain.weight - 0.35 / 0.60).abs() < 1e-9);
        assert!((config.components.technical.weight - 0.25 / 0.60).abs() < 1e-9);
        assert_eq!(config.components.domain.timeout_seconds, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_with_args_enabling_visual_stays_valid() {
        use clap::Parser;

        let args = crate::cli::Args::parse_from(["urltrust", "--enable", "visual", "https://example.com"]);
        let mut config = Config::default();
        config.merge_with_args(&args);

        assert!(config.components.visual.enabled);
        assert!(config.validate().is_ok());
        assert_eq!(config.components.content.timeout_seconds, 30);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[scoring]"));
        assert!(toml_str.contains("[components.domain]"));
        assert!(toml_str.contains("[http]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.components, Config::default().components);
    }
}
