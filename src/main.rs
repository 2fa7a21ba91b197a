//! urltrust - explainable trust scores for URLs
//!
//! A CLI tool that runs an ensemble of heuristic analyzers against each
//! URL and prints a Markdown or JSON trust report.
//!
//! Exit codes:
//!   0 - Success (no URL at or above the --fail-on level, or no --fail-on set)
//!   1 - Runtime error (config, invalid URL, every component failed, etc.)
//!   2 - A URL was rated at or above the --fail-on level

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use urltrust::cli::{Args, OutputFormat};
use urltrust::config::{Config, DEFAULT_CONFIG_FILE};
use urltrust::report::{self, UrlReport};
use urltrust::Detector;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` can apply
    let (config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("urltrust v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .urltrust.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize component weights, timeouts, and the allowlist.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Analyze every URL and write the report. Returns the exit code.
async fn run(args: Args, mut config: Config) -> Result<i32> {
    let start_time = Instant::now();

    config.merge_with_args(&args);

    let format = resolve_format(&args, &config);
    let detector = Detector::with_builtin_analyzers(config)?;

    let components: Vec<String> = detector
        .active_components()
        .iter()
        .map(|c| c.to_string())
        .collect();
    info!("Active components: {}", components.join(", "));

    let mut reports = Vec::with_capacity(args.urls.len());
    let mut had_error = false;

    for raw_url in &args.urls {
        let spinner = create_spinner(&args, raw_url);
        let outcome = detector.analyze(raw_url).await;
        spinner.finish_and_clear();

        match &outcome {
            Ok(result) => info!(
                "{} → trust {} ({}), confidence {}%",
                result.url, result.trust_score, result.risk_level, result.confidence
            ),
            Err(e) => {
                had_error = true;
                warn!("{}: {}", raw_url, e);
            }
        }
        reports.push(UrlReport::from_outcome(raw_url, outcome));
    }

    // Generate and write the report
    let output = match format {
        OutputFormat::Json => report::generate_json_report(&reports)?,
        OutputFormat::Markdown => report::generate_markdown_report(&reports),
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                eprintln!("✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }

    debug!(
        "Analyzed {} URLs in {:.1}s",
        reports.len(),
        start_time.elapsed().as_secs_f64()
    );

    // Check --fail-on threshold
    if let Some(threshold) = args.fail_threshold() {
        let reached = reports.iter().any(|r| match r {
            UrlReport::Analyzed { result, .. } => result.risk_level >= threshold,
            UrlReport::Failed { .. } => false,
        });

        if reached {
            eprintln!(
                "\n⛔ A URL was rated at or above {} risk. Failing (exit code 2).",
                threshold
            );
            return Ok(2);
        }
    }

    Ok(if had_error { 1 } else { 0 })
}

/// CLI flag wins unless it is the default and the config file names a format.
fn resolve_format(args: &Args, config: &Config) -> OutputFormat {
    if args.format != OutputFormat::Markdown {
        return args.format;
    }
    match config.general.format.as_deref() {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Markdown,
    }
}

/// Spinner shown on stderr while one URL is analyzed.
fn create_spinner(args: &Args, url: &str) -> ProgressBar {
    if args.quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Analyzing {}", url.trim()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Where the configuration came from, logged once logging is up.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Builtin,
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
            ConfigSource::Builtin => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {}", e),
        }
    }
}

/// Load configuration from file or use defaults.
///
/// An explicit `--config` path must load; a broken default file falls back
/// to built-in settings.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    Ok(match Config::load_default() {
        Ok(Some(config)) => (config, ConfigSource::DefaultFile),
        Ok(None) => (Config::default(), ConfigSource::Builtin),
        Err(e) => (Config::default(), ConfigSource::Fallback(e)),
    })
}
