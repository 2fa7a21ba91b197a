//! urltrust - explainable trust scores for URLs.
//!
//! A [`Detector`] runs independent analyzers (domain, content, technical and
//! optionally visual) against a URL concurrently, each under its own timeout,
//! and combines whatever succeeded into a 0-100 trust score, a risk level, a
//! confidence estimate and the evidence behind them.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use urltrust::{Config, Detector};
//!
//! let detector = Detector::with_builtin_analyzers(Config::default())?;
//! let result = detector.analyze("https://example.com").await?;
//! println!("{} ({})", result.trust_score, result.risk_level);
//! # Ok(())
//! # }
//! ```

pub mod allowlist;
pub mod analysis;
pub mod analyzers;
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod models;
pub mod report;

pub use analyzers::{Analyzer, AnalyzerOutput};
pub use config::Config;
pub use detector::{validate_url, Detector, DetectorBuilder};
pub use error::AnalysisError;
pub use models::{
    AnalysisResult, AnalysisStatus, Component, ComponentResult, ComponentScore, Explanation,
    Polarity, RiskLevel,
};
