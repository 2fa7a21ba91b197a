//! Analyzer contract and the built-in heuristic analyzers.
//!
//! Every analyzer takes a URL and returns a score with the evidence behind
//! it, or fails. The detector only depends on this contract; the adapter
//! wraps each call with a timeout and failure containment.

pub mod adapter;
pub mod content;
pub mod domain;
pub mod http;
pub mod technical;

use crate::config::Config;
use crate::models::{Component, Explanation};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

pub use adapter::run_analyzer;
pub use content::ContentAnalyzer;
pub use domain::DomainAnalyzer;
pub use technical::TechnicalAnalyzer;

/// Score and evidence returned by one analyzer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzerOutput {
    /// Unbounded; conventionally within -60..=60.
    pub score: i32,
    pub explanations: Vec<Explanation>,
}

impl AnalyzerOutput {
    pub fn new(score: i32, explanations: Vec<Explanation>) -> Self {
        Self {
            score,
            explanations,
        }
    }

    /// Score each explanation by its signed points.
    pub fn from_explanations(explanations: Vec<Explanation>) -> Self {
        let score = explanations
            .iter()
            .fold(0i32, |acc, e| acc.saturating_add(e.signed_points()));
        Self {
            score,
            explanations,
        }
    }
}

/// One independent heuristic check.
///
/// Implementations must not share mutable state between invocations; the
/// detector calls them concurrently.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// The component this analyzer implements.
    fn component(&self) -> Component;

    /// Analyze a validated http(s) URL.
    async fn analyze(&self, url: &Url) -> Result<AnalyzerOutput>;
}

/// The analyzers shipped with the crate. There is no built-in visual
/// analyzer, so that component is unavailable unless one is registered.
pub fn builtin_analyzers(config: &Config) -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(DomainAnalyzer::new()),
        Arc::new(ContentAnalyzer::new(config.http.clone())),
        Arc::new(TechnicalAnalyzer::new(config.http.clone())),
    ]
}
