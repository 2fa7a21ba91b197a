//! Orchestration of a single URL analysis.
//!
//! The detector validates the input, dispatches every active analyzer
//! concurrently through the adapter, and hands the results to the ensemble
//! combiner and explanation aggregator. It holds no mutable state, so one
//! detector can serve any number of concurrent `analyze` calls.

use crate::allowlist::Allowlist;
use crate::analysis::{merge_explanations, EnsembleCombiner, WeightTable};
use crate::analyzers::{builtin_analyzers, run_analyzer, Analyzer};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::models::{
    AnalysisResult, AnalysisStatus, Component, ComponentResult, ComponentScore, Explanation,
    RiskLevel,
};
use anyhow::Result;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Verdict returned for allowlisted hosts without running any analyzer.
const ALLOWLIST_TRUST_SCORE: u8 = 95;
const ALLOWLIST_CONFIDENCE: u8 = 95;
const ALLOWLIST_POINTS: u32 = 25;

/// Collects analyzers before freezing them into a [`Detector`].
pub struct DetectorBuilder {
    config: Config,
    analyzers: BTreeMap<Component, Arc<dyn Analyzer>>,
}

impl DetectorBuilder {
    /// Register an analyzer. A later registration for the same component
    /// replaces the earlier one.
    pub fn analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzers.insert(analyzer.component(), analyzer);
        self
    }

    /// Validate the configuration and build the detector.
    pub fn build(self) -> Result<Detector> {
        self.config.validate()?;
        let weights = WeightTable::from_config(&self.config)?;
        let enabled = self.config.enabled_components();

        let active: BTreeMap<Component, Arc<dyn Analyzer>> = self
            .analyzers
            .into_iter()
            .filter(|(component, _)| enabled.contains(component))
            .collect();

        for component in enabled.iter().filter(|c| !active.contains_key(*c)) {
            debug!("{} is enabled but no analyzer is registered for it", component);
        }

        Ok(Detector {
            combiner: EnsembleCombiner::new(self.config.scoring.clone(), weights),
            allowlist: Allowlist::from_config(&self.config.allowlist),
            timeouts: self.config.component_timeouts(),
            max_url_length: self.config.input.max_url_length,
            analyzers: active,
        })
    }
}

/// Runs the active analyzers against a URL and combines their verdicts.
pub struct Detector {
    /// Enabled and registered analyzers, in configured order.
    analyzers: BTreeMap<Component, Arc<dyn Analyzer>>,
    combiner: EnsembleCombiner,
    allowlist: Allowlist,
    timeouts: BTreeMap<Component, Duration>,
    max_url_length: usize,
}

impl Detector {
    pub fn builder(config: Config) -> DetectorBuilder {
        DetectorBuilder {
            config,
            analyzers: BTreeMap::new(),
        }
    }

    /// A detector with the built-in domain, content and technical analyzers.
    pub fn with_builtin_analyzers(config: Config) -> Result<Self> {
        let analyzers = builtin_analyzers(&config);
        analyzers
            .into_iter()
            .fold(Self::builder(config), DetectorBuilder::analyzer)
            .build()
    }

    /// Components that will be attempted for every non-allowlisted URL.
    pub fn active_components(&self) -> Vec<Component> {
        self.analyzers.keys().copied().collect()
    }

    /// Analyze one URL.
    ///
    /// Component timeouts and failures are absorbed into the result. Only
    /// invalid input, an empty active set, or the failure of every attempted
    /// component are errors.
    pub async fn analyze(&self, raw_url: &str) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let url = validate_url(raw_url, self.max_url_length)?;

        if let Some(domain) = self.allowlist.matching(&url) {
            info!("{} is allowlisted via {}, skipping analysis", url, domain);
            return Ok(allowlisted_result(&url, domain, started));
        }

        if self.analyzers.is_empty() {
            return Err(AnalysisError::NoComponents);
        }

        let ceiling = self
            .analyzers
            .keys()
            .map(|c| self.timeout(*c))
            .max()
            .unwrap_or_default();
        info!(
            "Analyzing {} with {} components (ceiling {}s)",
            url,
            self.analyzers.len(),
            ceiling.as_secs_f64()
        );

        let results: Vec<ComponentResult> = join_all(self.analyzers.iter().map(
            |(component, analyzer)| {
                run_analyzer(Arc::clone(analyzer), url.clone(), self.timeout(*component))
            },
        ))
        .await;

        let successful = results.iter().filter(|r| r.succeeded).count();
        info!(
            "{}/{} components completed successfully",
            successful,
            results.len()
        );

        let failures: Vec<(Component, String)> = results
            .iter()
            .filter(|r| !r.succeeded)
            .map(|r| {
                (
                    r.component_name,
                    r.error.clone().unwrap_or_else(|| "unknown error".to_string()),
                )
            })
            .collect();

        let verdict = match self.combiner.combine(&results) {
            Some(verdict) => verdict,
            None => {
                warn!("Every component failed for {}", url);
                return Err(AnalysisError::TotalFailure { failures });
            }
        };

        let component_scores = results
            .iter()
            .map(|r| {
                let score = if r.succeeded {
                    ComponentScore::Score(r.score)
                } else {
                    ComponentScore::Error
                };
                (r.component_name, score)
            })
            .collect();

        Ok(AnalysisResult {
            url: url.to_string(),
            trust_score: verdict.trust_score,
            risk_level: verdict.risk_level,
            confidence: verdict.confidence,
            component_scores,
            partial: verdict.is_partial(),
            status: AnalysisStatus {
                successful: verdict.successful,
                total: verdict.total,
                failed_components: failures,
            },
            weights_used: verdict.weights_used,
            explanations: merge_explanations(&results),
            allowlisted: false,
            analysis_time_seconds: started.elapsed().as_secs_f64(),
        })
    }

    fn timeout(&self, component: Component) -> Duration {
        self.timeouts
            .get(&component)
            .copied()
            .unwrap_or(Duration::from_secs(30))
    }
}

/// Check that `raw` is an absolute http(s) URL with a host.
pub fn validate_url(raw: &str, max_length: usize) -> Result<Url, AnalysisError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::InvalidInput("URL is empty".to_string()));
    }
    if trimmed.chars().count() > max_length {
        return Err(AnalysisError::InvalidInput(format!(
            "URL is longer than {} characters",
            max_length
        )));
    }

    let lowered = trimmed.to_ascii_lowercase();
    if !lowered.starts_with("http://") && !lowered.starts_with("https://") {
        return Err(AnalysisError::InvalidInput(
            "only http:// and https:// URLs can be analyzed".to_string(),
        ));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| AnalysisError::InvalidInput(format!("malformed URL: {}", e)))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AnalysisError::InvalidInput("URL has no host".to_string()));
    }

    Ok(url)
}

fn allowlisted_result(url: &Url, domain: &str, started: Instant) -> AnalysisResult {
    AnalysisResult {
        url: url.to_string(),
        trust_score: ALLOWLIST_TRUST_SCORE,
        risk_level: RiskLevel::Low,
        confidence: ALLOWLIST_CONFIDENCE,
        component_scores: BTreeMap::new(),
        weights_used: BTreeMap::new(),
        explanations: vec![Explanation::positive(
            "Domain is on the allowlist",
            ALLOWLIST_POINTS,
            format!("Matched allowlisted domain {}", domain),
        )
        .with_source("allowlist")],
        partial: false,
        status: AnalysisStatus::default(),
        allowlisted: true,
        analysis_time_seconds: started.elapsed().as_secs_f64(),
    }
}
