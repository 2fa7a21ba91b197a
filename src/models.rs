//! Data models for URL trust analysis.
//!
//! This module contains the core data structures shared by the analyzers,
//! the detector and the report generator.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// One independent analyzer in the ensemble.
///
/// The declaration order is the configured component order; it drives
/// dispatch order and the order explanations are merged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Domain registration and structure checks.
    Domain,
    /// Page content patterns.
    Content,
    /// TLS and header configuration.
    Technical,
    /// Logo / brand similarity.
    Visual,
}

impl Component {
    /// All components in configured order.
    pub const ALL: [Component; 4] = [
        Component::Domain,
        Component::Content,
        Component::Technical,
        Component::Visual,
    ];

    /// Short machine name, used as `source_component` on explanations.
    pub fn name(&self) -> &'static str {
        match self {
            Component::Domain => "domain",
            Component::Content => "content",
            Component::Technical => "technical",
            Component::Visual => "visual",
        }
    }

    /// Human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Component::Domain => "Domain Analysis",
            Component::Content => "Content Analysis",
            Component::Technical => "Technical Analysis",
            Component::Visual => "Visual Analysis",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "domain" => Ok(Component::Domain),
            "content" => Ok(Component::Content),
            "technical" => Ok(Component::Technical),
            "visual" => Ok(Component::Visual),
            other => Err(format!("unknown component: {}", other)),
        }
    }
}

/// Direction of a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Evidence in favor of trusting the URL.
    Positive,
    /// Evidence against trusting the URL.
    Negative,
    /// Informational only.
    Neutral,
}

impl Polarity {
    /// Returns an emoji representation of the polarity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Polarity::Positive => "✅",
            Polarity::Negative => "⚠️",
            Polarity::Neutral => "ℹ️",
        }
    }
}

/// One piece of human-readable evidence backing a component's score.
///
/// `points` is always a magnitude; the direction lives in `polarity` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub polarity: Polarity,
    pub description: String,
    pub points: u32,
    pub evidence: String,
    /// Name of the component (or `allowlist`) that produced this explanation.
    /// Analyzers leave it empty; the adapter stamps it.
    #[serde(default)]
    pub source_component: String,
}

impl Explanation {
    pub fn positive(description: impl Into<String>, points: u32, evidence: impl Into<String>) -> Self {
        Self::new(Polarity::Positive, description, points, evidence)
    }

    pub fn negative(description: impl Into<String>, points: u32, evidence: impl Into<String>) -> Self {
        Self::new(Polarity::Negative, description, points, evidence)
    }

    pub fn neutral(description: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self::new(Polarity::Neutral, description, 0, evidence)
    }

    fn new(
        polarity: Polarity,
        description: impl Into<String>,
        points: u32,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            polarity,
            description: description.into(),
            points,
            evidence: evidence.into(),
            source_component: String::new(),
        }
    }

    /// Signed contribution of this explanation (negative evidence subtracts).
    pub fn signed_points(&self) -> i32 {
        let magnitude = i32::try_from(self.points).unwrap_or(i32::MAX);
        match self.polarity {
            Polarity::Positive => magnitude,
            Polarity::Negative => -magnitude,
            Polarity::Neutral => 0,
        }
    }

    /// Returns a copy tagged with the given source.
    pub fn with_source(mut self, source: &str) -> Self {
        self.source_component = source.to_string();
        self
    }
}

/// Outcome of one analyzer invocation, produced by the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub component_name: Component,
    /// Raw component score; meaningless (zero) when the component failed.
    pub score: i32,
    pub explanations: Vec<Explanation>,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentResult {
    /// Creates a successful result.
    pub fn success(component: Component, score: i32, explanations: Vec<Explanation>) -> Self {
        Self {
            component_name: component,
            score,
            explanations,
            succeeded: true,
            error: None,
        }
    }

    /// Creates a failed result.
    pub fn failed(component: Component, error: String) -> Self {
        Self {
            component_name: component,
            score: 0,
            explanations: Vec::new(),
            succeeded: false,
            error: Some(error),
        }
    }
}

/// Per-component score as reported on the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentScore {
    Score(i32),
    Error,
}

impl Serialize for ComponentScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ComponentScore::Score(score) => serializer.serialize_i32(*score),
            ComponentScore::Error => serializer.serialize_str("error"),
        }
    }
}

impl fmt::Display for ComponentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentScore::Score(score) => write!(f, "{:+}", score),
            ComponentScore::Error => write!(f, "error"),
        }
    }
}

/// Risk classification derived from the trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl RiskLevel {
    /// Returns an emoji representation of the risk level.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🟠",
            RiskLevel::Critical => "🔴",
        }
    }
}

/// Which components contributed to a result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AnalysisStatus {
    /// Number of components that succeeded.
    pub successful: usize,
    /// Number of components that were attempted.
    pub total: usize,
    /// Components that were attempted but did not contribute, with the reason.
    pub failed_components: Vec<(Component, String)>,
}

/// The verdict for one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// The validated URL that was analyzed.
    pub url: String,
    pub trust_score: u8,
    pub risk_level: RiskLevel,
    pub confidence: u8,
    /// Exactly one entry per attempted component.
    pub component_scores: BTreeMap<Component, ComponentScore>,
    /// Renormalized weights actually used for the combination.
    pub weights_used: BTreeMap<Component, f64>,
    /// Evidence in configured component order.
    pub explanations: Vec<Explanation>,
    pub partial: bool,
    pub status: AnalysisStatus,
    /// True when analysis was bypassed because the host is allowlisted.
    pub allowlisted: bool,
    pub analysis_time_seconds: f64,
}

impl AnalysisResult {
    /// User-facing advice derived from the risk level and confidence.
    pub fn recommendation(&self) -> String {
        let partial_note = if self.partial {
            format!(
                " (based on {}/{} components)",
                self.status.successful, self.status.total
            )
        } else {
            String::new()
        };

        match self.risk_level {
            RiskLevel::Low if self.confidence >= 80 => format!(
                "This website appears legitimate{}. Standard internet precautions apply.",
                partial_note
            ),
            RiskLevel::Low => format!(
                "This website appears mostly safe{}, but the evidence was limited. Proceed with normal caution.",
                partial_note
            ),
            RiskLevel::Medium => format!(
                "This website shows some suspicious characteristics{}. Verify it before entering personal information.",
                partial_note
            ),
            RiskLevel::High => format!(
                "This website shows strong indicators of fraud{}. Avoid entering personal or financial information.",
                partial_note
            ),
            RiskLevel::Critical => format!(
                "This website shows critical signs of phishing or scam activity{}. Do not use it.",
                partial_note
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(risk_level: RiskLevel, confidence: u8, partial: bool) -> AnalysisResult {
        AnalysisResult {
            url: "https://example.com".to_string(),
            trust_score: 50,
            risk_level,
            confidence,
            component_scores: BTreeMap::new(),
            weights_used: BTreeMap::new(),
            explanations: vec![],
            partial,
            status: AnalysisStatus {
                successful: 2,
                total: 3,
                failed_components: vec![(Component::Content, "timeout after 30s".to_string())],
            },
            allowlisted: false,
            analysis_time_seconds: 0.0,
        }
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_component_from_str() {
        assert_eq!("domain".parse::<Component>(), Ok(Component::Domain));
        assert_eq!("Visual".parse::<Component>(), Ok(Component::Visual));
        assert!("whois".parse::<Component>().is_err());
    }

    #[test]
    fn test_signed_points() {
        assert_eq!(Explanation::positive("a", 5, "").signed_points(), 5);
        assert_eq!(Explanation::negative("b", 7, "").signed_points(), -7);
        assert_eq!(Explanation::neutral("c", "").signed_points(), 0);
    }

    #[test]
    fn test_component_score_serialization() {
        let mut scores = BTreeMap::new();
        scores.insert(Component::Domain, ComponentScore::Score(-12));
        scores.insert(Component::Content, ComponentScore::Error);

        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"domain":-12,"content":"error"}"#);
    }

    #[test]
    fn test_recommendation_mentions_partial_coverage() {
        let result = sample_result(RiskLevel::Medium, 50, true);
        assert!(result.recommendation().contains("based on 2/3 components"));

        let full = sample_result(RiskLevel::Medium, 50, false);
        assert!(!full.recommendation().contains("based on"));
    }

    #[test]
    fn test_recommendation_low_risk_depends_on_confidence() {
        let confident = sample_result(RiskLevel::Low, 85, false);
        assert!(confident.recommendation().contains("appears legitimate"));

        let hesitant = sample_result(RiskLevel::Low, 40, false);
        assert!(hesitant.recommendation().contains("mostly safe"));
    }
}
