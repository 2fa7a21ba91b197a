//! Error types surfaced by [`Detector::analyze`](crate::Detector::analyze).
//!
//! Component-level timeouts and analyzer errors never appear here; they are
//! absorbed into failed [`ComponentResult`](crate::models::ComponentResult)s.

use crate::models::Component;
use thiserror::Error;

/// Outcomes of `analyze` that are not a trust score.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The input is not an analyzable http(s) URL. No analyzer was run.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No component is both enabled and available.
    #[error("no analysis components are enabled")]
    NoComponents,

    /// Every attempted component failed, so nothing can be said about the URL.
    #[error("all {} analysis components failed: {}", .failures.len(), describe_failures(.failures))]
    TotalFailure { failures: Vec<(Component, String)> },
}

impl AnalysisError {
    /// True for the "could not analyze" outcomes, as opposed to bad input.
    pub fn is_total_failure(&self) -> bool {
        matches!(
            self,
            AnalysisError::NoComponents | AnalysisError::TotalFailure { .. }
        )
    }
}

fn describe_failures(failures: &[(Component, String)]) -> String {
    failures
        .iter()
        .map(|(component, reason)| format!("{} ({})", component, reason))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_failure_message_lists_components() {
        let err = AnalysisError::TotalFailure {
            failures: vec![
                (Component::Domain, "timeout after 15s".to_string()),
                (Component::Content, "connection refused".to_string()),
            ],
        };

        let message = err.to_string();
        assert!(message.contains("all 2 analysis components failed"));
        assert!(message.contains("domain (timeout after 15s)"));
        assert!(message.contains("content (connection refused)"));
        assert!(err.is_total_failure());
    }

    #[test]
    fn test_invalid_input_is_not_total_failure() {
        let err = AnalysisError::InvalidInput("empty URL".to_string());
        assert!(!err.is_total_failure());
        assert_eq!(err.to_string(), "invalid input: empty URL");
    }
}
