//! Markdown and JSON report generation.
//!
//! This module renders analysis results for people (Markdown) and for
//! pipelines (JSON).

use crate::analysis::{group_by_polarity, group_by_source, summarize};
use crate::error::AnalysisError;
use crate::models::{AnalysisResult, ComponentScore, Explanation, Polarity};
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

/// Outcome of analyzing one URL, as shown in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UrlReport {
    Analyzed {
        result: AnalysisResult,
        recommendation: String,
    },
    Failed {
        url: String,
        error: String,
    },
}

impl UrlReport {
    pub fn from_outcome(url: &str, outcome: Result<AnalysisResult, AnalysisError>) -> Self {
        match outcome {
            Ok(result) => UrlReport::Analyzed {
                recommendation: result.recommendation(),
                result,
            },
            Err(e) => UrlReport::Failed {
                url: url.trim().to_string(),
                error: e.to_string(),
            },
        }
    }
}

/// Generate a complete Markdown report for one or more URLs.
pub fn generate_markdown_report(reports: &[UrlReport]) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# URL Trust Report\n\n");
    output.push_str(&format!(
        "- **Generated:** {}\n- **URLs:** {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        reports.len()
    ));

    for report in reports {
        match report {
            UrlReport::Analyzed { result, .. } => output.push_str(&generate_result_section(result)),
            UrlReport::Failed { url, error } => output.push_str(&generate_failure_section(url, error)),
        }
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the section for one analyzed URL.
pub fn generate_result_section(result: &AnalysisResult) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", result.url));
    section.push_str(&generate_verdict_table(result));

    if !result.component_scores.is_empty() {
        section.push_str(&generate_component_table(result));
    }

    section.push_str(&generate_explanations_section(&result.explanations));
    section.push_str(&generate_summary_section(&result.explanations));

    section.push_str("### Recommendation\n\n");
    section.push_str(&format!("> {}\n\n", result.recommendation()));

    section
}

/// Generate the verdict table.
fn generate_verdict_table(result: &AnalysisResult) -> String {
    let mut table = String::new();

    table.push_str("| Trust Score | Risk Level | Confidence | Components | Duration |\n");
    table.push_str("|:---:|:---:|:---:|:---:|:---:|\n");

    let components = if result.allowlisted {
        "allowlisted".to_string()
    } else {
        format!("{}/{}", result.status.successful, result.status.total)
    };
    table.push_str(&format!(
        "| **{}/100** | {} {} | {}% | {} | {:.1}s |\n\n",
        result.trust_score,
        result.risk_level.emoji(),
        result.risk_level,
        result.confidence,
        components,
        result.analysis_time_seconds
    ));

    if result.partial {
        table.push_str(&format!(
            "*Partial result: {} of {} components contributed.*\n\n",
            result.status.successful, result.status.total
        ));
    }

    table
}

/// Generate the per-component table, failed components included.
fn generate_component_table(result: &AnalysisResult) -> String {
    let mut table = String::new();

    table.push_str("### Components\n\n");
    table.push_str("| Component | Score | Weight | Status |\n");
    table.push_str("|:---|:---:|:---:|:---|\n");

    for (component, score) in &result.component_scores {
        let weight = result
            .weights_used
            .get(component)
            .map(|w| format!("{:.2}", w))
            .unwrap_or_else(|| "-".to_string());

        let status = match score {
            ComponentScore::Score(_) => "✅ ok".to_string(),
            ComponentScore::Error => {
                let reason = result
                    .status
                    .failed_components
                    .iter()
                    .find(|(c, _)| c == component)
                    .map(|(_, reason)| reason.as_str())
                    .unwrap_or("failed");
                format!("❌ {}", reason)
            }
        };

        table.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            component.label(),
            score,
            weight,
            status
        ));
    }
    table.push('\n');

    table
}

/// Generate the explanations section, grouped by polarity.
fn generate_explanations_section(explanations: &[Explanation]) -> String {
    let mut section = String::new();

    section.push_str("### Findings\n\n");

    if explanations.is_empty() {
        section.push_str("No findings were reported.\n\n");
        return section;
    }

    let groups = group_by_polarity(explanations);
    for (heading, entries) in [
        ("Concerns", &groups.negative),
        ("Positive Signals", &groups.positive),
        ("Notes", &groups.neutral),
    ] {
        if entries.is_empty() {
            continue;
        }
        section.push_str(&format!("#### {}\n\n", heading));
        for explanation in entries {
            section.push_str(&generate_explanation_line(explanation));
        }
        section.push('\n');
    }

    section
}

/// Generate a single explanation bullet.
fn generate_explanation_line(explanation: &Explanation) -> String {
    let points = match explanation.polarity {
        Polarity::Neutral => String::new(),
        _ => format!(" ({:+})", explanation.signed_points()),
    };
    let mut line = format!(
        "- {} **{}**{}",
        explanation.polarity.emoji(),
        explanation.description,
        points
    );
    if !explanation.source_component.is_empty() {
        line.push_str(&format!(" `{}`", explanation.source_component));
    }
    if !explanation.evidence.is_empty() {
        line.push_str(&format!(" - {}", explanation.evidence));
    }
    line.push('\n');
    line
}

/// Generate the point totals and headline concerns.
fn generate_summary_section(explanations: &[Explanation]) -> String {
    if explanations.is_empty() {
        return String::new();
    }

    let summary = summarize(explanations);
    let mut section = String::new();

    section.push_str("### Summary\n\n");
    section.push_str(&format!(
        "- **Negative points:** {}\n- **Positive points:** {}\n",
        summary.total_negative_points, summary.total_positive_points
    ));
    let per_source: Vec<String> = group_by_source(explanations)
        .iter()
        .map(|(source, entries)| format!("{} {}", source, entries.len()))
        .collect();
    section.push_str(&format!("- **Findings by component:** {}\n", per_source.join(", ")));
    if let Some(component) = summary.most_problematic {
        section.push_str(&format!("- **Most concerns from:** {}\n", component.label()));
    }
    if !summary.top_concerns.is_empty() {
        let top: Vec<&str> = summary
            .top_concerns
            .iter()
            .map(|e| e.description.as_str())
            .collect();
        section.push_str(&format!("- **Top concerns:** {}\n", top.join("; ")));
    }
    section.push('\n');

    section
}

/// Generate the section for a URL that could not be scored.
fn generate_failure_section(url: &str, error: &str) -> String {
    format!("## {}\n\n❌ **Not analyzed:** {}\n\n", url, error)
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by urltrust v{}. Scores are heuristic and do not guarantee safety.*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(reports: &[UrlReport]) -> Result<String> {
    serde_json::to_string_pretty(reports).map_err(Into::into)
}
