//! Timeout and failure containment around a single analyzer call.
//!
//! Each call runs on its own tokio task. A timeout aborts the task and any
//! result it would have produced is dropped; an error or panic inside the
//! analyzer becomes a failed `ComponentResult`. Nothing here ever propagates
//! into the caller's control flow.

use crate::analyzers::Analyzer;
use crate::models::ComponentResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Longest error message kept on a failed component.
const MAX_ERROR_LEN: usize = 160;

/// Run one analyzer against one URL within `timeout`.
pub async fn run_analyzer(
    analyzer: Arc<dyn Analyzer>,
    url: Url,
    timeout: Duration,
) -> ComponentResult {
    let component = analyzer.component();
    info!("Starting {} analysis", component);
    let started = Instant::now();

    let mut handle = tokio::spawn(async move { analyzer.analyze(&url).await });

    match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(Ok(output))) => {
            debug!(
                "{} analysis finished in {:.2}s with score {}",
                component,
                started.elapsed().as_secs_f64(),
                output.score
            );
            let explanations = output
                .explanations
                .into_iter()
                .map(|e| e.with_source(component.name()))
                .collect();
            ComponentResult::success(component, output.score, explanations)
        }
        Ok(Ok(Err(e))) => {
            let message = sanitize_error(&format!("{:#}", e));
            warn!("{} analysis failed: {}", component, message);
            ComponentResult::failed(component, message)
        }
        Ok(Err(join_error)) => {
            let message = if join_error.is_panic() {
                "analyzer panicked".to_string()
            } else {
                "analyzer task was cancelled".to_string()
            };
            warn!("{} analysis failed: {}", component, message);
            ComponentResult::failed(component, message)
        }
        Err(_) => {
            handle.abort();
            let message = format!("timeout after {}", format_timeout(timeout));
            warn!("{} analysis {}", component, message);
            ComponentResult::failed(component, message)
        }
    }
}

/// First line only, no control characters, bounded length.
fn sanitize_error(raw: &str) -> String {
    let first_line = raw.lines().next().unwrap_or("").trim();
    let cleaned: String = first_line
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_ERROR_LEN)
        .collect();

    if cleaned.is_empty() {
        "unknown error".to_string()
    } else {
        cleaned
    }
}

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}
