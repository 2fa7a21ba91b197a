//! Transport and URL-shape checks.

use crate::analyzers::http::{fetch, FetchOptions, FetchedPage};
use crate::analyzers::{Analyzer, AnalyzerOutput};
use crate::config::HttpConfig;
use crate::models::{Component, Explanation};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

const SECURITY_HEADERS: &[&str] = &[
    "strict-transport-security",
    "content-security-policy",
    "x-frame-options",
    "x-content-type-options",
];

/// Inspects the URL itself and the response it produces.
#[derive(Debug, Clone)]
pub struct TechnicalAnalyzer {
    http: HttpConfig,
}

impl TechnicalAnalyzer {
    pub fn new(http: HttpConfig) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Analyzer for TechnicalAnalyzer {
    fn component(&self) -> Component {
        Component::Technical
    }

    async fn analyze(&self, url: &Url) -> Result<AnalyzerOutput> {
        let mut explanations = inspect_url(url);

        let options = FetchOptions {
            allow_error_status: true,
            ..FetchOptions::default()
        };
        match fetch(url, &self.http, options).await {
            Ok(page) => explanations.extend(inspect_response(url, &page)),
            Err(e) => {
                debug!("Technical fetch of {} failed: {:#}", url, e);
                explanations.push(request_failed(&e));
            }
        }

        Ok(AnalyzerOutput::from_explanations(explanations))
    }
}

/// Rules that need only the URL.
pub fn inspect_url(url: &Url) -> Vec<Explanation> {
    let mut explanations = Vec::new();

    if url.scheme() == "https" {
        explanations.push(Explanation::positive(
            "Uses HTTPS encryption",
            8,
            "Secure connection",
        ));
    } else {
        explanations.push(Explanation::negative(
            "No HTTPS encryption",
            15,
            "Data sent in plain text",
        ));
    }

    // `Url::port` is None when the port is the scheme default
    if let Some(port) = url.port() {
        explanations.push(Explanation::negative(
            format!("Uses non-standard port {}", port),
            6,
            url.as_str(),
        ));
    }

    if !url.username().is_empty() || url.password().is_some() {
        explanations.push(Explanation::negative(
            "Credentials embedded in the URL",
            20,
            "user@host form can disguise the real destination",
        ));
    }

    explanations
}

/// A failed request is evidence too; the URL-only findings still stand.
pub fn request_failed(error: &anyhow::Error) -> Explanation {
    let reason: String = format!("{:#}", error).chars().take(80).collect();
    Explanation::negative("HTTP request failed", 3, reason)
}

/// Rules over the response status, headers and redirect chain.
pub fn inspect_response(url: &Url, page: &FetchedPage) -> Vec<Explanation> {
    let mut explanations = Vec::new();

    if page.status >= 400 {
        explanations.push(Explanation::negative(
            "Server responded with an error status",
            3,
            format!("HTTP {}", page.status),
        ));
    }

    let present: Vec<&str> = SECURITY_HEADERS
        .iter()
        .copied()
        .filter(|name| page.header(name).is_some())
        .collect();
    match present.len() {
        0 => explanations.push(Explanation::negative(
            "No security headers",
            3,
            "None of HSTS, CSP, X-Frame-Options, X-Content-Type-Options",
        )),
        n if n >= 3 => explanations.push(Explanation::positive(
            format!("Good security headers ({}/{})", n, SECURITY_HEADERS.len()),
            4,
            present.join(", "),
        )),
        n => explanations.push(Explanation::positive(
            format!("Some security headers ({}/{})", n, SECURITY_HEADERS.len()),
            2,
            present.join(", "),
        )),
    }

    if page.redirected_off_host(url) {
        explanations.push(Explanation::negative(
            "Redirects to a different host",
            6,
            format!("Ended at {}", page.final_url),
        ));
    }

    if url.scheme() == "https" && page.final_url.scheme() == "http" {
        explanations.push(Explanation::negative(
            "Redirect downgrades HTTPS to HTTP",
            10,
            format!("Ended at {}", page.final_url),
        ));
    }

    explanations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::http::{page, page_with_status};

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_https_url() {
        let explanations = inspect_url(&url("https://example.com/"));
        assert_eq!(explanations.len(), 1);
        assert_eq!(explanations[0].signed_points(), 8);
    }

    #[test]
    fn test_plain_http_with_port_and_credentials() {
        let explanations = inspect_url(&url("http://admin:pw@example.com:8080/"));
        let total: i32 = explanations.iter().map(Explanation::signed_points).sum();
        assert_eq!(explanations.len(), 3);
        assert_eq!(total, -41);
    }

    #[test]
    fn test_default_port_is_not_flagged() {
        let explanations = inspect_url(&url("https://example.com:443/"));
        assert!(!explanations.iter().any(|e| e.description.contains("port")));
    }

    #[test]
    fn test_security_headers() {
        let original = url("https://example.com/");

        let bare = inspect_response(&original, &page("https://example.com/", &[], ""));
        assert_eq!(bare[0].signed_points(), -3);

        let some = inspect_response(
            &original,
            &page("https://example.com/", &[("X-Frame-Options", "DENY")], ""),
        );
        assert_eq!(some[0].signed_points(), 2);

        let good = inspect_response(
            &original,
            &page(
                "https://example.com/",
                &[
                    ("Strict-Transport-Security", "max-age=63072000"),
                    ("Content-Security-Policy", "default-src 'self'"),
                    ("X-Content-Type-Options", "nosniff"),
                ],
                "",
            ),
        );
        assert_eq!(good[0].signed_points(), 4);
        assert_eq!(good.len(), 1);
    }

    #[test]
    fn test_error_status_is_inspected() {
        let explanations = inspect_response(
            &url("https://example.com/"),
            &page_with_status(404, "https://example.com/"),
        );
        let descriptions: Vec<_> = explanations.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["Server responded with an error status", "No security headers"]
        );
        assert_eq!(explanations[0].evidence, "HTTP 404");
    }

    #[tokio::test]
    async fn test_unreachable_host_keeps_url_findings() {
        let analyzer = TechnicalAnalyzer::new(HttpConfig {
            request_timeout_seconds: 2,
            ..HttpConfig::default()
        });

        let output = analyzer
            .analyze(&url("http://admin:pw@127.0.0.1:1/"))
            .await
            .unwrap();
        let descriptions: Vec<_> = output
            .explanations
            .iter()
            .map(|e| e.description.as_str())
            .collect();

        assert_eq!(
            descriptions,
            vec![
                "No HTTPS encryption",
                "Uses non-standard port 1",
                "Credentials embedded in the URL",
                "HTTP request failed",
            ]
        );
        assert_eq!(output.score, -15 - 6 - 20 - 3);
    }

    #[test]
    fn test_redirect_off_host_and_downgrade() {
        let explanations = inspect_response(
            &url("https://example.com/"),
            &page("http://landing.example.net/", &[], ""),
        );
        let descriptions: Vec<_> = explanations.iter().map(|e| e.description.as_str()).collect();
        assert!(descriptions.contains(&"Redirects to a different host"));
        assert!(descriptions.contains(&"Redirect downgrades HTTPS to HTTP"));
    }
}
