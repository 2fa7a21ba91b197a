//! Domain structure and resolution checks.

use crate::analyzers::{Analyzer, AnalyzerOutput};
use crate::models::{Component, Explanation};
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::{Host, Url};

/// TLDs that show up disproportionately in phishing campaigns.
const HIGH_RISK_TLDS: &[&str] = &[
    "tk", "ml", "ga", "cf", "gq", "pw", "cc", "click", "download", "stream", "racing", "cricket",
    "science", "work", "party", "men", "win", "date", "top", "xyz", "zip", "mov",
];

const TRUSTED_TLDS: &[&str] = &[
    "com", "org", "net", "edu", "gov", "mil", "int", "uk", "de", "fr", "it", "es", "nl", "au",
    "ca", "jp", "kr",
];

const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "secure", "bank", "paypal", "amazon", "microsoft", "google", "apple", "facebook", "login",
    "signin", "verify", "update", "suspended", "security", "alert", "urgent", "confirm",
    "validation", "account", "wallet",
];

/// Scores the host name itself, plus whether it resolves.
#[derive(Debug, Clone, Default)]
pub struct DomainAnalyzer;

impl DomainAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Analyzer for DomainAnalyzer {
    fn component(&self) -> Component {
        Component::Domain
    }

    async fn analyze(&self, url: &Url) -> Result<AnalyzerOutput> {
        let host = url.host().context("URL has no host")?;
        let mut explanations = inspect_host(&host);

        if let Host::Domain(domain) = host {
            let port = url.port_or_known_default().unwrap_or(443);
            explanations.push(match tokio::net::lookup_host((domain, port)).await {
                Ok(addrs) => {
                    let count = addrs.count();
                    Explanation::positive(
                        "Domain resolves in DNS",
                        3,
                        format!("{} address{}", count, if count == 1 { "" } else { "es" }),
                    )
                }
                Err(e) => Explanation::negative("Domain does not resolve", 8, e.to_string()),
            });
        }

        Ok(AnalyzerOutput::from_explanations(explanations))
    }
}

/// Offline rules over the host name.
pub fn inspect_host(host: &Host<&str>) -> Vec<Explanation> {
    let domain = match host {
        Host::Domain(domain) => domain.trim_end_matches('.').to_lowercase(),
        Host::Ipv4(ip) => {
            return vec![Explanation::negative(
                "Uses a raw IP address instead of a domain name",
                20,
                ip.to_string(),
            )]
        }
        Host::Ipv6(ip) => {
            return vec![Explanation::negative(
                "Uses a raw IP address instead of a domain name",
                20,
                ip.to_string(),
            )]
        }
    };

    let mut explanations = Vec::new();
    let evidence = format!("Domain: {}", domain);
    let labels: Vec<&str> = domain.split('.').collect();

    let length = domain.len();
    if length > 30 {
        explanations.push(Explanation::negative(
            format!("Very long domain name ({} characters)", length),
            10,
            &evidence,
        ));
    } else if length > 20 {
        explanations.push(Explanation::negative(
            format!("Long domain name ({} characters)", length),
            5,
            &evidence,
        ));
    }

    let hyphens = domain.matches('-').count();
    if hyphens > 2 {
        explanations.push(Explanation::negative(
            format!("Multiple hyphens in domain ({} hyphens)", hyphens),
            8,
            &evidence,
        ));
    } else if hyphens > 0 {
        explanations.push(Explanation::negative(
            format!(
                "Contains hyphens ({} hyphen{})",
                hyphens,
                if hyphens > 1 { "s" } else { "" }
            ),
            3,
            &evidence,
        ));
    }

    let digits = domain.chars().filter(|c| c.is_ascii_digit()).count();
    if digits > 3 {
        explanations.push(Explanation::negative(
            format!("Many digits in domain ({} digits)", digits),
            6,
            &evidence,
        ));
    }

    if labels.iter().any(|label| label.starts_with("xn--")) {
        explanations.push(Explanation::negative(
            "Internationalized (punycode) domain can hide look-alike characters",
            12,
            &evidence,
        ));
    }

    let keywords: Vec<&str> = SUSPICIOUS_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| domain.contains(keyword))
        .collect();
    if !keywords.is_empty() {
        explanations.push(Explanation::negative(
            format!("Contains suspicious keywords: {}", keywords.join(", ")),
            if keywords.len() > 1 { 10 } else { 5 },
            &evidence,
        ));
    }

    if let Some(tld) = labels.last().filter(|_| labels.len() >= 2) {
        if HIGH_RISK_TLDS.contains(tld) {
            explanations.push(Explanation::negative(
                format!("Uses high-risk TLD (.{})", tld),
                15,
                &evidence,
            ));
        } else if TRUSTED_TLDS.contains(tld) {
            explanations.push(Explanation::positive(
                format!("Uses established TLD (.{})", tld),
                5,
                &evidence,
            ));
        } else {
            explanations.push(Explanation::neutral(
                format!("Uses uncommon TLD (.{})", tld),
                &evidence,
            ));
        }
    }

    // Labels left of the registrable name (approximated as the last two labels)
    let subdomains = &labels[..labels.len().saturating_sub(2)];
    let depth = subdomains.iter().filter(|l| **l != "www").count();
    if depth > 3 {
        explanations.push(Explanation::negative(
            format!("Many subdomain levels ({} levels)", depth),
            10,
            &evidence,
        ));
    } else if depth >= 1 {
        let suspicious: Vec<&str> = subdomains
            .iter()
            .copied()
            .filter(|label| SUSPICIOUS_KEYWORDS.iter().any(|k| label.contains(k)))
            .collect();
        if !suspicious.is_empty() {
            explanations.push(Explanation::negative(
                format!("Suspicious subdomains: {}", suspicious.join(", ")),
                8,
                &evidence,
            ));
        }
    }

    explanations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspect(url: &str) -> Vec<Explanation> {
        let url = Url::parse(url).unwrap();
        inspect_host(&url.host().unwrap())
    }

    fn descriptions(explanations: &[Explanation]) -> Vec<String> {
        explanations.iter().map(|e| e.description.clone()).collect()
    }

    #[test]
    fn test_plain_domain_is_clean() {
        let explanations = inspect("https://example.com/");
        assert_eq!(descriptions(&explanations), vec!["Uses established TLD (.com)"]);
        assert_eq!(AnalyzerOutput::from_explanations(explanations).score, 5);
    }

    #[test]
    fn test_phishing_shaped_domain() {
        let explanations = inspect("http://secure-login-verify-account.tk/");
        let found = descriptions(&explanations);

        assert!(found.iter().any(|d| d == "Long domain name (30 characters)"));
        assert!(found.iter().any(|d| d == "Multiple hyphens in domain (3 hyphens)"));
        assert!(found.iter().any(|d| d.starts_with("Contains suspicious keywords")));
        assert!(found.iter().any(|d| d == "Uses high-risk TLD (.tk)"));
        assert!(AnalyzerOutput::from_explanations(explanations).score <= -35);
    }

    #[test]
    fn test_ip_literal() {
        let explanations = inspect("http://192.168.10.4/login");
        assert_eq!(explanations.len(), 1);
        assert_eq!(explanations[0].points, 20);
        assert_eq!(explanations[0].evidence, "192.168.10.4");
    }

    #[test]
    fn test_suspicious_subdomain() {
        let found = descriptions(&inspect("https://paypal.verify.example.com/"));
        assert!(found.iter().any(|d| d == "Suspicious subdomains: paypal, verify"));
    }

    #[test]
    fn test_deep_subdomains() {
        let found = descriptions(&inspect("https://a.b.c.d.example.org/"));
        assert!(found.iter().any(|d| d == "Many subdomain levels (4 levels)"));
    }

    #[test]
    fn test_www_is_not_a_subdomain_signal() {
        let found = descriptions(&inspect("https://www.example.org/"));
        assert!(!found.iter().any(|d| d.contains("subdomain")));
    }

    #[test]
    fn test_punycode() {
        let found = descriptions(&inspect("https://xn--pypal-4ve.com/"));
        assert!(found.iter().any(|d| d.contains("punycode")));
    }
}
