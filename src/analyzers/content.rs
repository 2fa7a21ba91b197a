//! Page content checks: wording, forms, and brand impersonation.

use crate::analyzers::http::{fetch, FetchOptions, FetchedPage};
use crate::analyzers::{Analyzer, AnalyzerOutput};
use crate::config::HttpConfig;
use crate::models::{Component, Explanation};
use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// A named phrase and the pattern that finds it.
struct Keyword {
    label: &'static str,
    pattern: Regex,
}

/// Builds case-insensitive, whole-word patterns from `(label, alternation)` pairs.
fn keyword_table(entries: &[(&'static str, &str)]) -> Vec<Keyword> {
    entries
        .iter()
        .map(|(label, body)| Keyword {
            label: *label,
            pattern: Regex::new(&format!(r"(?i)\b(?:{})\b", body)).unwrap(),
        })
        .collect()
}

static URGENCY_KEYWORDS: Lazy<Vec<Keyword>> = Lazy::new(|| {
    keyword_table(&[
        ("urgent", r"urgent(?:ly)?"),
        ("immediate", r"immediate(?:ly)?"),
        ("expire", r"expir(?:e|es|ed|ing)"),
        ("suspend", r"suspend(?:ed|s)?"),
        ("verify now", r"verify\s+now"),
        ("act now", r"act\s+now"),
        ("limited time", r"limited\s+time"),
        ("click here", r"click\s+here"),
        ("confirm identity", r"confirm\s+(?:your\s+)?identity"),
        ("update payment", r"update\s+(?:your\s+)?payment"),
        ("security alert", r"security\s+alert"),
        ("account locked", r"account\s+(?:is\s+|has\s+been\s+)?locked"),
        ("within 24 hours", r"within\s+24\s+hours"),
    ])
});

static FINANCIAL_KEYWORDS: Lazy<Vec<Keyword>> = Lazy::new(|| {
    keyword_table(&[
        ("credit card", r"credit\s+card"),
        ("social security", r"social\s+security"),
        ("bank account", r"bank\s+account"),
        ("routing number", r"routing\s+number"),
        ("pin number", r"pin\s+number"),
        ("cvv", r"cvv2?"),
        ("billing information", r"billing\s+information"),
        ("payment method", r"payment\s+method"),
        ("wire transfer", r"wire\s+transfer"),
        ("bitcoin", r"bitcoin"),
    ])
});

static THREAT_KEYWORDS: Lazy<Vec<Keyword>> = Lazy::new(|| {
    keyword_table(&[
        ("account will be closed", r"account\s+will\s+be\s+closed"),
        ("legal action", r"legal\s+action"),
        ("arrest", r"arrest(?:ed)?"),
        ("penalty", r"penalt(?:y|ies)"),
        ("pay a fine", r"pay\s+a\s+fine"),
        ("lawsuit", r"lawsuit"),
        ("permanently deleted", r"permanently\s+deleted"),
    ])
});

/// Brand name and the domains that legitimately carry it.
struct Brand {
    name: &'static str,
    pattern: Regex,
    domains: &'static [&'static str],
}

static BRANDS: Lazy<Vec<Brand>> = Lazy::new(|| {
    let brands: [(&'static str, &'static [&'static str]); 7] = [
        ("paypal", &["paypal.com"]),
        ("amazon", &["amazon.com", "amazon.co.uk", "amazon.de"]),
        ("microsoft", &["microsoft.com", "live.com", "office.com"]),
        ("apple", &["apple.com", "icloud.com"]),
        ("google", &["google.com", "gmail.com"]),
        ("facebook", &["facebook.com", "fb.com"]),
        ("netflix", &["netflix.com"]),
    ];
    brands
        .into_iter()
        .map(|(name, domains)| Brand {
            name,
            pattern: Regex::new(&format!(r"(?i)\b{}\b", name)).unwrap(),
            domains,
        })
        .collect()
});

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static PASSWORD_INPUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<input\b[^>]*\btype\s*=\s*["']?password\b"#).unwrap()
});
static INSECURE_FORM_ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<form\b[^>]*\baction\s*=\s*["']?http://"#).unwrap()
});
static NON_VISIBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->").unwrap()
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PRIVACY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bprivacy\b").unwrap());
static CONTACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcontact\b").unwrap());

/// Text shorter than this is treated as a near-empty page.
const MIN_TEXT_LEN: usize = 200;

/// Fetches the page and scores what it says and asks for.
#[derive(Debug, Clone)]
pub struct ContentAnalyzer {
    http: HttpConfig,
}

impl ContentAnalyzer {
    pub fn new(http: HttpConfig) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Analyzer for ContentAnalyzer {
    fn component(&self) -> Component {
        Component::Content
    }

    async fn analyze(&self, url: &Url) -> Result<AnalyzerOutput> {
        let options = FetchOptions {
            read_body: true,
            ..FetchOptions::default()
        };
        let page = fetch(url, &self.http, options).await?;
        Ok(AnalyzerOutput::from_explanations(inspect_page(url, &page)))
    }
}

/// Offline rules over a fetched page.
pub fn inspect_page(url: &Url, page: &FetchedPage) -> Vec<Explanation> {
    let html = page.body.as_str();
    let text = visible_text(html);
    let mut explanations = Vec::new();

    let urgency = matching(&URGENCY_KEYWORDS, &text);
    if !urgency.is_empty() {
        explanations.push(Explanation::negative(
            format!("Urgent language detected ({} phrases)", urgency.len()),
            if urgency.len() > 2 { 10 } else { 5 },
            format!("Found: {}", urgency.join(", ")),
        ));
    }

    let financial = matching(&FINANCIAL_KEYWORDS, &text);
    if !financial.is_empty() {
        explanations.push(Explanation::negative(
            format!("Requests financial information ({} terms)", financial.len()),
            if financial.len() > 2 { 10 } else { 6 },
            format!("Found: {}", financial.join(", ")),
        ));
    }

    let threats = matching(&THREAT_KEYWORDS, &text);
    if !threats.is_empty() {
        explanations.push(Explanation::negative(
            "Threatening language detected",
            15,
            format!("Found: {}", threats.join(", ")),
        ));
    }

    if urgency.is_empty() && financial.is_empty() && threats.is_empty() {
        explanations.push(Explanation::positive(
            "No pressure or threat wording found",
            3,
            "Page text is free of urgency, financial and threat keywords",
        ));
    }

    if PASSWORD_INPUT.is_match(html) {
        if page.final_url.scheme() == "https" {
            explanations.push(Explanation::neutral(
                "Password field served over HTTPS",
                "Login form present",
            ));
        } else {
            explanations.push(Explanation::negative(
                "Password field on an unencrypted page",
                12,
                "Credentials would be sent in plain text",
            ));
        }
    }

    if page.final_url.scheme() == "https" && INSECURE_FORM_ACTION.is_match(html) {
        explanations.push(Explanation::negative(
            "Form submits to an unencrypted address",
            15,
            "form action uses http://",
        ));
    }

    if let Some(host) = url.host_str() {
        let host = host.to_lowercase();
        for brand in BRANDS.iter() {
            if brand.pattern.is_match(&text) && !owns_brand(&host, brand.domains) {
                explanations.push(Explanation::negative(
                    format!("Mentions {} but is not hosted on its domain", brand.name),
                    12,
                    format!("Host: {}", host),
                ));
            }
        }
    }

    if title(html).map_or(true, |t| t.is_empty()) {
        explanations.push(Explanation::negative(
            "Page has no title",
            4,
            "Missing or empty <title>",
        ));
    }

    let text_len = text.chars().count();
    if text_len < MIN_TEXT_LEN {
        explanations.push(Explanation::negative(
            "Very little page content",
            5,
            format!("{} characters of visible text", text_len),
        ));
    }

    if PRIVACY.is_match(&text) && CONTACT.is_match(&text) {
        explanations.push(Explanation::positive(
            "Links to privacy policy and contact information",
            3,
            "Found privacy and contact references",
        ));
    }

    explanations
}

fn matching(keywords: &[Keyword], text: &str) -> Vec<&'static str> {
    keywords
        .iter()
        .filter(|keyword| keyword.pattern.is_match(text))
        .map(|keyword| keyword.label)
        .collect()
}

fn owns_brand(host: &str, domains: &[&str]) -> bool {
    domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

/// Contents of the first `<title>` element, trimmed.
pub fn title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| WHITESPACE.replace_all(m.as_str().trim(), " ").into_owned())
}

/// Text outside of tags, with scripts, styles and comments removed and
/// whitespace collapsed.
pub fn visible_text(html: &str) -> String {
    let without_code = NON_VISIBLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_code, " ");
    WHITESPACE.replace_all(&without_tags, " ").trim().to_string()
}
