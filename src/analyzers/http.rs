//! Request-scoped page fetching for the built-in analyzers.
//!
//! A fresh client is built for every fetch so concurrent analyses never
//! share a connection pool.

use crate::config::HttpConfig;
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// What the analyzers need to know about a fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// URL after following redirects.
    pub final_url: Url,
    /// Final HTTP status code.
    pub status: u16,
    /// Header names lowercased; repeated headers are joined with ", ".
    pub headers: BTreeMap<String, String>,
    /// Body decoded lossily, truncated to the configured size.
    pub body: String,
}

impl FetchedPage {
    /// Header value by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// True when redirects moved the page to another host.
    pub fn redirected_off_host(&self, original: &Url) -> bool {
        match (original.host_str(), self.final_url.host_str()) {
            (Some(a), Some(b)) => !a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

/// What a caller needs from a fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Read (up to the size cap) and decode the body.
    pub read_body: bool,
    /// Return 4xx/5xx responses as pages instead of errors.
    pub allow_error_status: bool,
}

/// Fetch `url`, following at most `max_redirects` redirects.
///
/// Non-success statuses are errors unless `allow_error_status` is set.
pub async fn fetch(url: &Url, settings: &HttpConfig, options: FetchOptions) -> Result<FetchedPage> {
    let client = reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(settings.request_timeout_seconds))
        .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
        .build()
        .context("Failed to create HTTP client")?;

    let mut response = client.get(url.as_str()).send().await.map_err(|e| {
        if e.is_timeout() {
            anyhow::anyhow!("request timed out after {}s", settings.request_timeout_seconds)
        } else if e.is_connect() {
            anyhow::anyhow!("cannot connect to {}", url.host_str().unwrap_or("host"))
        } else if e.is_redirect() {
            anyhow::anyhow!("too many redirects (limit {})", settings.max_redirects)
        } else {
            anyhow::anyhow!("request failed: {}", e)
        }
    })?;

    let status = response.status();
    if !status.is_success() && !options.allow_error_status {
        bail!("HTTP status {}", status.as_u16());
    }

    let final_url = response.url().clone();
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in response.headers() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    let mut raw: Vec<u8> = Vec::new();
    if options.read_body {
        while let Some(chunk) = response.chunk().await.context("Failed to read response body")? {
            let remaining = settings.max_content_bytes.saturating_sub(raw.len());
            if chunk.len() >= remaining {
                raw.extend_from_slice(&chunk[..remaining]);
                debug!("Body of {} truncated at {} bytes", url, settings.max_content_bytes);
                break;
            }
            raw.extend_from_slice(&chunk);
        }
    }

    Ok(FetchedPage {
        final_url,
        status: status.as_u16(),
        headers,
        body: String::from_utf8_lossy(&raw).into_owned(),
    })
}

#[cfg(test)]
pub(crate) fn page_with_status(status: u16, final_url: &str) -> FetchedPage {
    FetchedPage {
        status,
        ..page(final_url, &[], "")
    }
}

#[cfg(test)]
pub(crate) fn page(final_url: &str, headers: &[(&str, &str)], body: &str) -> FetchedPage {
    FetchedPage {
        final_url: Url::parse(final_url).unwrap(),
        status: 200,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_string()))
            .collect(),
        body: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup() {
        let fetched = page(
            "https://example.com/",
            &[("Strict-Transport-Security", "max-age=31536000")],
            "",
        );
        assert_eq!(fetched.header("strict-transport-security"), Some("max-age=31536000"));
        assert_eq!(fetched.header("content-security-policy"), None);
    }

    #[test]
    fn test_redirected_off_host() {
        let original = Url::parse("https://example.com/").unwrap();
        assert!(!page("https://EXAMPLE.com/home", &[], "").redirected_off_host(&original));
        assert!(page("https://evil.example.net/", &[], "").redirected_off_host(&original));
    }
}
