//! Known-good hosts that bypass analysis.

use crate::config::AllowlistConfig;
use url::Url;

/// Normalized set of allowlisted domains.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    domains: Vec<String>,
}

impl Allowlist {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut domains: Vec<String> = domains
            .into_iter()
            .map(|d| normalize(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        domains.sort();
        domains.dedup();
        Self { domains }
    }

    pub fn from_config(config: &AllowlistConfig) -> Self {
        Self::new(&config.domains)
    }

    /// The allowlisted domain covering `url`'s host, if any.
    pub fn matching(&self, url: &Url) -> Option<&str> {
        let host = normalize(url.host_str()?);
        self.domains
            .iter()
            .find(|domain| {
                host == **domain
                    || host
                        .strip_suffix(domain.as_str())
                        .map_or(false, |prefix| prefix.ends_with('.'))
            })
            .map(String::as_str)
    }
}

fn normalize(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}
