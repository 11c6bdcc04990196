use globset::{Glob, GlobSet, GlobSetBuilder};
use reqwest::Url;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedUriError {
    #[error("unsupported uri: {0}")]
    Malformed(String),

    #[error("unsupported uri scheme: {0}")]
    Scheme(String),

    #[error("host not allowed: {0}")]
    Host(String),
}

/// Decides which URIs `fetch_doc` may reach before any request is made.
#[derive(Debug, Clone)]
pub struct UriPolicy {
    hosts: Option<GlobSet>,
}

impl UriPolicy {
    /// Build a policy from host glob patterns. No patterns allows any host.
    pub fn new(allowed_hosts: &[String]) -> Result<Self, globset::Error> {
        if allowed_hosts.is_empty() {
            return Ok(Self { hosts: None });
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in allowed_hosts {
            builder.add(Glob::new(&pattern.to_ascii_lowercase())?);
        }
        Ok(Self {
            hosts: Some(builder.build()?),
        })
    }

    pub fn allow_all() -> Self {
        Self { hosts: None }
    }

    pub fn check(&self, uri: &str) -> Result<Url, UnsupportedUriError> {
        let url = Url::parse(uri).map_err(|_| UnsupportedUriError::Malformed(uri.to_string()))?;
        self.check_url(&url)?;
        Ok(url)
    }

    /// Same rules as [`UriPolicy::check`] for an already parsed URL, such as a redirect target.
    pub fn check_url(&self, url: &Url) -> Result<(), UnsupportedUriError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(UnsupportedUriError::Scheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| UnsupportedUriError::Malformed(url.to_string()))?;

        if let Some(hosts) = &self.hosts {
            if !hosts.is_match(host) {
                return Err(UnsupportedUriError::Host(host.to_string()));
            }
        }

        Ok(())
    }
}
