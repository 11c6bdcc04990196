use std::error::Error as _;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect;
use tracing::warn;

use super::{FetchError, Fetcher};
use crate::config::Config;
use crate::policy::UriPolicy;

const MAX_REDIRECTS: usize = 10;

/// `reqwest`-backed fetcher with a fixed timeout and user agent.
///
/// Redirects are followed only while every hop stays on the original host
/// or on a host `allowed_hosts` permits.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let policy =
            UriPolicy::new(&config.allowed_hosts).map_err(|e| FetchError::Client(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .redirect(redirect_policy(policy))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

fn redirect_policy(policy: UriPolicy) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let same_host = attempt
            .previous()
            .first()
            .is_some_and(|origin| origin.host_str() == attempt.url().host_str());
        let verdict = if same_host {
            // scheme still has to be http(s)
            UriPolicy::allow_all().check_url(attempt.url())
        } else {
            policy.check_url(attempt.url())
        };
        match verdict {
            Ok(()) => attempt.follow(),
            Err(e) => {
                warn!("Refusing redirect to {}: {e}", attempt.url());
                attempt.error(e)
            }
        }
    })
}

/// Whether a declared `Content-Type` can be treated as text.
fn is_textual(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("text/")
        || mime.contains("html")
        || mime.contains("xml")
        || mime.contains("json")
        || mime.contains("markdown")
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_redirect() {
        let reason = err
            .source()
            .map(|source| source.to_string())
            .unwrap_or_else(|| err.to_string());
        FetchError::Redirect(reason)
    } else {
        FetchError::Network(err.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(ct) = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_textual(ct) {
                return Err(FetchError::UnsupportedContent(ct.to_string()));
            }
        }

        let bytes = resp.bytes().await.map_err(map_reqwest_error)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
