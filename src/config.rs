/// Configuration module for docscout.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use globset::Glob;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "docscout.json";

// ── Default value functions ──────────────────────────────────────────

fn default_catalog_sources() -> Vec<String> {
    vec!["https://strandsagents.com/latest/llms.txt".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("docscout/{}", env!("CARGO_PKG_VERSION"))
}

fn default_search_top_k() -> usize {
    5
}

fn default_hydrate_max() -> usize {
    5
}

fn default_snippet_chars() -> usize {
    300
}

// ── Config struct ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// llms.txt style link lists, in priority order.
    #[serde(default = "default_catalog_sources")]
    pub catalog_sources: Vec<String>,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Result count used when a search call does not pass `k`.
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    /// How many of the top search results get their content fetched.
    #[serde(default = "default_hydrate_max")]
    pub hydrate_max: usize,

    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,

    /// Host glob patterns `fetch_doc` may reach. Empty means any host.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_sources: default_catalog_sources(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            search_top_k: default_search_top_k(),
            hydrate_max: default_hydrate_max(),
            snippet_chars: default_snippet_chars(),
            allowed_hosts: Vec::new(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to [`DEFAULT_CONFIG_PATH`].
    /// A missing file or invalid JSON falls back to the default config.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            DEFAULT_CONFIG_PATH
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let mut cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");

        // Blank lines in hand-edited configs are common
        cfg.catalog_sources.retain(|s| !s.trim().is_empty());

        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.timeout_secs > 0, "timeout_secs must be positive");
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(self.snippet_chars > 0, "snippet_chars must be positive");
        anyhow::ensure!(
            !self.user_agent.trim().is_empty(),
            "user_agent must not be empty"
        );
        for pattern in &self.allowed_hosts {
            Glob::new(pattern).with_context(|| format!("invalid allowed_hosts entry: {pattern}"))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog_sources.len(), 1);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.search_top_k, 5);
        assert_eq!(config.hydrate_max, 5);
        assert!(config.user_agent.starts_with("docscout/"));
        assert!(config.allowed_hosts.is_empty());
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"timeout_secs": 5, "catalog_sources": ["https://a/llms.txt", "https://b/llms.txt"]}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.catalog_sources.len(), 2);
        // Other fields should have defaults
        assert_eq!(config.search_top_k, 5);
        assert_eq!(config.snippet_chars, 300);
    }

    #[test]
    fn test_validate_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_timeout() {
        let mut config = Config::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_host_glob() {
        let mut config = Config::default();
        config.allowed_hosts = vec!["docs.[example.com".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("absent.json");
        let config = Config::load(&path.to_string_lossy()).unwrap();
        assert_eq!(config.search_top_k, 5);
        assert!(!path.exists(), "load must not create files");
    }

    #[test]
    fn test_load_invalid_json_uses_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = Config::load(&path.to_string_lossy()).unwrap();
        assert_eq!(config.hydrate_max, 5);
    }

    #[test]
    fn test_load_drops_blank_sources() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("docscout.json");
        std::fs::write(
            &path,
            r#"{"catalog_sources": ["https://a/llms.txt", "  "], "hydrate_max": 2}"#,
        )
        .unwrap();
        let config = Config::load(&path.to_string_lossy()).unwrap();
        assert_eq!(config.catalog_sources, vec!["https://a/llms.txt"]);
        assert_eq!(config.hydrate_max, 2);
    }

    #[test]
    fn test_save_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.json");
        let path = path.to_string_lossy().to_string();

        let mut config = Config::default();
        config.allowed_hosts = vec!["*.example.com".to_string()];
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.allowed_hosts, config.allowed_hosts);
        assert_eq!(loaded.user_agent, config.user_agent);
    }
}
