//! Document catalog built from llms.txt style link lists.
//!
//! A catalog source is any text document containing markdown links
//! (`[Quickstart](https://example.com/quickstart.md)`). Every http(s) link
//! becomes a [`CatalogEntry`]. Entries are deduplicated by URI, first
//! occurrence winning, so earlier sources take priority over later ones.

use std::collections::HashMap;
use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::fetcher::Fetcher;

static MD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").unwrap());

#[derive(Error, Debug)]
pub enum CatalogLoadError {
    #[error("no catalog sources configured")]
    NoSources,

    #[error("no documents found in {0} catalog source(s)")]
    Empty(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub uri: String,
    pub display_title: String,
}

/// Immutable, URI-unique list of known documents in source order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_uri: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from `(title, uri)` pairs. Later duplicates are ignored.
    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut catalog = Self::default();
        for (title, uri) in links {
            if catalog.by_uri.contains_key(&uri) {
                continue;
            }
            catalog.by_uri.insert(uri.clone(), catalog.entries.len());
            catalog.entries.push(CatalogEntry {
                uri,
                display_title: title,
            });
        }
        catalog
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, uri: &str) -> Option<&CatalogEntry> {
        self.by_uri.get(uri).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extract `(title, uri)` pairs from markdown links with an http(s) target.
///
/// Blank titles fall back to the link target.
pub fn parse_links(text: &str) -> Vec<(String, String)> {
    MD_LINK
        .captures_iter(text)
        .map(|caps| {
            let uri = caps[2].trim().to_string();
            let title = caps[1].trim();
            let title = if title.is_empty() {
                uri.clone()
            } else {
                title.to_string()
            };
            (title, uri)
        })
        .collect()
}

/// Fetch every source and merge their links into one catalog.
///
/// Sources are fetched concurrently but merged in the order given. A failing
/// source is logged and skipped; only a catalog with no entries at all is an
/// error.
pub async fn load_catalog(
    fetcher: &dyn Fetcher,
    sources: &[String],
) -> Result<Catalog, CatalogLoadError> {
    if sources.is_empty() {
        return Err(CatalogLoadError::NoSources);
    }

    let bodies = join_all(sources.iter().map(|url| fetcher.get_text(url))).await;

    let mut links = Vec::new();
    for (url, body) in sources.iter().zip(bodies) {
        match body {
            Ok(text) => {
                let found = parse_links(&text);
                if found.is_empty() {
                    warn!("Catalog source {url} contains no links");
                } else {
                    info!("Catalog source {url}: {} links", found.len());
                }
                links.extend(found);
            }
            Err(e) => warn!("Catalog source {url} failed: {e}"),
        }
    }

    let catalog = Catalog::from_links(links);
    if catalog.is_empty() {
        return Err(CatalogLoadError::Empty(sources.len()));
    }

    info!(
        "Catalog ready: {} documents from {} source(s)",
        catalog.len(),
        sources.len()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use crate::fetcher::mock::MockFetcher;

    #[test]
    fn test_parse_links_http_only() {
        let text = "# Docs\n\
            - [Quickstart](https://x/q.md): start here\n\
            - [API](http://x/api.md)\n\
            - [Mail](mailto:team@x.com)\n\
            - [Relative](./local.md)\n";
        let links = parse_links(text);
        assert_eq!(
            links,
            vec![
                ("Quickstart".to_string(), "https://x/q.md".to_string()),
                ("API".to_string(), "http://x/api.md".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_links_blank_title_falls_back_to_uri() {
        let links = parse_links("[ ](https://x/blank.md)");
        assert_eq!(
            links,
            vec![("https://x/blank.md".to_string(), "https://x/blank.md".to_string())]
        );
    }

    #[test]
    fn test_from_links_first_occurrence_wins() {
        let catalog = Catalog::from_links(vec![
            ("First".to_string(), "https://x/a".to_string()),
            ("Other".to_string(), "https://x/b".to_string()),
            ("Second".to_string(), "https://x/a".to_string()),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("https://x/a").unwrap().display_title, "First");
        assert_eq!(catalog.entries()[1].uri, "https://x/b");
    }

    #[tokio::test]
    async fn test_load_catalog_merges_sources_in_order() {
        let fetcher = MockFetcher::new();
        fetcher.respond(
            "https://one/llms.txt",
            "[Quickstart](https://x/q.md)\n[API](https://x/api.md)",
        );
        fetcher.respond(
            "https://two/llms.txt",
            "[Quickstart v2](https://x/q.md)\n[Tools](https://x/tools.md)",
        );
        let sources = vec![
            "https://one/llms.txt".to_string(),
            "https://two/llms.txt".to_string(),
        ];

        let catalog = load_catalog(&fetcher, &sources).await.unwrap();

        let titles: Vec<&str> = catalog
            .entries()
            .iter()
            .map(|e| e.display_title.as_str())
            .collect();
        assert_eq!(titles, vec!["Quickstart", "API", "Tools"]);
    }

    #[tokio::test]
    async fn test_load_catalog_partial_failure() {
        let fetcher = MockFetcher::new();
        fetcher.fail("https://down/llms.txt", FetchError::Timeout);
        fetcher.respond("https://up/llms.txt", "[API](https://x/api.md)");
        let sources = vec![
            "https://down/llms.txt".to_string(),
            "https://up/llms.txt".to_string(),
        ];

        let catalog = load_catalog(&fetcher, &sources).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(fetcher.calls("https://down/llms.txt"), 1);
    }

    #[tokio::test]
    async fn test_load_catalog_total_failure() {
        let fetcher = MockFetcher::new();
        fetcher.respond("https://empty/llms.txt", "no links in here");
        let sources = vec![
            "https://missing/llms.txt".to_string(),
            "https://empty/llms.txt".to_string(),
        ];

        let err = load_catalog(&fetcher, &sources).await.unwrap_err();
        assert!(matches!(err, CatalogLoadError::Empty(2)));
    }

    #[tokio::test]
    async fn test_load_catalog_source_failures_are_not_errors() {
        let fetcher = MockFetcher::new();
        fetcher.fail("https://down/llms.txt", FetchError::Status(500));
        fetcher.respond("https://empty/llms.txt", "");
        fetcher.respond("https://up/llms.txt", "[Hooks](https://x/hooks.md)");
        let sources = vec![
            "https://down/llms.txt".to_string(),
            "https://empty/llms.txt".to_string(),
            "https://up/llms.txt".to_string(),
        ];
        assert_eq!(load_catalog(&fetcher, &sources).await.unwrap().len(), 1);

        let err = load_catalog(&fetcher, &sources[..2]).await.unwrap_err();
        // A per-source failure only surfaces as the aggregate outcome
        match &err {
            CatalogLoadError::Empty(n) => assert_eq!(*n, 2),
            CatalogLoadError::NoSources => panic!("sources were configured"),
        }
        assert_eq!(
            err.to_string(),
            "no documents found in 2 catalog source(s)"
        );
    }

    #[tokio::test]
    async fn test_load_catalog_no_sources() {
        let fetcher = MockFetcher::new();
        let err = load_catalog(&fetcher, &[]).await.unwrap_err();
        assert!(matches!(err, CatalogLoadError::NoSources));
        assert_eq!(fetcher.total_calls(), 0);
    }
}
