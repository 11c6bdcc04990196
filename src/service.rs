//! Documentation service: lifecycle, search assembly and direct fetches.
//!
//! [`DocService`] owns all process-wide state. The catalog and its index are
//! built lazily by [`DocService::ensure_ready`] through a `OnceCell`, so
//! concurrent first callers share a single load and a failed load leaves the
//! cell empty for the next caller to retry. Page content lives in the
//! [`DocumentCache`] and is only fetched for documents a request needs.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::cache::{CacheState, DocumentCache};
use crate::catalog::{Catalog, CatalogLoadError, load_catalog};
use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::policy::UriPolicy;
use crate::search::SearchIndex;
use crate::search::snippet::make_snippet;
use crate::search::tokenize::token_set;

/// Catalog and index, produced together by initialization.
#[derive(Debug)]
pub struct Library {
    pub catalog: Catalog,
    pub index: SearchIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub score: f64,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogLink {
    pub url: String,
    pub title: String,
}

/// Result of `fetch_doc`, serialized without a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FetchDocResponse {
    Document {
        url: String,
        title: String,
        content: String,
    },
    Catalog {
        urls: Vec<CatalogLink>,
    },
    Error {
        error: String,
        url: String,
    },
}

pub struct DocService {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    policy: UriPolicy,
    library: OnceCell<Library>,
    cache: DocumentCache,
}

fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

impl DocService {
    pub fn new(config: Arc<Config>, fetcher: Arc<dyn Fetcher>) -> Result<Self, globset::Error> {
        let policy = UriPolicy::new(&config.allowed_hosts)?;
        Ok(Self {
            cache: DocumentCache::new(Arc::clone(&fetcher)),
            config,
            fetcher,
            policy,
            library: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Load the catalog and build the index, once.
    ///
    /// Later calls return the same library without any network traffic. On
    /// failure nothing is stored and the next call tries again.
    pub async fn ensure_ready(&self) -> Result<&Library, CatalogLoadError> {
        self.library
            .get_or_try_init(|| async {
                let catalog =
                    load_catalog(self.fetcher.as_ref(), &self.config.catalog_sources).await?;
                let index = SearchIndex::build(&catalog);
                info!("Search index built over {} titles", index.len());
                Ok::<_, CatalogLoadError>(Library { catalog, index })
            })
            .await
    }

    /// The index, or `None` before the first successful `ensure_ready`.
    pub fn index(&self) -> Option<&SearchIndex> {
        self.library.get().map(|l| &l.index)
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.library.get().map(|l| &l.catalog)
    }

    /// Rank the catalog against `query` and attach snippets.
    ///
    /// Only the first `hydrate_max` results are hydrated; the rest, and any
    /// whose fetch fails, carry their title as snippet.
    pub async fn search_docs(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, CatalogLoadError> {
        let library = self.ensure_ready().await?;
        let results = library.index.search(query, k);

        let bound = results.len().min(self.config.hydrate_max);
        let hydrated = join_all(
            results[..bound]
                .iter()
                .map(|r| self.cache.ensure(&r.entry.uri)),
        )
        .await;
        debug!(
            "search {query:?}: {} results, {}/{bound} hydrated",
            results.len(),
            hydrated.iter().filter(|p| p.is_some()).count()
        );

        let query_tokens = token_set(query);
        let hits = results
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                let content = hydrated
                    .get(i)
                    .and_then(Option::as_ref)
                    .map(|page| page.content.as_str());
                let snippet = make_snippet(
                    content,
                    &r.entry.display_title,
                    &query_tokens,
                    self.config.snippet_chars,
                );
                SearchHit {
                    url: r.entry.uri,
                    title: r.entry.display_title,
                    score: round_score(r.score),
                    snippet,
                }
            })
            .collect();

        Ok(hits)
    }

    /// Full content for `uri`, or the whole catalog when `uri` is blank.
    ///
    /// The catalog is loaded first in both cases, but a direct fetch goes ahead
    /// when it cannot be loaded.
    pub async fn fetch_doc(&self, uri: Option<&str>) -> FetchDocResponse {
        let uri = uri.map(str::trim).unwrap_or_default();
        if uri.is_empty() {
            return self.list_catalog().await;
        }

        if let Err(e) = self.policy.check(uri) {
            return FetchDocResponse::Error {
                error: e.to_string(),
                url: uri.to_string(),
            };
        }

        // A direct fetch does not depend on the catalog
        if let Err(e) = self.ensure_ready().await {
            debug!("Fetching {uri} without a catalog: {e}");
        }

        match self.cache.ensure(uri).await {
            Some(page) => FetchDocResponse::Document {
                url: uri.to_string(),
                title: page.title.clone(),
                content: page.content.clone(),
            },
            None => {
                let error = match self.cache.state(uri) {
                    CacheState::Failed(e) => format!("fetch failed: {e}"),
                    _ => "fetch failed".to_string(),
                };
                FetchDocResponse::Error {
                    error,
                    url: uri.to_string(),
                }
            }
        }
    }

    async fn list_catalog(&self) -> FetchDocResponse {
        match self.ensure_ready().await {
            Ok(library) => FetchDocResponse::Catalog {
                urls: library
                    .catalog
                    .entries()
                    .iter()
                    .map(|e| CatalogLink {
                        url: e.uri.clone(),
                        title: e.display_title.clone(),
                    })
                    .collect(),
            },
            Err(e) => FetchDocResponse::Error {
                error: format!("catalog unavailable: {e}"),
                url: String::new(),
            },
        }
    }
}
