//! Title search over the document catalog.
//!
//! The index is built once from catalog titles, so it needs no page content
//! and costs nothing at the network level. Scoring is the Jaccard overlap
//! between the unique tokens of the query and of a title:
//!
//! ```text
//! score = |Q ∩ T| / |Q ∪ T|
//! ```
//!
//! Titles sharing no token with the query are left out of the results.
//! Equal scores keep catalog order.

pub mod snippet;
pub mod tokenize;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::catalog::{Catalog, CatalogEntry};
use tokenize::token_set;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub score: f64,
    pub entry: CatalogEntry,
}

/// Static inverted index over catalog titles.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<CatalogEntry>,
    title_sizes: Vec<usize>,
    postings: HashMap<String, Vec<usize>>,
}

impl SearchIndex {
    pub fn build(catalog: &Catalog) -> Self {
        let entries = catalog.entries().to_vec();
        let mut title_sizes = Vec::with_capacity(entries.len());
        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();

        for (pos, entry) in entries.iter().enumerate() {
            let tokens = token_set(&entry.display_title);
            title_sizes.push(tokens.len());
            for token in tokens {
                postings.entry(token).or_default().push(pos);
            }
        }

        Self {
            entries,
            title_sizes,
            postings,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank titles against `query`, best first, at most `k` results.
    pub fn search(&self, query: &str, k: usize) -> Vec<ScoredEntry> {
        let query_tokens: BTreeSet<String> = token_set(query);
        if k == 0 || query_tokens.is_empty() {
            return Vec::new();
        }

        // Postings lists are ascending, so each entry appears once per token
        let mut overlap: HashMap<usize, usize> = HashMap::new();
        for token in &query_tokens {
            if let Some(positions) = self.postings.get(token) {
                for &pos in positions {
                    *overlap.entry(pos).or_default() += 1;
                }
            }
        }

        let mut scored: Vec<(usize, f64)> = overlap
            .into_iter()
            .map(|(pos, shared)| {
                let union = query_tokens.len() + self.title_sizes[pos] - shared;
                (pos, shared as f64 / union as f64)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(pos, score)| ScoredEntry {
                score,
                entry: self.entries[pos].clone(),
            })
            .collect()
    }
}
