//! Append-only page cache with single-flight hydration.
//!
//! Each URI owns a slot holding a `tokio::sync::OnceCell`. The first caller to
//! reach an empty slot runs the fetch; every concurrent caller for the same
//! URI awaits that same cell. The map mutex only guards slot lookup and is
//! never held across an await, so fetches for different URIs run in parallel.
//!
//! Outcomes are memoized for the life of the process:
//! - hydrated pages are served without touching the network again,
//! - failures are remembered until [`DocumentCache::retry_failed`] or
//!   [`DocumentCache::clear_failed`] forgets them,
//! - a page that hydrated with empty content is fetched again on the next
//!   `ensure`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::fetcher::{FetchError, Fetcher, Page, fetch_page};

#[derive(Debug, Clone)]
enum CacheEntry {
    Hydrated(Arc<Page>),
    Failed(FetchError),
}

/// Observable state of a single URI.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheState {
    /// Never requested.
    Absent,
    /// A fetch is in flight.
    Pending,
    Hydrated(Arc<Page>),
    Failed(FetchError),
}

type Slot = Arc<OnceCell<CacheEntry>>;

pub struct DocumentCache {
    fetcher: Arc<dyn Fetcher>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl DocumentCache {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // Slots are only ever inserted or removed whole; a poisoned map is still consistent.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Slot for `uri`, replacing one whose page hydrated empty.
    fn slot(&self, uri: &str) -> Slot {
        let mut slots = self.lock();
        if let Some(slot) = slots.get(uri) {
            match slot.get() {
                Some(CacheEntry::Hydrated(page)) if page.content.is_empty() => {
                    debug!("Re-fetching {uri}: cached content is empty");
                }
                _ => return Arc::clone(slot),
            }
        }
        let slot: Slot = Arc::new(OnceCell::new());
        slots.insert(uri.to_string(), Arc::clone(&slot));
        slot
    }

    /// Return the page for `uri`, fetching it at most once.
    ///
    /// `None` means the fetch failed, now or on an earlier call.
    pub async fn ensure(&self, uri: &str) -> Option<Arc<Page>> {
        let slot = self.slot(uri);
        match slot.get_or_init(|| self.hydrate(uri)).await {
            CacheEntry::Hydrated(page) => Some(Arc::clone(page)),
            CacheEntry::Failed(_) => None,
        }
    }

    async fn hydrate(&self, uri: &str) -> CacheEntry {
        match fetch_page(self.fetcher.as_ref(), uri).await {
            Ok(page) => CacheEntry::Hydrated(Arc::new(page)),
            Err(e) => {
                warn!("Hydration failed for {uri}: {e}");
                CacheEntry::Failed(e)
            }
        }
    }

    /// Cached page for `uri`, if any. Never fetches.
    pub fn peek(&self, uri: &str) -> Option<Arc<Page>> {
        match self.lock().get(uri)?.get()? {
            CacheEntry::Hydrated(page) => Some(Arc::clone(page)),
            CacheEntry::Failed(_) => None,
        }
    }

    pub fn state(&self, uri: &str) -> CacheState {
        let slots = self.lock();
        let Some(slot) = slots.get(uri) else {
            return CacheState::Absent;
        };
        match slot.get() {
            None => CacheState::Pending,
            Some(CacheEntry::Hydrated(page)) => CacheState::Hydrated(Arc::clone(page)),
            Some(CacheEntry::Failed(e)) => CacheState::Failed(e.clone()),
        }
    }

    /// Forget a recorded failure for `uri` so the next `ensure` fetches again.
    ///
    /// Returns whether a failure was recorded.
    pub fn retry_failed(&self, uri: &str) -> bool {
        let mut slots = self.lock();
        let failed = matches!(
            slots.get(uri).and_then(|s| s.get()),
            Some(CacheEntry::Failed(_))
        );
        if failed {
            slots.remove(uri);
        }
        failed
    }

    /// Forget every recorded failure. Returns how many were dropped.
    pub fn clear_failed(&self) -> usize {
        let mut slots = self.lock();
        let before = slots.len();
        slots.retain(|_, slot| !matches!(slot.get(), Some(CacheEntry::Failed(_))));
        before - slots.len()
    }

    /// Number of URIs with a slot, including in-flight ones.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
