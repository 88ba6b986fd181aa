//! Shared page cache
//!
//! Stands in for a reverse proxy honoring `s-maxage`: rendered bodies are
//! kept per request path until they expire or are purged.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedPage {
    body: String,
    stored_at: Instant,
}

/// In-process cache of rendered pages keyed by request path
#[derive(Debug)]
pub struct PageCache {
    pages: RwLock<HashMap<String, CachedPage>>,
    max_age: Duration,
}

impl PageCache {
    pub fn new(max_age_secs: u64) -> Self {
        Self {
            pages: RwLock::new(HashMap::new()),
            max_age: Duration::from_secs(max_age_secs),
        }
    }

    /// Value for the `Cache-Control` header of cached pages
    pub fn cache_control(&self) -> String {
        format!("public, s-maxage={}", self.max_age.as_secs())
    }

    /// A fresh cached body for `path`
    pub fn get(&self, path: &str) -> Option<String> {
        let pages = self.pages.read().unwrap_or_else(|e| e.into_inner());
        pages
            .get(path)
            .filter(|page| page.stored_at.elapsed() < self.max_age)
            .map(|page| page.body.clone())
    }

    pub fn insert(&self, path: impl Into<String>, body: impl Into<String>) {
        let mut pages = self.pages.write().unwrap_or_else(|e| e.into_inner());
        pages.insert(
            path.into(),
            CachedPage {
                body: body.into(),
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop one cached page, reporting whether it was cached
    pub fn purge(&self, path: &str) -> bool {
        let removed = self
            .pages
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path)
            .is_some();
        debug!("Purged {} from page cache: {}", path, removed);
        removed
    }

    /// Drop every cached page
    pub fn purge_all(&self) {
        self.pages.write().unwrap_or_else(|e| e.into_inner()).clear();
        debug!("Purged page cache");
    }

    pub fn len(&self) -> usize {
        self.pages.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
