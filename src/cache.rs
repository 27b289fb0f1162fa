//! Shared resource cache for the embedding pipeline
//!
//! Two stores back the at-most-once-fetch guarantee:
//!
//! - a URL → inline-data map (the resource store), and
//! - a visited-URL set (the attempt store) recording every fetch attempt,
//!   successful or not.
//!
//! A URL present in the attempt store without a resource entry means a prior
//! fetch failed; it is never retried for the process lifetime. There is no
//! eviction, TTL, or size bound — correctness relies on permanence. The
//! aggregated embedding result itself is memoized in the resource store under
//! [`EMBED_CSS_KEY`].
//!
//! The cache is injected into the engine (shared via `Arc`) rather than held
//! as a module-level singleton, so tests can observe fetch-once behavior with
//! a fresh store.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::RwLock;

/// Well-known key under which the aggregated font CSS is memoized
pub const EMBED_CSS_KEY: &str = "fonts-embed-css";

/// Process-lifetime cache shared by all fetch paths
///
/// Writers from multiple threads are expected; writes are idempotent because
/// every fetch of the same URL converges on the same bytes. Last write wins.
#[derive(Debug, Default)]
pub struct EmbedCache {
    resources: RwLock<FxHashMap<String, String>>,
    attempted: RwLock<FxHashSet<String>>,
}

impl EmbedCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the inline data cached for `url`, if any
    pub fn resource(&self, url: &str) -> Option<String> {
        self.resources.read().unwrap().get(url).cloned()
    }

    /// Returns whether inline data is cached for `url`
    pub fn has_resource(&self, url: &str) -> bool {
        self.resources.read().unwrap().contains_key(url)
    }

    /// Stores inline data for `url`
    ///
    /// Once present the entry is reused for every subsequent reference and
    /// the URL is never fetched again.
    pub fn store_resource(&self, url: &str, data: impl Into<String>) {
        self.resources.write().unwrap().insert(url.to_string(), data.into());
    }

    /// Returns whether a fetch attempt (success or failure) was made for `url`
    pub fn was_attempted(&self, url: &str) -> bool {
        self.attempted.read().unwrap().contains(url)
    }

    /// Records that a fetch attempt has been made for `url`
    pub fn mark_attempted(&self, url: &str) {
        self.attempted.write().unwrap().insert(url.to_string());
    }

    /// Number of cached resources (test/diagnostic aid)
    pub fn resource_count(&self) -> usize {
        self.resources.read().unwrap().len()
    }
}
