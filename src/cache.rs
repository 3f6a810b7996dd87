//! Time-limited result cache for directory listings and line counts.
//!
//! Entries expire lazily: an entry older than the TTL is evicted when it is
//! read, there is no background sweep. Growth is not bounded (no LRU); a
//! session browses one root at a time and clears the cache on refresh.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::tree::FileNode;

/// Default time-to-live for cache entries (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache namespace. The same path may be cached once per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    DirectoryListing,
    FileLineCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePayload {
    /// Filtered, sorted entries of one directory. `scope` is the
    /// fingerprint of the exclusion rules that did the filtering.
    Listing {
        scope: u64,
        nodes: Arc<Vec<FileNode>>,
    },
    LineCount(usize),
}

impl CachePayload {
    pub fn kind(&self) -> CacheKind {
        match self {
            CachePayload::Listing { .. } => CacheKind::DirectoryListing,
            CachePayload::LineCount(_) => CacheKind::FileLineCount,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    payload: CachePayload,
    created_at: Instant,
}

#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<(CacheKind, PathBuf), CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(CacheKind, PathBuf), CacheEntry>> {
        // The map holds plain data, a panic elsewhere cannot leave it torn
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &Path, kind: CacheKind) -> Option<CachePayload> {
        let mut entries = self.lock();
        let map_key = (kind, key.to_path_buf());
        let entry = entries.get(&map_key)?;

        if entry.created_at.elapsed() > self.ttl {
            trace!(path = %key.display(), ?kind, "cache entry expired");
            entries.remove(&map_key);
            return None;
        }

        Some(entry.payload.clone())
    }

    pub fn set(&self, key: impl Into<PathBuf>, payload: CachePayload) {
        let entry = CacheEntry {
            created_at: Instant::now(),
            payload,
        };
        self.lock().insert((entry.payload.kind(), key.into()), entry);
    }

    /// Clear one namespace, or both when `kind` is `None`.
    pub fn clear(&self, kind: Option<CacheKind>) {
        let mut entries = self.lock();
        match kind {
            Some(kind) => entries.retain(|(k, _), _| *k != kind),
            None => entries.clear(),
        }
    }

    pub fn remove(&self, key: &Path, kind: CacheKind) {
        self.lock().remove(&(kind, key.to_path_buf()));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A listing of `dir` filtered under the rules fingerprinted by `scope`.
    ///
    /// A listing stored under other rules is a miss; the next
    /// `set_listing` replaces it.
    pub fn get_listing(&self, dir: &Path, scope: u64) -> Option<Arc<Vec<FileNode>>> {
        match self.get(dir, CacheKind::DirectoryListing)? {
            CachePayload::Listing { scope: stored, nodes } if stored == scope => Some(nodes),
            CachePayload::Listing { .. } => {
                trace!(path = %dir.display(), "listing filtered under other rules");
                None
            }
            CachePayload::LineCount(_) => None,
        }
    }

    pub fn set_listing(&self, dir: impl Into<PathBuf>, scope: u64, nodes: Arc<Vec<FileNode>>) {
        self.set(dir, CachePayload::Listing { scope, nodes });
    }

    pub fn get_line_count(&self, file: &Path) -> Option<usize> {
        match self.get(file, CacheKind::FileLineCount)? {
            CachePayload::LineCount(count) => Some(count),
            CachePayload::Listing { .. } => None,
        }
    }

    pub fn set_line_count(&self, file: impl Into<PathBuf>, count: usize) {
        self.set(file, CachePayload::LineCount(count));
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
