//! DirectoryWalker - builds the browsable tree, eager levels first
//!
//! Each directory's own filtered, sorted entries are cached under its path.
//! A walk assembles subtrees from those listings: levels shallower than
//! `initial_depth` are expanded before returning, deeper directories come
//! back as empty stubs plus a [`PendingExpansion`] for the background
//! scheduler.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, join_all};
use tracing::{trace, warn};

use crate::cache::ResultCache;
use crate::fs::{DirEntry, FileSystem};
use crate::matcher::PathMatcher;

use super::config::WalkerConfig;
use super::node::{FileNode, compare_nodes};

/// A stubbed directory waiting to be expanded in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExpansion {
    pub path: PathBuf,
    /// Depth at which `path` itself is listed.
    pub depth: usize,
}

/// Result of walking one directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    /// Sorted children of the walked directory.
    pub nodes: Vec<FileNode>,
    /// Stubs found anywhere in the walked subtree.
    pub deferred: Vec<PendingExpansion>,
}

pub struct DirectoryWalker<F> {
    fs: Arc<F>,
    cache: Arc<ResultCache>,
    config: WalkerConfig,
}

impl<F: FileSystem> DirectoryWalker<F> {
    pub fn new(fs: Arc<F>, cache: Arc<ResultCache>, config: WalkerConfig) -> Self {
        Self { fs, cache, config }
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Walk `dir`, treating read failures as an empty directory.
    ///
    /// Only the failing directory is affected; siblings and ancestors are
    /// walked normally.
    pub fn list<'a>(
        &'a self,
        dir: &'a Path,
        depth: usize,
        matcher: &'a PathMatcher,
    ) -> BoxFuture<'a, WalkOutcome> {
        async move {
            match self.try_list(dir, depth, matcher).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(path = %dir.display(), %err, "failed to read directory");
                    WalkOutcome::default()
                }
            }
        }
        .boxed()
    }

    /// Walk `dir`, returning the error if `dir` itself cannot be read.
    ///
    /// Failures below `dir` are still absorbed.
    pub async fn try_list(
        &self,
        dir: &Path,
        depth: usize,
        matcher: &PathMatcher,
    ) -> io::Result<WalkOutcome> {
        if depth >= self.config.max_depth {
            return Ok(WalkOutcome::default());
        }

        let listing = self.listing(dir, matcher).await?;
        Ok(self.assemble(&listing, depth, matcher).await)
    }

    /// The directory's own entries, from cache or from one `read_dir`.
    async fn listing(&self, dir: &Path, matcher: &PathMatcher) -> io::Result<Arc<Vec<FileNode>>> {
        if let Some(cached) = self.cache.get_listing(dir, matcher.fingerprint()) {
            trace!(path = %dir.display(), "listing cache hit");
            return Ok(cached);
        }

        let entries = self.fs.read_dir(dir).await?;
        let mut nodes: Vec<FileNode> = entries
            .into_iter()
            .filter_map(|entry| self.entry_node(dir, entry, matcher))
            .collect();
        nodes.sort_by(compare_nodes);

        let nodes = Arc::new(nodes);
        self.cache
            .set_listing(dir, matcher.fingerprint(), Arc::clone(&nodes));
        Ok(nodes)
    }

    fn entry_node(&self, dir: &Path, entry: DirEntry, matcher: &PathMatcher) -> Option<FileNode> {
        // Skip symlinks to prevent cycles
        if entry.is_symlink {
            trace!(dir = %dir.display(), name = %entry.name, "skipping symlink");
            return None;
        }
        if !entry.is_dir && !entry.is_file {
            return None;
        }

        let path = self.fs.join(dir, &entry.name);
        if matcher.should_exclude(&path, entry.is_dir) {
            trace!(path = %path.display(), "excluded");
            return None;
        }

        Some(if entry.is_dir {
            FileNode::dir(entry.name, path)
        } else {
            FileNode::file(entry.name, path)
        })
    }

    /// Expand eager directories, stub the rest.
    async fn assemble(&self, listing: &[FileNode], depth: usize, matcher: &PathMatcher) -> WalkOutcome {
        let mut nodes = listing.to_vec();
        let mut deferred = Vec::new();
        let mut eager = Vec::new();

        for (index, node) in nodes.iter_mut().enumerate() {
            if !node.is_dir() {
                continue;
            }
            if depth < self.config.initial_depth {
                eager.push((index, node.path().to_path_buf()));
                continue;
            }
            node.set_children(Vec::new());
            if depth + 1 < self.config.max_depth {
                deferred.push(PendingExpansion {
                    path: node.path().to_path_buf(),
                    depth: depth + 1,
                });
            }
        }

        let expanded = in_lanes(eager, self.config.parallel_limit, |(index, path)| async move {
            (index, self.list(&path, depth + 1, matcher).await)
        })
        .await;

        for (index, outcome) in expanded {
            nodes[index].set_children(outcome.nodes);
            deferred.extend(outcome.deferred);
        }

        WalkOutcome { nodes, deferred }
    }
}

/// Run `f` over `items` split round-robin into at most `lanes` lanes.
///
/// Lanes run concurrently, items within a lane run one after another, so no
/// more than `lanes` calls are in flight. Results come back grouped by lane.
async fn in_lanes<T, R, Fut>(items: Vec<T>, lanes: usize, f: impl Fn(T) -> Fut) -> Vec<R>
where
    Fut: Future<Output = R>,
{
    if items.is_empty() {
        return Vec::new();
    }

    let lane_count = lanes.clamp(1, items.len());
    let mut buckets: Vec<Vec<T>> = (0..lane_count).map(|_| Vec::new()).collect();
    for (i, item) in items.into_iter().enumerate() {
        buckets[i % lane_count].push(item);
    }

    let f = &f;
    let results = join_all(buckets.into_iter().map(|bucket| async move {
        let mut out = Vec::with_capacity(bucket.len());
        for item in bucket {
            out.push(f(item).await);
        }
        out
    }))
    .await;

    results.into_iter().flatten().collect()
}
