//! TreeSession - one browsable root and everything needed to keep it loaded
//!
//! Selecting a root walks the eager levels, publishes the tree, then hands
//! every stubbed directory to the background scheduler. Each background
//! expansion patches the published tree in place and queues its own stubs.
//!
//! Every selection starts a new generation. Expansions carry the generation
//! they were queued for and are dropped, before walking and again before
//! applying, once a newer selection exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::bundle::{self, Bundle};
use crate::cache::{CacheKind, DEFAULT_CACHE_TTL, ResultCache};
use crate::error::{BundleError, Result};
use crate::fs::FileSystem;
use crate::matcher::{MatcherRegistry, PathMatcher};
use crate::settings::{DEFAULT_EXCLUDES, Settings};
use crate::tree::{
    BackgroundScheduler, DirectoryWalker, FileNode, PendingExpansion, WalkOutcome, WalkerConfig,
    find_node, find_node_mut,
};

/// Message recorded when the selected root cannot be listed.
pub const ROOT_LOAD_ERROR: &str = "Failed to load directory contents";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub walker: WalkerConfig,
    pub cache_ttl: Duration,
    pub respect_gitignore: bool,
    pub excludes: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            respect_gitignore: true,
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The published tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    pub generation: u64,
    pub root: Option<PathBuf>,
    pub nodes: Arc<Vec<FileNode>>,
}

pub struct TreeSession<F> {
    fs: Arc<F>,
    cache: Arc<ResultCache>,
    walker: Arc<DirectoryWalker<F>>,
    scheduler: BackgroundScheduler,
    tree: Arc<watch::Sender<TreeSnapshot>>,
    generation: Arc<AtomicU64>,
    matchers: MatcherRegistry,
    excludes: Vec<String>,
    respect_gitignore: bool,
    root: Option<PathBuf>,
    error: Option<String>,
}

impl<F: FileSystem> TreeSession<F> {
    pub fn new(fs: Arc<F>, config: SessionConfig) -> Self {
        let cache = Arc::new(ResultCache::new(config.cache_ttl));
        let walker = Arc::new(DirectoryWalker::new(
            Arc::clone(&fs),
            Arc::clone(&cache),
            config.walker,
        ));
        let (tree, _) = watch::channel(TreeSnapshot::default());

        Self {
            fs,
            cache,
            walker,
            scheduler: BackgroundScheduler::new(config.walker.parallel_limit),
            tree: Arc::new(tree),
            generation: Arc::new(AtomicU64::new(0)),
            matchers: MatcherRegistry::new(),
            excludes: config.excludes,
            respect_gitignore: config.respect_gitignore,
            root: None,
            error: None,
        }
    }

    /// Make `path` the browsed root and load its eager levels.
    ///
    /// Deeper levels keep loading in the background after this returns.
    pub async fn select_root(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let root = path.into();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.root = Some(root.clone());
        self.error = None;
        info!(root = %root.display(), generation, "selecting root");

        let matcher = self
            .matchers
            .get_or_compile(self.fs.as_ref(), &root, &self.excludes, self.respect_gitignore)
            .await;

        let WalkOutcome { nodes, deferred } = match self.walker.try_list(&root, 0, &matcher).await {
            Ok(outcome) => outcome,
            Err(source) => {
                warn!(root = %root.display(), %source, "failed to load root");
                self.error = Some(ROOT_LOAD_ERROR.to_string());
                self.tree.send_replace(TreeSnapshot {
                    generation,
                    root: Some(root.clone()),
                    nodes: Arc::default(),
                });
                return Err(BundleError::RootUnreadable { path: root, source });
            }
        };

        debug!(
            root = %root.display(),
            top_level = nodes.len(),
            deferred = deferred.len(),
            "published eager tree"
        );
        self.tree.send_replace(TreeSnapshot {
            generation,
            root: Some(root),
            nodes: Arc::new(nodes),
        });

        let expander = Expander {
            walker: Arc::clone(&self.walker),
            tree: Arc::clone(&self.tree),
            scheduler: self.scheduler.clone(),
            current: Arc::clone(&self.generation),
            matcher,
            generation,
        };
        for pending in deferred {
            expander.enqueue(pending);
        }

        Ok(())
    }

    /// Drop every cached result and reload the current root.
    pub async fn refresh(&mut self) -> Result<()> {
        let Some(root) = self.root.clone() else {
            return Ok(());
        };
        self.cache.clear(None);
        self.matchers.clear();
        self.select_root(root).await
    }

    /// Replace the exclusion list. Takes effect on the next selection.
    pub fn set_excludes(&mut self, patterns: Vec<String>) {
        self.excludes = patterns;
        self.cache.clear(Some(CacheKind::DirectoryListing));
    }

    pub fn set_respect_gitignore(&mut self, respect: bool) {
        if self.respect_gitignore != respect {
            self.respect_gitignore = respect;
            self.cache.clear(Some(CacheKind::DirectoryListing));
        }
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    pub fn tree(&self) -> Arc<Vec<FileNode>> {
        Arc::clone(&self.tree.borrow().nodes)
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        self.tree.borrow().clone()
    }

    /// Receiver notified on every publish, eager or background.
    pub fn subscribe(&self) -> watch::Receiver<TreeSnapshot> {
        self.tree.subscribe()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.scheduler.is_loading()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.scheduler.subscribe_loading()
    }

    /// Wait until every queued expansion has run.
    pub async fn wait_for_background(&self) {
        self.scheduler.wait_idle().await;
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn config(&self) -> &WalkerConfig {
        self.walker.config()
    }

    pub async fn line_count(&self, path: &Path) -> Result<usize> {
        self.require_root()?;
        Ok(bundle::count_lines(self.fs.as_ref(), &self.cache, path).await)
    }

    pub async fn total_lines(&self, paths: &[PathBuf]) -> Result<usize> {
        self.require_root()?;
        Ok(bundle::total_lines(self.fs.as_ref(), &self.cache, paths).await)
    }

    pub async fn bundle(&self, selection: &[PathBuf], settings: &Settings) -> Result<Bundle> {
        let root = self.require_root()?;
        bundle::build_bundle(self.fs.as_ref(), root, selection, settings).await
    }

    fn require_root(&self) -> Result<&Path> {
        self.root.as_deref().ok_or(BundleError::NoRootSelected)
    }
}

/// Everything a background expansion needs, shared by one generation.
struct Expander<F> {
    walker: Arc<DirectoryWalker<F>>,
    tree: Arc<watch::Sender<TreeSnapshot>>,
    scheduler: BackgroundScheduler,
    current: Arc<AtomicU64>,
    matcher: Arc<PathMatcher>,
    generation: u64,
}

impl<F> Clone for Expander<F> {
    fn clone(&self) -> Self {
        Self {
            walker: Arc::clone(&self.walker),
            tree: Arc::clone(&self.tree),
            scheduler: self.scheduler.clone(),
            current: Arc::clone(&self.current),
            matcher: Arc::clone(&self.matcher),
            generation: self.generation,
        }
    }
}

impl<F: FileSystem> Expander<F> {
    fn enqueue(&self, pending: PendingExpansion) {
        let expander = self.clone();
        self.scheduler.enqueue(expander.expand(pending));
    }

    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    async fn expand(self, pending: PendingExpansion) {
        if !self.is_current() {
            trace!(path = %pending.path.display(), "skipping stale expansion");
            return;
        }

        let WalkOutcome { nodes, deferred } = self
            .walker
            .list(&pending.path, pending.depth, &self.matcher)
            .await;

        let mut children = Some(nodes);
        let applied = self.tree.send_if_modified(|snapshot| {
            if snapshot.generation != self.generation || !self.is_current() {
                return false;
            }
            if find_node(&snapshot.nodes, &pending.path).is_none() {
                return false;
            }
            let nodes = Arc::make_mut(&mut snapshot.nodes);
            match (find_node_mut(nodes, &pending.path), children.take()) {
                (Some(node), Some(children)) => {
                    node.set_children(children);
                    true
                }
                _ => false,
            }
        });

        if !applied {
            debug!(path = %pending.path.display(), "discarding expansion for an old tree");
            return;
        }

        // Queued only now, so a child never lands before its parent
        for next in deferred {
            self.enqueue(next);
        }
    }
}
