//! Test utilities: an in-memory file system and temporary directory trees.
//!
//! This module is only compiled for tests and benchmarks.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tempfile::TempDir;

use crate::fs::{DirEntry, FileSystem};

#[derive(Debug, Clone)]
enum MemNode {
    Dir,
    File(String),
    Symlink,
}

#[derive(Debug, Default)]
struct MemState {
    nodes: BTreeMap<PathBuf, MemNode>,
    reads: HashMap<PathBuf, usize>,
    failing: HashSet<PathBuf>,
    delay: Option<Duration>,
}

/// In-memory [`FileSystem`] that records every read.
///
/// Paths are stored verbatim; use absolute paths such as `/proj/src/a.rs`.
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<MemState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().expect("memory fs lock poisoned")
    }

    fn insert_parents(state: &mut MemState, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() || ancestor == Path::new("/") {
                break;
            }
            state.nodes.entry(ancestor.to_path_buf()).or_insert(MemNode::Dir);
        }
    }

    /// Create a directory and all of its parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        Self::insert_parents(&mut state, path);
        state.nodes.insert(path.to_path_buf(), MemNode::Dir);
    }

    /// Create a file (and its parent directories).
    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        let mut state = self.lock();
        Self::insert_parents(&mut state, path);
        state
            .nodes
            .insert(path.to_path_buf(), MemNode::File(content.to_string()));
    }

    pub fn add_symlink(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        Self::insert_parents(&mut state, path);
        state.nodes.insert(path.to_path_buf(), MemNode::Symlink);
    }

    /// Make every read of `path` fail with `PermissionDenied`.
    pub fn fail(&self, path: impl AsRef<Path>) {
        self.lock().failing.insert(path.as_ref().to_path_buf());
    }

    /// Delay every read, so concurrent reads overlap.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Number of reads (directory listings and file reads) of `path`.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.lock().reads.get(path.as_ref()).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.lock().reads.values().sum()
    }

    /// Highest number of reads observed in flight at the same time.
    pub fn max_concurrent_reads(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Record the read and return the configured delay, or the injected error.
    fn begin_read(&self, path: &Path) -> io::Result<Option<Duration>> {
        let mut state = self.lock();
        *state.reads.entry(path.to_path_buf()).or_insert(0) += 1;
        if state.failing.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }
        Ok(state.delay)
    }

    async fn simulate_latency(&self, delay: Option<Duration>) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.lock();
        match state.nodes.get(path) {
            Some(MemNode::Dir) => {}
            Some(_) => {
                return Err(io::Error::new(io::ErrorKind::Other, "not a directory"));
            }
            None => return Err(io::Error::from(io::ErrorKind::NotFound)),
        }

        Ok(state
            .nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .filter_map(|(p, node)| {
                let name = p.file_name()?.to_string_lossy().to_string();
                Some(match node {
                    MemNode::Dir => DirEntry::dir(name),
                    MemNode::File(_) => DirEntry::file(name),
                    MemNode::Symlink => DirEntry {
                        name,
                        is_dir: false,
                        is_file: false,
                        is_symlink: true,
                    },
                })
            })
            .collect())
    }

    fn contents(&self, path: &Path) -> io::Result<String> {
        match self.lock().nodes.get(path) {
            Some(MemNode::File(content)) => Ok(content.clone()),
            Some(_) => Err(io::Error::new(io::ErrorKind::Other, "not a file")),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}

impl FileSystem for MemoryFs {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let delay = self.begin_read(path)?;
        self.simulate_latency(delay).await;
        self.list(path)
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let delay = self.begin_read(path)?;
        self.simulate_latency(delay).await;
        self.contents(path)
    }
}

/// A temporary directory tree on disk.
///
/// The directory is removed when dropped.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a file, creating parent directories as needed.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    pub fn add_dir(&self, path: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        fs::create_dir_all(&full_path).expect("Failed to create dir");
        full_path
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}
