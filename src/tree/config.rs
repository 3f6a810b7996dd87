//! Configuration types for the directory walker

/// Depth and parallelism limits for [`DirectoryWalker`](super::DirectoryWalker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Levels resolved before first paint. Directories at or below this
    /// depth are stubbed and expanded in the background.
    pub initial_depth: usize,
    /// Hard recursion ceiling. Directories at this depth are never listed.
    pub max_depth: usize,
    /// Maximum number of concurrent reads per directory, and the size of a
    /// background wave.
    pub parallel_limit: usize,
}

impl WalkerConfig {
    /// Deep browsing of a whole project.
    pub const fn browse() -> Self {
        Self {
            initial_depth: 2,
            max_depth: 9,
            parallel_limit: 150,
        }
    }

    /// Shallow, gentle walk for the file-selection view.
    pub const fn light() -> Self {
        Self {
            initial_depth: 1,
            max_depth: 7,
            parallel_limit: 7,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_initial_depth(mut self, initial_depth: usize) -> Self {
        self.initial_depth = initial_depth;
        self
    }

    /// Zero is treated as one.
    pub fn with_parallel_limit(mut self, parallel_limit: usize) -> Self {
        self.parallel_limit = parallel_limit.max(1);
        self
    }
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self::browse()
    }
}
