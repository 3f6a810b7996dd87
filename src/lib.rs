//! bundleit - browse a directory tree and bundle selected files into one text
//!
//! The core is an incrementally loaded, cached, exclusion-filtered tree
//! reader ([`TreeSession`]). Settings, history, bundling and output sit on
//! top of it.

pub mod bundle;
pub mod cache;
pub mod error;
pub mod fs;
pub mod gitignore;
pub mod history;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod session;
pub mod settings;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use bundle::{Bundle, build_bundle, count_lines, default_file_name, folder_name, total_lines};
pub use cache::{CacheKind, CachePayload, DEFAULT_CACHE_TTL, ResultCache};
pub use error::{BundleError, Result};
pub use fs::{DirEntry, FileSystem, TokioFs};
pub use gitignore::{GitignoreRule, GitignoreRules};
pub use history::{History, HistoryEntry, MAX_HISTORY};
pub use matcher::{LiteralRule, MatcherRegistry, PathMatcher, relative_path};
pub use output::{OutputConfig, TreeFormatter, print_json};
pub use session::{ROOT_LOAD_ERROR, SessionConfig, TreeSession, TreeSnapshot};
pub use settings::{DEFAULT_EXCLUDES, ProjectSettings, Settings};
pub use tree::{
    BackgroundScheduler, DirectoryWalker, FileNode, PendingExpansion, WalkOutcome, WalkerConfig,
    count_nodes, find_node,
};
