//! Directory tree loading
//!
//! - `DirectoryWalker`: lists, filters, sorts and caches directories,
//!   expanding the first levels eagerly
//! - `BackgroundScheduler`: expands the deferred levels in bounded waves
//! - `FileNode`: the tree itself

mod config;
mod node;
mod scheduler;
mod walker;

pub use config::WalkerConfig;
pub use node::{FileNode, compare_nodes, count_nodes, find_node, find_node_mut};
pub use scheduler::{BackgroundScheduler, BackgroundTask};
pub use walker::{DirectoryWalker, PendingExpansion, WalkOutcome};
