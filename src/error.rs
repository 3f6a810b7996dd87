//! Error types for bundleit

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The selected root could not be listed. Deeper directories never
    /// surface this; they are logged and shown as empty instead.
    #[error("cannot read directory '{}': {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no folder selected")]
    NoRootSelected,

    #[error("no files selected")]
    EmptySelection,

    #[error("invalid JSON in '{}': {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BundleError>;
