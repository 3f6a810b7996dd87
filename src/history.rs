//! Recently opened folders and their saved file selections.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BundleError, Result};

/// Maximum number of remembered folders.
pub const MAX_HISTORY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub path: PathBuf,
    pub name: String,
    pub last_opened: DateTime<Utc>,
    #[serde(default)]
    pub selections: Vec<PathBuf>,
}

/// Most recently opened first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// `<data dir>/bundleit/history.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("bundleit").join("history.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&content).map_err(|source| BundleError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| BundleError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Record that `path` was opened, moving it to the front.
    pub fn add(&mut self, path: &Path) {
        let entry = match self.entries.iter().position(|h| h.path == path) {
            Some(index) => {
                let mut entry = self.entries.remove(index);
                entry.last_opened = Utc::now();
                entry
            }
            None => HistoryEntry {
                path: path.to_path_buf(),
                name: path
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.to_string_lossy().to_string()),
                last_opened: Utc::now(),
                selections: Vec::new(),
            },
        };
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY);
    }

    /// Replace saved selections. Unknown folders are ignored.
    pub fn update_selections(&mut self, path: &Path, selections: &[PathBuf]) {
        if let Some(entry) = self.entries.iter_mut().find(|h| h.path == path) {
            entry.selections = selections.to_vec();
        }
    }

    pub fn selections(&self, path: &Path) -> &[PathBuf] {
        self.entries
            .iter()
            .find(|h| h.path == path)
            .map(|h| h.selections.as_slice())
            .unwrap_or_default()
    }

    pub fn remove(&mut self, path: &Path) {
        self.entries.retain(|h| h.path != path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
