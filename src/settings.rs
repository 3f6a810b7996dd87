//! User settings: exclusion patterns and bundle pre/after texts.
//!
//! Stored as one JSON document. Missing keys fall back to defaults and
//! unknown keys are ignored, so older and newer files both load.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BundleError, Result};

/// Environment variable overriding the settings file location.
pub const SETTINGS_ENV: &str = "BUNDLEIT_SETTINGS";

/// Exclusions applied when the user has not customized the list.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "/Pods/",
    "/vendor/bundle/",
    ".git",
    "bun.lockb",
    ".DS_Store",
    ".bundle",
    ".idea",
    ".next",
    ".nuxt",
    ".xcode",
    "build",
    "cache",
    "dist",
    "logs",
    "node_modules",
    "package-lock.json",
    "pnpm",
    "Thumbs.db",
    "yarn.lock",
    ".lock",
    ".yarn",
    "tmp/",
    "temp/",
    "/gen/",
    "src-tauri/target",
    "/target/",
    ".TAG",
    "_locales",
];

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

/// Per-folder texts placed around the bundled files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSettings {
    pub pre_text: String,
    pub after_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub pre_text: String,
    pub after_text: String,
    pub excludes: Vec<String>,
    /// Keyed by the folder's path as displayed.
    pub project_settings: BTreeMap<String, ProjectSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pre_text: String::new(),
            after_text: String::new(),
            excludes: default_excludes(),
            project_settings: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// `$BUNDLEIT_SETTINGS`, else `<config dir>/bundleit/settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("bundleit").join("settings.json"))
    }

    /// Load settings, returning defaults when the file does not exist.
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

    /// Add a pattern unless it is already present.
    pub fn add_exclude(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.excludes.contains(&pattern) {
            self.excludes.push(pattern);
        }
    }

    pub fn remove_exclude(&mut self, pattern: &str) {
        self.excludes.retain(|p| p != pattern);
    }

    pub fn reset_excludes(&mut self) {
        self.excludes = default_excludes();
    }

    pub fn project(&self, root: &Path) -> ProjectSettings {
        self.project_settings
            .get(root.to_string_lossy().as_ref())
            .cloned()
            .unwrap_or_default()
    }

    pub fn update_project(&mut self, root: &Path, project: ProjectSettings) {
        self.project_settings
            .insert(root.to_string_lossy().to_string(), project);
    }
}
