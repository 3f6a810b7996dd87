//! Bundle assembly and line counting for selected files.
//!
//! A bundle is one text document: a header naming the folder, optional
//! pre-texts, every selected file under a `File Path:` banner, then optional
//! after-texts.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::ResultCache;
use crate::error::{BundleError, Result};
use crate::fs::FileSystem;
use crate::matcher::relative_path;
use crate::settings::Settings;

const SEPARATOR_WIDTH: usize = 55;

fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

/// Number of lines in `path`, counted as `\n`-separated pieces.
///
/// Cached per file. An unreadable file counts as 0 and is not cached.
pub async fn count_lines<F: FileSystem>(fs: &F, cache: &ResultCache, path: &Path) -> usize {
    if let Some(count) = cache.get_line_count(path) {
        return count;
    }

    match fs.read_to_string(path).await {
        Ok(content) => {
            let count = content.split('\n').count();
            cache.set_line_count(path, count);
            count
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "failed to count lines");
            0
        }
    }
}

pub async fn total_lines<F: FileSystem>(fs: &F, cache: &ResultCache, paths: &[PathBuf]) -> usize {
    join_all(paths.iter().map(|path| count_lines(fs, cache, path)))
        .await
        .into_iter()
        .sum()
}

/// Last component of `root`, or `bundle` when there is none.
pub fn folder_name(root: &Path) -> String {
    root.to_string_lossy()
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("bundle")
        .to_string()
}

pub fn default_file_name(root: &Path) -> String {
    format!("bundle-{}.txt", folder_name(root))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    pub content: String,
    pub file_name: String,
    /// Selected files actually written into the bundle.
    pub included: usize,
}

/// Concatenate `selection` (in order) into a bundle for `root`.
///
/// Files that cannot be read or hold only whitespace are left out.
pub async fn build_bundle<F: FileSystem>(
    fs: &F,
    root: &Path,
    selection: &[PathBuf],
    settings: &Settings,
) -> Result<Bundle> {
    if selection.is_empty() {
        return Err(BundleError::EmptySelection);
    }

    let folder = folder_name(root);
    let project = settings.project(root);
    let mut content = format!("Listing the contents of the \"{folder}\" folder:\n");

    for pre_text in [&settings.pre_text, &project.pre_text] {
        if !pre_text.is_empty() {
            content.push_str(&format!("\n{pre_text}\n\n{}\n", separator()));
        }
    }

    let mut included = 0;
    for path in selection {
        let text = match fs.read_to_string(path).await {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        if text.trim().is_empty() {
            debug!(path = %path.display(), "skipping empty file");
            continue;
        }

        content.push_str(&format!(
            "\n{}\nFile Path: {}\n\n{text}",
            separator(),
            relative_path(root, path)
        ));
        included += 1;
    }

    for after_text in [&settings.after_text, &project.after_text] {
        if !after_text.is_empty() {
            content.push_str(&format!("\n\n{}\n{after_text}", separator()));
        }
    }

    Ok(Bundle {
        content,
        file_name: format!("bundle-{folder}.txt"),
        included,
    })
}
