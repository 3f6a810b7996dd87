//! Path exclusion for tree walking
//!
//! A [`PathMatcher`] combines two layers, either of which can exclude a path:
//!
//! - literal patterns from user settings (see [`LiteralRule`])
//! - optional `.gitignore` rules read from the session root
//!
//! Candidates are always matched relative to the root, with `/` separators.
//! Directories are tested with a trailing `/` so that patterns such as
//! `tmp/` or `/gen/` prune the directory itself, not only its contents.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::fs::FileSystem;
use crate::gitignore::GitignoreRules;

/// A user-supplied exclusion pattern, classified once at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralRule {
    /// `/name` or `/dir/`: anchored to the root.
    Anchored(String),
    /// `name/`: the directory anywhere in the tree (substring match).
    Contains(String),
    /// `name` or `.ext`: a whole path segment, an extension, or the whole
    /// relative path.
    Segment(String),
}

impl LiteralRule {
    pub fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() || pattern == "/" {
            return None;
        }
        let pattern = pattern.replace('\\', "/");

        Some(if let Some(anchor) = pattern.strip_prefix('/') {
            LiteralRule::Anchored(anchor.to_string())
        } else if pattern.ends_with('/') {
            LiteralRule::Contains(pattern)
        } else {
            LiteralRule::Segment(pattern)
        })
    }

    /// `rel_path` is root-relative with `/` separators and, for directories,
    /// a trailing `/`.
    pub fn matches(&self, rel_path: &str) -> bool {
        match self {
            LiteralRule::Anchored(anchor) if anchor.ends_with('/') => rel_path.starts_with(anchor),
            LiteralRule::Anchored(anchor) => rel_path
                .strip_prefix(anchor.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
            LiteralRule::Contains(dir) => rel_path.contains(dir.as_str()),
            LiteralRule::Segment(pattern) => {
                let trimmed = rel_path.trim_end_matches('/');
                trimmed == pattern
                    || trimmed.split('/').any(|segment| {
                        segment == pattern || (pattern.starts_with('.') && segment.ends_with(pattern.as_str()))
                    })
            }
        }
    }
}

/// Render `path` relative to `root` using `/` separators.
///
/// Paths outside `root` are returned whole, with separators normalized.
pub fn relative_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path
            .to_string_lossy()
            .replace('\\', "/")
            .trim_start_matches('/')
            .to_string(),
    }
}

/// Compiled exclusion rules for one root.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    root: PathBuf,
    literals: Vec<LiteralRule>,
    gitignore: GitignoreRules,
    fingerprint: u64,
}

impl PathMatcher {
    /// Literal rules only.
    pub fn new(root: impl Into<PathBuf>, patterns: &[String]) -> Self {
        let mut matcher = Self {
            root: root.into(),
            literals: patterns.iter().filter_map(|p| LiteralRule::parse(p)).collect(),
            gitignore: GitignoreRules::default(),
            fingerprint: 0,
        };
        matcher.fingerprint = matcher.compute_fingerprint();
        matcher
    }

    pub fn with_gitignore(mut self, rules: GitignoreRules) -> Self {
        self.gitignore = rules;
        self.fingerprint = self.compute_fingerprint();
        self
    }

    fn compute_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.root.hash(&mut hasher);
        self.literals.hash(&mut hasher);
        self.gitignore.hash(&mut hasher);
        hasher.finish()
    }

    /// Hash of the root and every rule. Two matchers with the same
    /// fingerprint exclude the same paths, so listings filtered by one can
    /// be reused by the other.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Compile literal rules and, if requested, the root's `.gitignore`.
    ///
    /// A missing or unreadable `.gitignore` contributes no rules.
    pub async fn compile<F: FileSystem>(
        fs: &F,
        root: &Path,
        patterns: &[String],
        use_gitignore: bool,
    ) -> Self {
        let matcher = Self::new(root, patterns);
        if !use_gitignore {
            return matcher;
        }

        let gitignore_path = fs.join(root, ".gitignore");
        let rules = match fs.read_to_string(&gitignore_path).await {
            Ok(content) => GitignoreRules::parse(&content),
            Err(err) => {
                debug!(path = %gitignore_path.display(), %err, "no usable .gitignore");
                GitignoreRules::default()
            }
        };
        matcher.with_gitignore(rules)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn gitignore(&self) -> &GitignoreRules {
        &self.gitignore
    }

    pub fn should_exclude(&self, path: &Path, is_dir: bool) -> bool {
        let rel = relative_path(&self.root, path);
        if rel.is_empty() {
            return false;
        }

        let candidate = if is_dir { format!("{rel}/") } else { rel.clone() };
        if self.literals.iter().any(|rule| rule.matches(&candidate)) {
            return true;
        }

        self.gitignore.is_ignored(&rel, is_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatcherKey {
    root: PathBuf,
    patterns: Vec<String>,
    gitignore: bool,
}

/// Memoized matchers, keyed by root and sorted pattern list.
///
/// Owned by a session, so reopening the same folder with unchanged settings
/// reuses the compiled rules (including the parsed `.gitignore`).
#[derive(Debug, Default)]
pub struct MatcherRegistry {
    matchers: HashMap<MatcherKey, Arc<PathMatcher>>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_compile<F: FileSystem>(
        &mut self,
        fs: &F,
        root: &Path,
        patterns: &[String],
        use_gitignore: bool,
    ) -> Arc<PathMatcher> {
        let mut sorted = patterns.to_vec();
        sorted.sort();
        let key = MatcherKey {
            root: root.to_path_buf(),
            patterns: sorted,
            gitignore: use_gitignore,
        };

        if let Some(matcher) = self.matchers.get(&key) {
            debug!(root = %root.display(), "reusing compiled matcher");
            return Arc::clone(matcher);
        }

        let matcher = Arc::new(PathMatcher::compile(fs, root, patterns, use_gitignore).await);
        debug!(
            root = %root.display(),
            patterns = patterns.len(),
            gitignore_rules = matcher.gitignore().len(),
            "compiled matcher"
        );
        self.matchers.insert(key, Arc::clone(&matcher));
        matcher
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Forget every compiled matcher, e.g. after `.gitignore` changed.
    pub fn clear(&mut self) {
        self.matchers.clear();
    }
}
