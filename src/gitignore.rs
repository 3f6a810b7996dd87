//! `.gitignore` parsing and evaluation
//!
//! A small, single-pass model of gitignore:
//!
//! - rules are evaluated in file order
//! - a matching rule marks the path ignored
//! - a matching negated (`!`) rule un-ignores the path and stops evaluation
//! - a rule matches the path itself or any of its ancestor directories,
//!   except a negated rule, which only matches the path itself
//! - rules without a `/` also match a bare file or directory name
//!
//! Patterns are translated to anchored regular expressions. A pattern that
//! fails to compile never matches.

use std::hash::{Hash, Hasher};

use regex::Regex;
use tracing::debug;

/// One parsed line of a `.gitignore` file.
#[derive(Debug, Clone)]
pub struct GitignoreRule {
    /// Pattern text without `!`, leading `./` or `/`, or trailing `/`.
    pub pattern: String,
    pub negated: bool,
    pub dir_only: bool,
    /// True when the pattern should match any path segment by name.
    basename: bool,
    regex: Option<Regex>,
}

impl GitignoreRule {
    /// Parse a single line. Returns `None` for blank lines and comments.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (negated, rest) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let rest = rest.strip_prefix("./").unwrap_or(rest);
        let (anchored, rest) = match rest.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let (dir_only, pattern) = match rest.strip_suffix('/') {
            Some(p) => (true, p),
            None => (false, rest),
        };
        if pattern.is_empty() {
            return None;
        }

        let regex = Regex::new(&glob_to_regex(pattern))
            .inspect_err(|err| debug!(pattern, %err, "ignoring malformed gitignore pattern"))
            .ok();

        Some(Self {
            pattern: pattern.to_string(),
            negated,
            dir_only,
            basename: !anchored && !pattern.contains('/'),
            regex,
        })
    }

    /// Test the rule against a root-relative path using `/` separators.
    ///
    /// Re-including a directory does not re-include files a rule ignored
    /// inside it, so negated rules skip the ancestor check.
    pub fn matches(&self, rel_path: &str, is_dir: bool) -> bool {
        let Some(regex) = &self.regex else {
            return false;
        };

        let test = |candidate: &str| {
            if regex.is_match(candidate) {
                return true;
            }
            self.basename
                && candidate
                    .rsplit('/')
                    .next()
                    .is_some_and(|name| regex.is_match(name))
        };

        // Every proper prefix is an ancestor directory
        let mut ancestors = rel_path.match_indices('/').map(|(i, _)| &rel_path[..i]);
        if !self.negated && ancestors.any(|ancestor| test(ancestor)) {
            return true;
        }

        (is_dir || !self.dir_only) && test(rel_path)
    }

    /// True when this negated rule names something strictly inside `dir`.
    fn reincludes_under(&self, dir: &str) -> bool {
        self.negated
            && self
                .pattern
                .strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Convert a gitignore glob to an anchored regular expression.
///
/// `**/` matches zero or more directories, `*` any run of characters, `?`
/// one character. Everything else is literal.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');

    let mut rest = glob;
    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("**/") {
            out.push_str("(?:.*/)?");
            rest = after;
            continue;
        }
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
        rest = &rest[c.len_utf8()..];
    }

    out.push('$');
    out
}

// The regex is derived from the other fields.
impl Hash for GitignoreRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
        self.negated.hash(state);
        self.dir_only.hash(state);
        self.basename.hash(state);
    }
}

/// Ordered rule list from one `.gitignore`.
#[derive(Debug, Clone, Default, Hash)]
pub struct GitignoreRules {
    rules: Vec<GitignoreRule>,
}

impl GitignoreRules {
    pub fn parse(content: &str) -> Self {
        Self {
            rules: content.lines().filter_map(GitignoreRule::parse).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        let mut ignored = false;
        for rule in &self.rules {
            if !rule.matches(rel_path, is_dir) {
                continue;
            }
            if rule.negated {
                return false;
            }
            ignored = true;
        }

        // Keep an ignored directory visible when a later rule re-includes
        // something beneath it; its other contents stay ignored.
        if ignored && is_dir && self.rules.iter().any(|r| r.reincludes_under(rel_path)) {
            return false;
        }

        ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let rule = GitignoreRule::parse("!./build/").unwrap();
        assert!(rule.negated);
        assert!(rule.dir_only);
        assert_eq!(rule.pattern, "build");

        assert!(GitignoreRule::parse("   ").is_none());
        assert!(GitignoreRule::parse("# comment").is_none());
        assert!(GitignoreRule::parse("/").is_none());
    }

    #[test]
    fn test_glob_to_regex() {
        assert_eq!(glob_to_regex("*.log"), r"^.*\.log$");
        assert_eq!(glob_to_regex("a?c"), "^a.c$");
        assert_eq!(glob_to_regex("**/temp"), "^(?:.*/)?temp$");
        assert_eq!(glob_to_regex("docs/**/*.md"), r"^docs/(?:.*/)?.*\.md$");
    }

    #[test]
    fn test_double_star_matches_zero_segments() {
        let rule = GitignoreRule::parse("docs/**/*.md").unwrap();
        assert!(rule.matches("docs/readme.md", false));
        assert!(rule.matches("docs/a/b/readme.md", false));
        assert!(!rule.matches("src/readme.md", false));
    }

    #[test]
    fn test_basename_rule_matches_at_any_depth() {
        let rules = GitignoreRules::parse("*.log\nnode_modules\n");
        assert!(rules.is_ignored("debug.log", false));
        assert!(rules.is_ignored("logs/deep/debug.log", false));
        assert!(rules.is_ignored("web/node_modules", true));
        assert!(rules.is_ignored("web/node_modules/react/index.js", false));
        assert!(!rules.is_ignored("src/main.rs", false));
    }

    #[test]
    fn test_anchored_rule_only_matches_root() {
        let rules = GitignoreRules::parse("/target\n");
        assert!(rules.is_ignored("target", true));
        assert!(!rules.is_ignored("crates/x/target", true));
    }

    #[test]
    fn test_dir_only_rule_skips_files() {
        let rules = GitignoreRules::parse("cache/\n");
        assert!(rules.is_ignored("cache", true));
        assert!(!rules.is_ignored("cache", false));
        assert!(rules.is_ignored("cache/entry.bin", false));
    }

    #[test]
    fn test_negation_reincludes_single_file() {
        let rules = GitignoreRules::parse("dist/\n!dist/keep.txt\n");
        assert!(!rules.is_ignored("dist", true));
        assert!(!rules.is_ignored("dist/keep.txt", false));
        assert!(rules.is_ignored("dist/bundle.js", false));
        assert!(rules.is_ignored("dist/assets", true));
    }

    #[test]
    fn test_negation_short_circuits() {
        let rules = GitignoreRules::parse("*.txt\n!notes.txt\n*.txt\n");
        assert!(!rules.is_ignored("notes.txt", false));
        assert!(rules.is_ignored("other.txt", false));
    }

    #[test]
    fn test_negated_directory_keeps_ignored_files_inside() {
        let rules = GitignoreRules::parse("*.log\n!important/\n");
        assert!(rules.is_ignored("important/x.log", false));
        assert!(!rules.is_ignored("important", true));
        assert!(!rules.is_ignored("important/notes.txt", false));

        let negated = GitignoreRule::parse("!important/").unwrap();
        assert!(!negated.matches("important/x.log", false));
        assert!(negated.matches("important", true));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let rules = GitignoreRules::parse("file(1).txt\n");
        assert!(rules.is_ignored("file(1).txt", false));
        assert!(!rules.is_ignored("file1.txt", false));
    }
}
