//! Tree node type shared by the walker, the session and the formatters

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A file or directory in the browsed tree.
///
/// For directories, `children` carries the load state:
/// - `None`: not expanded
/// - `Some([])`: expansion in flight, or the directory is empty
/// - `Some([..])`: loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileNode {
    File {
        name: String,
        path: PathBuf,
    },
    Dir {
        name: String,
        path: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        children: Option<Vec<FileNode>>,
    },
}

impl FileNode {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        FileNode::File {
            name: name.into(),
            path: path.into(),
        }
    }

    /// An unexpanded directory.
    pub fn dir(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        FileNode::Dir {
            name: name.into(),
            path: path.into(),
            children: None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FileNode::File { name, .. } => name,
            FileNode::Dir { name, .. } => name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileNode::File { path, .. } => path,
            FileNode::Dir { path, .. } => path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileNode::Dir { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self, FileNode::File { .. })
    }

    pub fn children(&self) -> Option<&[FileNode]> {
        match self {
            FileNode::Dir { children, .. } => children.as_deref(),
            FileNode::File { .. } => None,
        }
    }

    /// Replace the children of a directory. Files are left untouched.
    pub fn set_children(&mut self, nodes: Vec<FileNode>) {
        if let FileNode::Dir { children, .. } = self {
            *children = Some(nodes);
        }
    }

    /// Find a child (or deeper descendant) by its absolute path.
    pub fn find(&self, target: &Path) -> Option<&FileNode> {
        if self.path() == target {
            return Some(self);
        }
        if !target.starts_with(self.path()) {
            return None;
        }
        find_node(self.children()?, target)
    }
}

/// Locate a node by path in a forest of siblings.
pub fn find_node<'a>(nodes: &'a [FileNode], target: &Path) -> Option<&'a FileNode> {
    nodes
        .iter()
        .find(|n| target.starts_with(n.path()))
        .and_then(|n| n.find(target))
}

/// Mutable variant of [`find_node`]. Descends only through directories that
/// are ancestors of `target`.
pub fn find_node_mut<'a>(nodes: &'a mut [FileNode], target: &Path) -> Option<&'a mut FileNode> {
    let node = nodes.iter_mut().find(|n| target.starts_with(n.path()))?;
    if node.path() == target {
        return Some(node);
    }
    match node {
        FileNode::Dir {
            children: Some(children),
            ..
        } => find_node_mut(children, target),
        _ => None,
    }
}

/// Sibling order: directories before files, then names compared
/// case-insensitively with lowercase winning ties.
pub fn compare_nodes(a: &FileNode, b: &FileNode) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| compare_names(a.name(), b.name()))
}

fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    // Reversed byte order puts 'a' before 'A'
    folded.then_with(|| b.cmp(a))
}

/// Count (directories, files) in a forest, not counting the forest's parent.
pub fn count_nodes(nodes: &[FileNode]) -> (usize, usize) {
    nodes.iter().fold((0, 0), |(dirs, files), node| match node {
        FileNode::File { .. } => (dirs, files + 1),
        FileNode::Dir { children, .. } => {
            let (d, f) = children.as_deref().map(count_nodes).unwrap_or((0, 0));
            (dirs + 1 + d, files + f)
        }
    })
}
