//! Tree formatter for buffered output
//!
//! This module provides `TreeFormatter` which renders a loaded `FileNode`
//! forest under its root name, either to a string or to stdout with colors.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;

use termcolor::{Color, ColorChoice, ColorSpec, NoColor, StandardStream, WriteColor};

use crate::tree::{FileNode, count_nodes};

use super::config::OutputConfig;

/// Formatter for buffered tree output.
pub struct TreeFormatter {
    config: OutputConfig,
    line_counts: HashMap<PathBuf, usize>,
}

impl TreeFormatter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            line_counts: HashMap::new(),
        }
    }

    /// Annotate these files with their line count.
    pub fn with_line_counts(mut self, line_counts: HashMap<PathBuf, usize>) -> Self {
        self.line_counts = line_counts;
        self
    }

    pub fn format(&self, root_name: &str, nodes: &[FileNode]) -> String {
        let mut out = NoColor::new(Vec::new());
        // Writes into a Vec cannot fail
        let _ = self.write_tree(&mut out, root_name, nodes);
        String::from_utf8_lossy(&out.into_inner()).into_owned()
    }

    pub fn print(&self, root_name: &str, nodes: &[FileNode]) -> io::Result<()> {
        let choice = if self.config.use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let mut stdout = StandardStream::stdout(choice);
        self.write_tree(&mut stdout, root_name, nodes)
    }

    fn write_tree<W: WriteColor>(&self, out: &mut W, root_name: &str, nodes: &[FileNode]) -> io::Result<()> {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
        writeln!(out, "{}", root_name)?;
        out.reset()?;

        self.write_children(out, nodes, "")?;

        let (dir_count, file_count) = count_nodes(nodes);
        writeln!(out)?;
        writeln!(out, "{} directories, {} files", dir_count, file_count)?;
        Ok(())
    }

    fn write_children<W: WriteColor>(&self, out: &mut W, nodes: &[FileNode], prefix: &str) -> io::Result<()> {
        for (i, node) in nodes.iter().enumerate() {
            let is_last = i == nodes.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };
            write!(out, "{}{}", prefix, connector)?;

            match node {
                FileNode::File { name, path } => {
                    out.set_color(ColorSpec::new().set_fg(Some(Color::White)))?;
                    write!(out, "{}", name)?;
                    out.reset()?;
                    if let Some(lines) = self.line_counts.get(path) {
                        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
                        write!(out, "  ({} lines)", lines)?;
                        out.reset()?;
                    }
                    writeln!(out)?;
                }
                FileNode::Dir { name, children, .. } => {
                    out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
                    writeln!(out, "{}", name)?;
                    out.reset()?;

                    if let Some(children) = children {
                        let new_prefix = if is_last {
                            format!("{}    ", prefix)
                        } else {
                            format!("{}│   ", prefix)
                        };
                        self.write_children(out, children, &new_prefix)?;
                    }
                }
            }
        }
        Ok(())
    }
}
