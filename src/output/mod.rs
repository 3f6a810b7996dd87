//! Tree formatting and display
//!
//! - `config` - Output configuration types
//! - `tree` - Console tree formatter with colors
//! - `json` - JSON output

mod config;
mod json;
mod tree;

pub use config::OutputConfig;
pub use json::print_json;
pub use tree::TreeFormatter;
