//! CLI entry point for bundleit

use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::debug;

use bundleit::{
    DEFAULT_CACHE_TTL, FileNode, History, OutputConfig, SessionConfig, Settings,
    TokioFs, TreeFormatter, TreeSession, WalkerConfig, folder_name, logging, print_json,
};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            std::io::stdout().is_terminal()
        }
    }
}

/// Walk depth and parallelism preset
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Profile {
    /// Two eager levels, up to 9 deep, 150 parallel reads
    #[default]
    Browse,
    /// One eager level, up to 7 deep, 7 parallel reads
    Light,
}

#[derive(Parser, Debug)]
#[command(name = "bundleit")]
#[command(about = "Browse a directory tree and bundle selected files into one prompt-ready text")]
#[command(version)]
struct Args {
    /// Directory to open
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Exclude paths matching pattern, on top of the configured list (can be used multiple times)
    #[arg(short = 'I', long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Ignore the exclusion list from settings
    #[arg(long = "no-excludes")]
    no_excludes: bool,

    /// Do not read the root's .gitignore
    #[arg(long = "no-gitignore")]
    no_gitignore: bool,

    /// Depth and parallelism preset
    #[arg(long = "profile", value_name = "PROFILE", default_value = "browse")]
    profile: Profile,

    /// Descend at most N levels deep
    #[arg(short = 'L', long = "level")]
    level: Option<usize>,

    /// Levels loaded before the tree is first shown
    #[arg(long = "initial-depth", value_name = "N")]
    initial_depth: Option<usize>,

    /// Maximum number of concurrent directory reads
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<usize>,

    /// How long cached listings stay valid (e.g. 30s, 5m)
    #[arg(long = "cache-ttl", value_name = "DURATION", value_parser = parse_duration_string)]
    cache_ttl: Option<Duration>,

    /// Print the tree as soon as the eager levels are loaded
    #[arg(long = "eager-only")]
    eager_only: bool,

    /// Output in JSON format
    #[arg(long = "json")]
    json: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Select a file, relative to PATH (can be used multiple times)
    #[arg(short = 's', long = "select", value_name = "FILE")]
    select: Vec<PathBuf>,

    /// Also select the files saved for PATH last time
    #[arg(long = "restore-selection")]
    restore_selection: bool,

    /// Show line counts of selected files
    #[arg(long = "lines")]
    lines: bool,

    /// Write the selected files as one bundle
    #[arg(long = "bundle")]
    bundle: bool,

    /// Bundle destination, `-` for stdout (default: ./bundle-<folder>.txt)
    #[arg(short = 'o', long = "output", value_name = "FILE", requires = "bundle")]
    output: Option<PathBuf>,

    /// List recently opened folders and exit
    #[arg(long = "recent")]
    recent: bool,

    /// Settings file
    #[arg(long = "settings", value_name = "FILE", env = "BUNDLEIT_SETTINGS")]
    settings: Option<PathBuf>,

    /// History file
    #[arg(long = "history", value_name = "FILE", env = "BUNDLEIT_HISTORY")]
    history: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

/// Parse a duration string like "30s", "5m" or "1h".
fn parse_duration_string(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| e.to_string())
}

fn walker_config(args: &Args) -> WalkerConfig {
    let mut config = match args.profile {
        Profile::Browse => WalkerConfig::browse(),
        Profile::Light => WalkerConfig::light(),
    };
    if let Some(level) = args.level {
        config = config.with_max_depth(level);
    }
    if let Some(initial_depth) = args.initial_depth {
        config = config.with_initial_depth(initial_depth);
    }
    if let Some(jobs) = args.jobs {
        config = config.with_parallel_limit(jobs);
    }
    config
}

/// Absolute form of `path` with `.` components dropped.
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    joined.components().collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    root: &'a Path,
    tree: &'a [FileNode],
    #[serde(skip_serializing_if = "Option::is_none")]
    selection: Option<&'a [PathBuf]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_lines: Option<usize>,
}

fn print_recent(history: &History, json: bool) -> std::io::Result<()> {
    if json {
        return print_json(history.entries());
    }
    for entry in history.entries() {
        println!(
            "{}  {}  ({})",
            entry.name,
            entry.path.display(),
            entry.last_opened.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("bundleit: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> bundleit::Result<()> {
    let settings_path = args.settings.clone().or_else(Settings::default_path);
    let settings = match &settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let history_path = args.history.clone().or_else(History::default_path);
    let mut history = match &history_path {
        Some(path) => History::load(path)?,
        None => History::default(),
    };

    if args.recent {
        print_recent(&history, args.json)?;
        return Ok(());
    }

    let root = absolute(&args.path);

    let mut excludes = if args.no_excludes {
        Vec::new()
    } else {
        settings.excludes.clone()
    };
    excludes.extend(args.exclude.iter().cloned());

    let config = SessionConfig {
        walker: walker_config(&args),
        cache_ttl: args.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL),
        respect_gitignore: !args.no_gitignore,
        excludes,
    };
    debug!(?config, "starting session");

    let mut session = TreeSession::new(Arc::new(TokioFs), config);
    session.select_root(&root).await?;
    if !args.eager_only {
        session.wait_for_background().await;
    }

    let mut selection: Vec<PathBuf> = args.select.iter().map(|p| root.join(p)).collect();
    if args.restore_selection {
        for saved in history.selections(&root) {
            if !selection.contains(saved) {
                selection.push(saved.clone());
            }
        }
    }

    history.add(&root);
    if !selection.is_empty() {
        history.update_selections(&root, &selection);
    }
    if let Some(path) = &history_path {
        if let Err(e) = history.save(path) {
            eprintln!("bundleit: warning: could not save history: {}", e);
        }
    }

    let mut line_counts = HashMap::new();
    if args.lines {
        for path in &selection {
            line_counts.insert(path.clone(), session.line_count(path).await?);
        }
    }
    let total_lines = args.lines.then(|| line_counts.values().sum::<usize>());

    let bundle_to_stdout = args.output.as_deref() == Some(Path::new("-"));
    let tree = session.tree();

    if args.json {
        let report = Report {
            root: &root,
            tree: &tree,
            selection: (!selection.is_empty()).then_some(selection.as_slice()),
            total_lines,
        };
        if !bundle_to_stdout {
            print_json(&report)?;
        }
    } else if !bundle_to_stdout {
        let formatter = TreeFormatter::new(OutputConfig {
            use_color: should_use_color(args.color),
        })
        .with_line_counts(line_counts);
        formatter.print(&folder_name(&root), &tree)?;
        if let Some(total) = total_lines {
            println!("{} lines in {} selected files", total, selection.len());
        }
    }

    if args.bundle {
        let bundle = session.bundle(&selection, &settings).await?;
        if bundle_to_stdout {
            print!("{}", bundle.content);
        } else {
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&bundle.file_name));
            tokio::fs::write(&output, &bundle.content).await?;
            eprintln!(
                "bundleit: wrote {} files to {}",
                bundle.included,
                output.display()
            );
        }
    }

    Ok(())
}
