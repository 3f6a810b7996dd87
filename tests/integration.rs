//! Integration tests for bundleit


use assert_cmd::Command;
use harness::{TestProject, run_bundleit};
use predicates::prelude::*;

#[test]
fn test_basic_tree_output() {
    let project = TestProject::new();
    project.add_file("main.rs", "fn main() {}");
    project.add_file("src/lib.rs", "pub mod foo;");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success, "bundleit should succeed");
    assert!(stdout.contains("├── src"), "should show src: {}", stdout);
    assert!(stdout.contains("│   └── lib.rs"), "should nest lib.rs: {}", stdout);
    assert!(stdout.contains("└── main.rs"), "should show main.rs: {}", stdout);
    assert!(stdout.contains("1 directories, 2 files"), "{}", stdout);
}

#[test]
fn test_default_excludes_hide_vendor_directories() {
    let project = TestProject::new();
    project.add_file("index.js", "console.log(1)");
    project.add_file("node_modules/left-pad/index.js", "module.exports = 1");
    project.add_file(".git/config", "[core]");
    project.add_file("yarn.lock", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success);
    assert!(stdout.contains("index.js"));
    assert!(!stdout.contains("node_modules"), "{}", stdout);
    assert!(!stdout.contains(".git"), "{}", stdout);
    assert!(!stdout.contains("yarn.lock"), "{}", stdout);
}

#[test]
fn test_no_excludes_shows_everything() {
    let project = TestProject::new();
    project.add_file("node_modules/pkg/index.js", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &["--no-excludes"]);
    assert!(success);
    assert!(stdout.contains("node_modules"), "{}", stdout);
}

#[test]
fn test_exclude_flag_adds_pattern() {
    let project = TestProject::new();
    project.add_file("keep.rs", "");
    project.add_file("generated/out.rs", "");
    project.add_file("src/generated/more.rs", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &["-I", "generated"]);
    assert!(success);
    assert!(stdout.contains("keep.rs"));
    assert!(!stdout.contains("generated"), "{}", stdout);
}

#[test]
fn test_anchored_exclude_only_matches_at_root() {
    let project = TestProject::new();
    project.add_file("docs/top.md", "");
    project.add_file("src/docs/inner.md", "");
    project.add_file("docsite/index.md", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &["--no-excludes", "-I", "/docs"]);
    assert!(success);
    assert!(!stdout.contains("top.md"), "{}", stdout);
    assert!(stdout.contains("inner.md"), "{}", stdout);
    assert!(stdout.contains("docsite"), "{}", stdout);
}

#[test]
fn test_gitignore_filtering() {
    let project = TestProject::new();
    project.add_file("main.rs", "fn main() {}");
    project.add_file("debug.log", "log content");
    project.add_file(".gitignore", "*.log\n");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success);
    assert!(stdout.contains("main.rs"));
    assert!(!stdout.contains("debug.log"), "{}", stdout);

    let (stdout, _stderr, success) = run_bundleit(&project, &["--no-gitignore"]);
    assert!(success);
    assert!(stdout.contains("debug.log"), "{}", stdout);
}

#[test]
fn test_gitignore_negation_under_ignored_directory() {
    let project = TestProject::new();
    project.add_file(".gitignore", "dist/\n!dist/keep.txt\n");
    project.add_file("dist/keep.txt", "kept");
    project.add_file("dist/bundle.js", "dropped");

    let (stdout, _stderr, success) = run_bundleit(&project, &["--no-excludes"]);
    assert!(success);
    assert!(stdout.contains("dist"), "{}", stdout);
    assert!(stdout.contains("keep.txt"), "{}", stdout);
    assert!(!stdout.contains("bundle.js"), "{}", stdout);
}

#[test]
fn test_depth_limit() {
    let project = TestProject::new();
    project.add_file("top.rs", "");
    project.add_file("level1/mid.rs", "");
    project.add_file("level1/level2/deep.rs", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &["-L", "1"]);
    assert!(success);
    assert!(stdout.contains("top.rs"));
    assert!(stdout.contains("level1"));
    assert!(!stdout.contains("mid.rs"), "{}", stdout);
    assert!(!stdout.contains("deep.rs"), "{}", stdout);
}

#[test]
fn test_background_levels_are_loaded_before_printing() {
    let project = TestProject::new();
    project.add_file("a/b/c/d/e/deep.txt", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &["--profile", "light"]);
    assert!(success);
    assert!(stdout.contains("deep.txt"), "{}", stdout);
}

#[test]
fn test_eager_only_stops_at_initial_depth() {
    let project = TestProject::new();
    project.add_file("a/b/c/deep.txt", "");

    let (stdout, _stderr, success) =
        run_bundleit(&project, &["--profile", "light", "--eager-only"]);
    assert!(success);
    assert!(stdout.contains("b"), "{}", stdout);
    assert!(!stdout.contains("deep.txt"), "{}", stdout);
}

#[test]
fn test_sorting_order() {
    let project = TestProject::new();
    project.add_file("b.txt", "");
    project.add_file("a.txt", "");
    project.add_file("A/inner.txt", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success);
    let dir = stdout.find("── A").expect("missing A");
    let a = stdout.find("── a.txt").expect("missing a.txt");
    let b = stdout.find("── b.txt").expect("missing b.txt");
    assert!(dir < a && a < b, "{}", stdout);
}

#[test]
fn test_json_output() {
    let project = TestProject::new();
    project.add_file("src/main.rs", "fn main() {}");

    let (stdout, _stderr, success) = run_bundleit(&project, &["--json"]);
    assert!(success);

    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let tree = parsed["tree"].as_array().expect("tree array");
    assert_eq!(tree[0]["type"], "dir");
    assert_eq!(tree[0]["name"], "src");
    assert_eq!(tree[0]["children"][0]["name"], "main.rs");
    assert_eq!(tree[0]["children"][0]["type"], "file");
    assert!(parsed.get("selection").is_none());
}

#[test]
fn test_line_counts_for_selection() {
    let project = TestProject::new();
    project.add_file("src/main.rs", "fn main() {\n}\n");
    project.add_file("README.md", "# Title");

    let (stdout, _stderr, success) =
        run_bundleit(&project, &["--lines", "-s", "src/main.rs", "-s", "README.md"]);
    assert!(success);
    assert!(stdout.contains("main.rs  (3 lines)"), "{}", stdout);
    assert!(stdout.contains("README.md  (1 lines)"), "{}", stdout);
    assert!(stdout.contains("4 lines in 2 selected files"), "{}", stdout);
}

#[test]
fn test_bundle_written_to_file() {
    let project = TestProject::new();
    project.add_file("src/main.rs", "fn main() {}\n");
    project.add_file("empty.txt", "   \n");

    let (_stdout, stderr, success) = run_bundleit(
        &project,
        &["--bundle", "-s", "src/main.rs", "-s", "empty.txt", "-o", "out.txt"],
    );
    assert!(success, "{}", stderr);
    assert!(stderr.contains("wrote 1 files to out.txt"), "{}", stderr);

    let content = project.read("out.txt");
    assert!(content.starts_with("Listing the contents of the \""));
    assert!(content.contains(&format!("{}\nFile Path: src/main.rs\n\nfn main() {{}}\n", "=".repeat(55))));
    assert!(!content.contains("empty.txt"));
}

#[test]
fn test_bundle_default_file_name() {
    let project = TestProject::new();
    project.add_file("a.txt", "alpha");
    let folder = project
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();

    let (_stdout, stderr, success) = run_bundleit(&project, &["--bundle", "-s", "a.txt"]);
    assert!(success, "{}", stderr);
    let content = project.read(&format!("bundle-{}.txt", folder));
    assert!(content.contains("File Path: a.txt"));
}

#[test]
fn test_bundle_to_stdout_with_settings_texts() {
    let project = TestProject::new();
    project.add_file("a.txt", "alpha");
    project.write_settings(r#"{"preText": "Please review", "afterText": "Thanks"}"#);

    Command::from_std(project.command())
        .args(["--bundle", "-s", "a.txt", "-o", "-"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Listing the contents of the"))
        .stdout(predicate::str::contains("\nPlease review\n\n"))
        .stdout(predicate::str::contains("File Path: a.txt\n\nalpha"))
        .stdout(predicate::str::ends_with("\nThanks"))
        .stdout(predicate::str::contains("directories,").not());
}

#[test]
fn test_bundle_without_selection_fails() {
    let project = TestProject::new();
    project.add_file("a.txt", "alpha");

    Command::from_std(project.command())
        .args(["--bundle", "-o", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bundleit: no files selected"));
}

#[test]
fn test_settings_excludes_are_used() {
    let project = TestProject::new();
    project.add_file("keep.rs", "");
    project.add_file("secret/key.pem", "");
    project.write_settings(r#"{"excludes": ["secret"]}"#);

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success);
    assert!(stdout.contains("keep.rs"));
    assert!(!stdout.contains("secret"), "{}", stdout);
}

#[test]
fn test_invalid_settings_fails() {
    let project = TestProject::new();
    project.add_file("a.txt", "");
    project.write_settings("{ not json");

    Command::from_std(project.command())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn test_history_remembers_selection() {
    let project = TestProject::new();
    project.add_file("a.txt", "alpha");
    project.add_file("b.txt", "beta");

    let (_stdout, _stderr, success) = run_bundleit(&project, &["-s", "a.txt"]);
    assert!(success);

    let (stdout, _stderr, success) = run_bundleit(&project, &["--recent"]);
    assert!(success);
    let folder = project.path().file_name().unwrap().to_string_lossy().to_string();
    assert!(stdout.contains(&folder), "{}", stdout);

    let (stdout, stderr, success) =
        run_bundleit(&project, &["--restore-selection", "--bundle", "-o", "-"]);
    assert!(success, "{}", stderr);
    assert!(stdout.contains("File Path: a.txt"), "{}", stdout);
    assert!(!stdout.contains("b.txt"), "{}", stdout);
}

#[test]
fn test_recent_json() {
    let project = TestProject::new();
    project.add_file("a.txt", "");

    let (_stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success);

    let (stdout, _stderr, success) = run_bundleit(&project, &["--recent", "--json"]);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let entries = parsed.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert!(entries[0]["lastOpened"].is_string());
}

#[test]
fn test_missing_directory_fails() {
    let project = TestProject::new();

    Command::from_std(project.command())
        .arg("does-not-exist")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read directory"));
}

#[test]
fn test_invalid_cache_ttl_is_rejected() {
    let project = TestProject::new();

    Command::from_std(project.command())
        .args(["--cache-ttl", "soon"])
        .assert()
        .failure();
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("bundleit")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bundleit"));
}
