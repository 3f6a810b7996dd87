//! Edge case and error handling tests for bundleit


use harness::{TestProject, run_bundleit};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::{PermissionsExt, symlink};

// ============================================================================
// Symlink Edge Cases
// ============================================================================

#[test]
#[cfg(unix)]
fn test_symlink_to_file_is_skipped() {
    let project = TestProject::new();
    project.add_file("target.rs", "fn target() {}");
    symlink(project.path().join("target.rs"), project.path().join("link.rs"))
        .expect("Failed to create symlink");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success, "bundleit should succeed with symlink");
    assert!(stdout.contains("target.rs"));
    assert!(!stdout.contains("link.rs"), "{}", stdout);
}

#[test]
#[cfg(unix)]
fn test_symlink_to_parent_no_infinite_loop() {
    let project = TestProject::new();
    project.add_file("subdir/file.rs", "");
    symlink("..", project.path().join("subdir/parent")).expect("Failed to create parent symlink");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success, "bundleit should not hang on parent symlink");
    assert!(stdout.contains("file.rs"));
    assert!(!stdout.contains("parent"), "{}", stdout);
}

#[test]
#[cfg(unix)]
fn test_broken_symlink() {
    let project = TestProject::new();
    project.add_file("real.rs", "");
    symlink("nonexistent.rs", project.path().join("broken.rs"))
        .expect("Failed to create broken symlink");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success, "bundleit should handle broken symlinks");
    assert!(stdout.contains("real.rs"));
}

// ============================================================================
// Permission Edge Cases
// ============================================================================

#[test]
#[cfg(unix)]
fn test_unreadable_directory() {
    let project = TestProject::new();
    project.add_file("readable/file.rs", "");

    let unreadable = project.add_dir("unreadable");
    fs::write(unreadable.join("hidden.rs"), "").expect("Failed to write file");

    let mut perms = fs::metadata(&unreadable).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&unreadable, perms).expect("Failed to set permissions");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);

    // Restore permissions for cleanup
    let mut perms = fs::metadata(&unreadable).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&unreadable, perms).expect("Failed to restore permissions");

    assert!(success, "an unreadable subdirectory must not fail the walk");
    assert!(stdout.contains("unreadable"), "{}", stdout);
    assert!(stdout.contains("file.rs"), "{}", stdout);
}

#[test]
#[cfg(unix)]
fn test_unreadable_file_counts_as_zero_lines() {
    let project = TestProject::new();
    let file_path = project.add_file("locked.rs", "a\nb\nc");
    project.add_file("open.rs", "a\nb");

    let mut perms = fs::metadata(&file_path).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&file_path, perms).expect("Failed to set permissions");

    let readable = fs::read_to_string(&file_path).is_ok();
    let (stdout, _stderr, success) =
        run_bundleit(&project, &["--lines", "-s", "locked.rs", "-s", "open.rs"]);

    let mut perms = fs::metadata(&file_path).unwrap().permissions();
    perms.set_mode(0o644);
    fs::set_permissions(&file_path, perms).expect("Failed to restore permissions");

    assert!(success);
    // Running as root ignores file modes
    let expected = if readable { 5 } else { 2 };
    assert!(
        stdout.contains(&format!("{} lines in 2 selected files", expected)),
        "{}",
        stdout
    );
}

// ============================================================================
// File Name Edge Cases
// ============================================================================

#[test]
fn test_filename_with_spaces() {
    let project = TestProject::new();
    project.add_file("my file.rs", "content");
    project.add_file("dir with spaces/nested.rs", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &["-s", "my file.rs", "--bundle", "-o", "-"]);
    assert!(success);
    assert!(stdout.contains("File Path: my file.rs"), "{}", stdout);
}

#[test]
fn test_filename_with_unicode() {
    let project = TestProject::new();
    project.add_file("日本語.rs", "");
    project.add_file("émoji_🦀.rs", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success);
    assert!(stdout.contains("日本語.rs"));
    assert!(stdout.contains("émoji_🦀.rs"));
}

#[test]
fn test_empty_directory() {
    let project = TestProject::new();
    project.add_dir("empty");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success);
    assert!(stdout.contains("└── empty"));
    assert!(stdout.contains("1 directories, 0 files"), "{}", stdout);
}

// ============================================================================
// Gitignore Edge Cases
// ============================================================================

#[test]
fn test_malformed_gitignore() {
    let project = TestProject::new();
    project.add_file("normal.rs", "");
    project.add_file("server.log", "");
    project.add_file(
        ".gitignore",
        r#"
# Comment line
*.log

[invalid
**/
!negation
"#,
    );

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success, "bundleit should handle malformed gitignore");
    assert!(stdout.contains("normal.rs"));
    assert!(!stdout.contains("server.log"), "{}", stdout);
}

#[test]
fn test_double_star_gitignore() {
    let project = TestProject::new();
    project.add_file(".gitignore", "**/fixtures/*.json\n");
    project.add_file("fixtures/a.json", "");
    project.add_file("tests/fixtures/b.json", "");
    project.add_file("tests/fixtures/c.txt", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success);
    assert!(!stdout.contains("a.json"), "{}", stdout);
    assert!(!stdout.contains("b.json"), "{}", stdout);
    assert!(stdout.contains("c.txt"), "{}", stdout);
}

// ============================================================================
// Scale
// ============================================================================

#[test]
fn test_performance_1000_files() {
    use std::time::Instant;

    let project = TestProject::new();
    for i in 0..1000 {
        let file = format!("dir_{:02}/file_{:04}.rs", i / 100, i);
        project.add_file(&file, "");
    }

    let start = Instant::now();
    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    let elapsed = start.elapsed();

    assert!(success, "bundleit should succeed with 1000 files");
    assert!(stdout.contains("10 directories, 1000 files"), "{}", stdout);
    assert!(
        elapsed.as_secs() < 10,
        "listing 1000 files took too long: {:?}",
        elapsed
    );
}

#[test]
fn test_deep_nesting_stops_at_max_depth() {
    let project = TestProject::new();
    project.add_file("l1/l2/l3/l4/l5/l6/l7/l8/l9/l10/bottom.rs", "");

    let (stdout, _stderr, success) = run_bundleit(&project, &[]);
    assert!(success);
    assert!(stdout.contains("l9"), "{}", stdout);
    assert!(!stdout.contains("l10"), "{}", stdout);
    assert!(!stdout.contains("bottom.rs"), "{}", stdout);
}
