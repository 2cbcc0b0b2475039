//! CLI integration tests for linekit.
//!
//! These tests verify argument parsing, progress output, destination
//! content and exit codes for the failure categories.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the linekit binary.
fn cmd() -> Command {
    Command::cargo_bin("linekit").unwrap()
}

fn write_source(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_lists_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--conflict"))
        .stdout(predicate::str::contains("--line-ending"))
        .stdout(predicate::str::contains("--preserve-metadata"))
        .stdout(predicate::str::contains("--no-progress"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("linekit"));
}

#[test]
fn test_missing_arguments_is_usage_error() {
    cmd().assert().failure().code(2);
}

#[test]
fn test_invalid_conflict_value_rejected() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "a\n");
    cmd()
        .arg(&src)
        .arg(dir.path().join("backup.txt"))
        .args(["--conflict", "merge"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Invalid conflict strategy"));
}

// =============================================================================
// Copy Tests
// =============================================================================

#[test]
fn test_copy_prints_marker_per_line_then_done() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "one\ntwo\nthree\n");
    let dst = dir.path().join("backup.txt");

    cmd()
        .arg(&src)
        .arg(&dst)
        .args(["--line-ending", "lf"])
        .assert()
        .success()
        .stdout("...done!\n");

    assert_eq!(fs::read_to_string(&dst).unwrap(), "one\ntwo\nthree\n");
}

#[test]
fn test_copy_empty_source_prints_only_done() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "empty.txt", "");
    let dst = dir.path().join("backup.txt");

    cmd().arg(&src).arg(&dst).assert().success().stdout("done!\n");

    assert!(dst.exists());
    assert_eq!(fs::read_to_string(&dst).unwrap(), "");
}

#[test]
fn test_copy_custom_marker_and_no_progress() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "a\nb\n");

    cmd()
        .arg(&src)
        .arg(dir.path().join("marked.txt"))
        .args(["--marker", "#"])
        .assert()
        .success()
        .stdout("##done!\n");

    cmd()
        .arg(&src)
        .arg(dir.path().join("quiet.txt"))
        .arg("--no-progress")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_copy_crlf_line_ending() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "a\nb");
    let dst = dir.path().join("backup.txt");

    cmd()
        .arg(&src)
        .arg(&dst)
        .args(["--line-ending", "crlf", "--no-progress"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&dst).unwrap(), "a\r\nb\r\n");
}

#[test]
fn test_copy_report_goes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "a\nb\n");

    cmd()
        .arg(&src)
        .arg(dir.path().join("backup.txt"))
        .args(["--report", "--no-progress", "--line-ending", "lf"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "[COPY] lines_read=2 lines_written=2 bytes_written=4 skipped=0 warnings=0",
        ));
}

#[test]
fn test_stdin_to_file() {
    let dir = TempDir::new().unwrap();
    let dst = dir.path().join("from_stdin.txt");

    cmd()
        .arg("-")
        .arg(&dst)
        .args(["--line-ending", "lf"])
        .write_stdin("x\r\ny\n")
        .assert()
        .success()
        .stdout("..done!\n");

    assert_eq!(fs::read_to_string(&dst).unwrap(), "x\ny\n");
}

#[test]
fn test_file_to_stdout_moves_progress_to_stderr() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "alpha\nbeta\n");

    cmd()
        .arg(&src)
        .arg("-")
        .args(["--line-ending", "lf"])
        .assert()
        .success()
        .stdout("alpha\nbeta\n")
        .stderr(predicate::str::contains("..done!"));
}

// =============================================================================
// Conflict Policy Tests
// =============================================================================

#[test]
fn test_conflict_error_keeps_destination() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "new\n");
    let dst = write_source(&dir, "backup.txt", "old\n");

    cmd()
        .arg(&src)
        .arg(&dst)
        .args(["--conflict", "error"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Destination exists"));

    assert_eq!(fs::read_to_string(&dst).unwrap(), "old\n");
}

#[test]
fn test_conflict_append() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "new\n");
    let dst = write_source(&dir, "backup.txt", "old\n");

    cmd()
        .arg(&src)
        .arg(&dst)
        .args(["--conflict", "append", "--line-ending", "lf", "--no-progress"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&dst).unwrap(), "old\nnew\n");
}

#[test]
fn test_conflict_skip_reports_skipped() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "new\n");
    let dst = write_source(&dir, "backup.txt", "old\n");

    cmd()
        .arg(&src)
        .arg(&dst)
        .args(["--conflict", "skip", "--report"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("skipped=1"));

    assert_eq!(fs::read_to_string(&dst).unwrap(), "old\n");
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_missing_source_reports_open_failure_with_cause() {
    let dir = TempDir::new().unwrap();
    let dst = dir.path().join("backup.txt");

    cmd()
        .arg(dir.path().join("readme.txt"))
        .arg(&dst)
        .assert()
        .failure()
        .code(3)
        .stdout(predicate::str::contains("done!").not())
        .stderr(predicate::str::contains("Error: Failed to open source"))
        .stderr(predicate::str::contains("Caused by:"));

    assert!(!dst.exists());
}

#[test]
fn test_same_file_rejected() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "keep\n");

    cmd()
        .arg(&src)
        .arg(&src)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("same file"));

    assert_eq!(fs::read_to_string(&src).unwrap(), "keep\n");
}

#[cfg(unix)]
#[test]
fn test_directory_source_to_stdout_is_setup_failure() {
    let dir = TempDir::new().unwrap();

    cmd()
        .arg(dir.path())
        .arg("-")
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Source is not a regular file"));
}

#[cfg(unix)]
#[test]
fn test_hard_link_destination_rejected() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "keep me\n");
    let alias = dir.path().join("alias.txt");
    fs::hard_link(&src, &alias).unwrap();

    cmd()
        .arg(&src)
        .arg(&alias)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("same file"));

    assert_eq!(fs::read_to_string(&src).unwrap(), "keep me\n");
}

#[test]
fn test_invalid_utf8_source_is_read_failure() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("binary.bin");
    fs::write(&src, [b'o', b'k', b'\n', 0xff, 0xfe, b'\n']).unwrap();
    let dst = dir.path().join("backup.txt");

    cmd()
        .arg(&src)
        .arg(&dst)
        .args(["--line-ending", "lf"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("Failed to read line 2 from source"));

    // The first line was committed before the failure and flushed on release.
    assert_eq!(fs::read_to_string(&dst).unwrap(), "ok\n");
}

#[test]
fn test_invalid_verbosity_rejected() {
    let dir = TempDir::new().unwrap();
    let src = write_source(&dir, "readme.txt", "a\n");

    cmd()
        .arg(&src)
        .arg(dir.path().join("backup.txt"))
        .args(["--verbosity", "loud"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid verbosity"));
}
