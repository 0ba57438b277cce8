//! CLI E2E tests against fake proc trees.
//!
//! Validates:
//! - Deleted libraries are reported once per process
//! - Live libraries and non-library deletions are not reported
//! - A process whose maps file disappeared is skipped
//! - Any other open or read failure aborts with no stdout
//! - Exit codes for configuration and collection errors

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

// ============================================================================
// Helpers
// ============================================================================

const FOO_DELETED: &str =
    "7f0000000000-7f0000021000 r-xp 00000000 08:01 131 /lib/x86_64-linux-gnu/libfoo.so.1 (deleted)";
const FOO_LIVE: &str =
    "7f0000000000-7f0000021000 r-xp 00000000 08:01 131 /lib/x86_64-linux-gnu/libfoo.so.1";
const BAR_DELETED: &str = "7f1000000000-7f1000010000 r-xp 00000000 08:01 77 /lib/libbar.so (deleted)";
const HEAP: &str = "55d0c1a2b000-55d0c1a4c000 rw-p 00000000 00:00 0 [heap]";
const ANON: &str = "7ffd1c5e4000-7ffd1c605000 rw-p 00000000 00:00 0";

/// Get a Command for the dls-core binary.
fn dls_core() -> Command {
    let mut cmd = cargo_bin_cmd!("dls-core");
    cmd.timeout(Duration::from_secs(60));
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("DLS_PROC_ROOT");
    cmd.env_remove("DLS_LIBRARY_MARKER");
    cmd.env_remove("DLS_DELETION_MARKER");
    cmd
}

fn write_maps(root: &Path, pid: &str, lines: &[&str]) {
    let dir = root.join(pid);
    fs::create_dir_all(&dir).unwrap();
    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(dir.join("maps"), contents).unwrap();
}

fn fake_proc() -> TempDir {
    tempdir().expect("tempdir")
}

fn scan(root: &Path) -> String {
    let output = dls_core()
        .arg("--proc-root")
        .arg(root)
        .assert()
        .success()
        .code(0)
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf-8 stdout")
}

fn series(text: &str) -> Vec<String> {
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Successful scans
// ============================================================================

#[test]
fn test_single_deleted_library() {
    let proc = fake_proc();
    write_maps(proc.path(), "101", &[ANON, HEAP, FOO_DELETED]);

    let text = scan(proc.path());
    assert!(text.contains("# TYPE node_processes_linking_deleted_libraries gauge"));

    let lines = series(&text);
    assert_eq!(lines.len(), 1, "{text}");
    assert!(lines[0].starts_with("node_processes_linking_deleted_libraries{"));
    assert!(lines[0].contains(r#"library_path="/lib/x86_64-linux-gnu""#));
    assert!(lines[0].contains(r#"library_name="libfoo.so.1""#));
    assert!(lines[0].ends_with(" 1"));
}

#[test]
fn test_live_library_not_reported() {
    let proc = fake_proc();
    write_maps(proc.path(), "101", &[FOO_LIVE]);

    let text = scan(proc.path());
    assert!(series(&text).is_empty(), "{text}");
    assert!(text.contains(
        "# HELP node_processes_linking_deleted_libraries Count of running processes that link a deleted library"
    ));
    assert!(text.contains("# TYPE node_processes_linking_deleted_libraries gauge"));
}

#[test]
fn test_repeated_mappings_count_once_per_process() {
    let proc = fake_proc();
    write_maps(proc.path(), "101", &[BAR_DELETED, BAR_DELETED]);
    write_maps(proc.path(), "102", &[BAR_DELETED]);
    write_maps(proc.path(), "103", &[FOO_LIVE]);

    let lines = series(&scan(proc.path()));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#"library_path="/lib""#));
    assert!(lines[0].contains(r#"library_name="libbar.so""#));
    assert!(lines[0].ends_with(" 2"), "{}", lines[0]);
}

#[test]
fn test_vanished_process_is_skipped() {
    let proc = fake_proc();
    write_maps(proc.path(), "101", &[FOO_DELETED]);
    // Directory listed but maps already gone.
    fs::create_dir(proc.path().join("999")).unwrap();
    // Dangling link behaves like a file removed after enumeration.
    fs::create_dir(proc.path().join("998")).unwrap();
    symlink("/nonexistent/maps", proc.path().join("998/maps")).unwrap();

    let lines = series(&scan(proc.path()));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" 1"));
}

#[test]
fn test_non_process_entries_ignored() {
    let proc = fake_proc();
    write_maps(proc.path(), "101", &[BAR_DELETED]);
    write_maps(proc.path(), "self", &[BAR_DELETED]);
    write_maps(proc.path(), "thread-self", &[BAR_DELETED]);

    let lines = series(&scan(proc.path()));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" 1"), "{}", lines[0]);
}

#[test]
fn test_proc_root_from_env() {
    let proc = fake_proc();
    write_maps(proc.path(), "7", &[BAR_DELETED]);

    dls_core()
        .env("DLS_PROC_ROOT", proc.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"library_name="libbar.so""#));
}

#[test]
fn test_logs_stay_on_stderr() {
    let proc = fake_proc();
    write_maps(proc.path(), "101", &[FOO_DELETED, BAR_DELETED]);
    fs::create_dir(proc.path().join("999")).unwrap();

    let output = dls_core()
        .arg("--proc-root")
        .arg(proc.path())
        .args(["--log-level", "trace", "--log-format", "json"])
        .assert()
        .success()
        .get_output()
        .clone();

    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    assert!(!stdout.is_empty());
    for line in stdout.lines() {
        assert!(
            line.starts_with('#') || line.starts_with("node_processes_linking_deleted_libraries"),
            "unexpected stdout line: {line}"
        );
    }
    assert_eq!(series(&stdout).len(), 2, "{stdout}");

    let stderr = String::from_utf8(output.stderr).expect("utf-8 stderr");
    assert!(!stderr.trim().is_empty(), "trace logging should reach stderr");
    for line in stderr.lines() {
        let _: Value = serde_json::from_str(line).expect("stderr log line is JSON");
    }
}

#[test]
fn test_json_format() {
    let proc = fake_proc();
    write_maps(proc.path(), "101", &[BAR_DELETED]);
    write_maps(proc.path(), "102", &[BAR_DELETED, FOO_DELETED]);
    fs::create_dir(proc.path().join("999")).unwrap();

    let output = dls_core()
        .arg("--proc-root")
        .arg(proc.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).expect("parse JSON");
    assert_eq!(json["processes_scanned"], 2);
    assert_eq!(json["processes_vanished"], 1);
    assert_eq!(json["processes_affected"], 2);

    let libraries = json["libraries"].as_array().expect("libraries array");
    assert_eq!(libraries.len(), 2);
    assert_eq!(libraries[0]["library_path"], "/lib");
    assert_eq!(libraries[0]["library_name"], "libbar.so");
    assert_eq!(libraries[0]["processes"], 2);
    assert_eq!(libraries[1]["library_path"], "/lib/x86_64-linux-gnu");
    assert_eq!(libraries[1]["processes"], 1);
}

// ============================================================================
// Fatal errors
// ============================================================================

#[test]
fn test_unopenable_maps_aborts_without_output() {
    let proc = fake_proc();
    write_maps(proc.path(), "101", &[FOO_DELETED]);
    fs::create_dir(proc.path().join("500")).unwrap();
    // Self-referencing link: open fails with ELOOP, not NotFound.
    symlink("maps", proc.path().join("500/maps")).unwrap();

    dls_core()
        .arg("--proc-root")
        .arg(proc.path())
        .assert()
        .failure()
        .code(11)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to open file"))
        .stderr(predicate::str::contains("500/maps"));
}

#[test]
fn test_read_failure_aborts_without_output() {
    let proc = fake_proc();
    write_maps(proc.path(), "101", &[FOO_DELETED]);
    // A directory opens fine but cannot be read.
    fs::create_dir_all(proc.path().join("600/maps")).unwrap();

    dls_core()
        .arg("--proc-root")
        .arg(proc.path())
        .assert()
        .failure()
        .code(11)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to read file"));
}

#[test]
fn test_invalid_utf8_aborts() {
    let proc = fake_proc();
    fs::create_dir(proc.path().join("42")).unwrap();
    fs::write(
        proc.path().join("42/maps"),
        b"7f00-7f01 r-xp 0 08:01 1 /lib/\xfe\xff.so (deleted)\n",
    )
    .unwrap();

    dls_core()
        .arg("--proc-root")
        .arg(proc.path())
        .assert()
        .failure()
        .code(11)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("not valid UTF-8"));
}

#[test]
fn test_missing_proc_root_aborts() {
    let proc = fake_proc();

    dls_core()
        .arg("--proc-root")
        .arg(proc.path().join("missing"))
        .assert()
        .failure()
        .code(11)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_empty_marker_is_config_error() {
    let proc = fake_proc();

    dls_core()
        .arg("--proc-root")
        .arg(proc.path())
        .args(["--library-marker", ""])
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("library marker"));
}
