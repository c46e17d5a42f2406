//! Tests for the tree scanner

#![allow(clippy::expect_used)]

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use crate::config::{EngineConfig, SymlinkPolicy};
use crate::error::Error;
use crate::hash::HexDigest;
use crate::scanner::{SkipReason, TreeScan, TreeScanner};
use crate::test_support::{mkdir, sample_tree, write, Event, RecordingDiagnostics};

fn scan(root: &std::path::Path) -> TreeScan {
    TreeScanner::new(&EngineConfig::default())
        .scan(root)
        .expect("Failed to scan")
}

fn file_paths(scan: &TreeScan) -> Vec<&str> {
    scan.files().iter().map(|f| f.relative_path.as_str()).collect()
}

#[test]
fn test_scan_records_files_and_directories() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());

    let scan = scan(temp_dir.path());

    assert_eq!(file_paths(&scan), vec!["a.txt", "sub/b.txt"]);
    assert_eq!(scan.directories().len(), 1);
    assert_eq!(scan.directories()[0].relative_path, "sub");
    assert!(!scan.directories()[0].is_empty);
    assert!(scan.skipped().is_empty());
}

#[test]
fn test_file_record_fields() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write(temp_dir.path(), "sub/b.txt", "world");

    let scan = scan(temp_dir.path());
    let record = scan.file("sub/b.txt").expect("record for sub/b.txt");

    assert_eq!(record.size, 5);
    assert_eq!(record.content_hash, HexDigest::of_bytes(b"world"));
    assert_eq!(record.permission_bits & !0o777, 0);
}

#[test]
fn test_records_use_byte_wise_path_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for name in ["a/b", "a.txt", "B", "a-b", "a/a"] {
        write(temp_dir.path(), name, name);
    }

    let scan = scan(temp_dir.path());

    assert_eq!(file_paths(&scan), vec!["B", "a-b", "a.txt", "a/a", "a/b"]);
}

#[test]
fn test_root_is_not_recorded() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let scan = scan(temp_dir.path());

    assert!(scan.files().is_empty());
    assert!(scan.directories().is_empty());
    assert_eq!(scan.root(), temp_dir.path());
}

#[test]
fn test_empty_directories_are_flagged() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    mkdir(temp_dir.path(), "outer/inner");

    let scan = scan(temp_dir.path());

    let outer = scan.directory("outer").expect("outer recorded");
    let inner = scan.directory("outer/inner").expect("inner recorded");
    assert!(!outer.is_empty);
    assert!(inner.is_empty);
}

#[test]
fn test_missing_root_is_not_found_and_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let recorder = Arc::new(RecordingDiagnostics::default());

    let result = TreeScanner::new(&EngineConfig::default())
        .with_diagnostics(recorder.clone())
        .scan(&temp_dir.path().join("missing"));

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(recorder
        .events()
        .iter()
        .any(|e| matches!(e, Event::Aborted(_))));
}

#[test]
fn test_file_root_is_invalid_argument() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write(temp_dir.path(), "plain", "data");

    let result = TreeScanner::new(&EngineConfig::default()).scan(&path);

    assert!(matches!(result, Err(Error::InvalidArgument { .. })));
}

#[test]
fn test_zero_chunk_size_aborts_scan() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());

    let result =
        TreeScanner::new(&EngineConfig::default().with_chunk_size(0)).scan(temp_dir.path());

    assert!(matches!(result, Err(Error::HashEngine(_))));
}

#[test]
fn test_progress_events_are_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());
    let recorder = Arc::new(RecordingDiagnostics::default());

    TreeScanner::new(&EngineConfig::default())
        .with_diagnostics(recorder.clone())
        .scan(temp_dir.path())
        .expect("Failed to scan");

    assert_eq!(
        recorder.events(),
        vec![
            Event::Started(temp_dir.path().to_path_buf()),
            Event::Finished {
                files: 2,
                directories: 1,
                skipped: 0
            },
        ]
    );
}

#[test]
fn test_rescan_of_unchanged_tree_is_identical() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());

    let first = scan(temp_dir.path());
    let second = scan(temp_dir.path());

    assert_eq!(first.files(), second.files());
    assert_eq!(first.directories(), second.directories());
}

#[cfg(unix)]
#[test]
fn test_permission_bits_are_recorded() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write(temp_dir.path(), "script.sh", "#!/bin/sh");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o750)).expect("chmod");
    let dir = mkdir(temp_dir.path(), "private");
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).expect("chmod");

    let scan = scan(temp_dir.path());

    assert_eq!(scan.file("script.sh").expect("file").permission_bits, 0o750);
    assert_eq!(scan.directory("private").expect("dir").permission_bits, 0o700);
}

#[cfg(unix)]
#[test]
fn test_socket_is_skipped_without_failing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());
    let _listener = std::os::unix::net::UnixListener::bind(temp_dir.path().join("sock"))
        .expect("bind socket");
    let recorder = Arc::new(RecordingDiagnostics::default());

    let scan = TreeScanner::new(&EngineConfig::default())
        .with_diagnostics(recorder.clone())
        .scan(temp_dir.path())
        .expect("Failed to scan");

    assert_eq!(file_paths(&scan), vec!["a.txt", "sub/b.txt"]);
    assert_eq!(scan.skipped().len(), 1);
    assert_eq!(scan.skipped()[0].path, temp_dir.path().join("sock"));
    assert_eq!(
        scan.skipped()[0].reason,
        SkipReason::UnsupportedKind {
            kind: "socket".to_string()
        }
    );
    assert_eq!(recorder.skipped(), scan.skipped().to_vec());
}

#[cfg(unix)]
#[test]
fn test_symlinks_skipped_under_default_policy() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());
    std::os::unix::fs::symlink("sub", temp_dir.path().join("alias")).expect("symlink");

    let scan = scan(temp_dir.path());

    assert_eq!(file_paths(&scan), vec!["a.txt", "sub/b.txt"]);
    assert_eq!(
        scan.skipped()[0].reason,
        SkipReason::UnsupportedKind {
            kind: "symlink".to_string()
        }
    );
}

#[cfg(unix)]
#[test]
fn test_symlinks_followed_when_configured() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());
    std::os::unix::fs::symlink("sub", temp_dir.path().join("alias")).expect("symlink");
    let config = EngineConfig::default().with_symlink_policy(SymlinkPolicy::Follow);

    let scan = TreeScanner::new(&config)
        .scan(temp_dir.path())
        .expect("Failed to scan");

    assert_eq!(file_paths(&scan), vec!["a.txt", "alias/b.txt", "sub/b.txt"]);
    assert!(scan.directory("alias").is_some());
}

#[cfg(unix)]
#[test]
fn test_symlink_loop_is_skipped_when_following() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());
    std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("sub/up")).expect("symlink");
    let config = EngineConfig::default().with_symlink_policy(SymlinkPolicy::Follow);

    let scan = TreeScanner::new(&config)
        .scan(temp_dir.path())
        .expect("Failed to scan");

    assert_eq!(file_paths(&scan), vec!["a.txt", "sub/b.txt"]);
    assert!(scan
        .skipped()
        .iter()
        .any(|entry| entry.reason == SkipReason::SymlinkLoop));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());
    let locked = write(temp_dir.path(), "locked", "secret");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");

    // Privileged users can read the file anyway.
    if fs::read(&locked).is_ok() {
        return;
    }

    let scan = scan(temp_dir.path());

    assert_eq!(file_paths(&scan), vec!["a.txt", "sub/b.txt"]);
    assert_eq!(scan.skipped().len(), 1);
    assert!(matches!(scan.skipped()[0].reason, SkipReason::Io { .. }));
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    sample_tree(temp_dir.path());
    let odd = temp_dir.path().join(OsStr::from_bytes(b"bad\xffname"));
    fs::create_dir(&odd).expect("create non-utf8 dir");
    fs::write(odd.join("inside"), "x").expect("write inside");

    let scan = scan(temp_dir.path());

    assert_eq!(file_paths(&scan), vec!["a.txt", "sub/b.txt"]);
    assert_eq!(scan.skipped().len(), 1);
    assert_eq!(scan.skipped()[0].reason, SkipReason::NonUtf8Name);
}
