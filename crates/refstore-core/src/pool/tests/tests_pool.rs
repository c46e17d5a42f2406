//! Tests for the worker pool

#![allow(clippy::expect_used)]

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use crate::compare::MismatchField;
use crate::config::{EngineConfig, SymlinkPolicy};
use crate::error::Error;
use crate::hash::TreeHasher;
use crate::pool::WorkerPool;
use crate::scanner::TreeScanner;
use crate::test_support::{mkdir, sample_tree, write, Event, RecordingDiagnostics};

fn wide_tree(root: &Path) {
    sample_tree(root);
    for i in 0..8 {
        write(root, &format!("branch{i}/leaf.txt"), format!("leaf {i}"));
        write(root, &format!("branch{i}/deeper/more.bin"), vec![i as u8; 1000]);
    }
    mkdir(root, "hollow");
    write(root, "top-level.txt", "top");
}

#[tokio::test]
async fn test_pool_scan_matches_sequential_scan() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    wide_tree(temp_dir.path());
    let config = EngineConfig::default().with_workers(3);

    let pooled = WorkerPool::new(config.clone())
        .scan(temp_dir.path())
        .await
        .expect("Failed to scan");
    let sequential = TreeScanner::new(&config)
        .scan(temp_dir.path())
        .expect("Failed to scan");

    assert_eq!(pooled.files(), sequential.files());
    assert_eq!(pooled.directories(), sequential.directories());
    assert_eq!(pooled.files().len(), 19);
}

#[tokio::test]
async fn test_pool_hash_tree_matches_sequential_hash() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    wide_tree(temp_dir.path());
    let config = EngineConfig::default().with_workers(2);

    let pooled = WorkerPool::new(config.clone())
        .hash_tree(temp_dir.path())
        .await
        .expect("Failed to hash");
    let sequential = TreeHasher::new(&config)
        .hash_tree(temp_dir.path())
        .expect("Failed to hash");

    assert_eq!(pooled, sequential);
}

#[tokio::test]
async fn test_pool_hash_of_empty_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let pooled = WorkerPool::new(EngineConfig::default())
        .hash_tree(temp_dir.path())
        .await
        .expect("Failed to hash");

    assert_eq!(pooled, crate::hash::HexDigest::of_bytes(b""));
}

#[tokio::test]
async fn test_pool_compare_reports_first_mismatch() {
    let left = TempDir::new().expect("Failed to create temp dir");
    let right = TempDir::new().expect("Failed to create temp dir");
    sample_tree(left.path());
    sample_tree(right.path());
    let pool = WorkerPool::new(EngineConfig::default().with_workers(4));

    let equal = pool
        .compare(left.path(), right.path())
        .await
        .expect("Failed to compare");
    assert!(equal.is_equal());

    write(right.path(), "sub/b.txt", "WORLD");
    let differs = pool
        .compare(left.path(), right.path())
        .await
        .expect("Failed to compare");
    let mismatch = differs.first_mismatch().expect("mismatch");
    assert_eq!(mismatch.path, "sub/b.txt");
    assert_eq!(mismatch.field(), MismatchField::ContentHash);
}

#[tokio::test]
async fn test_pool_scan_missing_root_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let recorder = Arc::new(RecordingDiagnostics::default());

    let result = WorkerPool::new(EngineConfig::default())
        .with_diagnostics(recorder.clone())
        .scan(&temp_dir.path().join("missing"))
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(recorder
        .events()
        .iter()
        .any(|e| matches!(e, Event::Aborted(_))));
}

#[tokio::test]
async fn test_pool_hash_tree_rejects_file_root() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write(temp_dir.path(), "file", "data");
    let recorder = Arc::new(RecordingDiagnostics::default());

    let result = WorkerPool::new(EngineConfig::default())
        .with_diagnostics(recorder.clone())
        .hash_tree(&path)
        .await;

    assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    assert!(recorder
        .events()
        .iter()
        .any(|e| matches!(e, Event::Aborted(_))));
}

#[test]
fn test_worker_count_is_at_least_one() {
    let pool = WorkerPool::new(EngineConfig::default().with_workers(0));

    assert_eq!(pool.workers(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_pool_follow_mode_matches_sequential_scan() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    wide_tree(temp_dir.path());
    std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("branch0/up"))
        .expect("symlink");
    let config = EngineConfig::default().with_symlink_policy(SymlinkPolicy::Follow);

    let pooled = WorkerPool::new(config.clone())
        .scan(temp_dir.path())
        .await
        .expect("Failed to scan");
    let sequential = TreeScanner::new(&config)
        .scan(temp_dir.path())
        .expect("Failed to scan");

    assert_eq!(pooled.files(), sequential.files());
    assert_eq!(pooled.skipped(), sequential.skipped());

    let pooled_hash = WorkerPool::new(config.clone())
        .hash_tree(temp_dir.path())
        .await
        .expect("Failed to hash");
    let sequential_hash = TreeHasher::new(&config)
        .hash_tree(temp_dir.path())
        .expect("Failed to hash");
    assert_eq!(pooled_hash, sequential_hash);
}
