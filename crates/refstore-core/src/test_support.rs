//! Fixtures and a recording diagnostics sink shared by unit tests

#![allow(clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::compare::Mismatch;
use crate::diagnostics::Diagnostics;
use crate::error::Error;
use crate::scanner::SkippedEntry;

/// Write `content` to `root/relative`, creating parent directories
pub(crate) fn write(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    fs::write(&path, content).expect("Failed to write file");
    path
}

/// Create `root/relative` as a directory
pub(crate) fn mkdir(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(&path).expect("Failed to create dir");
    path
}

/// `a.txt` = "hello", `sub/b.txt` = "world"
pub(crate) fn sample_tree(root: &Path) {
    write(root, "a.txt", "hello");
    write(root, "sub/b.txt", "world");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Started(PathBuf),
    Finished {
        files: usize,
        directories: usize,
        skipped: usize,
    },
    Skipped(SkippedEntry),
    Mismatch(Mismatch),
    Aborted(String),
}

/// Keeps every event it receives
#[derive(Debug, Default)]
pub(crate) struct RecordingDiagnostics {
    events: Mutex<Vec<Event>>,
}

impl RecordingDiagnostics {
    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().expect("diagnostics lock").clone()
    }

    pub(crate) fn skipped(&self) -> Vec<SkippedEntry> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Skipped(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().expect("diagnostics lock").push(event);
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn scan_started(&self, root: &Path) {
        self.push(Event::Started(root.to_path_buf()));
    }

    fn scan_finished(&self, _root: &Path, files: usize, directories: usize, skipped: usize) {
        self.push(Event::Finished {
            files,
            directories,
            skipped,
        });
    }

    fn entry_skipped(&self, entry: &SkippedEntry) {
        self.push(Event::Skipped(entry.clone()));
    }

    fn mismatch_found(&self, mismatch: &Mismatch) {
        self.push(Event::Mismatch(mismatch.clone()));
    }

    fn aborted(&self, _root: &Path, error: &Error) {
        self.push(Event::Aborted(error.to_string()));
    }
}
