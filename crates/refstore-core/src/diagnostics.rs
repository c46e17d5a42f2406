//! Diagnostics sink: the engine's boundary to logging
//!
//! Scanners and comparators report progress, skipped entries, mismatches
//! and fatal aborts through this trait instead of a global logger, so a
//! test can swap in a recording sink and production code can forward to
//! `tracing`. Every method returns `()`: a sink cannot change a result.

use std::path::Path;

use tracing::{error, info, warn};

use crate::compare::Mismatch;
use crate::error::Error;
use crate::scanner::SkippedEntry;

/// Receiver for engine events. All methods default to doing nothing.
pub trait Diagnostics: Send + Sync {
    fn scan_started(&self, _root: &Path) {}

    fn scan_finished(&self, _root: &Path, _files: usize, _directories: usize, _skipped: usize) {}

    fn entry_skipped(&self, _entry: &SkippedEntry) {}

    fn mismatch_found(&self, _mismatch: &Mismatch) {}

    fn aborted(&self, _root: &Path, _error: &Error) {}
}

/// Forwards engine events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn scan_started(&self, root: &Path) {
        info!(root = %root.display(), "Scanning tree");
    }

    fn scan_finished(&self, root: &Path, files: usize, directories: usize, skipped: usize) {
        info!(
            root = %root.display(),
            files,
            directories,
            skipped,
            "✓ Scan completed"
        );
    }

    fn entry_skipped(&self, entry: &SkippedEntry) {
        warn!(path = %entry.path.display(), reason = %entry.reason, "Skipping entry");
    }

    fn mismatch_found(&self, mismatch: &Mismatch) {
        info!(path = %mismatch.path, field = %mismatch.field(), "{mismatch}");
    }

    fn aborted(&self, root: &Path, error: &Error) {
        error!(root = %root.display(), "Aborted: {error}");
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {}
