//! Keyed merge walk over two canonical record sequences

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::mismatch::{Comparison, Divergence, EntryKind, Mismatch};
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::Result;
use crate::scanner::{DirectoryRecord, FileRecord, TreeScan, TreeScanner};

/// A record that can be merged by relative path
trait Keyed {
    const KIND: EntryKind;

    fn key(&self) -> &str;

    /// First differing field between two records with the same key
    fn diverge(&self, other: &Self) -> Option<Divergence>;
}

impl Keyed for FileRecord {
    const KIND: EntryKind = EntryKind::File;

    fn key(&self) -> &str {
        &self.relative_path
    }

    fn diverge(&self, other: &Self) -> Option<Divergence> {
        if self.size != other.size {
            return Some(Divergence::Size {
                left: self.size,
                right: other.size,
            });
        }
        if self.permission_bits != other.permission_bits {
            return Some(Divergence::PermissionBits {
                left: self.permission_bits,
                right: other.permission_bits,
            });
        }
        if self.content_hash != other.content_hash {
            return Some(Divergence::ContentHash {
                left: self.content_hash.clone(),
                right: other.content_hash.clone(),
            });
        }
        None
    }
}

impl Keyed for DirectoryRecord {
    const KIND: EntryKind = EntryKind::Directory;

    fn key(&self) -> &str {
        &self.relative_path
    }

    fn diverge(&self, other: &Self) -> Option<Divergence> {
        if self.is_empty != other.is_empty {
            return Some(Divergence::IsEmpty {
                left: self.is_empty,
                right: other.is_empty,
            });
        }
        if self.permission_bits != other.permission_bits {
            return Some(Divergence::PermissionBits {
                left: self.permission_bits,
                right: other.permission_bits,
            });
        }
        None
    }
}

/// Merge two sorted sequences, stopping at the first divergence.
///
/// Equality requires both sequences to run out together: a record left
/// over on either side is reported as present on that side only.
fn first_divergence<T: Keyed>(left: &[T], right: &[T]) -> Option<Mismatch> {
    let (mut i, mut j) = (0, 0);

    loop {
        let (path, divergence) = match (left.get(i), right.get(j)) {
            (None, None) => return None,
            (Some(a), None) => (a.key(), Divergence::OnlyInLeft),
            (None, Some(b)) => (b.key(), Divergence::OnlyInRight),
            (Some(a), Some(b)) => match a.key().cmp(b.key()) {
                Ordering::Less => (a.key(), Divergence::OnlyInLeft),
                Ordering::Greater => (b.key(), Divergence::OnlyInRight),
                Ordering::Equal => match a.diverge(b) {
                    Some(divergence) => (a.key(), divergence),
                    None => {
                        i += 1;
                        j += 1;
                        continue;
                    }
                },
            },
        };
        return Some(Mismatch::new(T::KIND, path, divergence));
    }
}

/// Compare two scans: files first, then directories
#[must_use]
pub fn compare_scans(left: &TreeScan, right: &TreeScan) -> Comparison {
    first_divergence(left.files(), right.files())
        .or_else(|| first_divergence(left.directories(), right.directories()))
        .into()
}

/// Decides whether two directory trees have identical content and structure
#[derive(Clone)]
pub struct TreeComparator {
    scanner: TreeScanner,
    diagnostics: Arc<dyn Diagnostics>,
}

impl TreeComparator {
    /// Create a comparator reporting to `tracing`
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scanner: TreeScanner::new(config),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Replace the diagnostics sink (used by both scans and the comparison)
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.scanner = self.scanner.with_diagnostics(Arc::clone(&diagnostics));
        self.diagnostics = diagnostics;
        self
    }

    /// Scan both roots and compare them
    ///
    /// # Errors
    /// Returns the scan error of whichever root could not be scanned; a
    /// difference between the trees is never an error.
    pub fn compare(&self, left: &Path, right: &Path) -> Result<Comparison> {
        let left_scan = self.scanner.scan(left)?;
        let right_scan = self.scanner.scan(right)?;
        Ok(self.compare_scans(&left_scan, &right_scan))
    }

    /// Compare two existing scans, reporting any mismatch
    #[must_use]
    pub fn compare_scans(&self, left: &TreeScan, right: &TreeScan) -> Comparison {
        let comparison = compare_scans(left, right);
        match comparison.first_mismatch() {
            Some(mismatch) => self.diagnostics.mismatch_found(mismatch),
            None => debug!(
                "{} and {} are identical",
                left.root().display(),
                right.root().display()
            ),
        }
        comparison
    }
}
