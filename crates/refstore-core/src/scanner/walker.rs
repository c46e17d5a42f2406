//! Tree walker: Builds a `TreeScan` from a directory on disk

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use super::record::{DirectoryRecord, FileRecord, SkipReason, SkippedEntry, TreeScan};
use super::{describe_file_type, permission_bits};
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::{Error, Result};
use crate::hash::ContentHasher;

/// Scanner producing canonical record sets for a directory tree
#[derive(Clone)]
pub struct TreeScanner {
    content: ContentHasher,
    follow_links: bool,
    diagnostics: Arc<dyn Diagnostics>,
}

impl TreeScanner {
    /// Create a scanner reporting to `tracing`
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            content: ContentHasher::from_config(config),
            follow_links: config.follow_links(),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Replace the diagnostics sink
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Scan every entry below `root`
    ///
    /// Unreadable or unsupported entries are skipped and listed in
    /// [`TreeScan::skipped`]; they never fail the scan.
    ///
    /// # Errors
    /// Returns `NotFound` if `root` is absent, `InvalidArgument` if it is not
    /// a directory, and `HashEngine` if the content hasher is unusable.
    pub fn scan(&self, root: &Path) -> Result<TreeScan> {
        self.diagnostics.scan_started(root);

        if let Err(e) = self.check_root(root) {
            self.diagnostics.aborted(root, &e);
            return Err(e);
        }

        let mut scan = TreeScan::new(root);
        self.walk_into(root, "", None, &mut scan);
        scan.sort();

        self.finish(&scan);
        Ok(scan)
    }

    /// Validate a scan root before any traversal starts
    pub(crate) fn check_root(&self, root: &Path) -> Result<()> {
        let metadata = fs::metadata(root).map_err(|e| Error::from_root(root, e))?;
        if !metadata.is_dir() {
            return Err(Error::invalid(root, "not a directory"));
        }
        self.content.ensure_usable()
    }

    pub(crate) fn finish(&self, scan: &TreeScan) {
        self.diagnostics.scan_finished(
            scan.root(),
            scan.files().len(),
            scan.directories().len(),
            scan.skipped().len(),
        );
    }

    /// Record the entries below `dir` into `scan`, prefixing relative paths
    /// with `prefix`. `max_depth` limits descent (1 = immediate children).
    pub(crate) fn walk_into(
        &self,
        dir: &Path,
        prefix: &str,
        max_depth: Option<usize>,
        scan: &mut TreeScan,
    ) {
        let mut walker = WalkDir::new(dir)
            .min_depth(1)
            .follow_links(self.follow_links)
            .sort_by_file_name();
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth);
        }

        let mut entries = walker.into_iter();
        while let Some(next) = entries.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    self.skip_walk_error(dir, &e, scan);
                    continue;
                }
            };

            if !self.record_entry(dir, prefix, entry, scan) {
                entries.skip_current_dir();
            }
        }
    }

    /// Record one walked entry. Returns `false` only for a directory the
    /// walk must not descend into.
    fn record_entry(&self, dir: &Path, prefix: &str, entry: DirEntry, scan: &mut TreeScan) -> bool {
        let file_type = entry.file_type();

        let Some(relative) = relative_path(dir, entry.path(), prefix) else {
            self.skip(scan, entry.into_path(), SkipReason::NonUtf8Name);
            return !file_type.is_dir();
        };

        if file_type.is_file() {
            match self.file_record(&entry, relative) {
                Ok(record) => scan.push_file(record),
                Err(reason) => self.skip(scan, entry.into_path(), reason),
            }
        } else if file_type.is_dir() {
            match self.directory_record(&entry, relative) {
                Ok(record) => scan.push_directory(record),
                Err(reason) => {
                    self.skip(scan, entry.into_path(), reason);
                    return false;
                }
            }
        } else {
            let kind = describe_file_type(&file_type).to_string();
            self.skip(scan, entry.into_path(), SkipReason::UnsupportedKind { kind });
        }
        true
    }

    fn skip_walk_error(&self, dir: &Path, error: &walkdir::Error, scan: &mut TreeScan) {
        let path = error.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
        let reason = if error.loop_ancestor().is_some() {
            SkipReason::SymlinkLoop
        } else {
            SkipReason::Io {
                message: error.to_string(),
            }
        };
        self.skip(scan, path, reason);
    }

    fn file_record(
        &self,
        entry: &DirEntry,
        relative_path: String,
    ) -> std::result::Result<FileRecord, SkipReason> {
        let metadata = entry.metadata().map_err(|e| SkipReason::Io {
            message: e.to_string(),
        })?;
        let content_hash = self.content.hash(entry.path()).map_err(|e| SkipReason::Io {
            message: e.to_string(),
        })?;
        trace!("Hashed {} -> {}", relative_path, content_hash);

        Ok(FileRecord {
            relative_path,
            size: metadata.len(),
            permission_bits: permission_bits(&metadata),
            content_hash,
        })
    }

    fn directory_record(
        &self,
        entry: &DirEntry,
        relative_path: String,
    ) -> std::result::Result<DirectoryRecord, SkipReason> {
        let metadata = entry.metadata().map_err(|e| SkipReason::Io {
            message: e.to_string(),
        })?;
        let is_empty = fs::read_dir(entry.path())
            .map_err(|e| SkipReason::from_io(&e))?
            .next()
            .is_none();

        Ok(DirectoryRecord {
            relative_path,
            is_empty,
            permission_bits: permission_bits(&metadata),
        })
    }

    fn skip(&self, scan: &mut TreeScan, path: PathBuf, reason: SkipReason) {
        debug!("Skipping {}: {}", path.display(), reason);
        let entry = SkippedEntry { path, reason };
        self.diagnostics.entry_skipped(&entry);
        scan.push_skipped(entry);
    }
}

/// `/`-joined path of `path` below `base`, behind `prefix`.
/// `None` if any component is not valid UTF-8.
fn relative_path(base: &Path, path: &Path, prefix: &str) -> Option<String> {
    let stripped = path.strip_prefix(base).ok()?;
    let mut joined = String::from(prefix);

    for component in stripped.components() {
        let Component::Normal(name) = component else {
            continue;
        };
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(name.to_str()?);
    }

    Some(joined)
}
