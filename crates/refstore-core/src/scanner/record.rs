//! Scan records and the scan result

use std::fs::{FileType, Metadata};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::HexDigest;

/// A regular file found by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the scan root, `/`-separated
    pub relative_path: String,
    /// Size in bytes
    pub size: u64,
    /// Owner/group/other rwx bits (`0o777` mask)
    pub permission_bits: u32,
    /// SHA-256 of the file content
    pub content_hash: HexDigest,
}

/// A directory found by a scan (the root itself is never recorded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Path relative to the scan root, `/`-separated
    pub relative_path: String,
    /// Whether the directory had no entries at all when scanned
    pub is_empty: bool,
    /// Owner/group/other rwx bits (`0o777` mask)
    pub permission_bits: u32,
}

/// Why an entry was left out of a scan or a tree digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Symlink, FIFO, socket or device node
    UnsupportedKind { kind: String },
    /// The entry could not be read
    Io { message: String },
    /// The entry name is not valid UTF-8
    NonUtf8Name,
    /// A followed link points back at one of its own ancestors
    SymlinkLoop,
}

impl SkipReason {
    pub(crate) fn from_io(error: &std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedKind { kind } => write!(f, "unsupported entry kind ({kind})"),
            Self::Io { message } => write!(f, "i/o error: {message}"),
            Self::NonUtf8Name => write!(f, "name is not valid UTF-8"),
            Self::SymlinkLoop => write!(f, "symlink loop"),
        }
    }
}

/// An entry omitted from the record sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of scanning one tree
///
/// Files and directories are kept sorted by `relative_path` (byte-wise),
/// which is the order the comparator merges on.
#[derive(Debug, Clone, Serialize)]
pub struct TreeScan {
    root: PathBuf,
    scanned_at: DateTime<Utc>,
    files: Vec<FileRecord>,
    directories: Vec<DirectoryRecord>,
    skipped: Vec<SkippedEntry>,
}

impl TreeScan {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scanned_at: Utc::now(),
            files: Vec::new(),
            directories: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Build a scan from records obtained elsewhere (e.g. persisted metadata)
    ///
    /// # Errors
    /// Returns `InvalidArgument` if a relative path appears twice within the
    /// files or within the directories.
    pub fn from_records(
        root: impl Into<PathBuf>,
        files: Vec<FileRecord>,
        directories: Vec<DirectoryRecord>,
    ) -> Result<Self> {
        let mut scan = Self::new(root);
        scan.files = files;
        scan.directories = directories;
        scan.sort();

        if let Some(dup) = first_duplicate(scan.files.iter().map(|f| f.relative_path.as_str())) {
            return Err(Error::invalid(dup, "duplicate file record"));
        }
        if let Some(dup) = first_duplicate(scan.directories.iter().map(|d| d.relative_path.as_str())) {
            return Err(Error::invalid(dup, "duplicate directory record"));
        }
        Ok(scan)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    /// File records in canonical order
    #[must_use]
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// Directory records in canonical order
    #[must_use]
    pub fn directories(&self) -> &[DirectoryRecord] {
        &self.directories
    }

    /// Entries left out of the record sets, ordered by path
    #[must_use]
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Look up a file record by relative path
    #[must_use]
    pub fn file(&self, relative_path: &str) -> Option<&FileRecord> {
        self.files
            .binary_search_by(|f| f.relative_path.as_str().cmp(relative_path))
            .ok()
            .map(|i| &self.files[i])
    }

    /// Look up a directory record by relative path
    #[must_use]
    pub fn directory(&self, relative_path: &str) -> Option<&DirectoryRecord> {
        self.directories
            .binary_search_by(|d| d.relative_path.as_str().cmp(relative_path))
            .ok()
            .map(|i| &self.directories[i])
    }

    /// Total bytes across all file records
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub(crate) fn push_file(&mut self, record: FileRecord) {
        self.files.push(record);
    }

    pub(crate) fn push_directory(&mut self, record: DirectoryRecord) {
        self.directories.push(record);
    }

    pub(crate) fn push_skipped(&mut self, entry: SkippedEntry) {
        self.skipped.push(entry);
    }

    /// Move another scan's records into this one (order restored by `sort`)
    pub(crate) fn absorb(&mut self, other: Self) {
        self.files.extend(other.files);
        self.directories.extend(other.directories);
        self.skipped.extend(other.skipped);
    }

    pub(crate) fn sort(&mut self) {
        self.files
            .sort_unstable_by(|a, b| a.relative_path.cmp(&b.relative_path));
        self.directories
            .sort_unstable_by(|a, b| a.relative_path.cmp(&b.relative_path));
        self.skipped.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

fn first_duplicate<'a>(sorted: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut previous: Option<&str> = None;
    for path in sorted {
        if previous == Some(path) {
            return Some(path);
        }
        previous = Some(path);
    }
    None
}

/// Owner/group/other permission bits of an entry
#[cfg(unix)]
pub(crate) fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

/// Owner/group/other permission bits of an entry
///
/// Without POSIX modes only the read-only flag is known, so it is mapped
/// onto the conventional modes.
#[cfg(not(unix))]
pub(crate) fn permission_bits(metadata: &Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, true) => 0o555,
        (true, false) => 0o777,
        (false, true) => 0o444,
        (false, false) => 0o666,
    }
}

/// Short human name for an entry kind
pub(crate) fn describe_file_type(file_type: &FileType) -> &'static str {
    if file_type.is_symlink() {
        return "symlink";
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if file_type.is_fifo() {
            return "fifo";
        }
        if file_type.is_socket() {
            return "socket";
        }
        if file_type.is_block_device() {
            return "block device";
        }
        if file_type.is_char_device() {
            return "character device";
        }
    }
    if file_type.is_file() {
        "file"
    } else if file_type.is_dir() {
        "directory"
    } else {
        "unknown"
    }
}
