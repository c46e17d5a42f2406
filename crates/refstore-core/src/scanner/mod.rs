//! Scanner module: Canonical file and directory records
//!
//! Walks a directory tree and produces path-ordered `FileRecord` and
//! `DirectoryRecord` sets. Entries that cannot be represented or read
//! are skipped and listed on the scan instead of failing it.

mod record;
mod walker;

pub use record::{DirectoryRecord, FileRecord, SkipReason, SkippedEntry, TreeScan};
pub use walker::TreeScanner;

pub(crate) use record::{describe_file_type, permission_bits};

#[cfg(test)]
mod tests;
