//! refstore-core: Content fingerprinting and hierarchical comparison
//!
//! Produces deterministic SHA-256 digests for single files and whole
//! directory subtrees, scans trees into canonically ordered records,
//! and decides whether two subtrees are content-identical.
//!
//! # Components
//!
//! - **ContentHasher** - streams one regular file through SHA-256
//! - **TreeHasher** - Merkle-style digest of a directory subtree
//! - **TreeScanner** - path-ordered file and directory records
//! - **TreeComparator** - keyed merge walk over two scans

pub mod compare;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hash;
pub mod pool;
pub mod scanner;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use compare::{Comparison, Divergence, EntryKind, Mismatch, MismatchField, TreeComparator};
pub use config::{EngineConfig, SymlinkPolicy};
pub use diagnostics::{Diagnostics, NullDiagnostics, TracingDiagnostics};
pub use error::{Error, Result};
pub use hash::{hash_path, ContentHasher, HexDigest, TreeHasher};
pub use pool::WorkerPool;
pub use scanner::{DirectoryRecord, FileRecord, SkipReason, SkippedEntry, TreeScan, TreeScanner};
