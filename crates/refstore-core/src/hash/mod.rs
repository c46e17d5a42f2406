//! Hash module: File and directory fingerprints
//!
//! `ContentHasher` streams a single file through SHA-256; `TreeHasher`
//! composes child digests into one Merkle-style digest per directory.

mod content;
mod tree;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{Error, Result};

pub use content::{ContentHasher, HexDigest};
pub use tree::TreeHasher;

/// Hash a regular file by content or a directory by structure and content
///
/// # Errors
/// Returns `NotFound` if `path` does not exist, `InvalidArgument` if it is
/// neither a regular file nor a directory, and any error raised while
/// hashing the file or subtree.
pub fn hash_path(path: &Path, config: &EngineConfig) -> Result<HexDigest> {
    let metadata = fs::metadata(path).map_err(|e| Error::from_root(path, e))?;

    if metadata.is_dir() {
        debug!("Hashing directory {}", path.display());
        TreeHasher::new(config).hash_tree(path)
    } else if metadata.is_file() {
        debug!("Hashing file {}", path.display());
        ContentHasher::from_config(config).hash(path)
    } else {
        Err(Error::invalid(path, "not a regular file or directory"))
    }
}
