//! Error types for hashing, scanning and comparison

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while fingerprinting or comparing trees
#[derive(Debug, Error)]
pub enum Error {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid argument{}: {reason}", subject(path))]
    InvalidArgument { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Hash engine error: {0}")]
    HashEngine(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build an invalid-argument error for `path`
    pub fn invalid(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-argument error for a value that is not a path
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::invalid(PathBuf::new(), reason)
    }

    /// Classify a metadata lookup failure on a caller-supplied root.
    ///
    /// A missing root is `NotFound`; anything else stays an I/O error.
    pub(crate) fn from_root(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::io(path, source)
        }
    }
}

fn subject(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        String::new()
    } else {
        format!(" {}", path.display())
    }
}
