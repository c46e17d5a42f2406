//! Streaming content hasher and the hex digest type

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{EngineConfig, DEFAULT_CHUNK_SIZE};
use crate::error::{Error, Result};

/// Lowercase hex encoding of a SHA-256 digest (always 64 characters)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexDigest(String);

impl HexDigest {
    /// Length of the encoded digest in characters
    pub const LEN: usize = 64;

    /// Encode a finished SHA-256 context. Only the algorithm's own output
    /// bytes are encoded.
    pub(crate) fn finish(hasher: Sha256) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Digest of an in-memory byte slice
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Validate and wrap an existing hex digest string
    ///
    /// # Errors
    /// Returns `InvalidArgument` unless `s` is exactly 64 lowercase hex characters.
    pub fn parse(s: &str) -> Result<Self> {
        let valid = s.len() == Self::LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::invalid_value(format!(
                "{s:?} is not a lowercase SHA-256 hex digest"
            )))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HexDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HexDigest {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<HexDigest> for String {
    fn from(digest: HexDigest) -> Self {
        digest.0
    }
}

/// Streams regular files through SHA-256 in fixed-size chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentHasher {
    chunk_size: usize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ContentHasher {
    /// Create a hasher reading `chunk_size` bytes at a time
    #[must_use]
    pub const fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.chunk_size)
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash the content of the regular file at `path`
    ///
    /// The type is checked before the file is opened, so FIFOs and devices
    /// are rejected rather than blocking. The file handle is dropped on
    /// every return path.
    ///
    /// # Errors
    /// Returns `HashEngine` for a zero chunk size, `InvalidArgument` if
    /// `path` is not a regular file, and `Io` if the file cannot be opened
    /// or a read fails mid-stream.
    pub fn hash(&self, path: &Path) -> Result<HexDigest> {
        self.ensure_usable()?;

        let file_type = fs::metadata(path).map_err(|e| Error::io(path, e))?.file_type();
        if file_type.is_dir() {
            return Err(Error::invalid(path, "expected a regular file, found a directory"));
        }
        if !file_type.is_file() {
            return Err(Error::invalid(path, "expected a regular file"));
        }

        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        self.hash_reader(file).map_err(|e| Error::io(path, e))
    }

    /// Hash everything `reader` yields until end of stream
    ///
    /// # Errors
    /// Returns the first read error other than `Interrupted`.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<HexDigest> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.chunk_size.max(1)];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        Ok(HexDigest::finish(hasher))
    }

    pub(crate) fn ensure_usable(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::HashEngine(
                "cannot initialise digest stream with a zero-byte chunk size".to_string(),
            ));
        }
        Ok(())
    }
}
