//! Merkle-style directory hasher
//!
//! A directory digest is SHA-256 over its children in canonical (byte-wise
//! name) order, feeding for each child: name bytes, child digest, then a
//! `FILE` or `DIR` marker. Traversal uses an explicit stack of directory
//! frames, so nesting depth never grows the call stack.

use std::ffi::OsString;
use std::fs::{self, FileType};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::{ContentHasher, HexDigest};
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::{Error, Result};
use crate::scanner::{describe_file_type, SkipReason, SkippedEntry};

const FILE_MARKER: &[u8] = b"FILE";
const DIR_MARKER: &[u8] = b"DIR";

/// Kind of a child that takes part in a directory digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildKind {
    File,
    Directory,
}

impl ChildKind {
    const fn marker(self) -> &'static [u8] {
        match self {
            Self::File => FILE_MARKER,
            Self::Directory => DIR_MARKER,
        }
    }
}

/// An immediate child of a directory being hashed
#[derive(Debug, Clone)]
pub(crate) struct TreeChild {
    pub name: OsString,
    pub path: PathBuf,
    pub kind: ChildKind,
}

/// One directory on the work stack
struct Frame {
    name: OsString,
    identity: Option<PathBuf>,
    children: std::vec::IntoIter<TreeChild>,
    hasher: Sha256,
}

impl Frame {
    fn absorb(&mut self, name: &OsString, digest: &HexDigest, kind: ChildKind) {
        absorb(&mut self.hasher, name, digest, kind);
    }
}

fn absorb(hasher: &mut Sha256, name: &OsString, digest: &HexDigest, kind: ChildKind) {
    hasher.update(name.as_encoded_bytes());
    hasher.update(digest.as_str().as_bytes());
    hasher.update(kind.marker());
}

/// Computes one digest for a whole directory subtree
#[derive(Clone)]
pub struct TreeHasher {
    content: ContentHasher,
    follow_links: bool,
    diagnostics: Arc<dyn Diagnostics>,
}

impl TreeHasher {
    /// Create a tree hasher reporting skipped entries to `tracing`
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

    /// Hash the directory at `root`
    ///
    /// An empty directory hashes to the digest of the empty byte stream.
    /// Entries that are neither regular files nor directories are left out.
    ///
    /// # Errors
    /// Returns `NotFound` if `root` is absent, `InvalidArgument` if it is not
    /// a directory, and the first `Io` or `HashEngine` error raised by any
    /// descendant. Every error is also reported as an abort.
    pub fn hash_tree(&self, root: &Path) -> Result<HexDigest> {
        let digest = self
            .check_root(root)
            .and_then(|()| self.digest_directory(root, &[]));
        if let Err(e) = &digest {
            self.diagnostics.aborted(root, e);
        }
        digest
    }

    /// Validate a tree root and the content hasher before hashing starts
    pub(crate) fn check_root(&self, root: &Path) -> Result<()> {
        let metadata = fs::metadata(root).map_err(|e| Error::from_root(root, e))?;
        if !metadata.is_dir() {
            return Err(Error::invalid(root, "not a directory"));
        }
        self.content.ensure_usable()
    }

    /// Digest `dir`, treating `ancestors` as directories already open above it
    pub(crate) fn digest_directory(&self, dir: &Path, ancestors: &[PathBuf]) -> Result<HexDigest> {
        let mut stack = vec![self.open_frame(OsString::new(), dir, self.identity(dir)?)?];

        while let Some(frame) = stack.last_mut() {
            match frame.children.next() {
                Some(TreeChild {
                    name,
                    path,
                    kind: ChildKind::File,
                }) => {
                    let digest = self.content.hash(&path)?;
                    frame.absorb(&name, &digest, ChildKind::File);
                }
                Some(TreeChild {
                    name,
                    path,
                    kind: ChildKind::Directory,
                }) => {
                    let identity = self.identity(&path)?;
                    let open = ancestors.iter().chain(stack.iter().filter_map(|f| f.identity.as_ref()));
                    if is_loop(identity.as_ref(), open) {
                        self.skip(path, SkipReason::SymlinkLoop);
                        continue;
                    }
                    let next = self.open_frame(name, &path, identity)?;
                    stack.push(next);
                }
                None => {
                    let Some(done) = stack.pop() else { break };
                    let digest = HexDigest::finish(done.hasher);
                    match stack.last_mut() {
                        Some(parent) => parent.absorb(&done.name, &digest, ChildKind::Directory),
                        None => return Ok(digest),
                    }
                }
            }
        }

        Err(Error::HashEngine(format!(
            "work stack for {} drained without a digest",
            dir.display()
        )))
    }

    /// Digest a single child, or `None` if it closes a symlink loop
    pub(crate) fn child_digest(
        &self,
        child: &TreeChild,
        ancestors: &[PathBuf],
    ) -> Result<Option<HexDigest>> {
        match child.kind {
            ChildKind::File => self.content.hash(&child.path).map(Some),
            ChildKind::Directory => {
                let identity = self.identity(&child.path)?;
                if is_loop(identity.as_ref(), ancestors.iter()) {
                    self.skip(child.path.clone(), SkipReason::SymlinkLoop);
                    return Ok(None);
                }
                self.digest_directory(&child.path, ancestors).map(Some)
            }
        }
    }

    /// Combine already computed child digests in canonical order
    pub(crate) fn combine<'a>(
        children: impl IntoIterator<Item = (&'a TreeChild, &'a HexDigest)>,
    ) -> HexDigest {
        let mut hasher = Sha256::new();
        for (child, digest) in children {
            absorb(&mut hasher, &child.name, digest, child.kind);
        }
        HexDigest::finish(hasher)
    }

    /// List the hashable children of `dir`, sorted by name bytes
    pub(crate) fn list_children(&self, dir: &Path) -> Result<Vec<TreeChild>> {
        let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
        let mut children = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;

            match classify(&path, file_type, self.follow_links) {
                Ok(kind) => children.push(TreeChild {
                    name: entry.file_name(),
                    path,
                    kind,
                }),
                Err(reason) => self.skip(path, reason),
            }
        }

        children.sort_by(|a, b| a.name.as_encoded_bytes().cmp(b.name.as_encoded_bytes()));
        Ok(children)
    }

    /// Canonical location of `dir`, tracked only when links are followed
    pub(crate) fn identity(&self, dir: &Path) -> Result<Option<PathBuf>> {
        if !self.follow_links {
            return Ok(None);
        }
        fs::canonicalize(dir).map(Some).map_err(|e| Error::io(dir, e))
    }

    fn open_frame(&self, name: OsString, dir: &Path, identity: Option<PathBuf>) -> Result<Frame> {
        Ok(Frame {
            name,
            identity,
            children: self.list_children(dir)?.into_iter(),
            hasher: Sha256::new(),
        })
    }

    fn skip(&self, path: PathBuf, reason: SkipReason) {
        self.diagnostics.entry_skipped(&SkippedEntry { path, reason });
    }
}

fn is_loop<'a>(identity: Option<&PathBuf>, mut open: impl Iterator<Item = &'a PathBuf>) -> bool {
    identity.is_some_and(|id| open.any(|ancestor| ancestor == id))
}

/// Decide whether an entry takes part in hashing, resolving links if asked
fn classify(
    path: &Path,
    file_type: FileType,
    follow_links: bool,
) -> std::result::Result<ChildKind, SkipReason> {
    let file_type = if file_type.is_symlink() && follow_links {
        fs::metadata(path)
            .map_err(|e| SkipReason::from_io(&e))?
            .file_type()
    } else {
        file_type
    };

    if file_type.is_file() {
        Ok(ChildKind::File)
    } else if file_type.is_dir() {
        Ok(ChildKind::Directory)
    } else {
        Err(SkipReason::UnsupportedKind {
            kind: describe_file_type(&file_type).to_string(),
        })
    }
}
