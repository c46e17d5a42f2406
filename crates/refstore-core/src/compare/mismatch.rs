//! Comparison outcome types

use serde::{Deserialize, Serialize};

use crate::hash::HexDigest;

/// Which record set a mismatch was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// The record field a mismatch was detected on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchField {
    /// Entry exists on one side only
    Presence,
    Size,
    PermissionBits,
    ContentHash,
    IsEmpty,
}

impl std::fmt::Display for MismatchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Presence => "presence",
            Self::Size => "size",
            Self::PermissionBits => "permission_bits",
            Self::ContentHash => "content_hash",
            Self::IsEmpty => "is_empty",
        };
        write!(f, "{s}")
    }
}

/// How the two sides differ, with both values where both exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum Divergence {
    OnlyInLeft,
    OnlyInRight,
    Size { left: u64, right: u64 },
    PermissionBits { left: u32, right: u32 },
    ContentHash { left: HexDigest, right: HexDigest },
    IsEmpty { left: bool, right: bool },
}

impl Divergence {
    #[must_use]
    pub const fn field(&self) -> MismatchField {
        match self {
            Self::OnlyInLeft | Self::OnlyInRight => MismatchField::Presence,
            Self::Size { .. } => MismatchField::Size,
            Self::PermissionBits { .. } => MismatchField::PermissionBits,
            Self::ContentHash { .. } => MismatchField::ContentHash,
            Self::IsEmpty { .. } => MismatchField::IsEmpty,
        }
    }
}

/// The first differing record found by a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub kind: EntryKind,
    /// Relative path of the differing entry
    pub path: String,
    pub divergence: Divergence,
}

impl Mismatch {
    #[must_use]
    pub fn new(kind: EntryKind, path: impl Into<String>, divergence: Divergence) -> Self {
        Self {
            kind,
            path: path.into(),
            divergence,
        }
    }

    #[must_use]
    pub const fn field(&self) -> MismatchField {
        self.divergence.field()
    }
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            kind,
            path,
            divergence,
        } = self;
        match divergence {
            Divergence::OnlyInLeft => write!(f, "{kind} {path} only exists in the left tree"),
            Divergence::OnlyInRight => write!(f, "{kind} {path} only exists in the right tree"),
            Divergence::Size { left, right } => {
                write!(f, "{kind} {path} differs: size {left} vs {right}")
            }
            Divergence::PermissionBits { left, right } => {
                write!(f, "{kind} {path} differs: permission bits {left:03o} vs {right:03o}")
            }
            Divergence::ContentHash { left, right } => {
                write!(f, "{kind} {path} differs: content hash {left} vs {right}")
            }
            Divergence::IsEmpty { left, right } => {
                write!(f, "{kind} {path} differs: empty {left} vs {right}")
            }
        }
    }
}

/// Outcome of comparing two trees
///
/// `is_equal()` holds exactly when there is no mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    equal: bool,
    first_mismatch: Option<Mismatch>,
}

impl Comparison {
    #[must_use]
    pub const fn equal() -> Self {
        Self {
            equal: true,
            first_mismatch: None,
        }
    }

    #[must_use]
    pub const fn differs(mismatch: Mismatch) -> Self {
        Self {
            equal: false,
            first_mismatch: Some(mismatch),
        }
    }

    #[must_use]
    pub const fn is_equal(&self) -> bool {
        self.equal
    }

    #[must_use]
    pub const fn first_mismatch(&self) -> Option<&Mismatch> {
        self.first_mismatch.as_ref()
    }

    #[must_use]
    pub fn into_mismatch(self) -> Option<Mismatch> {
        self.first_mismatch
    }
}

impl From<Option<Mismatch>> for Comparison {
    fn from(mismatch: Option<Mismatch>) -> Self {
        mismatch.map_or_else(Self::equal, Self::differs)
    }
}
