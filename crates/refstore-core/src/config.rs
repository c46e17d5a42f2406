//! Engine configuration

use serde::{Deserialize, Serialize};

/// Default read buffer for streaming file content through the digest
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// How symbolic links met during traversal are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymlinkPolicy {
    /// Leave links out of every record set and report them as skipped
    #[default]
    Skip,
    /// Resolve links to their targets; loops are skipped with a warning
    Follow,
}

impl std::fmt::Display for SymlinkPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Follow => write!(f, "follow"),
        }
    }
}

/// Settings shared by the hashers, the scanner and the worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub chunk_size: usize,
    pub symlink_policy: SymlinkPolicy,
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            symlink_policy: SymlinkPolicy::Skip,
            workers: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
        }
    }
}

impl EngineConfig {
    /// Set the read buffer size used by the content hasher
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the symlink policy
    #[must_use]
    pub fn with_symlink_policy(mut self, policy: SymlinkPolicy) -> Self {
        self.symlink_policy = policy;
        self
    }

    /// Set the worker-pool size (clamped to at least one)
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Whether traversal should resolve symbolic links
    #[must_use]
    pub const fn follow_links(&self) -> bool {
        matches!(self.symlink_policy, SymlinkPolicy::Follow)
    }
}
