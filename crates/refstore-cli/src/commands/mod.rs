//! CLI commands

pub mod compare;
pub mod hash;
pub mod scan;

use std::path::Path;

use refstore_core::{
    hash_path, Comparison, EngineConfig, Error, HexDigest, Result, TreeComparator, TreeScan,
    TreeScanner, WorkerPool,
};

/// The engine a command runs on: sequential, or the worker pool
pub enum Engine {
    Sequential(EngineConfig),
    Pooled(WorkerPool),
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig, parallel: bool) -> Self {
        if parallel {
            Self::Pooled(WorkerPool::new(config))
        } else {
            Self::Sequential(config)
        }
    }

    /// Hash a file or directory
    ///
    /// # Errors
    /// Returns an error if `path` cannot be hashed.
    pub async fn hash(&self, path: &Path) -> Result<HexDigest> {
        match self {
            Self::Pooled(pool) if path.is_dir() => pool.hash_tree(path).await,
            Self::Pooled(pool) => {
                let config = pool.config().clone();
                let path = path.to_path_buf();
                blocking(move || hash_path(&path, &config)).await
            }
            Self::Sequential(config) => {
                let config = config.clone();
                let path = path.to_path_buf();
                blocking(move || hash_path(&path, &config)).await
            }
        }
    }

    /// Scan a directory tree
    ///
    /// # Errors
    /// Returns an error if the scan root is unusable.
    pub async fn scan(&self, path: &Path) -> Result<TreeScan> {
        match self {
            Self::Pooled(pool) => pool.scan(path).await,
            Self::Sequential(config) => {
                let scanner = TreeScanner::new(config);
                let path = path.to_path_buf();
                blocking(move || scanner.scan(&path)).await
            }
        }
    }

    /// Compare two directory trees
    ///
    /// # Errors
    /// Returns an error if either tree cannot be scanned.
    pub async fn compare(&self, left: &Path, right: &Path) -> Result<Comparison> {
        match self {
            Self::Pooled(pool) => pool.compare(left, right).await,
            Self::Sequential(config) => {
                let comparator = TreeComparator::new(config);
                let (left, right) = (left.to_path_buf(), right.to_path_buf());
                blocking(move || comparator.compare(&left, &right)).await
            }
        }
    }
}

/// Run filesystem work off the async runtime threads
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::HashEngine(format!("worker task failed: {e}")))?
}
