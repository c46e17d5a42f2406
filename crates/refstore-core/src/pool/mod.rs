//! Worker pool: Concurrent scanning and hashing of sibling subtrees
//!
//! Each top-level subdirectory is handled on a blocking task, with at
//! most `workers` tasks running at once. Results are merged back into
//! canonical order, so they match the sequential engine exactly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::debug;

use crate::compare::{Comparison, TreeComparator};
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::{Error, Result};
use crate::hash::{HexDigest, TreeHasher};
use crate::scanner::{TreeScan, TreeScanner};

/// Runs scans, tree hashes and comparisons across a bounded set of workers
#[derive(Clone)]
pub struct WorkerPool {
    config: EngineConfig,
    permits: Arc<Semaphore>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl WorkerPool {
    /// Create a pool sized by `config.workers`
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let workers = config.workers.max(1);
        Self {
            config,
            permits: Arc::new(Semaphore::new(workers)),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Replace the diagnostics sink
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.config.workers.max(1)
    }

    fn scanner(&self) -> TreeScanner {
        TreeScanner::new(&self.config).with_diagnostics(Arc::clone(&self.diagnostics))
    }

    fn tree_hasher(&self) -> TreeHasher {
        TreeHasher::new(&self.config).with_diagnostics(Arc::clone(&self.diagnostics))
    }

    /// Scan `root`, one task per top-level subdirectory
    ///
    /// When links are followed the whole tree is walked by a single task,
    /// since loop detection needs the full ancestor chain.
    ///
    /// # Errors
    /// Same as [`TreeScanner::scan`], plus `HashEngine` if a worker task
    /// panics or is cancelled.
    pub async fn scan(&self, root: &Path) -> Result<TreeScan> {
        let scanner = self.scanner();
        self.diagnostics.scan_started(root);

        let top = {
            let scanner = scanner.clone();
            let root = root.to_path_buf();
            let depth = (!self.config.follow_links()).then_some(1);
            blocking(move || {
                scanner.check_root(&root)?;
                let mut scan = TreeScan::new(&root);
                scanner.walk_into(&root, "", depth, &mut scan);
                Ok(scan)
            })
            .await
        };
        let mut scan = match top {
            Ok(scan) => scan,
            Err(e) => {
                self.diagnostics.aborted(root, &e);
                return Err(e);
            }
        };

        if !self.config.follow_links() {
            let mut tasks = JoinSet::new();
            for dir in scan.directories() {
                let scanner = scanner.clone();
                let prefix = dir.relative_path.clone();
                let path = root.join(&prefix);
                self.spawn_limited(&mut tasks, move || {
                    let mut part = TreeScan::new(&path);
                    scanner.walk_into(&path, &prefix, None, &mut part);
                    Ok(part)
                });
            }
            debug!("Scanning {} subtrees of {}", tasks.len(), root.display());

            while let Some(joined) = tasks.join_next().await {
                scan.absorb(joined.map_err(join_error)??);
            }
        }

        scan.sort();
        scanner.finish(&scan);
        Ok(scan)
    }

    /// Hash the directory at `root`, one task per immediate child
    ///
    /// # Errors
    /// Same as [`TreeHasher::hash_tree`], plus `HashEngine` if a worker task
    /// panics or is cancelled. Every error is also reported as an abort.
    pub async fn hash_tree(&self, root: &Path) -> Result<HexDigest> {
        let digest = self.hash_children(root).await;
        if let Err(e) = &digest {
            self.diagnostics.aborted(root, e);
        }
        digest
    }

    async fn hash_children(&self, root: &Path) -> Result<HexDigest> {
        let hasher = self.tree_hasher();

        let (children, ancestors) = {
            let hasher = hasher.clone();
            let root = root.to_path_buf();
            blocking(move || {
                hasher.check_root(&root)?;
                let ancestors: Vec<PathBuf> = hasher.identity(&root)?.into_iter().collect();
                Ok((hasher.list_children(&root)?, ancestors))
            })
            .await?
        };
        let ancestors = Arc::new(ancestors);

        let mut tasks = JoinSet::new();
        for (index, child) in children.iter().cloned().enumerate() {
            let hasher = hasher.clone();
            let ancestors = Arc::clone(&ancestors);
            self.spawn_limited(&mut tasks, move || {
                Ok((index, hasher.child_digest(&child, &ancestors)?))
            });
        }

        let mut digests: Vec<Option<HexDigest>> = vec![None; children.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, digest) = joined.map_err(join_error)??;
            if let Some(slot) = digests.get_mut(index) {
                *slot = digest;
            }
        }

        Ok(TreeHasher::combine(
            children
                .iter()
                .zip(&digests)
                .filter_map(|(child, digest)| digest.as_ref().map(|d| (child, d))),
        ))
    }

    /// Scan both roots concurrently and compare them
    ///
    /// # Errors
    /// Returns the first scan error; differing trees are not an error.
    pub async fn compare(&self, left: &Path, right: &Path) -> Result<Comparison> {
        let (left_scan, right_scan) = tokio::try_join!(self.scan(left), self.scan(right))?;
        let comparator =
            TreeComparator::new(&self.config).with_diagnostics(Arc::clone(&self.diagnostics));
        Ok(comparator.compare_scans(&left_scan, &right_scan))
    }

    /// Queue blocking `work` behind a worker permit
    fn spawn_limited<T, F>(&self, tasks: &mut JoinSet<Result<T>>, work: F)
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| Error::HashEngine(format!("worker pool closed: {e}")))?;
            blocking(work).await
        });
    }
}

async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(join_error)?
}

fn join_error(error: JoinError) -> Error {
    Error::HashEngine(format!("worker task failed: {error}"))
}

#[cfg(test)]
mod tests;
