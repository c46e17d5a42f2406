//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use refstore_core::config::DEFAULT_CHUNK_SIZE;
use refstore_core::{EngineConfig, SymlinkPolicy};

#[derive(Debug, Parser)]
#[command(name = "refstore")]
#[command(author, version, about = "Content fingerprinting and tree comparison", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Scan and hash sibling subdirectories concurrently
    #[arg(long, global = true)]
    pub parallel: bool,

    /// Worker count for --parallel (defaults to available cores)
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Read buffer size in bytes used while hashing files
    #[arg(long, global = true, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Follow symbolic links instead of skipping them
    #[arg(long, global = true)]
    pub follow_symlinks: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the digest of a file or directory
    Hash {
        /// File or directory to hash
        path: PathBuf,
    },

    /// List the file and directory records of a tree
    Scan {
        /// Directory to scan
        path: PathBuf,

        /// Print the scan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether two trees have identical content and structure
    Compare {
        /// First tree
        left: PathBuf,

        /// Second tree
        right: PathBuf,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Engine settings selected by the global flags
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default().with_chunk_size(self.chunk_size);
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.follow_symlinks {
            config = config.with_symlink_policy(SymlinkPolicy::Follow);
        }
        config
    }
}
