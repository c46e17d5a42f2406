//! Hash command: Print the digest of a file or directory

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tracing::info;

use super::Engine;

/// Run the hash command
///
/// # Errors
/// Returns an error if the path cannot be hashed.
pub async fn run(engine: &Engine, path: &Path) -> Result<ExitCode> {
    info!("Hashing {}", path.display());

    let digest = engine.hash(path).await?;
    println!("{digest}  {}", path.display());

    Ok(ExitCode::SUCCESS)
}
