//! Scan command: List the records of a tree

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use refstore_core::TreeScan;

use super::Engine;

/// Run the scan command
///
/// # Errors
/// Returns an error if the tree cannot be scanned or serialized.
pub async fn run(engine: &Engine, path: &Path, json: bool) -> Result<ExitCode> {
    let scan = engine.scan(path).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&scan)?);
    } else {
        for line in render(&scan) {
            println!("{line}");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// One line per record: directories first, then files, then skipped entries
#[must_use]
pub fn render(scan: &TreeScan) -> Vec<String> {
    let directories = scan.directories().iter().map(|d| {
        format!(
            "dir   {:03o} {:>12} {}/",
            d.permission_bits,
            if d.is_empty { "(empty)" } else { "-" },
            d.relative_path
        )
    });
    let files = scan.files().iter().map(|f| {
        format!(
            "file  {:03o} {:>12} {} {}",
            f.permission_bits, f.size, f.content_hash, f.relative_path
        )
    });
    let skipped = scan
        .skipped()
        .iter()
        .map(|s| format!("skip  {} ({})", s.path.display(), s.reason));

    directories.chain(files).chain(skipped).collect()
}
