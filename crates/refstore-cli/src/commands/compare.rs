//! Compare command: Check two trees for identical content

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use refstore_core::Comparison;
use tracing::info;

use super::Engine;

/// Exit status when both trees were scanned but differ
pub const EXIT_DIFFERENT: u8 = 2;

/// Run the compare command
///
/// # Errors
/// Returns an error if either tree cannot be scanned; differing trees are
/// reported through the exit code instead.
pub async fn run(engine: &Engine, left: &Path, right: &Path, json: bool) -> Result<ExitCode> {
    info!("Comparing {} to {}", left.display(), right.display());

    let comparison = engine.compare(left, right).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        println!("{}", summary(&comparison));
    }

    Ok(exit_code(&comparison))
}

/// One-line human summary of a comparison
#[must_use]
pub fn summary(comparison: &Comparison) -> String {
    match comparison.first_mismatch() {
        None => "equal".to_string(),
        Some(mismatch) => format!("different: {mismatch}"),
    }
}

#[must_use]
pub fn exit_code(comparison: &Comparison) -> ExitCode {
    if comparison.is_equal() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DIFFERENT)
    }
}
