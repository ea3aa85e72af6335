//! Safety utilities to prevent accidental file deletion.
//!
//! The output store is removed before every run, so the output path is
//! checked against the input before anything is deleted.

use anyhow::{bail, Result};
use std::path::Path;

/// Extensions of tabular source files that must never be used as the output.
const SOURCE_EXTENSIONS: [&str; 3] = ["tsv", "csv", "txt"];

/// Validates that an output path is safe to delete and recreate.
///
/// Checks:
/// - Output cannot be the same as any of the provided source paths
/// - Output cannot carry a tabular source extension (`.tsv`, `.csv`, `.txt`)
pub fn validate_output_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    for source in source_paths {
        if output == *source {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if SOURCE_EXTENSIONS.contains(&extension.as_str()) {
        bail!(
            "Safety check failed: output '{}' looks like a source file (.{})",
            output.display(),
            extension
        );
    }

    Ok(())
}
