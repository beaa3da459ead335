pub mod classify;
pub mod evaluate;
pub mod markers;
pub mod probe;
pub mod validate;

use anyhow::{Context, Result};
use gate_config::{Manifest, parser};
use std::path::Path;
use tracing::debug;

/// Parse the manifest when it exists; commands that work without one use the defaults
pub fn load_optional_manifest(manifest_path: &Path) -> Result<Option<Manifest>> {
    if !manifest_path.exists() {
        debug!(path = %manifest_path.display(), "no manifest, using defaults");
        return Ok(None);
    }

    let manifest = parser::parse_file(manifest_path)
        .with_context(|| format!("Failed to parse manifest {}", manifest_path.display()))?;
    Ok(Some(manifest))
}

/// Check the `--format` value
pub fn check_format(format: &str) -> Result<()> {
    if format != "table" && format != "json" {
        anyhow::bail!("Invalid format: {}. Must be 'table' or 'json'", format);
    }
    Ok(())
}
