use anyhow::{Context, Result};
use gate_config::parser;
use selection_gate::register_markers;
use std::path::Path;

pub fn run(manifest_path: &Path, strict: bool) -> Result<()> {
    println!("Validating {}...", manifest_path.display());

    let manifest = parser::parse_file(manifest_path).context("Failed to parse manifest")?;

    // Marker arguments are only checked once the suite is built
    let suite = parser::build_suite(&manifest, strict).context("Invalid markers")?;

    println!("✓ Manifest valid");
    println!("  Version: {}", manifest.version);

    if let Some(name) = &manifest.name {
        println!("  Name: {}", name);
    }

    println!("  Tests: {}", suite.items.len());

    let registry = register_markers();
    let markers = suite.items.iter().flat_map(|item| item.markers());
    let (registered, unregistered): (Vec<_>, Vec<_>) =
        markers.partition(|marker| registry.is_registered(marker.name()));
    println!("  Markers: {}", registered.len());

    if !unregistered.is_empty() {
        let mut names: Vec<_> = unregistered.iter().map(|marker| marker.name()).collect();
        names.sort_unstable();
        names.dedup();
        println!(
            "  ⚠ {} unregistered marker(s) will be ignored: {}",
            unregistered.len(),
            names.join(", ")
        );
    }

    Ok(())
}
