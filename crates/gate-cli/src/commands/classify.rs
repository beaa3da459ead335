use super::load_optional_manifest;
use anyhow::Result;
use gate_config::parser;
use std::path::Path;

pub fn run(manifest_path: &Path, paths: &[String]) -> Result<()> {
    // The manifest may override the classification rules
    let manifest = load_optional_manifest(manifest_path)?;
    let categories = manifest
        .as_ref()
        .and_then(|manifest| manifest.settings.categories.as_deref());
    let classifier = parser::convert_categories(categories);

    for path in paths {
        let tags = classifier.classify(path);
        let display = if tags.is_empty() {
            "-".to_string()
        } else {
            tags.iter()
                .map(|tag| tag.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("{}: {}", path, display);
    }

    Ok(())
}
