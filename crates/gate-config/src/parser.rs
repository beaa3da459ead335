//! Manifest parser with environment variable substitution

use crate::{
    CategoryRule, ConfigError, Manifest, MarkerEntry, NetworkSettings, Result, Suite,
    resolver::{ResolutionContext, resolve_env_vars},
};
use selection_gate::{
    Classifier, Marker, MarkerRegistry, ProbeSettings, SuiteRule, TestItem, register_markers,
};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Parse a YAML manifest file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse a YAML manifest from a string, resolving variables from the process environment
pub fn parse_str(content: &str) -> Result<Manifest> {
    parse_str_with_context(content, &ResolutionContext::new())
}

/// Parse a YAML manifest from a string with an explicit resolution context
pub fn parse_str_with_context(content: &str, context: &ResolutionContext) -> Result<Manifest> {
    let content = resolve_env_vars(content, context)?;
    let manifest: Manifest = serde_yaml::from_str(&content)?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Validate the structure of a manifest
fn validate_manifest(manifest: &Manifest) -> Result<()> {
    // Check version
    if manifest.version != "1.0" {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported version: {}, expected 1.0",
            manifest.version
        )));
    }

    let mut names = HashSet::new();
    for test in &manifest.tests {
        if test.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Test names must not be empty".to_string(),
            ));
        }
        if test.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Test '{}' has an empty path",
                test.name
            )));
        }
        if !names.insert(test.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Test '{}' is defined more than once",
                test.name
            )));
        }
    }

    if let Some(network) = &manifest.settings.network {
        validate_network(network)?;
    }

    if let Some(categories) = &manifest.settings.categories {
        for rule in categories {
            if rule.suite.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Category suite names must not be empty".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_network(network: &NetworkSettings) -> Result<()> {
    if network.local_ports.len() != 2 {
        return Err(ConfigError::ValidationError(format!(
            "network.local_ports needs exactly 2 ports, got {}",
            network.local_ports.len()
        )));
    }
    if network.external_addresses.is_empty() {
        return Err(ConfigError::ValidationError(
            "network.external_addresses must not be empty".to_string(),
        ));
    }
    if network.connect_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "network.connect_timeout_ms must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Convert a manifest into gate types.
///
/// Markers outside the registered vocabulary are errors when `strict` or the
/// manifest's `strict_markers` is set, and a warning otherwise. Items come back
/// tagged by the manifest's classifier.
pub fn build_suite(manifest: &Manifest, strict: bool) -> Result<Suite> {
    let registry = register_markers();
    let strict = strict || manifest.settings.strict_markers;
    let classifier = convert_categories(manifest.settings.categories.as_deref());

    let mut items = Vec::with_capacity(manifest.tests.len());
    for test in &manifest.tests {
        let mut item = TestItem::new(test.name.as_str(), test.path.as_str());
        for entry in &test.markers {
            let marker = convert_marker(entry).map_err(|source| ConfigError::Marker {
                test: test.name.clone(),
                source,
            })?;
            check_registered(&registry, &test.name, &marker, strict)?;
            item.add_marker(marker);
        }
        classifier.tag_item(&mut item);
        debug!(test = item.name(), tags = item.tags().len(), "collected test");
        items.push(item);
    }

    Ok(Suite {
        name: manifest.name.clone(),
        run_config: manifest.settings.run_configuration(),
        probes: convert_network(manifest.settings.network.as_ref())?,
        classifier,
        items,
    })
}

fn convert_marker(entry: &MarkerEntry) -> selection_gate::Result<Marker> {
    match entry {
        MarkerEntry::Name(name) => Marker::parse(name, &[], &BTreeMap::new()),
        MarkerEntry::Call { name, args, kwargs } => Marker::parse(name, args, kwargs),
    }
}

fn check_registered(
    registry: &MarkerRegistry,
    test: &str,
    marker: &Marker,
    strict: bool,
) -> Result<()> {
    if registry.is_registered(marker.name()) {
        return Ok(());
    }
    if strict {
        return Err(ConfigError::UnknownMarker {
            test: test.to_string(),
            marker: marker.name().to_string(),
        });
    }
    warn!(test, marker = marker.name(), "unregistered marker, it will be ignored");
    Ok(())
}

/// Convert network settings into probe settings, falling back to the defaults.
///
/// Settings are validated here as well; a hand-built [`Manifest`] never went
/// through [`parse_str`].
pub fn convert_network(network: Option<&NetworkSettings>) -> Result<ProbeSettings> {
    let Some(network) = network else {
        return Ok(ProbeSettings::default());
    };
    validate_network(network)?;

    let local_ports = match network.local_ports.as_slice() {
        [first, second] => [*first, *second],
        _ => {
            return Err(ConfigError::ValidationError(
                "network.local_ports needs exactly 2 ports".to_string(),
            ));
        }
    };

    Ok(ProbeSettings {
        local_ports,
        external_addresses: network.external_addresses.clone(),
        external_port: network.external_port,
        connect_timeout: Duration::from_millis(network.connect_timeout_ms),
    })
}

/// Convert category rules into a classifier, falling back to the default rules
pub fn convert_categories(categories: Option<&[CategoryRule]>) -> Classifier {
    match categories {
        Some(rules) => Classifier::new(
            rules
                .iter()
                .map(|rule| SuiteRule::new(rule.suite.as_str(), rule.subsystems.iter().cloned()))
                .collect(),
        ),
        None => Classifier::default(),
    }
}
