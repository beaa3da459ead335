//! # Gate Configuration
//!
//! YAML suite manifest parser for the selection gate.
//!
//! A manifest lists the tests of a suite with their markers, plus the settings
//! the gate runs with: which disabled-by-default categories are enabled, the
//! network probe parameters and the path classification rules. The parser
//! substitutes `${VAR}` / `${VAR:-default}` references, validates the document
//! and turns it into a [`Suite`] of `selection-gate` types.

#![warn(missing_docs)]

use selection_gate::{
    Classifier, MarkerError, MarkerValue, ProbeSettings, RunConfiguration, TestItem,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use thiserror::Error;

pub mod parser;
pub mod resolver;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the manifest
    #[error("Failed to read manifest: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Invalid manifest
    #[error("Invalid manifest: {0}")]
    ValidationError(String),

    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// A test uses a marker outside the registered vocabulary
    #[error("Test '{test}' uses unregistered marker '{marker}'")]
    UnknownMarker {
        /// Test name
        test: String,
        /// Marker name
        marker: String,
    },

    /// A marker could not be parsed
    #[error("Invalid marker on test '{test}': {source}")]
    Marker {
        /// Test name
        test: String,
        /// Underlying marker error
        #[source]
        source: MarkerError,
    },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root manifest structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest version
    pub version: String,

    /// Optional suite name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Gate settings
    #[serde(default, skip_serializing_if = "Settings::is_default")]
    pub settings: Settings,

    /// Test definitions
    #[serde(default)]
    pub tests: Vec<TestEntry>,
}

/// Gate settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Run tests marked `destructive_test`
    #[serde(default)]
    pub run_destructive: bool,

    /// Run tests marked `expensive_test`
    #[serde(default)]
    pub run_expensive: bool,

    /// Reject markers outside the registered vocabulary instead of warning
    #[serde(default)]
    pub strict_markers: bool,

    /// Network probe overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSettings>,

    /// Classification rule overrides, evaluated in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryRule>>,
}

impl Settings {
    /// Check if settings are default
    fn is_default(&self) -> bool {
        self == &Settings::default()
    }

    /// The run configuration these settings ask for
    pub fn run_configuration(&self) -> RunConfiguration {
        RunConfiguration::new(self.run_destructive, self.run_expensive)
    }
}

/// Network probe parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSettings {
    /// The two ports the local probe binds
    #[serde(default = "default_local_ports")]
    pub local_ports: Vec<u16>,

    /// Addresses the external probe connects to, in order
    #[serde(default = "default_external_addresses")]
    pub external_addresses: Vec<IpAddr>,

    /// Port used for every external address
    #[serde(default = "default_external_port")]
    pub external_port: u16,

    /// Connect timeout per external address in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            local_ports: default_local_ports(),
            external_addresses: default_external_addresses(),
            external_port: default_external_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// A suite directory and the subsystems recognized beneath it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRule {
    /// Suite directory name, e.g. `integration`
    pub suite: String,

    /// Subsystem directory names, first match wins
    #[serde(default)]
    pub subsystems: Vec<String>,
}

/// A test definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestEntry {
    /// Test name, unique within the manifest
    pub name: String,

    /// File the test lives in
    pub path: String,

    /// Attached markers
    #[serde(default)]
    pub markers: Vec<MarkerEntry>,
}

/// A marker as written in the manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MarkerEntry {
    /// Bare marker name, e.g. `destructive_test`
    Name(String),

    /// Marker with arguments
    Call {
        /// Marker name
        name: String,
        /// Positional arguments
        #[serde(default)]
        args: Vec<MarkerValue>,
        /// Keyword arguments
        #[serde(default)]
        kwargs: BTreeMap<String, MarkerValue>,
    },
}

impl MarkerEntry {
    /// Marker name
    pub fn name(&self) -> &str {
        match self {
            MarkerEntry::Name(name) | MarkerEntry::Call { name, .. } => name,
        }
    }
}

/// A manifest resolved into gate types
#[derive(Debug, Clone)]
pub struct Suite {
    /// Optional suite name
    pub name: Option<String>,
    /// Run configuration from the manifest settings
    pub run_config: RunConfiguration,
    /// Network probe parameters
    pub probes: ProbeSettings,
    /// Path classifier
    pub classifier: Classifier,
    /// Test items in manifest order, already tagged
    pub items: Vec<TestItem>,
}

// Defaults for network settings
fn default_local_ports() -> Vec<u16> {
    selection_gate::network::DEFAULT_LOCAL_PORTS.to_vec()
}
fn default_external_addresses() -> Vec<IpAddr> {
    ProbeSettings::default().external_addresses
}
fn default_external_port() -> u16 {
    selection_gate::network::DEFAULT_EXTERNAL_PORT
}
fn default_connect_timeout_ms() -> u64 {
    250
}
