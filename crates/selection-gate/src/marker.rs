//! Marker model
//!
//! Markers arrive in a loose form (a name plus positional and keyword
//! arguments) and are parsed into the closed [`Marker`] type the gate matches on.

use crate::error::{MarkerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the marker for destructive tests
pub const DESTRUCTIVE_TEST: &str = "destructive_test";
/// Name of the marker for expensive tests
pub const EXPENSIVE_TEST: &str = "expensive_test";
/// Name of the marker for tests that need root
pub const SKIP_IF_NOT_ROOT: &str = "skip_if_not_root";
/// Name of the marker for tests that need binaries on `PATH`
pub const SKIP_IF_BINARIES_MISSING: &str = "skip_if_binaries_missing";
/// Name of the marker for tests that need networking
pub const REQUIRES_NETWORK: &str = "requires_network";

/// A raw marker argument value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerValue {
    /// A boolean flag
    Bool(bool),
    /// An integer
    Integer(i64),
    /// A string
    Text(String),
    /// A list of values
    List(Vec<MarkerValue>),
}

impl MarkerValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            MarkerValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            MarkerValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for MarkerValue {
    fn from(value: &str) -> Self {
        MarkerValue::Text(value.to_owned())
    }
}

impl From<bool> for MarkerValue {
    fn from(value: bool) -> Self {
        MarkerValue::Bool(value)
    }
}

/// A marker attached to a test item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "marker", rename_all = "snake_case")]
pub enum Marker {
    /// The test changes the host (users, packages, services)
    DestructiveTest,

    /// The test costs money or a lot of time to run
    ExpensiveTest,

    /// The test must run as root
    SkipIfNotRoot,

    /// The test needs binaries from the executable search path
    SkipIfBinariesMissing {
        /// Binary names, in declaration order
        binaries: Vec<String>,
        /// Require every binary instead of at least one
        check_all: bool,
        /// Prefix for the skip message
        message: Option<String>,
    },

    /// The test needs network access
    RequiresNetwork {
        /// Only require the local network, not internet access
        only_local_network: bool,
    },

    /// A marker outside the registered vocabulary; never evaluated
    Unregistered {
        /// The marker name as written
        name: String,
    },
}

impl Marker {
    /// Parse a marker from its name and arguments.
    ///
    /// A single list argument to `skip_if_binaries_missing` is flattened into the
    /// binaries. Names outside the registered vocabulary become [`Marker::Unregistered`].
    pub fn parse(
        name: &str,
        args: &[MarkerValue],
        kwargs: &BTreeMap<String, MarkerValue>,
    ) -> Result<Self> {
        match name {
            "" => Err(MarkerError::EmptyName),
            DESTRUCTIVE_TEST => {
                reject_arguments(name, args, kwargs)?;
                Ok(Marker::DestructiveTest)
            }
            EXPENSIVE_TEST => {
                reject_arguments(name, args, kwargs)?;
                Ok(Marker::ExpensiveTest)
            }
            SKIP_IF_NOT_ROOT => {
                reject_arguments(name, args, kwargs)?;
                Ok(Marker::SkipIfNotRoot)
            }
            SKIP_IF_BINARIES_MISSING => parse_binaries_missing(args, kwargs),
            REQUIRES_NETWORK => {
                if !args.is_empty() {
                    return Err(MarkerError::unexpected_argument(name, "args[0]"));
                }
                let mut only_local_network = false;
                for (key, value) in kwargs {
                    match key.as_str() {
                        "only_local_network" => {
                            only_local_network = value.as_bool().ok_or_else(|| {
                                MarkerError::invalid_argument(name, key.as_str(), "a boolean")
                            })?;
                        }
                        _ => return Err(MarkerError::unexpected_argument(name, key.as_str())),
                    }
                }
                Ok(Marker::RequiresNetwork { only_local_network })
            }
            other => Ok(Marker::Unregistered {
                name: other.to_owned(),
            }),
        }
    }

    /// Parse a marker that takes no arguments
    pub fn named(name: &str) -> Result<Self> {
        Self::parse(name, &[], &BTreeMap::new())
    }

    /// Shorthand for `skip_if_binaries_missing(*binaries)`
    pub fn binaries_missing<I, S>(binaries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Marker::SkipIfBinariesMissing {
            binaries: binaries.into_iter().map(Into::into).collect(),
            check_all: false,
            message: None,
        }
    }

    /// The marker name as used in manifests and test annotations
    pub fn name(&self) -> &str {
        match self {
            Marker::DestructiveTest => DESTRUCTIVE_TEST,
            Marker::ExpensiveTest => EXPENSIVE_TEST,
            Marker::SkipIfNotRoot => SKIP_IF_NOT_ROOT,
            Marker::SkipIfBinariesMissing { .. } => SKIP_IF_BINARIES_MISSING,
            Marker::RequiresNetwork { .. } => REQUIRES_NETWORK,
            Marker::Unregistered { name } => name,
        }
    }

    /// Whether the marker belongs to the registered vocabulary
    pub fn is_registered(&self) -> bool {
        !matches!(self, Marker::Unregistered { .. })
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::SkipIfBinariesMissing {
                binaries,
                check_all,
                message,
            } => {
                write!(f, "{}({}", self.name(), binaries.join(", "))?;
                if *check_all {
                    write!(f, ", check_all=true")?;
                }
                if let Some(message) = message {
                    write!(f, ", message={message:?}")?;
                }
                write!(f, ")")
            }
            Marker::RequiresNetwork {
                only_local_network: true,
            } => write!(f, "{}(only_local_network=true)", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

fn reject_arguments(
    name: &str,
    args: &[MarkerValue],
    kwargs: &BTreeMap<String, MarkerValue>,
) -> Result<()> {
    if !args.is_empty() {
        return Err(MarkerError::unexpected_argument(name, "args[0]"));
    }
    if let Some(key) = kwargs.keys().next() {
        return Err(MarkerError::unexpected_argument(name, key.as_str()));
    }
    Ok(())
}

fn parse_binaries_missing(
    args: &[MarkerValue],
    kwargs: &BTreeMap<String, MarkerValue>,
) -> Result<Marker> {
    let name = SKIP_IF_BINARIES_MISSING;

    // `skip_if_binaries_missing([a, b])` means the same as `skip_if_binaries_missing(a, b)`
    let (values, flattened) = match args {
        [MarkerValue::List(inner)] => (inner.as_slice(), true),
        _ => (args, false),
    };

    let mut binaries = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        let argument = if flattened {
            format!("args[0][{index}]")
        } else {
            format!("args[{index}]")
        };
        let binary = value
            .as_text()
            .ok_or_else(|| MarkerError::invalid_argument(name, argument, "a binary name"))?;
        binaries.push(binary.to_owned());
    }

    let mut check_all = false;
    let mut message = None;
    for (key, value) in kwargs {
        match key.as_str() {
            "check_all" => {
                check_all = value
                    .as_bool()
                    .ok_or_else(|| MarkerError::invalid_argument(name, key.as_str(), "a boolean"))?;
            }
            "message" => {
                let text = value
                    .as_text()
                    .ok_or_else(|| MarkerError::invalid_argument(name, key.as_str(), "a string"))?;
                message = Some(text.to_owned());
            }
            _ => return Err(MarkerError::unexpected_argument(name, key.as_str())),
        }
    }

    Ok(Marker::SkipIfBinariesMissing {
        binaries,
        check_all,
        message,
    })
}
