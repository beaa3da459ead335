//! Environment variable resolver
//!
//! Resolves `${VAR}` and `${VAR:-default}` references in manifest text.

use crate::{ConfigError, Result};
use regex::Regex;
use std::collections::HashMap;

/// Context for resolving variables
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// Environment variables (can be overridden)
    pub env_vars: HashMap<String, String>,
}

impl ResolutionContext {
    /// Create a context from the process environment
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Create a context with no variables at all
    pub fn empty() -> Self {
        Self {
            env_vars: HashMap::new(),
        }
    }

    /// Add or update an environment variable
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env_vars.insert(key.into(), value.into());
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve environment variables in a string.
///
/// Every unresolved variable without a default is collected and reported in a
/// single [`ConfigError::EnvVarNotFound`].
pub fn resolve_env_vars(input: &str, context: &ResolutionContext) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::ValidationError(format!("bad variable pattern: {e}")))?;
    let mut missing: Vec<String> = Vec::new();

    let resolved = re.replace_all(input, |cap: &regex::Captures<'_>| {
        let var_expr = cap.get(1).map_or("", |m| m.as_str());

        // Handle default values: ${VAR:-default}
        let (var_name, default_value) = match var_expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (var_expr, None),
        };

        match (context.env_vars.get(var_name), default_value) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.to_owned(),
            (None, None) => {
                if !missing.iter().any(|name| name == var_name) {
                    missing.push(var_name.to_owned());
                }
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ConfigError::EnvVarNotFound(missing.join(", ")));
    }

    Ok(resolved.into_owned())
}
