//! The registered marker vocabulary

use crate::marker::{
    DESTRUCTIVE_TEST, EXPENSIVE_TEST, REQUIRES_NETWORK, SKIP_IF_BINARIES_MISSING, SKIP_IF_NOT_ROOT,
};
use serde::Serialize;

/// A marker known to the gate, with the text shown by `--help`-style listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerDeclaration {
    /// Marker name
    pub name: &'static str,
    /// Call signature including arguments and their defaults
    pub signature: &'static str,
    /// Free-text description, never evaluated
    pub description: &'static str,
}

/// The set of recognized markers, in registration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRegistry {
    declarations: Vec<MarkerDeclaration>,
}

/// Declare the fixed vocabulary of markers the gate understands
pub fn register_markers() -> MarkerRegistry {
    MarkerRegistry {
        declarations: vec![
            MarkerDeclaration {
                name: DESTRUCTIVE_TEST,
                signature: "destructive_test",
                description: "Run destructive tests. These tests can include adding or removing \
                              users from your system for example.",
            },
            MarkerDeclaration {
                name: EXPENSIVE_TEST,
                signature: "expensive_test",
                description: "Run expensive tests. These tests usually involve costs like for \
                              example bootstrapping a cloud VM.",
            },
            MarkerDeclaration {
                name: SKIP_IF_NOT_ROOT,
                signature: "skip_if_not_root",
                description: "Skip if the current user is not `root`.",
            },
            MarkerDeclaration {
                name: SKIP_IF_BINARIES_MISSING,
                signature: "skip_if_binaries_missing(*binaries, check_all=False, message=None)",
                description: "Skip if any of the passed binaries are not found in path. If \
                              'check_all' is 'True', then all binaries must be found.",
            },
            MarkerDeclaration {
                name: REQUIRES_NETWORK,
                signature: "requires_network(only_local_network=False)",
                description: "Skip if no networking is set up. If 'only_local_network' is \
                              'True', only the local network is checked.",
            },
        ],
    }
}

impl MarkerRegistry {
    /// All declarations in registration order
    pub fn declarations(&self) -> &[MarkerDeclaration] {
        &self.declarations
    }

    /// Look up a declaration by marker name
    pub fn get(&self, name: &str) -> Option<&MarkerDeclaration> {
        self.declarations.iter().find(|decl| decl.name == name)
    }

    /// Whether a marker name is part of the vocabulary
    pub fn is_registered(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of registered markers
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl Default for MarkerRegistry {
    fn default() -> Self {
        register_markers()
    }
}
