//! Process-wide run configuration

use serde::{Deserialize, Serialize};

/// Flags that opt into test categories which are disabled by default.
///
/// Built once at process entry and passed by reference to [`evaluate`](crate::evaluate).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Run tests marked `destructive_test` (they may add or remove system users, for example)
    #[serde(default)]
    pub run_destructive: bool,

    /// Run tests marked `expensive_test` (they may bootstrap a cloud VM, for example)
    #[serde(default)]
    pub run_expensive: bool,
}

impl RunConfiguration {
    /// Create a run configuration
    pub fn new(run_destructive: bool, run_expensive: bool) -> Self {
        Self {
            run_destructive,
            run_expensive,
        }
    }

    /// Combine two configurations; a category is enabled if either side enables it
    #[must_use]
    pub fn merge(self, other: RunConfiguration) -> Self {
        Self {
            run_destructive: self.run_destructive || other.run_destructive,
            run_expensive: self.run_expensive || other.run_expensive,
        }
    }
}
