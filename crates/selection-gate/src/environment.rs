//! Facts about the host the gate consults

use crate::network::{self, ProbeSettings};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Host facts consumed by [`evaluate`](crate::evaluate)
pub trait HostEnvironment {
    /// Effective user id; `None` on platforms without user ids
    fn effective_user_id(&self) -> Option<u32>;

    /// Resolve a binary name against the executable search path
    fn which(&self, binary: &str) -> Option<PathBuf>;

    /// Resolve the first of several binary names that exists
    fn which_any(&self, binaries: &[String]) -> Option<PathBuf> {
        binaries.iter().find_map(|binary| self.which(binary))
    }

    /// Whether a local network stack is available
    fn has_local_network(&self) -> bool;

    /// Whether an external host is reachable
    fn has_external_network(&self) -> bool;
}

/// The real host: process credentials, `PATH` and sockets
#[derive(Debug, Clone, Default)]
pub struct SystemEnvironment {
    probes: ProbeSettings,
    search_path: Option<OsString>,
}

impl SystemEnvironment {
    /// Environment with default probe settings, resolving binaries against `PATH`
    pub fn new() -> Self {
        Self::default()
    }

    /// Use different probe settings
    #[must_use]
    pub fn with_probe_settings(mut self, probes: ProbeSettings) -> Self {
        self.probes = probes;
        self
    }

    /// Resolve binaries against this search path instead of `PATH`
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// The probe settings in use
    pub fn probe_settings(&self) -> &ProbeSettings {
        &self.probes
    }
}

impl HostEnvironment for SystemEnvironment {
    fn effective_user_id(&self) -> Option<u32> {
        #[cfg(unix)]
        {
            Some(nix::unistd::geteuid().as_raw())
        }
        #[cfg(not(unix))]
        {
            None
        }
    }

    fn which(&self, binary: &str) -> Option<PathBuf> {
        match &self.search_path {
            Some(search_path) => resolve_binary(binary, Some(search_path)),
            None => resolve_binary(binary, std::env::var_os("PATH").as_deref()),
        }
    }

    fn has_local_network(&self) -> bool {
        network::probe_local_network(&self.probes)
    }

    fn has_external_network(&self) -> bool {
        network::probe_external_network(&self.probes).is_some()
    }
}

/// Locate an executable.
///
/// Names with more than one path component are checked as given; bare names are
/// joined with each entry of `search_path` in order.
pub fn resolve_binary(binary: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if binary.is_empty() {
        return None;
    }

    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    std::env::split_paths(search_path?)
        .map(|dir| dir.join(binary))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
